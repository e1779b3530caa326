use tracing::trace;

use crate::handler::BoxedMiddleware;
use crate::middleware::Next;
use crate::request::Request;
use crate::response::Response;

/// How a chain ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Flow {
    /// The final continuation was reached: the caller may advance.
    Continue,
    /// A step dropped its `Next` without running it.
    Halt,
}

/// Runs one element's middleware in order, one at a time.
///
/// Iteration stops early once an error has been recorded on the response,
/// unless this is an error-handling chain, whose handlers run regardless.
/// Whether it completes or stops early, the chain clears the request's path
/// parameters before handing control back.
pub(crate) struct MiddlewareChain<'a> {
    middlewares: &'a [BoxedMiddleware],
    handles_errors: bool,
}

impl<'a> MiddlewareChain<'a> {
    pub(crate) fn new(middlewares: &'a [BoxedMiddleware], handles_errors: bool) -> Self {
        Self { middlewares, handles_errors }
    }

    pub(crate) async fn run(&self, req: &mut Request, res: &mut Response) -> Flow {
        for (cursor, middleware) in self.middlewares.iter().enumerate() {
            if res.error().is_some() && !self.handles_errors {
                trace!(cursor, "error recorded, leaving middleware chain");
                break;
            }

            let (next, continuation) = Next::pair();
            trace!(cursor, "running middleware");
            match middleware.handle(req, res, next).await {
                Err(e) => {
                    // A failing step counts as having advanced.
                    trace!(cursor, "middleware failed: {e}");
                    res.set_error(e);
                }
                Ok(()) => {
                    if !continuation.invoked().await {
                        trace!(cursor, "middleware did not continue");
                        req.params.clear();
                        return Flow::Halt;
                    }
                }
            }
        }

        req.params.clear();
        Flow::Continue
    }
}
