//! The adapter that runs a typed handler inside the chain.
//!
//! The chain moves on as soon as the handler reports, not when its future
//! ends: whatever the handler still has to do after reporting keeps running
//! on its own task.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use tracing::{debug, trace};

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::typed::capability::{CapabilitySet, resolve_set};
use crate::typed::outcome::{Outcome, Respond, finalize};

pub(crate) type Decode<In> = fn(&Request, &mut Response) -> Option<In>;

pub(crate) type TypedHandler<C, In, O> = Arc<dyn Fn(C, In, Respond<O>) -> BoxFuture<'static, ()> + Send + Sync>;

/// The middleware a typed registration turns into.
///
/// Per request it decodes the input, resolves the capabilities, runs the
/// handler until it reports and finalizes the response. A decode or
/// capability failure leaves its status on the response and skips the
/// handler. In every case the chain continues.
pub(crate) struct TypedEndpoint<C, In, O> {
    pub(crate) label: &'static str,
    pub(crate) decode: Decode<In>,
    pub(crate) encode: fn(O) -> Outcome,
    pub(crate) success: StatusCode,
    pub(crate) handler: TypedHandler<C, In, O>,
    pub(crate) _capabilities: PhantomData<fn() -> C>,
}

enum First {
    Reported(Option<Outcome>),
    Returned,
}

#[async_trait]
impl<C, In, O> Middleware for TypedEndpoint<C, In, O>
where
    C: CapabilitySet,
    In: Send + 'static,
    O: Send + 'static,
{
    async fn handle(&self, req: &mut Request, res: &mut Response, next: Next) -> Result<(), Error> {
        debug!(route = self.label, path = req.path(), "received typed request");

        let Some(input) = (self.decode)(req, res) else {
            next.run();
            return Ok(());
        };
        let Some(capabilities) = resolve_set::<C>(req, res).await else {
            next.run();
            return Ok(());
        };

        let (respond, mut report) = Respond::new(self.encode);
        let mut work = (self.handler)(capabilities, input, respond);

        let first = tokio::select! {
            biased;
            reported = &mut report => First::Reported(reported.ok()),
            () = &mut work => First::Returned,
        };
        let outcome = match first {
            First::Reported(outcome) => {
                trace!(route = self.label, "handler reported before returning, detaching the rest");
                tokio::spawn(work);
                outcome
            }
            // The reporter may have moved into a task the handler spawned.
            First::Returned => report.await.ok(),
        };
        let outcome = outcome.unwrap_or(Outcome::Missing);

        finalize(outcome, self.success, res);
        next.run();
        Ok(())
    }
}
