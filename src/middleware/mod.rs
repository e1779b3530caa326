//! Middleware layer.
//!
//! Everything the router runs is a [`Middleware`]: plain closures, mounted
//! cross-cutting layers, error handlers and the adapters generated for typed
//! routes. Each receives the request, the response and a [`Next`]
//! continuation.
//!
//! A middleware does exactly one of three things:
//!
//! - calls [`Next::run`] to let the chain advance,
//! - finalizes the response with [`Response::end`](crate::Response::end),
//! - returns `Err`, which records the error and advances to error handlers.
//!
//! Dropping `Next` without running it, and without finalizing the response,
//! halts the chain.

mod chain;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

pub(crate) use chain::{Flow, MiddlewareChain};

pub use crate::handler::{FnMiddleware, from_fn};

#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, req: &mut Request, res: &mut Response, next: Next) -> Result<(), Error>;
}

// ── Continuation ──────────────────────────────────────────────────────────────

/// Single-use continuation handed to every middleware.
///
/// Consumed by [`run`](Next::run), so a step can advance its chain at most
/// once. It is `Send + 'static`: a middleware may move it into another task
/// and run it from there; the chain waits.
#[must_use = "dropping `Next` without running it halts the chain"]
pub struct Next {
    tx: oneshot::Sender<()>,
}

impl Next {
    pub(crate) fn pair() -> (Next, Continuation) {
        let (tx, rx) = oneshot::channel();
        (Next { tx }, Continuation(rx))
    }

    /// Lets the chain advance to the following step.
    pub fn run(self) {
        // The receiver is gone only if the request itself was dropped.
        let _ = self.tx.send(());
    }
}

/// The chain's side of a [`Next`].
pub(crate) struct Continuation(oneshot::Receiver<()>);

impl Continuation {
    /// Resolves once the step ran its `Next` (`true`) or dropped it (`false`).
    pub(crate) async fn invoked(self) -> bool {
        self.0.await.is_ok()
    }
}
