//! Type erasure for middleware.
//!
//! The router holds middleware of *different* concrete types in one ordered
//! list, so every registration is erased into a trait object:
//!
//! ```text
//! |req, res, next| Box::pin(async move { … })   ← user writes this
//!        ↓ router.get("/", f)
//! from_fn(f)                                     ← FnMiddleware(f)
//!        ↓
//! Arc::new(FnMiddleware(f))                      ← stored as BoxedMiddleware
//!        ↓
//! middleware.handle(&mut req, &mut res, next)    ← one vtable dispatch per step
//! ```
//!
//! Typed routes go through the same door: the adapter built for them is just
//! another `Middleware` behind the same `Arc<dyn …>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware shared, read-only, by all concurrent requests.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Middleware built from a closure. See [`from_fn`].
pub struct FnMiddleware<F>(F);

/// Wraps a `(request, response, next)` closure as a [`Middleware`].
///
/// The closure returns a boxed future borrowing the request and response:
///
/// ```rust
/// use weft::middleware::from_fn;
///
/// let stamp = from_fn(|_req, res, next| Box::pin(async move {
///     res.set_header("x-served-by", "weft");
///     next.run();
///     Ok(())
/// }));
/// ```
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware(f)
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    async fn handle(&self, req: &mut Request, res: &mut Response, next: Next) -> Result<(), Error> {
        (self.0)(req, res, next).await
    }
}
