//! Ordered route/middleware table.
//!
//! Unlike a plain method → path lookup, every registration becomes one
//! element of a single ordered list. A request walks that list front to back:
//! mounted layers, several handlers for the same path, and error handlers all
//! run in the order they were registered.

use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, warn};

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedMiddleware};
use crate::method::Verb;
use crate::middleware::{Middleware, Next, from_fn};
use crate::pattern::PathPattern;
use crate::request::Request;
use crate::response::Response;
use crate::route::{ChainEnd, Reach, RouteChain, RouteElement};

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every registration returns `self` so calls chain naturally.
pub struct Router {
    elements: Vec<RouteElement>,
}

impl Router {
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    /// Registers a middleware for a verb + path pair.
    ///
    /// Path parameters use `:name` (or `{name}`) syntax and are read with
    /// [`Request::param`].
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid pattern.
    pub fn on(self, verb: Verb, path: &str, middleware: impl Middleware) -> Self {
        self.add(verb, Some(path), Reach::Route, vec![Arc::new(middleware)])
    }

    /// Registers several handlers as one element; they share one middleware
    /// chain and run in the given order.
    pub fn chain(self, verb: Verb, path: &str, handlers: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.add(verb, Some(path), Reach::Route, handlers.into_iter().collect())
    }

    /// Registers a layer that sees every request at or below `path`, whatever
    /// its method.
    pub fn mount(self, path: &str, middleware: impl Middleware) -> Self {
        self.add(Verb::All, Some(path), Reach::Mount, vec![Arc::new(middleware)])
    }

    /// Registers an error handler. It runs only once a failure has been
    /// recorded on the response, wherever that happened in the chain.
    pub fn error(self, middleware: impl Middleware) -> Self {
        self.add(Verb::Error, None, Reach::Route, vec![Arc::new(middleware)])
    }

    pub fn get<F>(self, path: &str, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, Result<(), Error>>
            + Send + Sync + 'static,
    {
        self.on(Verb::Get, path, from_fn(f))
    }

    pub fn post<F>(self, path: &str, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, Result<(), Error>>
            + Send + Sync + 'static,
    {
        self.on(Verb::Post, path, from_fn(f))
    }

    pub fn put<F>(self, path: &str, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, Result<(), Error>>
            + Send + Sync + 'static,
    {
        self.on(Verb::Put, path, from_fn(f))
    }

    pub fn patch<F>(self, path: &str, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, Result<(), Error>>
            + Send + Sync + 'static,
    {
        self.on(Verb::Patch, path, from_fn(f))
    }

    pub fn delete<F>(self, path: &str, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, Result<(), Error>>
            + Send + Sync + 'static,
    {
        self.on(Verb::Delete, path, from_fn(f))
    }

    /// Matches every method.
    pub fn all<F>(self, path: &str, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response, Next) -> BoxFuture<'a, Result<(), Error>>
            + Send + Sync + 'static,
    {
        self.on(Verb::All, path, from_fn(f))
    }

    fn add(mut self, verb: Verb, path: Option<&str>, reach: Reach, handlers: Vec<BoxedMiddleware>) -> Self {
        let pattern = path.map(|p| {
            let compiled = match reach {
                Reach::Route => PathPattern::exact(p),
                Reach::Mount => PathPattern::prefix(p),
            };
            compiled.unwrap_or_else(|e| panic!("invalid route `{p}`: {e}"))
        });
        debug!(%verb, path, handlers = handlers.len(), "registered route element");
        self.elements.push(RouteElement { verb, pattern, reach, handlers });
        self
    }

    /// Runs `req` through the chain and returns the finalized response.
    ///
    /// A response nobody finalized gets a status here: 500 if an error was
    /// recorded, 200 if some route matched, 404 otherwise.
    pub async fn handle(&self, mut req: Request) -> Response {
        let mut res = Response::new();
        let end = RouteChain::new(&self.elements)
            .run(&mut req, &mut res, |_, res, found| complete(res, found))
            .await;

        if end == ChainEnd::Halted && !res.is_ended() {
            warn!(method = %req.method(), path = req.path(), "chain halted without finalizing the response");
            complete(&mut res, true);
        }
        res
    }
}

fn complete(res: &mut Response, found: bool) {
    if res.is_ended() {
        return;
    }
    if res.status().is_none() {
        let status = if res.error().is_some() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else if found {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        };
        res.set_status(status);
    }
    res.end();
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
