//! Route elements and the chain that walks them.

use tracing::trace;

use crate::handler::BoxedMiddleware;
use crate::method::Verb;
use crate::middleware::{Flow, MiddlewareChain};
use crate::pattern::PathPattern;
use crate::request::Request;
use crate::response::Response;

/// How a route element may be reached.
pub(crate) enum Reach {
    /// A route: counts as "found" for the 404 fallback.
    Route,
    /// A mounted layer; matches but never makes a path "found".
    Mount,
}

/// One registered (verb, pattern, handlers) binding. Immutable once built.
pub(crate) struct RouteElement {
    pub(crate) verb: Verb,
    pub(crate) pattern: Option<PathPattern>,
    pub(crate) reach: Reach,
    pub(crate) handlers: Vec<BoxedMiddleware>,
}

/// What one element did with the request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Step {
    Skipped,
    Advanced { found: bool },
    Halted,
}

impl RouteElement {
    async fn process(&self, req: &mut Request, res: &mut Response) -> Step {
        let handles_errors = self.verb == Verb::Error;
        if handles_errors != res.error().is_some() {
            return Step::Skipped;
        }
        if !handles_errors && !self.verb.matches(req.method()) {
            return Step::Skipped;
        }
        if let Some(pattern) = &self.pattern {
            let Some(params) = pattern.matches(req.path()) else {
                return Step::Skipped;
            };
            req.params.extend(params);
        }

        trace!(verb = %self.verb, pattern = self.pattern.as_ref().map(PathPattern::as_str), "element matched");
        match MiddlewareChain::new(&self.handlers, handles_errors).run(req, res).await {
            Flow::Continue => Step::Advanced { found: matches!(self.reach, Reach::Route) },
            Flow::Halt => Step::Halted,
        }
    }
}

/// How a [`RouteChain`] run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ChainEnd {
    /// Every element was offered the request, or one finalized the response.
    Completed,
    /// An element neither continued nor finalized the response.
    Halted,
}

/// Walks the router's elements for one request, strictly in order.
///
/// The cursor only moves forward. Each element runs to completion, including
/// waiting for its continuation, before the next one is looked at. The walk
/// stops as soon as the response is finalized.
pub(crate) struct RouteChain<'a> {
    elements: &'a [RouteElement],
}

impl<'a> RouteChain<'a> {
    pub(crate) fn new(elements: &'a [RouteElement]) -> Self {
        Self { elements }
    }

    /// Drives the chain, then hands `complete` the request, the response and
    /// whether any route element matched. `complete` is skipped on a halt.
    pub(crate) async fn run<F>(&self, req: &mut Request, res: &mut Response, complete: F) -> ChainEnd
    where
        F: FnOnce(&mut Request, &mut Response, bool),
    {
        let mut found = false;
        let mut cursor = 0;
        while cursor < self.elements.len() && !res.is_ended() {
            match self.elements[cursor].process(req, res).await {
                Step::Skipped => {}
                Step::Advanced { found: f } => found |= f,
                Step::Halted => {
                    trace!(cursor, "route chain halted");
                    return ChainEnd::Halted;
                }
            }
            cursor += 1;
        }
        complete(req, res, found);
        ChainEnd::Completed
    }
}
