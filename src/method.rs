//! Route verbs.
//!
//! A [`Verb`] is what a route element is registered under. Besides the usual
//! HTTP methods it has two routing-only members: [`Verb::All`] matches every
//! method, and [`Verb::Error`] marks an error-handling element that runs only
//! once a failure has been recorded on the response.

use std::fmt;

use http::Method;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verb {
    All,
    Delete,
    Error,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
}

impl Verb {
    /// Returns the uppercase representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All     => "ALL",
            Self::Delete  => "DELETE",
            Self::Error   => "ERROR",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
        }
    }

    /// Whether an element registered under this verb accepts `method`.
    ///
    /// `Error` never matches a method; error elements are selected by the
    /// response's error state instead.
    pub fn matches(self, method: &Method) -> bool {
        match self {
            Self::All     => true,
            Self::Error   => false,
            Self::Delete  => method == Method::DELETE,
            Self::Get     => method == Method::GET,
            Self::Head    => method == Method::HEAD,
            Self::Options => method == Method::OPTIONS,
            Self::Patch   => method == Method::PATCH,
            Self::Post    => method == Method::POST,
            Self::Put     => method == Method::PUT,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
