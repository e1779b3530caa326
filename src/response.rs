//! Outgoing HTTP response type.
//!
//! A [`Response`] is shared, mutably and in turn, by every element of the
//! chain serving a request. Once [`end`](Response::end) has been called the
//! response is *finalized*: further mutation is ignored rather than allowed
//! to corrupt what goes on the wire.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;

// ── LinkParameter ─────────────────────────────────────────────────────────────

/// Parameters of an RFC 5988 `Link` header, for [`Response::add_link`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LinkParameter {
    Anchor,
    Hreflang,
    Media,
    Rel,
    Rev,
    Title,
    Type,
}

impl LinkParameter {
    fn as_str(self) -> &'static str {
        match self {
            Self::Anchor   => "anchor",
            Self::Hreflang => "hreflang",
            Self::Media    => "media",
            Self::Rel      => "rel",
            Self::Rev      => "rev",
            Self::Title    => "title",
            Self::Type     => "type",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    error: Option<Error>,
    ended: bool,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status set so far. `None` until someone sets one.
    pub fn status(&self) -> Option<StatusCode> { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn is_ended(&self) -> bool { self.ended }

    /// The failure recorded for this request, if any.
    pub fn error(&self) -> Option<&Error> { self.error.as_ref() }

    pub fn set_status(&mut self, status: impl Into<StatusCode>) -> &mut Self {
        if self.guard("status") {
            self.status = Some(status.into());
        }
        self
    }

    /// Replaces a header. Invalid names or values are skipped.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        if !self.guard("header") {
            return self;
        }
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => debug!(name, "skipping invalid response header"),
        }
        self
    }

    /// Appends bytes to the body.
    pub fn send(&mut self, bytes: impl AsRef<[u8]>) -> &mut Self {
        if self.guard("body") {
            self.body.extend_from_slice(bytes.as_ref());
        }
        self
    }

    /// Appends text and defaults the content type to `text/plain`.
    pub fn send_text(&mut self, text: &str) -> &mut Self {
        if !self.headers.contains_key(header::CONTENT_TYPE) {
            self.set_header("content-type", "text/plain; charset=utf-8");
        }
        self.send(text)
    }

    /// Replaces the body with the JSON encoding of `value`.
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self, Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self.send_json_bytes(bytes))
    }

    pub(crate) fn send_json_bytes(&mut self, bytes: Vec<u8>) -> &mut Self {
        if self.guard("body") {
            self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            self.body = bytes;
        }
        self
    }

    /// Appends a `Link` header value: `<link>; rel="next"; title="…"`.
    pub fn add_link(&mut self, link: &str, params: &[(LinkParameter, &str)]) -> &mut Self {
        if !self.guard("header") {
            return self;
        }
        let mut value = format!("<{link}>");
        for (param, v) in params {
            value.push_str(&format!("; {}=\"{v}\"", param.as_str()));
        }
        match HeaderValue::try_from(value) {
            Ok(v) => {
                self.headers.append(header::LINK, v);
            }
            Err(_) => debug!(link, "skipping invalid link header"),
        }
        self
    }

    /// Records a failure. Subsequent non-error elements are skipped.
    pub fn set_error(&mut self, error: Error) -> &mut Self {
        if self.guard("error") {
            self.error = Some(error);
        }
        self
    }

    /// Removes the recorded error, e.g. once an error handler has answered it.
    pub fn take_error(&mut self) -> Option<Error> {
        if self.ended { None } else { self.error.take() }
    }

    /// Finalizes the response. Idempotent.
    pub fn end(&mut self) {
        self.ended = true;
    }

    /// `true` if the response may still be mutated; logs the ignored write otherwise.
    fn guard(&self, what: &'static str) -> bool {
        if self.ended {
            debug!(what, "ignoring mutation of a finalized response");
        }
        !self.ended
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = self.headers;
        res
    }
}
