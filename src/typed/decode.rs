//! Parameter decoding for typed routes.
//!
//! Every decoder either returns the value or sets `400 Bad Request` on the
//! response and returns `None`; the caller then abandons the typed handler
//! and lets the chain continue.

use std::collections::HashMap;

use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::request::Request;
use crate::response::Response;
use crate::typed::identifier::Identifier;

/// Name of the path parameter typed routes append.
pub(crate) const ID_PARAM: &str = "id";

/// Builds the identifier from the `:id` path segment.
pub fn identifier<Id: Identifier>(req: &Request, res: &mut Response) -> Option<Id> {
    let Some(segment) = req.param(ID_PARAM) else {
        debug!("typed route reached without an `id` parameter");
        res.set_status(StatusCode::BAD_REQUEST);
        return None;
    };
    match Id::from_segment(segment) {
        Ok(id) => Some(id),
        Err(e) => {
            debug!("malformed path parameter: {e}");
            res.set_status(StatusCode::BAD_REQUEST);
            None
        }
    }
}

/// Decodes the query string into `Q`.
pub fn query<Q: DeserializeOwned>(req: &Request, res: &mut Response) -> Option<Q> {
    debug!(query = ?req.query(), "decoding query parameters");
    match from_query_map(req.query()) {
        Ok(q) => Some(q),
        Err(e) => {
            debug!("malformed query parameters: {e}");
            res.set_status(StatusCode::BAD_REQUEST);
            None
        }
    }
}

/// Decodes the JSON request body into `I`.
pub fn body<I: DeserializeOwned>(req: &Request, res: &mut Response) -> Option<I> {
    match serde_json::from_slice(req.body()) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("malformed request body: {e}");
            res.set_status(StatusCode::BAD_REQUEST);
            None
        }
    }
}

/// Decodes a flat string map into a typed struct. Numeric and boolean fields
/// are parsed from their string form.
pub fn from_query_map<Q: DeserializeOwned>(map: &HashMap<String, String>) -> Result<Q, serde_urlencoded::de::Error> {
    let encoded = serde_urlencoded::to_string(map)
        .map_err(|e| <serde_urlencoded::de::Error as serde::de::Error>::custom(e))?;
    serde_urlencoded::from_str(&encoded)
}

// Input shapes composed from the decoders above.

pub(crate) fn nothing(_: &Request, _: &mut Response) -> Option<()> {
    Some(())
}

pub(crate) fn identifier_and_body<Id: Identifier, I: DeserializeOwned>(
    req: &Request,
    res: &mut Response,
) -> Option<(Id, I)> {
    let id = identifier(req, res)?;
    let input = body(req, res)?;
    Some((id, input))
}
