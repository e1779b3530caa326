//! Typed results and how they reach the wire.
//!
//! A typed handler reports through a [`Respond`]. The report is encoded into
//! an [`Outcome`] right away, handed back to the adapter, and turned into a
//! status and body by [`finalize`]:
//!
//! | Outcome        | Status                  | Body             |
//! |----------------|-------------------------|------------------|
//! | `Value`        | 200, or 201 for POST    | JSON value/array |
//! | `Identified`   | 200, or 201 for POST    | JSON value, plus `Location: <id>` |
//! | `NoContent`    | 200                     | empty            |
//! | `Error(kind)`  | `kind.status()`         | empty            |
//! | `Missing`      | 500                     | empty            |

use std::sync::Mutex;

use http::StatusCode;
use serde::Serialize;
use serde::ser::SerializeMap;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::error::RequestError;
use crate::response::Response;
use crate::typed::identifier::Identifier;

/// What a typed handler reported, already encoded.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// A single value or an array of values.
    Value(Vec<u8>),
    /// A value created under `id`.
    Identified { id: String, body: Vec<u8> },
    NoContent,
    Error(RequestError),
    /// The handler reported neither a value nor an error.
    Missing,
}

/// Applies `outcome` to `res` and finalizes it.
///
/// `success` is the status used for value outcomes (201 for creating routes).
pub fn finalize(outcome: Outcome, success: StatusCode, res: &mut Response) {
    match outcome {
        Outcome::Value(body) => {
            res.set_status(success).send_json_bytes(body);
        }
        Outcome::Identified { id, body } => {
            res.set_status(success).set_header("location", &id).send_json_bytes(body);
        }
        Outcome::NoContent => {
            res.set_status(StatusCode::OK);
        }
        Outcome::Error(kind) => {
            res.set_status(kind.status());
        }
        Outcome::Missing => {
            error!("typed handler reported neither a value nor an error");
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
    res.end();
}

// ── Respond ───────────────────────────────────────────────────────────────────

/// Result-reporting handle given to every typed handler.
///
/// Only the first report counts; later ones are ignored. It may be moved into
/// another task and used from there. Dropping it without reporting yields a
/// `500`.
pub struct Respond<O> {
    slot: Mutex<Option<oneshot::Sender<Outcome>>>,
    encode: fn(O) -> Outcome,
}

impl<O> Respond<O> {
    pub(crate) fn new(encode: fn(O) -> Outcome) -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { slot: Mutex::new(Some(tx)), encode }, rx)
    }

    /// Reports a value or an error kind.
    pub fn send(&self, result: Result<O, RequestError>) {
        self.deliver(|encode| match result {
            Ok(value) => encode(value),
            Err(kind) => Outcome::Error(kind),
        });
    }

    /// Reports optional parts. An error wins over a value; neither is a
    /// malformed report and yields `500`.
    pub fn complete(&self, value: Option<O>, error: Option<RequestError>) {
        self.deliver(|encode| match (value, error) {
            (_, Some(kind)) => Outcome::Error(kind),
            (Some(value), None) => encode(value),
            (None, None) => Outcome::Missing,
        });
    }

    fn deliver(&self, make: impl FnOnce(fn(O) -> Outcome) -> Outcome) {
        let sender = self.slot.lock().ok().and_then(|mut slot| slot.take());
        match sender {
            // The receiver is gone only if the request was dropped mid-flight.
            Some(tx) => {
                let _ = tx.send(make(self.encode));
            }
            None => debug!("result already reported, ignoring"),
        }
    }
}

impl Respond<()> {
    /// Reports a no-content result: `None` for success, or the error kind.
    pub fn done(&self, error: Option<RequestError>) {
        self.send(error.map_or(Ok(()), Err));
    }
}

// ── Encoders ──────────────────────────────────────────────────────────────────

pub(crate) fn encode_value<O: Serialize>(value: O) -> Outcome {
    match serde_json::to_vec(&value) {
        Ok(body) => Outcome::Value(body),
        Err(e) => encode_failure(e),
    }
}

pub(crate) fn encode_identified<Id: Identifier, O: Serialize>((id, value): (Id, O)) -> Outcome {
    match serde_json::to_vec(&value) {
        Ok(body) => Outcome::Identified { id: id.value(), body },
        Err(e) => encode_failure(e),
    }
}

/// `[(id, value), …]` encodes as `[{"<id>": value}, …]`.
pub(crate) fn encode_identified_list<Id: Identifier, O: Serialize>(pairs: Vec<(Id, O)>) -> Outcome {
    let tagged: Vec<Tagged<'_, O>> = pairs.iter().map(|(id, value)| Tagged(id.value(), value)).collect();
    encode_value(tagged)
}

pub(crate) fn encode_empty(_: ()) -> Outcome {
    Outcome::NoContent
}

fn encode_failure(e: serde_json::Error) -> Outcome {
    error!("failed to encode typed result: {e}");
    Outcome::Error(RequestError::InternalServerError)
}

struct Tagged<'a, O>(String, &'a O);

impl<O: Serialize> Serialize for Tagged<'_, O> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.0, self.1)?;
        map.end()
    }
}
