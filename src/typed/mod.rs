//! Typed handlers.
//!
//! A typed route binds a plain async function to a verb and path. Its
//! parameters are decoded for it, its [`Capability`] preconditions resolved,
//! and whatever it reports through [`Respond`] is encoded as JSON:
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use weft::{RequestError, Respond, Router};
//!
//! #[derive(Deserialize, Serialize)]
//! struct User { id: i32, name: String }
//!
//! async fn find(_: (), id: i32, respond: Respond<User>) {
//!     match id {
//!         1 => respond.send(Ok(User { id, name: "Mike".into() })),
//!         _ => respond.send(Err(RequestError::NotFound)),
//!     }
//! }
//!
//! let router = Router::new().get_by_id("/users", find);
//! ```
//!
//! Decoding failures answer `400` and a refused capability answers with its
//! own status; in both cases the function is never called.

mod capability;
pub mod decode;
mod endpoint;
mod identifier;
mod outcome;
mod routes;

pub use capability::{Capability, CapabilityDescriptor, CapabilitySet, Rejection, Resolution, resolve_all};
pub use identifier::{Identifier, IdentifierError};
pub use outcome::{Outcome, Respond, finalize};
