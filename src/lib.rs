//! # weft
//!
//! Request dispatch for HTTP services: one ordered chain of routes and
//! middleware, plus a layer that binds plain typed async functions into it.
//!
//! ## The model
//!
//! Every registration appends one element to a single list. A request walks
//! that list front to back, and each element whose verb and path match gets
//! to run its middleware. A middleware either runs its [`middleware::Next`]
//! continuation, finalizes the response, or returns an error. Errors move the
//! request over to the elements registered with [`Router::error`].
//!
//! What weft does:
//!
//! - Ordered dispatch over verb + path elements, with mounted layers
//! - Error elements that only run once something has failed
//! - Typed routes: identifiers, query structs and JSON bodies decoded for
//!   you, results encoded for you
//! - [`Capability`] preconditions resolved in order before a typed route runs
//! - A hyper server with graceful shutdown
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use weft::{RequestError, Respond, Router, Server};
//!
//! #[derive(Clone, Deserialize, Serialize)]
//! struct User { id: i32, name: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), weft::Error> {
//!     let app = Router::new()
//!         .get_by_id("/users", get_user)
//!         .post_typed("/users", create_user)
//!         .get("/healthz", |_req, res, next| Box::pin(async move {
//!             res.send_text("ok");
//!             next.run();
//!             Ok(())
//!         }));
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn get_user(_: (), id: i32, respond: Respond<User>) {
//!     match id {
//!         1 => respond.send(Ok(User { id, name: "Mike".into() })),
//!         _ => respond.send(Err(RequestError::NotFound)),
//!     }
//! }
//!
//! async fn create_user(_: (), user: User, respond: Respond<User>) {
//!     respond.send(Ok(user));
//! }
//! ```

mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod route;
mod router;
mod server;
mod typed;

pub mod middleware;

pub use async_trait::async_trait;

pub use error::{Error, RequestError};
pub use handler::{BoxFuture, BoxedMiddleware};
pub use method::Verb;
pub use request::Request;
pub use response::{LinkParameter, Response};
pub use router::Router;
pub use server::Server;
pub use typed::{
    Capability, CapabilityDescriptor, CapabilitySet, Identifier, IdentifierError, Outcome, Rejection, Resolution,
    Respond, decode, finalize, resolve_all,
};
