//! Typed registrations on [`Router`].
//!
//! Every method takes the capability tuple as the handler's first argument
//! and a [`Respond`] as its last. Methods ending in `_by_id` append `/:id` to
//! the path and hand the parsed identifier to the handler; they refuse a path
//! that already declares a parameter.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::handler::BoxFuture;
use crate::method::Verb;
use crate::pattern;
use crate::router::Router;
use crate::typed::capability::CapabilitySet;
use crate::typed::decode;
use crate::typed::endpoint::{Decode, TypedEndpoint, TypedHandler};
use crate::typed::identifier::Identifier;
use crate::typed::outcome::{Outcome, Respond, encode_empty, encode_identified, encode_identified_list, encode_value};

const ID_SEGMENT: &str = ":id";

impl Router {
    /// `GET path`: a single value, or an array when `O` is a `Vec`.
    pub fn get_typed<C, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        O: Serialize + Send + 'static,
        F: Fn(C, Respond<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: TypedHandler<C, (), O> =
            Arc::new(move |caps: C, _: (), respond: Respond<O>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, respond))
            });
        self.typed(Verb::Get, path, "get", decode::nothing, encode_value::<O>, StatusCode::OK, handler)
    }

    /// `GET path/:id`.
    pub fn get_by_id<C, Id, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        Id: Identifier,
        O: Serialize + Send + 'static,
        F: Fn(C, Id, Respond<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(path) = identified_path(Verb::Get, path) else { return self };
        let handler: TypedHandler<C, Id, O> =
            Arc::new(move |caps: C, id: Id, respond: Respond<O>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, id, respond))
            });
        self.typed(Verb::Get, &path, "get by id", decode::identifier::<Id>, encode_value::<O>, StatusCode::OK, handler)
    }

    /// `GET path?…`: the query string decoded into `Q`.
    pub fn get_with_query<C, Q, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        Q: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(C, Q, Respond<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: TypedHandler<C, Q, O> =
            Arc::new(move |caps: C, query: Q, respond: Respond<O>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, query, respond))
            });
        self.typed(Verb::Get, path, "get with query", decode::query::<Q>, encode_value::<O>, StatusCode::OK, handler)
    }

    /// `GET path`: `(id, value)` pairs, encoded as `[{"<id>": value}, …]`.
    pub fn get_identified<C, Id, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        Id: Identifier,
        O: Serialize + Send + 'static,
        F: Fn(C, Respond<Vec<(Id, O)>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: TypedHandler<C, (), Vec<(Id, O)>> =
            Arc::new(move |caps: C, _: (), respond: Respond<Vec<(Id, O)>>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, respond))
            });
        self.typed(
            Verb::Get,
            path,
            "get identified",
            decode::nothing,
            encode_identified_list::<Id, O>,
            StatusCode::OK,
            handler,
        )
    }

    /// `POST path` with a JSON body. Answers `201 Created`.
    pub fn post_typed<C, I, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(C, I, Respond<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: TypedHandler<C, I, O> =
            Arc::new(move |caps: C, input: I, respond: Respond<O>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, input, respond))
            });
        self.typed(Verb::Post, path, "post", decode::body::<I>, encode_value::<O>, StatusCode::CREATED, handler)
    }

    /// `POST path` reporting the new identifier too. Answers `201 Created`
    /// with a `Location` header.
    pub fn post_identified<C, I, Id, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        I: DeserializeOwned + Send + 'static,
        Id: Identifier,
        O: Serialize + Send + 'static,
        F: Fn(C, I, Respond<(Id, O)>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: TypedHandler<C, I, (Id, O)> =
            Arc::new(move |caps: C, input: I, respond: Respond<(Id, O)>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, input, respond))
            });
        self.typed(
            Verb::Post,
            path,
            "post identified",
            decode::body::<I>,
            encode_identified::<Id, O>,
            StatusCode::CREATED,
            handler,
        )
    }

    /// `PUT path/:id` with a JSON body.
    pub fn put_by_id<C, Id, I, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        Id: Identifier,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(C, Id, I, Respond<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.replace_by_id(Verb::Put, "put by id", path, handler)
    }

    /// `PATCH path/:id` with a JSON body, usually a struct of optional fields.
    pub fn patch_by_id<C, Id, I, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        Id: Identifier,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(C, Id, I, Respond<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.replace_by_id(Verb::Patch, "patch by id", path, handler)
    }

    /// `DELETE path`. The handler reports `None` on success.
    pub fn delete_typed<C, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        F: Fn(C, Respond<()>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: TypedHandler<C, (), ()> =
            Arc::new(move |caps: C, _: (), respond: Respond<()>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, respond))
            });
        self.typed(Verb::Delete, path, "delete", decode::nothing, encode_empty, StatusCode::OK, handler)
    }

    /// `DELETE path/:id`.
    pub fn delete_by_id<C, Id, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        Id: Identifier,
        F: Fn(C, Id, Respond<()>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(path) = identified_path(Verb::Delete, path) else { return self };
        let handler: TypedHandler<C, Id, ()> =
            Arc::new(move |caps: C, id: Id, respond: Respond<()>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, id, respond))
            });
        self.typed(Verb::Delete, &path, "delete by id", decode::identifier::<Id>, encode_empty, StatusCode::OK, handler)
    }

    /// `DELETE path?…`: deletes whatever the query selects.
    pub fn delete_with_query<C, Q, F, Fut>(self, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        Q: DeserializeOwned + Send + 'static,
        F: Fn(C, Q, Respond<()>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: TypedHandler<C, Q, ()> =
            Arc::new(move |caps: C, query: Q, respond: Respond<()>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, query, respond))
            });
        self.typed(Verb::Delete, path, "delete with query", decode::query::<Q>, encode_empty, StatusCode::OK, handler)
    }

    fn replace_by_id<C, Id, I, O, F, Fut>(self, verb: Verb, label: &'static str, path: &str, handler: F) -> Self
    where
        C: CapabilitySet,
        Id: Identifier,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(C, Id, I, Respond<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(path) = identified_path(verb, path) else { return self };
        let handler: TypedHandler<C, (Id, I), O> =
            Arc::new(move |caps: C, (id, input): (Id, I), respond: Respond<O>| -> BoxFuture<'static, ()> {
                Box::pin(handler(caps, id, input, respond))
            });
        self.typed(
            verb,
            &path,
            label,
            decode::identifier_and_body::<Id, I>,
            encode_value::<O>,
            StatusCode::OK,
            handler,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn typed<C, In, O>(
        self,
        verb: Verb,
        path: &str,
        label: &'static str,
        decode: Decode<In>,
        encode: fn(O) -> Outcome,
        success: StatusCode,
        handler: TypedHandler<C, In, O>,
    ) -> Self
    where
        C: CapabilitySet,
        In: Send + 'static,
        O: Send + 'static,
    {
        debug!(%verb, path, route = label, capabilities = C::descriptors().len(), "registering typed route");
        let endpoint = TypedEndpoint { label, decode, encode, success, handler, _capabilities: PhantomData };
        self.on(verb, path, endpoint)
    }
}

/// `path` with `/:id` appended, or `None` if `path` already has a parameter.
///
/// Such a registration is dropped: requests for it fall through to whatever
/// else matches, usually a `404`.
fn identified_path(verb: Verb, path: &str) -> Option<String> {
    if pattern::has_parameter(path) {
        error!(%verb, path, "typed route with an identifier must not declare its own path parameters; route not registered");
        return None;
    }
    Some(pattern::join(path, ID_SEGMENT))
}
