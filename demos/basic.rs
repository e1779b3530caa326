//! weft example: a small in-memory user API.
//!
//! Run with:
//!   RUST_LOG=weft=debug,basic=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users
//!   curl http://localhost:3000/users/1
//!   curl 'http://localhost:3000/search?name=Mike'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'x-api-key: secret' -H 'content-type: application/json' \
//!        -d '{"id":4,"name":"David"}'
//!   curl -X DELETE -H 'x-api-key: secret' http://localhost:3000/users/4

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;
use weft::{Capability, Request, RequestError, Respond, Response, Router, Server, async_trait};

#[derive(Clone, Debug, Deserialize, Serialize)]
struct User {
    id: i32,
    name: String,
}

#[derive(Deserialize)]
struct Search {
    name: String,
}

type Store = Arc<Mutex<BTreeMap<i32, User>>>;

/// Writes require `x-api-key: secret`.
struct Admin;

#[async_trait]
impl Capability for Admin {
    async fn resolve(req: &mut Request, _res: &mut Response) -> Result<Self, Option<RequestError>> {
        match req.header("x-api-key") {
            Some("secret") => Ok(Admin),
            Some(_) => Err(Some(RequestError::Forbidden)),
            None => Err(Some(RequestError::Unauthorized)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), weft::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store: Store = Arc::new(Mutex::new(BTreeMap::from([
        (1, User { id: 1, name: "Mike".into() }),
        (2, User { id: 2, name: "Chris".into() }),
    ])));

    let app = Router::new()
        .mount("/", weft::middleware::from_fn(|req, _res, next| {
            Box::pin(async move {
                info!(method = %req.method(), path = req.path(), "request");
                next.run();
                Ok(())
            })
        }))
        .get_identified("/users", {
            let store = Arc::clone(&store);
            move |_: (), respond: Respond<Vec<(i32, User)>>| {
                let users: Vec<_> = snapshot(&store).into_iter().map(|u| (u.id, u)).collect();
                async move { respond.send(Ok(users)) }
            }
        })
        .get_by_id("/users", {
            let store = Arc::clone(&store);
            move |_: (), id: i32, respond: Respond<User>| {
                let found = store.lock().ok().and_then(|users| users.get(&id).cloned());
                async move { respond.send(found.ok_or(RequestError::NotFound)) }
            }
        })
        .get_with_query("/search", {
            let store = Arc::clone(&store);
            move |_: (), search: Search, respond: Respond<Vec<User>>| {
                let matches: Vec<_> = snapshot(&store).into_iter().filter(|u| u.name == search.name).collect();
                async move { respond.send(Ok(matches)) }
            }
        })
        .post_identified("/users", {
            let store = Arc::clone(&store);
            move |(_admin,): (Admin,), user: User, respond: Respond<(i32, User)>| {
                let inserted = store.lock().ok().map(|mut users| {
                    users.insert(user.id, user.clone());
                    (user.id, user)
                });
                async move { respond.send(inserted.ok_or(RequestError::InternalServerError)) }
            }
        })
        .delete_by_id("/users", {
            let store = Arc::clone(&store);
            move |(_admin,): (Admin,), id: i32, respond: Respond<()>| {
                let removed = store.lock().ok().and_then(|mut users| users.remove(&id));
                async move { respond.done(removed.is_none().then_some(RequestError::NotFound)) }
            }
        })
        .error(weft::middleware::from_fn(|req, res, next| {
            Box::pin(async move {
                if let Some(e) = res.error() {
                    info!(path = req.path(), "request failed: {e}");
                }
                next.run();
                Ok(())
            })
        }));

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

fn snapshot(store: &Store) -> Vec<User> {
    store.lock().map(|users| users.values().cloned().collect()).unwrap_or_default()
}
