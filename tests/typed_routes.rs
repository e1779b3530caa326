use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use weft::{Capability, Rejection, Request, RequestError, Respond, Response, Router, async_trait};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct User {
    id: i32,
    name: String,
}

#[derive(Deserialize)]
struct ByName {
    name: String,
}

fn mike() -> User {
    User { id: 1, name: "Mike".into() }
}

async fn send(router: &Router, req: Request) -> Response {
    router.handle(req).await
}

// ── Parameter shapes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn post_echoes_body_with_201() {
    let router = Router::new().post_typed("/users", |_: (), user: User, respond: Respond<User>| async move {
        respond.send(Ok(user));
    });

    let res = send(&router, Request::new(Method::POST, "/users").with_body(r#"{"id":4,"name":"David"}"#)).await;

    assert_eq!(res.status(), Some(StatusCode::CREATED));
    assert_eq!(res.headers()["content-type"], "application/json");
    let user: User = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(user, User { id: 4, name: "David".into() });
}

#[tokio::test]
async fn malformed_body_is_400_and_handler_never_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let router = Router::new().post_typed("/users", move |_: (), user: User, respond: Respond<User>| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { respond.send(Ok(user)) }
    });

    let res = send(&router, Request::new(Method::POST, "/users").with_body("{\"id\":")).await;

    assert_eq!(res.status(), Some(StatusCode::BAD_REQUEST));
    assert!(res.body().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn get_by_id_parses_the_identifier() {
    let router = Router::new().get_by_id("/users", |_: (), id: i32, respond: Respond<User>| async move {
        match id {
            1 => respond.send(Ok(mike())),
            _ => respond.send(Err(RequestError::NotFound)),
        }
    });

    let res = send(&router, Request::new(Method::GET, "/users/1")).await;
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#"{"id":1,"name":"Mike"}"#);

    let res = send(&router, Request::new(Method::GET, "/users/2")).await;
    assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));
    assert!(res.body().is_empty());

    let res = send(&router, Request::new(Method::GET, "/users/abc")).await;
    assert_eq!(res.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn identifier_route_on_parameterized_path_is_dropped() {
    let router = Router::new().get_by_id("/users/:uid/posts", |_: (), _id: i32, respond: Respond<User>| async move {
        respond.send(Ok(mike()));
    });

    let res = send(&router, Request::new(Method::GET, "/users/1/posts/1")).await;
    assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn query_struct_is_decoded_or_rejected() {
    let router = Router::new().get_with_query("/users", |_: (), q: ByName, respond: Respond<Vec<User>>| async move {
        let found: Vec<User> = [mike()].into_iter().filter(|u| u.name == q.name).collect();
        respond.send(Ok(found));
    });

    let res = send(&router, Request::new(Method::GET, "/users?name=Mike")).await;
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#"[{"id":1,"name":"Mike"}]"#);

    let res = send(&router, Request::new(Method::GET, "/users")).await;
    assert_eq!(res.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn put_by_id_gets_identifier_and_body() {
    let router = Router::new().put_by_id("/users", |_: (), id: i32, mut user: User, respond: Respond<User>| async move {
        user.id = id;
        respond.send(Ok(user));
    });

    let res = send(&router, Request::new(Method::PUT, "/users/7").with_body(r#"{"id":0,"name":"Ann"}"#)).await;

    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#"{"id":7,"name":"Ann"}"#);
}

// ── Output shapes ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn identified_list_is_an_array_of_single_key_objects() {
    let router = Router::new().get_identified("/users", |_: (), respond: Respond<Vec<(i32, User)>>| async move {
        respond.send(Ok(vec![(1, mike())]));
    });

    let res = send(&router, Request::new(Method::GET, "/users")).await;

    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#"[{"1":{"id":1,"name":"Mike"}}]"#);
}

#[tokio::test]
async fn post_identified_sets_location() {
    let router = Router::new().post_identified("/users", |_: (), user: User, respond: Respond<(i32, User)>| async move {
        respond.send(Ok((user.id, user)));
    });

    let res = send(&router, Request::new(Method::POST, "/users").with_body(r#"{"id":4,"name":"David"}"#)).await;

    assert_eq!(res.status(), Some(StatusCode::CREATED));
    assert_eq!(res.headers()["location"], "4");
}

#[tokio::test]
async fn delete_reporting_nothing_is_200_with_empty_body() {
    let router = Router::new()
        .delete_typed("/users", |_: (), respond: Respond<()>| async move { respond.done(None) })
        .delete_by_id("/users", |_: (), _id: i32, respond: Respond<()>| async move {
            respond.done(Some(RequestError::Conflict));
        });

    let res = send(&router, Request::new(Method::DELETE, "/users")).await;
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert!(res.body().is_empty());

    let res = send(&router, Request::new(Method::DELETE, "/users/3")).await;
    assert_eq!(res.status(), Some(StatusCode::CONFLICT));
}

// ── Reporting ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_the_first_report_counts() {
    let router = Router::new().get_typed("/users", |_: (), respond: Respond<User>| async move {
        respond.send(Ok(mike()));
        respond.send(Err(RequestError::Forbidden));
        respond.complete(None, Some(RequestError::Gone));
    });

    let res = send(&router, Request::new(Method::GET, "/users")).await;

    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#"{"id":1,"name":"Mike"}"#);
}

#[tokio::test]
async fn report_from_another_task_is_awaited() {
    let router = Router::new().get_typed("/users", |_: (), respond: Respond<User>| async move {
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            respond.send(Ok(mike()));
        });
    });

    let res = send(&router, Request::new(Method::GET, "/users")).await;

    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#"{"id":1,"name":"Mike"}"#);
}

#[tokio::test]
async fn handler_that_never_reports_is_500() {
    let router = Router::new().get_typed("/users", |_: (), respond: Respond<User>| async move { drop(respond) });

    let res = send(&router, Request::new(Method::GET, "/users")).await;

    assert_eq!(res.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

// ── Capabilities ──────────────────────────────────────────────────────────────

static LATE_CALLS: AtomicUsize = AtomicUsize::new(0);

struct Session(String);
struct Owner;
struct Late;

#[async_trait]
impl Capability for Session {
    async fn resolve(req: &mut Request, _res: &mut Response) -> Result<Self, Option<RequestError>> {
        req.header("x-session").map(|s| Session(s.to_owned())).ok_or(Some(RequestError::Unauthorized))
    }
}

#[async_trait]
impl Capability for Owner {
    async fn resolve(_req: &mut Request, _res: &mut Response) -> Result<Self, Option<RequestError>> {
        tokio::task::yield_now().await;
        Err(Some(RequestError::NotFound))
    }
}

#[async_trait]
impl Capability for Late {
    async fn resolve(_req: &mut Request, _res: &mut Response) -> Result<Self, Option<RequestError>> {
        LATE_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(Late)
    }
}

#[tokio::test]
async fn capabilities_are_handed_to_the_handler() {
    let router = Router::new().get_typed("/me", |(session,): (Session,), respond: Respond<String>| async move {
        respond.send(Ok(session.0));
    });

    let res = send(&router, Request::new(Method::GET, "/me").with_header("x-session", "abc")).await;
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#""abc""#);

    let res = send(&router, Request::new(Method::GET, "/me")).await;
    assert_eq!(res.status(), Some(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn second_capability_failure_blocks_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let router = Router::new().get_typed("/items", move |_: (Session, Owner), respond: Respond<String>| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { respond.send(Ok("never".into())) }
    });

    let res = send(&router, Request::new(Method::GET, "/items").with_header("x-session", "abc")).await;

    assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));
    assert!(res.body().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn capabilities_after_a_failure_are_never_resolved() {
    let router = Router::new().get_typed("/items", |_: (Session, Owner, Late), respond: Respond<String>| async move {
        respond.send(Ok("never".into()));
    });

    let res = send(&router, Request::new(Method::GET, "/items").with_header("x-session", "abc")).await;

    assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(LATE_CALLS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn later_elements_still_run_after_a_refusal() {
    let router = Router::new()
        .get_typed("/me", |(session,): (Session,), respond: Respond<String>| async move {
            respond.send(Ok(session.0));
        })
        .all("/me", |req, res, next| {
            Box::pin(async move {
                let refused_by = req.extensions().get::<Rejection>().map(|r| r.capability.clone()).unwrap_or_default();
                res.set_header("x-refused-by", &refused_by);
                next.run();
                Ok(())
            })
        });

    let res = send(&router, Request::new(Method::GET, "/me")).await;

    assert_eq!(res.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(res.error().is_none());
    assert_eq!(res.headers()["x-refused-by"], Session::describe());
}

struct Tenant(String);
struct Clock(u64);

#[async_trait]
impl Capability for Tenant {
    async fn resolve(req: &mut Request, _res: &mut Response) -> Result<Self, Option<RequestError>> {
        Ok(Tenant(req.header("x-tenant").unwrap_or("default").to_owned()))
    }
}

#[async_trait]
impl Capability for Clock {
    async fn resolve(_req: &mut Request, _res: &mut Response) -> Result<Self, Option<RequestError>> {
        tokio::task::yield_now().await;
        Ok(Clock(1_700_000_000))
    }
}

#[tokio::test]
async fn three_capabilities_are_all_handed_over() {
    let router = Router::new().get_typed(
        "/whoami",
        |(session, tenant, clock): (Session, Tenant, Clock), respond: Respond<String>| async move {
            respond.send(Ok(format!("{}@{}:{}", session.0, tenant.0, clock.0)));
        },
    );

    let req = Request::new(Method::GET, "/whoami").with_header("x-session", "abc").with_header("x-tenant", "acme");
    let res = send(&router, req).await;

    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#""abc@acme:1700000000""#);
}

// ── Request lifetime ──────────────────────────────────────────────────────────

#[tokio::test]
async fn response_is_sent_once_the_handler_reports() {
    let gate = Arc::new(Notify::new());
    let finished = Arc::new(Notify::new());
    let (gate_in, finished_in) = (Arc::clone(&gate), Arc::clone(&finished));
    let router = Router::new().get_typed("/users", move |_: (), respond: Respond<User>| {
        let (gate, finished) = (Arc::clone(&gate_in), Arc::clone(&finished_in));
        async move {
            respond.send(Ok(mike()));
            gate.notified().await;
            finished.notify_one();
        }
    });

    let res = tokio::time::timeout(Duration::from_secs(1), send(&router, Request::new(Method::GET, "/users")))
        .await
        .expect("answered while the handler was still running");
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#"{"id":1,"name":"Mike"}"#);

    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(1), finished.notified())
        .await
        .expect("handler finished its remaining work");
}

// ── Remaining shapes ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct UserPatch {
    name: Option<String>,
}

#[tokio::test]
async fn patch_by_id_merges_the_partial_body() {
    let router = Router::new().patch_by_id("/users", |_: (), id: i32, patch: UserPatch, respond: Respond<User>| async move {
        if id != 1 {
            return respond.send(Err(RequestError::NotFound));
        }
        let mut user = mike();
        if let Some(name) = patch.name {
            user.name = name;
        }
        respond.send(Ok(user));
    });

    let res = send(&router, Request::new(Method::PATCH, "/users/1").with_body(r#"{"name":"Michael"}"#)).await;
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert_eq!(res.body(), br#"{"id":1,"name":"Michael"}"#);

    let res = send(&router, Request::new(Method::PATCH, "/users/1").with_body("{}")).await;
    assert_eq!(res.body(), br#"{"id":1,"name":"Mike"}"#);

    let res = send(&router, Request::new(Method::PATCH, "/users/9").with_body("{}")).await;
    assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn delete_with_query_selects_what_to_remove() {
    let router = Router::new().delete_with_query("/users", |_: (), q: ByName, respond: Respond<()>| async move {
        respond.done((q.name != "Mike").then_some(RequestError::NotFound));
    });

    let res = send(&router, Request::new(Method::DELETE, "/users?name=Mike")).await;
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert!(res.body().is_empty());

    let res = send(&router, Request::new(Method::DELETE, "/users?name=Chris")).await;
    assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));

    let res = send(&router, Request::new(Method::DELETE, "/users?nom=Mike")).await;
    assert_eq!(res.status(), Some(StatusCode::BAD_REQUEST));

    let res = send(&router, Request::new(Method::DELETE, "/users")).await;
    assert_eq!(res.status(), Some(StatusCode::BAD_REQUEST));
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct Team {
    name: String,
    lead: Option<User>,
    members: Vec<User>,
    budget: Option<f64>,
}

#[tokio::test]
async fn nested_values_come_back_as_sent() {
    let router = Router::new().post_typed("/teams", |_: (), team: Team, respond: Respond<Team>| async move {
        respond.send(Ok(team));
    });
    let team = Team {
        name: "core".into(),
        lead: Some(mike()),
        members: vec![mike(), User { id: 2, name: "Chris \"CJ\" Jones".into() }],
        budget: None,
    };

    let body = serde_json::to_string(&team).unwrap();
    let res = send(&router, Request::new(Method::POST, "/teams").with_body(body)).await;

    assert_eq!(res.status(), Some(StatusCode::CREATED));
    let echoed: Team = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(echoed, team);
}
