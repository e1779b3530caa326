use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use weft::{RequestError, Respond, Router, Server};

#[derive(Deserialize, Serialize)]
struct User {
    id: i32,
    name: String,
}

fn app() -> Router {
    Router::new()
        .get_by_id("/users", |_: (), id: i32, respond: Respond<User>| async move {
            match id {
                1 => respond.send(Ok(User { id, name: "Mike".into() })),
                _ => respond.send(Err(RequestError::NotFound)),
            }
        })
        .post_typed("/users", |_: (), user: User, respond: Respond<User>| async move {
            respond.send(Ok(user));
        })
}

async fn start() -> (SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<Result<(), weft::Error>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = Server::from_listener(listener);
    let handle = tokio::spawn(server.serve_with_shutdown(app(), async move {
        let _ = stopped.await;
    }));
    (addr, stop, handle)
}

async fn exchange(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn serves_typed_routes_over_tcp() {
    let (addr, stop, handle) = start().await;

    let found = exchange(addr, "GET /users/1 HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(found.starts_with("HTTP/1.1 200 OK"), "{found}");
    assert!(found.ends_with(r#"{"id":1,"name":"Mike"}"#), "{found}");

    let missing = exchange(addr, "GET /users/9 HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(missing.starts_with("HTTP/1.1 404 Not Found"), "{missing}");

    let body = r#"{"id":4,"name":"David"}"#;
    let created = exchange(
        addr,
        &format!(
            "POST /users HTTP/1.1\r\nhost: test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(created.starts_with("HTTP/1.1 201 Created"), "{created}");
    assert!(created.ends_with(body), "{created}");

    stop.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn unknown_path_is_404() {
    let (addr, stop, handle) = start().await;

    let res = exchange(addr, "GET /nope HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 404 Not Found"), "{res}");

    stop.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[test]
fn bind_rejects_bad_addresses() {
    assert!(matches!(Server::bind("localhost"), Err(weft::Error::Address(_))));
}
