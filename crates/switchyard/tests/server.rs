//! The hyper adapter over real sockets.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use switchyard::prelude::*;
use switchyard::server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

#[derive(Default)]
struct Health;
injectable!(Health => Singleton);

impl Component for Health {
    fn invoke(
        self: Arc<Self>,
        handler: &str,
        args: Arguments,
    ) -> BoxFuture<'static, DispatchResult<Value>> {
        match handler {
            "check" => Box::pin(async { Ok(json!({ "status": "ok" })) }),
            "region" => Box::pin(async move {
                let region = args
                    .request(0)
                    .and_then(|view| view.env().get_str("REGION").map(str::to_string));
                Ok(json!({ "region": region }))
            }),
            other => unknown_handler::<Self>(other),
        }
    }
}

impl Declare for Health {
    fn declare(d: &mut Declaration<'_, Self>) {
        d.controller("/health");
        d.get("/", "check");
        d.get("/region", "region").request();
    }
}

#[derive(Default)]
struct Chat;
injectable!(Chat => Singleton);

impl Component for Chat {
    fn invoke(
        self: Arc<Self>,
        handler: &str,
        args: Arguments,
    ) -> BoxFuture<'static, DispatchResult<Value>> {
        match handler {
            "greet" => Box::pin(async move {
                let name = args.text(0).unwrap_or("stranger");
                Ok(json!(format!("hello, {name}")))
            }),
            "sum" => Box::pin(async move {
                let numbers: Vec<i64> = args.parse(0)?;
                Ok(json!({ "sum": numbers.iter().sum::<i64>() }))
            }),
            other => unknown_handler::<Self>(other),
        }
    }
}

impl Declare for Chat {
    fn declare(d: &mut Declaration<'_, Self>) {
        d.gateway("/chat");
        d.subscribe("greet", "greet");
        d.subscribe("sum", "sum");
    }
}

async fn start() -> anyhow::Result<(SocketAddr, oneshot::Sender<()>)> {
    let mut app = App::default();
    app.register_routes::<Health>()?
        .register_gateways::<Chat>()?
        .enable_cors("*")?;

    let mut bindings = serde_json::Map::new();
    bindings.insert("REGION".to_string(), json!("eu-west"));

    let listener = server::bind("127.0.0.1:0".parse()?).await?;
    let addr = listener.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();

    tokio::spawn(server::serve_with_shutdown(
        listener,
        Arc::new(app),
        Environment::from_map(bindings),
        async move {
            let _ = stopped.await;
        },
    ));
    Ok((addr, stop))
}

async fn raw_get(addr: SocketAddr, path: &str) -> anyhow::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}

#[tokio::test]
async fn serves_http_routes() -> anyhow::Result<()> {
    let (addr, _stop) = start().await?;

    let response = raw_get(addr, "/health").await?;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("access-control-allow-origin: *"));
    assert!(response.ends_with(r#"{"status":"ok"}"#));

    let response = raw_get(addr, "/missing").await?;
    assert!(response.starts_with("HTTP/1.1 404 Not Found"));
    assert!(response.ends_with(r#"{"code":404,"error":"Not found."}"#));
    Ok(())
}

#[tokio::test]
async fn handlers_see_environment_bindings() -> anyhow::Result<()> {
    let (addr, _stop) = start().await?;

    let response = raw_get(addr, "/health/region").await?;
    assert!(response.ends_with(r#"{"region":"eu-west"}"#));
    Ok(())
}

#[tokio::test]
async fn plain_get_on_gateway_is_rejected() -> anyhow::Result<()> {
    let (addr, _stop) = start().await?;

    let response = raw_get(addr, "/chat").await?;
    assert!(response.starts_with("HTTP/1.1 502 Bad Gateway"));
    assert!(response.ends_with(r#"{"code":502,"error":"Bad request."}"#));
    Ok(())
}

#[tokio::test]
async fn gateway_replies_over_websocket() -> anyhow::Result<()> {
    let (addr, _stop) = start().await?;
    let (mut socket, response) = tokio_tungstenite::connect_async(format!("ws://{addr}/chat")).await?;
    assert_eq!(response.status(), http::StatusCode::SWITCHING_PROTOCOLS);

    socket
        .send(Message::text(r#"{"message":"greet","value":"ada"}"#))
        .await?;
    match socket.next().await {
        Some(Ok(Message::Text(text))) => assert_eq!(text.as_str(), "hello, ada"),
        other => panic!("expected a text frame, got {other:?}"),
    }

    socket.send(Message::text("not json")).await?;
    socket
        .send(Message::text(r#"{"message":"sum","value":[1,2,3]}"#))
        .await?;
    match socket.next().await {
        Some(Ok(Message::Text(text))) => {
            let reply: Value = serde_json::from_str(text.as_str())?;
            assert_eq!(reply, json!({ "sum": 6 }));
        }
        other => panic!("expected a text frame, got {other:?}"),
    }

    socket.close(None).await?;
    Ok(())
}

#[tokio::test]
async fn stops_accepting_after_shutdown() -> anyhow::Result<()> {
    let (addr, stop) = start().await?;
    assert!(raw_get(addr, "/health").await?.starts_with("HTTP/1.1 200 OK"));

    let _ = stop.send(());
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(TcpStream::connect(addr).await.is_err());
    Ok(())
}
