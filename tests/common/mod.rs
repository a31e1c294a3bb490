#![allow(dead_code)]

use std::{
    net::{SocketAddr, TcpListener},
    time::Duration,
};

use actix::{Actor, Context, Handler, Recipient};
use actix_web::{dev::ServerHandle, web, App, HttpServer};
use async_tungstenite::tungstenite::{self, Message};
use futures::{SinkExt, StreamExt};
use revolt_server::{
    env::Settings, instance::snapshot::ClientStateBroadcast, protocol::ServerMessage, server,
    AppState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;

pub const TIMEOUT: Duration = Duration::from_secs(5);

// --- client inbox ---------------------------------------------------------

/// Stands in for a client connection: everything an instance sends to it
/// ends up on the channel.
pub struct Inbox {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl Actor for Inbox {
    type Context = Context<Self>;
}

impl Handler<ServerMessage> for Inbox {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _ctx: &mut Context<Self>) {
        let _ = self.tx.send(msg);
    }
}

pub struct InboxRx {
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

pub fn inbox() -> (Recipient<ServerMessage>, InboxRx) {
    let (tx, rx) = mpsc::unbounded_channel();
    let addr = Inbox { tx }.start();
    (addr.recipient(), InboxRx { rx })
}

impl InboxRx {
    pub async fn recv(&mut self) -> ServerMessage {
        match tokio::time::timeout(TIMEOUT, self.rx.recv()).await {
            Ok(Some(msg)) => msg,
            Ok(None) => panic!("inbox channel closed"),
            Err(_) => panic!("no message within {:?}", TIMEOUT),
        }
    }

    pub async fn state(&mut self) -> ClientStateBroadcast {
        match self.recv().await {
            ServerMessage::State(view) => *view,
            other => panic!("expected state, got {:?}", other),
        }
    }

    pub async fn error(&mut self) -> (revolt_server::protocol::ErrorCode, String) {
        match self.recv().await {
            ServerMessage::Error { code, message } => (code, message),
            other => panic!("expected error, got {:?}", other),
        }
    }

    pub fn is_empty(&mut self) -> bool {
        self.rx.try_recv().is_err()
    }
}

// --- HTTP / WebSocket ----------------------------------------------------

pub fn test_settings() -> Settings {
    Settings::default()
}

pub async fn spawn_server() -> (SocketAddr, AppState, ServerHandle) {
    let app_state = AppState::new(test_settings());
    let state = app_state.clone();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(server::configure)
    })
    .workers(1)
    .listen(listener)
    .unwrap()
    .run();

    let handle = server.handle();
    tokio::spawn(server);

    (addr, app_state, handle)
}

type WsStream = async_tungstenite::WebSocketStream<
    async_tungstenite::tokio::TokioAdapter<tokio::net::TcpStream>,
>;

pub struct WebSocketTest {
    pub stream: futures_util::stream::SplitStream<WsStream>,
    pub sink: futures_util::stream::SplitSink<WsStream, Message>,
}

impl WebSocketTest {
    pub async fn connect(addr: SocketAddr) -> Result<Self, tungstenite::Error> {
        let url = format!("ws://{}/ws/", addr);
        let (ws_stream, response) = async_tungstenite::tokio::connect_async(url).await?;

        assert_eq!(
            response.status(),
            tungstenite::http::StatusCode::SWITCHING_PROTOCOLS
        );

        let (sink, stream) = ws_stream.split();
        Ok(Self { stream, sink })
    }

    pub async fn send_json(&mut self, value: Value) {
        self.sink
            .send(Message::Text(value.to_string()))
            .await
            .expect("send frame");
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.sink
            .send(Message::Text(text.to_string()))
            .await
            .expect("send frame");
    }

    pub async fn close(&mut self) -> Result<(), tungstenite::Error> {
        info!("[TEST_WS] Sending Close frame to server.");
        self.sink.send(Message::Close(None)).await?;
        self.sink.close().await
    }

    /// Waits for the next server message accepted by `extractor`, skipping the rest.
    pub async fn expect_message<F, R>(&mut self, mut extractor: F) -> R
    where
        F: FnMut(ServerMessage) -> Option<R>,
    {
        let callback = async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        info!("[TEST] Received message: {}", text);
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(parsed) => {
                                if let Some(result) = extractor(parsed) {
                                    return result;
                                }
                            }
                            Err(e) => panic!("unparseable server frame {}: {}", text, e),
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(reason))) => {
                        panic!("WebSocket closed unexpectedly. Reason: {:?}", reason);
                    }
                    Some(Ok(msg)) => {
                        info!("[TEST] Ignoring other message type: {:?}", msg);
                    }
                    Some(Err(e)) => panic!("WebSocket error: {:?}", e),
                    None => panic!("WebSocket closed unexpectedly"),
                }
            }
        };

        match tokio::time::timeout(TIMEOUT, callback).await {
            Ok(result) => result,
            Err(_) => panic!("Expected message timeout after {:?}", TIMEOUT),
        }
    }

    pub async fn expect_state(&mut self) -> ClientStateBroadcast {
        self.expect_message(|msg| match msg {
            ServerMessage::State(view) => Some(*view),
            _ => None,
        })
        .await
    }
}
