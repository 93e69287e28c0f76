//! A scripted Krist node for integration tests.
//!
//! `POST /ws/start` hands out `ws://.../ws`; the socket sends a `hello`,
//! answers the bootstrap commands and lets the test push frames or close
//! the connection.
#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::{get, post},
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

pub const OWNER: &str = "kowner0000";
pub const PRIVATE_KEY: &str = "test-private-key";

pub enum Push {
    Frame(Value),
    Close,
}

#[derive(Clone, Default)]
pub struct MockNode {
    pub base_url: String,
    pub connections: Arc<AtomicUsize>,
    pub handshakes: Arc<AtomicUsize>,
    pushers: Arc<Mutex<Vec<mpsc::UnboundedSender<Push>>>>,
    commands: Arc<Mutex<Vec<Value>>>,
    /// When set, `address` commands are never answered.
    pub hang_address: Arc<AtomicBool>,
    /// When set, `/ws/start` hands out a URL nothing listens on.
    pub broken_socket: Arc<AtomicBool>,
    /// Replaces the default `hello` frame for new connections.
    hello: Arc<Mutex<Option<Value>>>,
    /// When set, `/ws/start` answers with only a `url` field.
    pub bare_start_reply: Arc<AtomicBool>,
}

impl MockNode {
    pub async fn start() -> MockNode {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let node = MockNode {
            base_url: format!("http://{addr}"),
            ..Default::default()
        };

        let app = Router::new()
            .route("/ws/start", post(start_session))
            .route("/ws", get(upgrade))
            .with_state(node.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        node
    }

    pub fn set_hello(&self, frame: Value) {
        *self.hello.lock().unwrap() = Some(frame);
    }

    /// Pushes a frame to the most recent connection.
    pub fn push(&self, frame: Value) {
        if let Some(pusher) = self.pushers.lock().unwrap().last() {
            let _ = pusher.send(Push::Frame(frame));
        }
    }

    /// Closes the most recent connection from the server side.
    pub fn close_latest(&self) {
        if let Some(pusher) = self.pushers.lock().unwrap().last() {
            let _ = pusher.send(Push::Close);
        }
    }

    pub fn commands_of_type(&self, kind: &str) -> Vec<Value> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|command| command["type"] == kind)
            .cloned()
            .collect()
    }

    /// Waits until `connections` reaches `count`, up to two seconds.
    pub async fn wait_for_connections(&self, count: usize) {
        for _ in 0..200 {
            if self.connections.load(Ordering::SeqCst) >= count {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("node never saw {count} connections");
    }

    /// Waits until at least `count` commands of `kind` arrived.
    pub async fn wait_for_commands(&self, kind: &str, count: usize) {
        for _ in 0..200 {
            if self.commands_of_type(kind).len() >= count {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("node never saw {count} `{kind}` commands");
    }

    async fn serve(self, socket: WebSocket, authed: bool) {
        self.connections.fetch_add(1, Ordering::SeqCst);

        let (push_tx, mut push_rx) = mpsc::unbounded_channel();
        self.pushers.lock().unwrap().push(push_tx);

        let hello = self.hello.lock().unwrap().clone().unwrap_or_else(hello_frame);
        let (mut sink, mut stream) = socket.split();
        if sink.send(text(&hello)).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                push = push_rx.recv() => match push {
                    Some(Push::Frame(frame)) => {
                        if sink.send(text(&frame)).await.is_err() {
                            break;
                        }
                    }
                    Some(Push::Close) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                },
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(body))) => {
                        let command: Value = serde_json::from_str(body.as_str()).unwrap();
                        self.commands.lock().unwrap().push(command.clone());

                        if let Some(reply) = self.reply_to(&command, authed) {
                            if sink.send(text(&reply)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    fn reply_to(&self, command: &Value, authed: bool) -> Option<Value> {
        let id = command["id"].clone();

        let reply = match command["type"].as_str()? {
            "me" if authed => json!({
                "ok": true,
                "isGuest": false,
                "address": {"address": OWNER, "balance": 1000, "totalin": 1200, "totalout": 200}
            }),
            "me" => json!({"ok": true, "isGuest": true}),
            "login" if command["privatekey"] == PRIVATE_KEY => json!({
                "ok": true,
                "isGuest": false,
                "address": {"address": OWNER, "balance": 1000}
            }),
            "login" => json!({"ok": false, "error": "auth_failed"}),
            "logout" => json!({"ok": true, "isGuest": true}),
            "stake" => json!({
                "ok": true,
                "stake": {"owner": command["address"], "stake": 75, "active": true}
            }),
            "address" if self.hang_address.load(Ordering::SeqCst) => return None,
            "address" => json!({
                "ok": true,
                "address": {"address": command["address"], "balance": 12}
            }),
            "unsubscribe" if command["event"] == "ownStake" && !authed => {
                json!({"ok": false, "error": "invalid_parameter", "parameter": "event"})
            }
            "unsubscribe" => json!({"ok": true, "subscription_level": ["ownTransactions"]}),
            "subscribe" if command["event"] == "everything" => {
                json!({"ok": false, "error": "invalid_parameter", "parameter": "event"})
            }
            "subscribe" => json!({
                "ok": true,
                "subscription_level": [command["event"].clone()]
            }),
            "make_transaction" => json!({
                "ok": true,
                "transaction": {
                    "id": 501,
                    "from": OWNER,
                    "to": command["to"],
                    "value": command["amount"],
                    "time": "2024-05-01T10:00:00.000Z",
                    "name": null,
                    "metadata": command.get("metadata").cloned().unwrap_or(Value::Null),
                    "type": "transfer"
                }
            }),
            "submit_block" => json!({"ok": true, "success": false, "error": "solution_incorrect"}),
            _ => json!({"ok": false, "error": "unknown_type"}),
        };

        let mut reply = reply;
        reply["id"] = id;
        Some(reply)
    }
}

fn text(frame: &Value) -> Message {
    Message::Text(frame.to_string().into())
}

pub fn hello_frame() -> Value {
    json!({
        "ok": true,
        "type": "hello",
        "server_time": "2024-05-01T10:00:00.000Z",
        "motd": "Welcome to the test node",
        "last_block": {
            "height": 1200,
            "address": "kminer0000",
            "hash": "00000000a1b2c3d4e5f6",
            "short_hash": "00000000a1b2",
            "value": 25,
            "time": "2024-05-01T09:59:00.000Z",
            "difficulty": 400000
        },
        "work": 380000,
        "currency": {
            "address_prefix": "k",
            "name_suffix": "kst",
            "currency_name": "Krist",
            "currency_symbol": "KST"
        }
    })
}

async fn start_session(State(node): State<MockNode>, body: Bytes) -> Json<Value> {
    node.handshakes.fetch_add(1, Ordering::SeqCst);

    if node.broken_socket.load(Ordering::SeqCst) {
        return Json(json!({"ok": true, "url": "ws://127.0.0.1:1/ws", "expires": 30}));
    }

    let authed = serde_json::from_slice::<Value>(&body)
        .ok()
        .is_some_and(|body| body["privatekey"] == PRIVATE_KEY);
    let session = if authed { "authed" } else { "guest" };
    let ws_base = node.base_url.replacen("http://", "ws://", 1);

    let url = format!("{ws_base}/ws?session={session}");

    if node.bare_start_reply.load(Ordering::SeqCst) {
        return Json(json!({ "url": url }));
    }

    Json(json!({
        "ok": true,
        "url": url,
        "expires": 30
    }))
}

async fn upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
    State(node): State<MockNode>,
) -> Response {
    let authed = query.get("session").is_some_and(|session| session == "authed");
    ws.on_upgrade(move |socket| node.serve(socket, authed))
}
