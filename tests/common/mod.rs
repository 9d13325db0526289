//! In-process stand-in for QuestDB's HTTP server.
//!
//! Serves `/exec` and `/write` on an ephemeral port and records every request
//! so tests can assert on exactly what the client sent.

#![allow(dead_code)]

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use questdb_mcp_server::config::ConnectionDescriptor;
use questdb_mcp_server::db::QuestDbClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub params: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::new(StatusCode::OK, value.to_string())
    }
}

#[derive(Default)]
struct FakeState {
    requests: Mutex<Vec<Recorded>>,
    exec_replies: Mutex<Vec<Reply>>,
    write_replies: Mutex<Vec<Reply>>,
}

impl FakeState {
    fn record(&self, recorded: Recorded) {
        self.requests.lock().unwrap().push(recorded);
    }

    /// Pop the next scripted reply; the last one repeats.
    fn next_reply(queue: &Mutex<Vec<Reply>>, fallback: Reply) -> Reply {
        let mut queue = queue.lock().unwrap();
        match queue.len() {
            0 => fallback,
            1 => queue[0].clone(),
            _ => queue.remove(0),
        }
    }
}

pub struct FakeQuestDb {
    pub port: u16,
    state: Arc<FakeState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl FakeQuestDb {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());

        let app = Router::new()
            .route("/exec", get(exec_handler))
            .route("/write", post(write_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local_addr").port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move { server.await });

        Self {
            port,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::new("127.0.0.1", self.port)
    }

    pub fn client(&self) -> QuestDbClient {
        QuestDbClient::new(self.descriptor()).expect("client")
    }

    pub fn reply_exec(&self, reply: Reply) {
        self.state.exec_replies.lock().unwrap().push(reply);
    }

    pub fn reply_write(&self, reply: Reply) {
        self.state.write_replies.lock().unwrap().push(reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Drop for FakeQuestDb {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn exec_handler(
    State(state): State<Arc<FakeState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    state.record(Recorded {
        path: "/exec".to_string(),
        params,
        authorization: authorization(&headers),
        body: String::new(),
    });
    let reply = FakeState::next_reply(
        &state.exec_replies,
        Reply::json(serde_json::json!({"query": "", "columns": [], "dataset": [], "count": 0})),
    );
    (reply.status, reply.body)
}

async fn write_handler(
    State(state): State<Arc<FakeState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.record(Recorded {
        path: "/write".to_string(),
        params,
        authorization: authorization(&headers),
        body,
    });
    let reply = FakeState::next_reply(
        &state.write_replies,
        Reply::new(StatusCode::NO_CONTENT, ""),
    );
    (reply.status, reply.body)
}
