#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use timeclock::api::HttpApi;

pub const CLOCK_IN_AT: &str = "2024-01-01T00:00:00Z";

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub content_type: Option<String>,
    pub body: Value,
}

/// In-process stand-in for the hosted script endpoint.
#[derive(Default)]
pub struct FakeScript {
    pub since: Mutex<Option<String>>,
    pub seen: Mutex<Vec<SeenRequest>>,
}

impl FakeScript {
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

async fn script(
    State(fake): State<Arc<FakeScript>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    fake.seen.lock().unwrap().push(SeenRequest {
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    let reply = match body["action"].as_str() {
        Some("login") => {
            if body["username"] == "asha" && body["password"] == "secret" {
                json!({"ok": true, "data": {"ok": true, "employeeName": "Asha Gurung"}})
            } else if body["username"] == "nameless" {
                json!({"ok": true, "data": {"ok": true}})
            } else {
                json!({"ok": true, "data": {"ok": false, "error": "Invalid credentials"}})
            }
        }
        Some("status") => match fake.since.lock().unwrap().clone() {
            Some(since) => json!({"ok": true, "data": {"state": "IN", "sinceISO": since}}),
            None => json!({"ok": true, "data": {"state": "NONE", "sinceISO": null}}),
        },
        Some("clock") => match body["event"].as_str() {
            Some("CLOCK_IN") => {
                *fake.since.lock().unwrap() = Some(CLOCK_IN_AT.to_string());
                json!({"ok": true, "data": {"ok": true}})
            }
            Some("CLOCK_OUT") if fake.since.lock().unwrap().is_some() => {
                *fake.since.lock().unwrap() = None;
                json!({"ok": true, "data": {"ok": true}})
            }
            Some("CLOCK_OUT") => {
                json!({"ok": true, "data": {"ok": false, "error": "Not clocked in"}})
            }
            _ => json!({"ok": false, "error": "Unknown event"}),
        },
        _ => json!({"ok": false, "error": "Unknown action"}),
    };
    Json(reply)
}

async fn roster() -> Json<Value> {
    Json(json!({"employees": ["Asha Gurung", "", "Bikash Rai", null]}))
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn garbled() -> &'static str {
    "<html>Sign in to continue</html>"
}

pub async fn spawn_fake() -> (SocketAddr, Arc<FakeScript>) {
    let fake = Arc::new(FakeScript::default());
    let app = Router::new()
        .route("/exec", post(script).get(roster))
        .route("/broken", post(broken).get(broken))
        .route("/garbled", post(garbled).get(garbled))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, fake)
}

pub fn client_for(addr: SocketAddr, path: &str) -> HttpApi {
    let url = format!("http://{}{}", addr, path);
    HttpApi::new(&url, &url, Duration::from_secs(5)).unwrap()
}
