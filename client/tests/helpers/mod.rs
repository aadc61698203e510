//! Reusable test helpers for client integration tests.
//!
//! Provides [`MockTransport`], which records every request and replays
//! queued responses, plus payload builders for common entities.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{json, Value};
use tessera_client::{Client, ClientConfig, Method, Transport, TransportError};

/// A request as seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Transport that records requests and answers from a queue.
///
/// An empty queue answers `Value::Null`, like a 204.
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
}

impl MockTransport {
    pub fn respond(&self, body: Value) {
        self.responses.lock().unwrap().push_back(Ok(body));
    }

    pub fn fail(&self, status: u16, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Status {
                status,
                message: message.into(),
            }));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for MockTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: path.to_owned(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

/// Client over a fresh [`MockTransport`].
pub fn mock_client() -> Client<MockTransport> {
    Client::with_transport(ClientConfig::default_for_test(), MockTransport::default())
}

pub const GUILD_ID: &str = "100";

/// Guild text channel payload.
pub fn text_channel(id: &str, overwrites: Value) -> Value {
    json!({
        "id": id,
        "type": 0,
        "guild_id": GUILD_ID,
        "name": "general",
        "topic": "chat",
        "position": 1,
        "nsfw": false,
        "rate_limit_per_user": 0,
        "permission_overwrites": overwrites
    })
}

pub fn user(id: &str) -> Value {
    json!({ "id": id, "username": format!("user{id}") })
}

pub fn message(id: &str, channel_id: &str, content: &str) -> Value {
    json!({
        "id": id,
        "channel_id": channel_id,
        "author": user("1"),
        "content": content,
        "timestamp": "2021-01-01T00:00:00+00:00"
    })
}

/// Guild owned by user 1 whose default role grants `everyone`.
pub fn guild(everyone: &str, roles: Value) -> Value {
    let mut all_roles = vec![json!({
        "id": GUILD_ID,
        "name": "@everyone",
        "permissions": everyone,
        "position": 0
    })];
    if let Value::Array(extra) = roles {
        all_roles.extend(extra);
    }
    json!({
        "id": GUILD_ID,
        "name": "Test Guild",
        "owner_id": "1",
        "roles": all_roles
    })
}

pub fn member(user_id: &str, roles: &[&str]) -> Value {
    json!({ "user": user(user_id), "roles": roles })
}
