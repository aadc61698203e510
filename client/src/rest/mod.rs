//! REST plumbing.
//!
//! The SDK never talks to the network directly: every call goes through a
//! [`Transport`], which takes a method, a path and an optional JSON body and
//! returns the parsed response. [`HttpTransport`] is the `reqwest` adapter;
//! tests and hosts with their own HTTP stack supply another implementation.

mod channels;
pub mod endpoints;
mod guilds;
pub mod http;

use std::future::Future;

pub use reqwest::Method;
use serde_json::Value;

use crate::error::TransportError;

pub use http::HttpTransport;

/// Request execution primitive.
pub trait Transport: Send + Sync {
    /// Execute one request.
    ///
    /// `path` is an endpoint path such as `/channels/123`. Success yields the
    /// response body, `Value::Null` when it is empty.
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Attach an audit-log reason to a request body.
fn with_reason(body: Option<Value>, reason: Option<&str>) -> Option<Value> {
    let Some(reason) = reason else {
        return body;
    };
    let mut body = body.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    if let Value::Object(map) = &mut body {
        map.insert("reason".into(), Value::String(reason.to_owned()));
    }
    Some(body)
}
