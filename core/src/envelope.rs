//! Request and response envelopes of the A-Parser API.
//!
//! # Design
//! Every call is `{action, password, data}` POSTed to one URL and answered
//! with `{success, data, msg}`. Building and interpreting those envelopes is
//! pure, so hosts that run their own HTTP stack can use `build_request` and
//! `parse_response` directly and skip `Transport` altogether.
//!
//! The service is loose about `success`: it may be `true`, `1`, or `"1"`.
//! Truthiness follows the service's convention (see `is_truthy`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Data, Reply};

/// Message used when a failed envelope carries no usable `msg`.
pub const UNKNOWN_ERROR: &str = "unknown error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub action: Action,
    pub password: String,
    pub data: Data,
}

/// Build the POST for `action` with `data`.
pub fn build_request(
    config: &ClientConfig,
    action: Action,
    data: Data,
) -> Result<HttpRequest, ApiError> {
    let envelope = RequestEnvelope {
        action,
        password: config.password().to_string(),
        data,
    };
    let body =
        serde_json::to_string(&envelope).map_err(|e| TransportError::Encode(e.to_string()))?;
    Ok(HttpRequest {
        url: config.host().to_string(),
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body,
    })
}

/// Interpret a response: non-2xx is a transport error, a falsy `success` or
/// an unreadable body is an application error.
pub fn parse_response(response: &HttpResponse) -> Result<Reply, ApiError> {
    if !response.is_success() {
        return Err(TransportError::Status {
            status: response.status,
            body: response.body_text(),
        }
        .into());
    }

    let mut body = match serde_json::from_slice::<Value>(&response.body) {
        Ok(Value::Object(map)) => map,
        _ => return Err(ApiError::application(UNKNOWN_ERROR)),
    };

    if !body.get("success").is_some_and(is_truthy) {
        return Err(ApiError::application(failure_message(body.get("msg"))));
    }

    Ok(match body.remove("data") {
        None | Some(Value::Null) => Reply::Done,
        Some(data) => Reply::Data(data),
    })
}

fn failure_message(msg: Option<&Value>) -> String {
    match msg {
        Some(Value::String(s)) if !(s.is_empty() || s == "0") => s.clone(),
        Some(v) if !v.is_string() && is_truthy(v) => v.to_string(),
        _ => UNKNOWN_ERROR.to_string(),
    }
}

/// Loose truthiness: `null`, `false`, `0`, `""`, `"0"`, `[]` and `{}` are
/// falsy, everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
