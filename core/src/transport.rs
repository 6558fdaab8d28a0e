//! Executing an `HttpRequest` against the network.
//!
//! `Transport` is the seam between the envelope logic and real I/O. The
//! client ships with `UreqTransport`, a blocking implementation; tests and
//! hosts with their own HTTP stack can plug in anything else.

use std::io;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs one HTTP round-trip. Implementations must not retry.
///
/// Non-2xx responses are returned as data; `envelope::parse_response`
/// decides what they mean.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        request: &HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        (**self).send(request, timeout)
    }
}

/// Blocking transport built on `ureq`.
///
/// A fresh agent is configured per call so each call carries its own
/// timeout; the struct itself holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: &HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .new_agent();

        let mut builder = agent.post(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(|e| map_error(&request.url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        // Replies to bulk parses and task configs can be large; no cap.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| map_error(&request.url, e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(endpoint: &str, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => TransportError::Timeout,
        ureq::Error::BadUri(reason) => TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        },
        ureq::Error::Http(e) => TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        },
        other => TransportError::Connection(other.to_string()),
    }
}
