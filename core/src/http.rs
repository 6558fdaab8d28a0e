//! HTTP exchange types for the host-does-IO pattern.
//!
//! # Design
//! The envelope layer builds an `HttpRequest` and parses an `HttpResponse`
//! without touching the network. A `Transport` (or a host that does its own
//! I/O) turns one into the other. The A-Parser API only ever takes a JSON
//! POST to a single URL, so there is no method or path here.

/// A POST request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`, then
/// passed to `envelope::parse_response`. The body is kept as raw bytes;
/// whether it decodes is for the envelope layer to judge.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
