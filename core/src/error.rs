//! Error types for the A-Parser API client.
//!
//! # Design
//! Calls fail in exactly two ways. `Transport` covers everything that stops
//! the round-trip from producing a usable HTTP response: a bad endpoint, a
//! refused connection, a timeout, or a non-2xx status. `Application` covers
//! responses that arrived fine but whose envelope reports failure. Neither is
//! retried or recovered here.

use thiserror::Error;

/// Errors returned by `AParserClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered, but `success` was falsy or the body was not an
    /// envelope. Carries the server's `msg`, or `"unknown error"`.
    #[error("{message}")]
    Application { message: String },
}

impl ApiError {
    pub fn application(message: impl Into<String>) -> Self {
        ApiError::Application {
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// The server-provided message of an application error.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Application { message } => Some(message),
            ApiError::Transport(_) => None,
        }
    }
}

/// Failures below the envelope layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured host could not be used as a request URL.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// No response arrived within the timeout.
    #[error("request timed out")]
    Timeout,

    /// Connecting, sending, or reading failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request envelope could not be serialized.
    #[error("request encoding failed: {0}")]
    Encode(String),
}

/// Errors raised while resolving a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}
