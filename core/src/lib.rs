//! Synchronous client for the A-Parser HTTP API.
//!
//! # Overview
//! Every operation is a JSON POST of `{action, password, data}` to a single
//! endpoint, answered with `{success, data, msg}`. `AParserClient` offers one
//! dispatch primitive (`call`) and a thin typed method per action.
//!
//! # Design
//! - `AParserClient` holds only an immutable `ClientConfig` and a
//!   `Transport`; it is safe to share between threads.
//! - Envelope building and interpretation (`envelope`) never touch the
//!   network, so hosts can bring their own HTTP stack.
//! - One attempt per call. Transport failures and application failures are
//!   distinct `ApiError` variants and are never retried.
//! - A successful call yields `Reply::Data` or, when the service sent no
//!   payload, `Reply::Done`.

pub mod action;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use action::Action;
pub use client::AParserClient;
pub use config::{CallTimeout, ClientConfig};
pub use error::{ApiError, ConfigError, TransportError};
pub use http::{HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    task_defaults, AddTask, BulkRequest, Data, MoveDirection, OneRequest, ParserOption, Reply,
    TaskStatus, TaskUid,
};
