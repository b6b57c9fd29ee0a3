//! HTTP server for librelog.
//!
//! Routes, authentication middleware and the WebSocket ingest transport.
//! Enabled by the `http-server` feature.

mod auth;
mod config;
mod error;
mod handlers;
mod http;
mod ingest;
mod metrics;
mod middleware;
mod request;
mod response;

pub use config::{CliArgs, Command, DEFAULT_MAX_MESSAGE_BYTES, LogServerConfig, load_config};
pub use error::ApiError;
pub use handlers::AppState;
pub use http::{LogServer, build_router};
pub use metrics::Metrics;
