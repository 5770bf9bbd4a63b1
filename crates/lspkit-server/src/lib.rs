//! Stdio language server host with text document sync.

pub mod config;
pub mod documents;
pub mod server;
pub mod transport;

pub use config::{resolve_log_filter, ServerConfig};
pub use documents::DocumentStore;
pub use server::{build_session, build_session_with, ServerState};
pub use transport::StdioTransport;
