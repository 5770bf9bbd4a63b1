//! Transport layer for language server communication.

pub mod framing;
pub mod stdio;

pub use stdio::StdioTransport;
