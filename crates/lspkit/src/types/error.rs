//! Error types and JSON-RPC error codes for sessions and dispatch.

use serde_json::Value;

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub const JSONRPC_RESERVED_ERROR_RANGE_START: i32 = -32099;
    pub const JSONRPC_RESERVED_ERROR_RANGE_END: i32 = -32000;
}

/// Language-server protocol error codes.
pub mod lsp_error_codes {
    pub const SERVER_NOT_INITIALIZED: i32 = -32002;
    pub const UNKNOWN_ERROR_CODE: i32 = -32001;

    pub const LSP_RESERVED_ERROR_RANGE_START: i32 = -32899;
    pub const REQUEST_FAILED: i32 = -32803;
    pub const SERVER_CANCELLED: i32 = -32802;
    pub const CONTENT_MODIFIED: i32 = -32801;
    pub const REQUEST_CANCELLED: i32 = -32800;
    pub const LSP_RESERVED_ERROR_RANGE_END: i32 = -32800;

    /// Whether `code` falls in the range reserved for protocol-specific errors.
    pub fn is_reserved(code: i32) -> bool {
        (LSP_RESERVED_ERROR_RANGE_START..=LSP_RESERVED_ERROR_RANGE_END).contains(&code)
    }
}

/// All errors that can occur while dispatching or issuing calls.
#[derive(thiserror::Error, Debug)]
pub enum LspError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Server is not initialized.")]
    ServerNotInitialized,

    #[error("Unknown error: {0}")]
    UnknownErrorCode(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server cancelled the request")]
    ServerCancelled,

    #[error("Content modified")]
    ContentModified,

    #[error("Request cancelled")]
    RequestCancelled,

    /// Structured error produced by a handler or returned by the peer.
    #[error("{message}")]
    Rpc {
        code: i32,
        message: String,
        data: Option<Value>,
    },

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LspError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use lsp_error_codes::*;
        match self {
            LspError::ParseError(_) => PARSE_ERROR,
            LspError::InvalidRequest(_) => INVALID_REQUEST,
            LspError::MethodNotFound(_) => METHOD_NOT_FOUND,
            LspError::InvalidParams(_) => INVALID_PARAMS,
            LspError::InternalError(_) => INTERNAL_ERROR,
            LspError::ServerNotInitialized => SERVER_NOT_INITIALIZED,
            LspError::UnknownErrorCode(_) => UNKNOWN_ERROR_CODE,
            LspError::RequestFailed(_) => REQUEST_FAILED,
            LspError::ServerCancelled => SERVER_CANCELLED,
            LspError::ContentModified => CONTENT_MODIFIED,
            LspError::RequestCancelled => REQUEST_CANCELLED,
            LspError::Rpc { code, .. } => *code,
            LspError::ChannelClosed
            | LspError::Transport(_)
            | LspError::Io(_)
            | LspError::Json(_) => INTERNAL_ERROR,
        }
    }

    /// Build a structured error with an explicit code.
    pub fn rpc(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        LspError::Rpc {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        let data = match self {
            LspError::Rpc { data, .. } => data.clone(),
            _ => None,
        };
        JsonRpcErrorObject {
            code: self.code(),
            message: self.to_string(),
            data,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: self.to_error_object(),
        }
    }
}

impl From<JsonRpcErrorObject> for LspError {
    fn from(err: JsonRpcErrorObject) -> Self {
        LspError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

pub type LspResult<T> = Result<T, LspError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lifecycle_codes() {
        assert_eq!(LspError::ServerNotInitialized.code(), -32002);
        assert_eq!(LspError::RequestFailed("x".into()).code(), -32803);
        assert_eq!(LspError::InvalidParams("x".into()).code(), -32602);
    }

    #[test]
    fn test_rpc_error_passes_through() {
        let err = LspError::rpc(-32042, "custom failure", Some(json!({"retry": false})));
        let wire = err.to_json_rpc_error(RequestId::Number(3));
        assert_eq!(wire.error.code, -32042);
        assert_eq!(wire.error.message, "custom failure");
        assert_eq!(wire.error.data, Some(json!({"retry": false})));
    }

    #[test]
    fn test_reserved_range() {
        assert!(lsp_error_codes::is_reserved(lsp_error_codes::REQUEST_FAILED));
        assert!(lsp_error_codes::is_reserved(lsp_error_codes::REQUEST_CANCELLED));
        assert!(!lsp_error_codes::is_reserved(lsp_error_codes::SERVER_NOT_INITIALIZED));
    }
}
