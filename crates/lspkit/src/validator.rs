//! JSON-RPC envelope validation.

use crate::types::{JsonRpcNotification, JsonRpcRequest, LspError, LspResult, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> LspResult<()> {
    validate_envelope(&request.jsonrpc, &request.method)
}

/// Validate that a JSON-RPC notification is well-formed.
pub fn validate_notification(notification: &JsonRpcNotification) -> LspResult<()> {
    validate_envelope(&notification.jsonrpc, &notification.method)
}

fn validate_envelope(jsonrpc: &str, method: &str) -> LspResult<()> {
    if jsonrpc != JSONRPC_VERSION {
        return Err(LspError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{jsonrpc}\""
        )));
    }

    if method.is_empty() {
        return Err(LspError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    Ok(())
}
