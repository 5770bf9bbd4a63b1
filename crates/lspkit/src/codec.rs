//! Conversion between raw message bodies and typed payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{LspError, LspResult};

/// Decode a raw params body into `P`.
///
/// An absent or `null` body decodes as `{}` first and then as `null`, so
/// empty shapes like [`crate::types::Void`] and all-optional structs accept
/// a missing body. Positional (array) params are rejected: serde would
/// otherwise bind them to struct fields by order. Any failure is reported as
/// invalid params.
pub fn decode_params<P: DeserializeOwned>(params: Option<Value>) -> LspResult<P> {
    let decoded = match params {
        Some(Value::Array(_)) => {
            return Err(LspError::InvalidParams(
                "Positional params are not supported".to_string(),
            ))
        }
        Some(value) if !value.is_null() => serde_json::from_value(value),
        _ => serde_json::from_value(Value::Object(Map::new()))
            .or_else(|_| serde_json::from_value(Value::Null)),
    };

    decoded.map_err(|e| LspError::InvalidParams(e.to_string()))
}

/// Encode a handler result; `None` yields an absent body.
pub fn encode_result<R: Serialize>(result: Option<R>) -> LspResult<Option<Value>> {
    result
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| LspError::InternalError(format!("Failed to encode result: {e}")))
}

/// Encode an outbound params payload.
pub fn encode_params<P: Serialize>(params: &P) -> LspResult<Option<Value>> {
    let value = serde_json::to_value(params)
        .map_err(|e| LspError::InternalError(format!("Failed to encode params: {e}")))?;
    Ok(Some(value))
}
