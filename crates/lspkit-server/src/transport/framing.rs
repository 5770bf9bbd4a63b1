//! Content-Length message framing.
//!
//! Each message is a header block of `Name: value\r\n` lines, an empty
//! `\r\n` line, then exactly `Content-Length` bytes of JSON.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use lspkit::headers::CONTENT_LENGTH;
use lspkit::types::JsonRpcMessage;
use lspkit::{HeaderSet, LspError, LspResult};

/// Upper bound on a single message body.
pub const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

/// One framed message as read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub headers: HeaderSet,
    pub body: Vec<u8>,
}

/// Read the next frame. Returns `Ok(None)` on a clean EOF between frames.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> LspResult<Option<Frame>> {
    let mut headers = HeaderSet::new();
    let mut line = String::new();
    let mut started = false;

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            if started {
                return Err(LspError::Transport(
                    "Unexpected EOF inside header block".to_string(),
                ));
            }
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            if started {
                break;
            }
            // Tolerate stray blank lines between frames.
            continue;
        }
        started = true;

        let (name, value) = trimmed
            .split_once(':')
            .ok_or_else(|| LspError::Transport(format!("Malformed header line: {trimmed}")))?;
        headers.insert(name.trim(), value.trim());
    }

    let length = match headers.get(CONTENT_LENGTH) {
        Some(raw) => headers
            .content_length()
            .ok_or_else(|| LspError::Transport(format!("Invalid Content-Length: {raw}")))?,
        None => return Err(LspError::Transport("Missing Content-Length".to_string())),
    };
    if length > MAX_CONTENT_LENGTH {
        return Err(LspError::Transport(format!(
            "Content-Length {length} exceeds limit of {MAX_CONTENT_LENGTH}"
        )));
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(Frame { headers, body }))
}

/// Parse a frame body as a JSON-RPC message.
pub fn parse_message(body: &[u8]) -> LspResult<JsonRpcMessage> {
    serde_json::from_slice(body).map_err(|e| LspError::ParseError(e.to_string()))
}

/// Serialize a message with its Content-Length header.
pub fn frame_message(message: &JsonRpcMessage) -> LspResult<Vec<u8>> {
    let body = serde_json::to_vec(message)?;
    let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// Write one framed message and flush.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &JsonRpcMessage,
) -> LspResult<()> {
    let framed = frame_message(message)?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}
