//! Stdio transport: Content-Length framed JSON-RPC over stdin/stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

use lspkit::types::{is_lifecycle_method, JsonRpcMessage, RequestId};
use lspkit::{ChannelPort, LspError, LspResult, Port, Session};

use super::framing;

/// Drives one session over a byte stream pair.
///
/// Notifications and lifecycle requests are dispatched inline so they take
/// effect in arrival order; every other request runs on its own task. All
/// outbound traffic (responses included) goes through the port's queue and a
/// single writer task.
pub struct StdioTransport<C> {
    session: Arc<Session<C>>,
    port: Arc<ChannelPort>,
    outbound: UnboundedReceiver<JsonRpcMessage>,
}

impl<C: Send + Sync + 'static> StdioTransport<C> {
    pub fn new(
        session: Arc<Session<C>>,
        port: Arc<ChannelPort>,
        outbound: UnboundedReceiver<JsonRpcMessage>,
    ) -> Self {
        Self {
            session,
            port,
            outbound,
        }
    }

    /// Run over the process's stdin and stdout.
    pub async fn run(self) -> LspResult<()> {
        self.run_with(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Run until EOF on `reader` or until the session exits.
    pub async fn run_with<R, W>(self, mut reader: R, writer: W) -> LspResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Self {
            session,
            port,
            outbound,
        } = self;

        let writer_task = tokio::spawn(write_loop(port.clone(), outbound, writer));
        let mut requests = JoinSet::new();

        tracing::info!("Stdio transport started");

        let outcome = loop {
            let frame = tokio::select! {
                biased;
                _ = port.closed() => break Ok(()),
                frame = framing::read_frame(&mut reader) => frame,
            };

            let frame = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("EOF on stdin, shutting down");
                    // Nothing can answer outbound requests any more; fail them
                    // so in-flight handlers finish and their replies still go out.
                    port.stop_requests();
                    while requests.join_next().await.is_some() {}
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!("Framing error: {e}");
                    break Err(e);
                }
            };

            let message = match framing::parse_message(&frame.body) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    send_reply(&port, JsonRpcMessage::Error(e.to_json_rpc_error(RequestId::Null)));
                    continue;
                }
            };

            match message {
                JsonRpcMessage::Response(_) | JsonRpcMessage::Error(_) => {
                    if !port.complete(message) {
                        tracing::warn!("Dropping response with no matching outbound request");
                    }
                }
                JsonRpcMessage::Request(request) if !is_lifecycle_method(&request.method) => {
                    let session = session.clone();
                    let port = port.clone();
                    let headers = frame.headers;
                    requests.spawn(async move {
                        let reply = session.handle_request(headers, request).await;
                        send_reply(&port, reply);
                    });
                }
                message => {
                    if let Some(reply) = session.handle_message(frame.headers, message).await {
                        send_reply(&port, reply);
                    }
                }
            }

            // Reap finished request tasks so the set stays small.
            while let Some(joined) = requests.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!("Request task failed: {e}");
                }
            }
        };

        // After exit, still-running handlers finish but their replies are dropped.
        requests.detach_all();
        port.close();

        match writer_task.await {
            Ok(result) => result?,
            Err(e) => tracing::error!("Writer task failed: {e}"),
        }

        tracing::info!("Stdio transport stopped (exit code {})", session.exit_code());
        outcome
    }
}

fn send_reply(port: &ChannelPort, reply: JsonRpcMessage) {
    if let Err(e) = port.send(reply) {
        tracing::debug!("Reply dropped: {e}");
    }
}

/// Drain the outbound queue into `writer` until the port closes, then flush
/// whatever was queued before the close.
async fn write_loop<W: AsyncWrite + Unpin>(
    port: Arc<ChannelPort>,
    mut outbound: UnboundedReceiver<JsonRpcMessage>,
    mut writer: W,
) -> LspResult<()> {
    let result = async {
        loop {
            let message = tokio::select! {
                biased;
                message = outbound.recv() => message,
                _ = port.closed() => None,
            };
            let Some(message) = message else { break };
            framing::write_message(&mut writer, &message).await?;
        }

        while let Ok(message) = outbound.try_recv() {
            framing::write_message(&mut writer, &message).await?;
        }
        writer.shutdown().await?;
        Ok::<_, LspError>(())
    }
    .await;

    if let Err(e) = &result {
        tracing::error!("Write failed, closing session channel: {e}");
        port.close();
    }
    result
}
