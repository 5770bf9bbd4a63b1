//! The RPC channel seen by the dispatch core.
//!
//! The transport owns framing and I/O; the core only needs to push outbound
//! notifications and requests and to close the channel on `exit`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};

use crate::types::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, LspError, LspResult, RequestId,
};

/// Outbound half of an RPC channel.
///
/// Implementations must tolerate concurrent calls from many handlers.
pub trait Port: Send + Sync {
    /// Send a one-way notification.
    fn notify(&self, method: &str, params: Option<Value>) -> LspResult<()>;

    /// Send a request and resolve with the peer's result or error.
    fn request(&self, method: &str, params: Option<Value>) -> BoxFuture<'static, LspResult<Value>>;

    /// Close the channel. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

type PendingMap = HashMap<RequestId, oneshot::Sender<LspResult<Value>>>;

/// In-process [`Port`] feeding an unbounded queue drained by a transport writer.
pub struct ChannelPort {
    outbound: mpsc::UnboundedSender<JsonRpcMessage>,
    pending: Mutex<PendingMap>,
    next_id: AtomicI64,
    requests_stopped: AtomicBool,
    closed: watch::Sender<bool>,
}

impl ChannelPort {
    /// Create a port and the receiver the transport writes from.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<JsonRpcMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        let port = Arc::new(Self {
            outbound: tx,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            requests_stopped: AtomicBool::new(false),
            closed,
        });
        (port, rx)
    }

    /// Queue any outbound message, typically a response produced by a session.
    pub fn send(&self, message: JsonRpcMessage) -> LspResult<()> {
        if self.is_closed() {
            return Err(LspError::ChannelClosed);
        }
        self.outbound
            .send(message)
            .map_err(|_| LspError::ChannelClosed)
    }

    /// Route a peer response to the outbound request waiting on it.
    ///
    /// Returns `false` when the message is not a response or no request with
    /// that id is pending.
    pub fn complete(&self, message: JsonRpcMessage) -> bool {
        let (id, outcome) = match message {
            JsonRpcMessage::Response(resp) => (resp.id, Ok(resp.result)),
            JsonRpcMessage::Error(err) => (err.id, Err(LspError::from(err.error))),
            _ => return false,
        };

        match self.pending().remove(&id) {
            Some(waiter) => {
                let _ = waiter.send(outcome);
                true
            }
            None => {
                tracing::warn!("Response for unknown request id {id}");
                false
            }
        }
    }

    /// Resolves once [`Port::close`] has been called.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Fail every outbound request still waiting on the peer and refuse new
    /// ones. Notifications and replies keep flowing until [`Port::close`].
    ///
    /// For when the peer can no longer answer, e.g. its input hit EOF.
    pub fn stop_requests(&self) {
        self.requests_stopped.store(true, Ordering::SeqCst);
        let abandoned = {
            let mut pending = self.pending();
            let count = pending.len();
            pending.clear();
            count
        };
        if abandoned > 0 {
            tracing::info!("Abandoned {abandoned} outbound requests");
        }
    }

    /// Number of outbound requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.pending().len()
    }

    /// Checked under the pending lock so a concurrent close or stop clears
    /// anything registered before it.
    fn register(&self, id: RequestId, waiter: oneshot::Sender<LspResult<Value>>) -> LspResult<()> {
        let mut pending = self.pending();
        if self.is_closed() || self.requests_stopped.load(Ordering::SeqCst) {
            return Err(LspError::ChannelClosed);
        }
        pending.insert(id, waiter);
        Ok(())
    }

    fn pending(&self) -> MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Port for ChannelPort {
    fn notify(&self, method: &str, params: Option<Value>) -> LspResult<()> {
        tracing::trace!("-> notification {method}");
        self.send(JsonRpcMessage::Notification(JsonRpcNotification::new(
            method, params,
        )))
    }

    fn request(&self, method: &str, params: Option<Value>) -> BoxFuture<'static, LspResult<Value>> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();

        let sent = self.register(id.clone(), tx).and_then(|()| {
            tracing::trace!("-> request {method} ({id})");
            let sent = self.send(JsonRpcMessage::Request(JsonRpcRequest::new(
                id.clone(),
                method,
                params,
            )));
            if sent.is_err() {
                self.pending().remove(&id);
            }
            sent
        });

        Box::pin(async move {
            sent?;
            rx.await.map_err(|_| LspError::ChannelClosed)?
        })
    }

    fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        // Dropping the waiters fails every outstanding request.
        self.pending().clear();
        tracing::info!("Channel closed");
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}
