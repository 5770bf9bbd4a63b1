//! Per-peer session: lifecycle state, peer metadata and inbound dispatch.
//!
//! State lives behind one lock that is held only while reading or writing it,
//! never across a handler, so a slow handler cannot stall other calls.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::codec::encode_params;
use crate::headers::HeaderSet;
use crate::method::MethodSet;
use crate::port::Port;
use crate::progress::WorkDoneReporter;
use crate::types::*;
use crate::validator::{validate_notification, validate_request};

/// Lifecycle of a session. Only ever advances in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Initialized,
    Shutdown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// What the peer declared about itself in `initialize`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerInfo {
    pub name: String,
    pub version: Option<String>,
    pub process_id: Option<i64>,
    pub capabilities: ClientCapabilities,
    pub root_uri: Option<String>,
    pub initialization_options: Option<Value>,
}

impl From<InitializeParams> for PeerInfo {
    fn from(params: InitializeParams) -> Self {
        let (name, version) = params
            .client_info
            .map(|info| (info.name, info.version))
            .unwrap_or_default();

        Self {
            name,
            version,
            process_id: params.process_id,
            capabilities: params.capabilities,
            root_uri: params.root_uri,
            initialization_options: params.initialization_options,
        }
    }
}

/// Lifecycle hook. Runs synchronously right after the transition it is
/// attached to; it can observe the session but has no way to mutate state.
pub type EventHandler<C> = Arc<dyn Fn(&Session<C>) + Send + Sync>;

struct SessionState {
    lifecycle: LifecycleState,
    peer: Option<PeerInfo>,
    exit_code: Option<i32>,
}

/// Everything a handler receives besides its decoded params.
pub struct CallContext<C> {
    session: Arc<Session<C>>,
    port: Arc<dyn Port>,
    headers: Arc<HeaderSet>,
}

impl<C> Clone for CallContext<C> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            port: self.port.clone(),
            headers: self.headers.clone(),
        }
    }
}

impl<C> CallContext<C> {
    pub fn session(&self) -> &Arc<Session<C>> {
        &self.session
    }

    pub fn port(&self) -> &Arc<dyn Port> {
        &self.port
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Application context owned by the session.
    pub fn context(&self) -> &C {
        &self.session.context
    }
}

/// One connected peer.
pub struct Session<C> {
    state: Mutex<SessionState>,
    methods: Arc<MethodSet<C>>,
    port: Arc<dyn Port>,
    context: C,
    server_info: Option<ProgramInfo>,
    capabilities: ServerCapabilities,
    on_initialized: Option<EventHandler<C>>,
    on_shutdown: Option<EventHandler<C>>,
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder<C> {
    context: C,
    methods: Option<Arc<MethodSet<C>>>,
    server_info: Option<ProgramInfo>,
    capabilities: ServerCapabilities,
    on_initialized: Option<EventHandler<C>>,
    on_shutdown: Option<EventHandler<C>>,
}

impl<C: Send + Sync + 'static> SessionBuilder<C> {
    pub fn new(context: C) -> Self {
        Self {
            context,
            methods: None,
            server_info: None,
            capabilities: ServerCapabilities::default(),
            on_initialized: None,
            on_shutdown: None,
        }
    }

    /// Use a prebuilt method set. Defaults to [`MethodSet::standard`].
    pub fn methods(mut self, methods: Arc<MethodSet<C>>) -> Self {
        self.methods = Some(methods);
        self
    }

    pub fn server_info(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.server_info = Some(ProgramInfo {
            name: name.into(),
            version,
        });
        self
    }

    /// Capabilities advertised in the `initialize` result.
    pub fn capabilities(mut self, capabilities: ServerCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn on_initialized(mut self, hook: impl Fn(&Session<C>) + Send + Sync + 'static) -> Self {
        self.on_initialized = Some(Arc::new(hook));
        self
    }

    pub fn on_shutdown(mut self, hook: impl Fn(&Session<C>) + Send + Sync + 'static) -> Self {
        self.on_shutdown = Some(Arc::new(hook));
        self
    }

    pub fn build(self, port: Arc<dyn Port>) -> Arc<Session<C>> {
        Arc::new(Session {
            state: Mutex::new(SessionState {
                lifecycle: LifecycleState::Uninitialized,
                peer: None,
                exit_code: None,
            }),
            methods: self
                .methods
                .unwrap_or_else(|| Arc::new(MethodSet::standard())),
            port,
            context: self.context,
            server_info: self.server_info,
            capabilities: self.capabilities,
            on_initialized: self.on_initialized,
            on_shutdown: self.on_shutdown,
        })
    }
}

impl<C> Session<C> {
    pub fn state(&self) -> LifecycleState {
        self.lock().lifecycle
    }

    /// Peer metadata, once `initialize` has been accepted.
    pub fn peer_info(&self) -> Option<PeerInfo> {
        self.lock().peer.clone()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn methods(&self) -> &Arc<MethodSet<C>> {
        &self.methods
    }

    pub fn port(&self) -> &Arc<dyn Port> {
        &self.port
    }

    /// Process exit status: 0 only when `exit` followed a successful `shutdown`.
    pub fn exit_code(&self) -> i32 {
        self.lock().exit_code.unwrap_or(1)
    }

    pub fn has_exited(&self) -> bool {
        self.lock().exit_code.is_some()
    }

    /// Guard for application handlers.
    pub fn check_initialized(&self) -> LspResult<()> {
        if self.state() != LifecycleState::Initialized {
            return Err(LspError::ServerNotInitialized);
        }
        Ok(())
    }

    pub fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            capabilities: self.capabilities.clone(),
            server_info: self.server_info.clone(),
        }
    }

    /// Send a typed notification to the peer.
    pub fn notify<P: Serialize>(&self, method: &str, params: &P) -> LspResult<()> {
        self.port.notify(method, encode_params(params)?)
    }

    /// Send a typed request to the peer and decode its result.
    pub async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> LspResult<R> {
        let pending = self.port.request(method, encode_params(params)?);
        let value = pending.await?;
        serde_json::from_value(value)
            .map_err(|e| LspError::InternalError(format!("Failed to decode {method} result: {e}")))
    }

    /// Ask the peer to create a work-done token and return a reporter for it.
    pub async fn create_work_done_progress(
        &self,
        token: ProgressToken,
    ) -> LspResult<WorkDoneReporter> {
        let params = WorkDoneProgressCreateParams {
            token: token.clone(),
        };
        self.request::<_, Value>(WORK_DONE_PROGRESS_CREATE_METHOD, &params)
            .await?;
        Ok(WorkDoneReporter::new(self.port.clone(), token))
    }

    /// Capture peer info and enter `Initializing`, atomically.
    pub(crate) fn begin_initialize(&self, peer: PeerInfo) -> LspResult<()> {
        let mut state = self.lock();
        if state.lifecycle != LifecycleState::Uninitialized {
            return Err(LspError::RequestFailed(
                "Server is not uninitialized.".to_string(),
            ));
        }
        tracing::info!(
            "Initializing for client: {} {}",
            peer.name,
            peer.version.as_deref().unwrap_or("")
        );
        state.peer = Some(peer);
        state.lifecycle = LifecycleState::Initializing;
        Ok(())
    }

    /// Move from `from` to `to`, or fail with `reject()` if not in `from`.
    pub(crate) fn transition(
        &self,
        from: LifecycleState,
        to: LifecycleState,
        reject: impl FnOnce() -> LspError,
    ) -> LspResult<()> {
        let mut state = self.lock();
        if state.lifecycle != from {
            return Err(reject());
        }
        state.lifecycle = to;
        tracing::info!("Session {from} -> {to}");
        Ok(())
    }

    /// Record `exit` and return the resulting exit code.
    pub(crate) fn record_exit(&self) -> i32 {
        let mut state = self.lock();
        let code = if state.lifecycle == LifecycleState::Shutdown {
            0
        } else {
            1
        };
        state.exit_code = Some(code);
        code
    }

    pub(crate) fn run_on_initialized(&self) {
        if let Some(hook) = &self.on_initialized {
            hook(self);
        }
    }

    pub(crate) fn run_on_shutdown(&self) {
        if let Some(hook) = &self.on_shutdown {
            hook(self);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Send + Sync + 'static> Session<C> {
    /// Dispatch one inbound message. Requests yield a response message;
    /// notifications and stray responses yield nothing.
    pub async fn handle_message(
        self: &Arc<Self>,
        headers: HeaderSet,
        message: JsonRpcMessage,
    ) -> Option<JsonRpcMessage> {
        match message {
            JsonRpcMessage::Request(request) => Some(self.handle_request(headers, request).await),
            JsonRpcMessage::Notification(notification) => {
                let method = notification.method.clone();
                match self.handle_notification(headers, notification).await {
                    Ok(()) => {}
                    Err(LspError::MethodNotFound(_)) => {
                        tracing::debug!("Unknown notification: {method}");
                    }
                    Err(e) => tracing::warn!("Notification {method} failed: {e}"),
                }
                None
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::Error(_) => {
                tracing::warn!("Received a response with no outbound request to match");
                None
            }
        }
    }

    pub async fn handle_request(
        self: &Arc<Self>,
        headers: HeaderSet,
        request: JsonRpcRequest,
    ) -> JsonRpcMessage {
        let id = request.id.clone();
        let method = request.method.clone();
        tracing::debug!("<- request {method} ({id})");

        match self.dispatch_request(headers, request).await {
            Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(
                id,
                result.unwrap_or(Value::Null),
            )),
            Err(e) => {
                tracing::debug!("Request {method} ({id}) failed: {e}");
                JsonRpcMessage::Error(e.to_json_rpc_error(id))
            }
        }
    }

    /// Dispatch a notification. The error is informational only; there is no
    /// response slot to carry it.
    pub async fn handle_notification(
        self: &Arc<Self>,
        headers: HeaderSet,
        notification: JsonRpcNotification,
    ) -> LspResult<()> {
        tracing::debug!("<- notification {}", notification.method);
        validate_notification(&notification)?;
        if !is_lifecycle_method(&notification.method) {
            self.check_initialized()?;
        }

        let Some(definition) = self.methods.get(&notification.method).cloned() else {
            if notification.method.starts_with("$/") {
                tracing::trace!("Ignoring {}", notification.method);
                return Ok(());
            }
            return Err(LspError::MethodNotFound(notification.method));
        };

        definition
            .process_notification(self.call_context(headers), notification.params)
            .await
    }

    async fn dispatch_request(
        self: &Arc<Self>,
        headers: HeaderSet,
        request: JsonRpcRequest,
    ) -> LspResult<Option<Value>> {
        validate_request(&request)?;
        if !is_lifecycle_method(&request.method) {
            self.check_initialized()?;
        }

        let definition = self
            .methods
            .get(&request.method)
            .cloned()
            .ok_or_else(|| LspError::MethodNotFound(request.method.clone()))?;

        definition
            .process_request(self.call_context(headers), request.id, request.params)
            .await
    }

    /// Context for invoking a handler outside normal dispatch.
    pub fn call_context(self: &Arc<Self>, headers: HeaderSet) -> CallContext<C> {
        CallContext {
            session: self.clone(),
            port: self.port.clone(),
            headers: Arc::new(headers),
        }
    }
}
