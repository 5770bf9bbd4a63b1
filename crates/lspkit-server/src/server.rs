//! Session wiring for the stdio server: context, method set, capabilities.

use std::sync::Arc;

use serde::Deserialize;

use lspkit::types::{
    PartialParams, PartialResultParams, PositionEncodingKind, ProgressToken, RequestId,
    ServerCapabilities, WorkDoneProgressParams,
};
use lspkit::{
    CallContext, LspResult, MethodDefinition, MethodDirection, MethodSet, PartialResult, Port,
    Session, SessionBuilder, WorkDoneReporter,
};

use crate::config::ServerConfig;
use crate::documents::{add_sync_methods, sync_capabilities, DocumentHost, DocumentStore};

/// Lists the URIs of all open documents.
pub const OPEN_DOCUMENTS: &str = "lspkit/openDocuments";

/// Per-session server state.
#[derive(Debug)]
pub struct ServerState {
    config: ServerConfig,
    documents: DocumentStore,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            documents: DocumentStore::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl DocumentHost for ServerState {
    fn documents(&self) -> &DocumentStore {
        &self.documents
    }
}

pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        position_encoding: Some(PositionEncodingKind::Utf16),
        text_document_sync: Some(sync_capabilities()),
        ..Default::default()
    }
}

/// Lifecycle methods, document sync and the server's own requests.
pub fn method_set() -> MethodSet<ServerState> {
    let mut methods = MethodSet::standard();
    add_sync_methods(&mut methods);
    methods.add(MethodDefinition::request_with_partial(
        OPEN_DOCUMENTS,
        MethodDirection::ClientToServer,
        open_documents,
    ));
    methods
}

pub fn build_session(config: ServerConfig, port: Arc<dyn Port>) -> Arc<Session<ServerState>> {
    build_session_with(config, method_set(), port)
}

/// Like [`build_session`] but serving `methods`, typically [`method_set`]
/// extended with more handlers.
pub fn build_session_with(
    config: ServerConfig,
    methods: MethodSet<ServerState>,
    port: Arc<dyn Port>,
) -> Arc<Session<ServerState>> {
    let name = config.name.clone();
    let version = config.version.clone();

    SessionBuilder::new(ServerState::new(config))
        .methods(Arc::new(methods))
        .server_info(name, version)
        .capabilities(server_capabilities())
        .on_initialized(|session| {
            let peer = session.peer_info().unwrap_or_default();
            tracing::info!("Client ready: {}", peer.name);
        })
        .on_shutdown(|session| {
            let documents = session.context().documents();
            tracing::info!("Shutting down with {} open documents", documents.len());
            documents.clear();
        })
        .build(port)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDocumentsParams {
    #[serde(flatten)]
    pub work_done: WorkDoneProgressParams,
    #[serde(flatten)]
    pub partial: PartialResultParams,
}

impl PartialParams for OpenDocumentsParams {
    fn partial_token(&self) -> Option<&ProgressToken> {
        self.partial.partial_token()
    }
}

async fn open_documents(
    call: CallContext<ServerState>,
    _id: RequestId,
    params: OpenDocumentsParams,
    partial: Option<PartialResult<Vec<String>>>,
) -> LspResult<Option<Vec<String>>> {
    call.session().check_initialized()?;

    let uris = call.context().documents().uris();
    let progress = WorkDoneReporter::from_params(call.port().clone(), &params.work_done);

    if let Some(progress) = &progress {
        progress.begin("Listing documents", false)?;
    }

    let Some(partial) = partial else {
        if let Some(progress) = &progress {
            progress.end(None)?;
        }
        return Ok(Some(uris));
    };

    let total = uris.len().max(1);
    for (i, uri) in uris.into_iter().enumerate() {
        partial.send(&vec![uri])?;
        if let Some(progress) = &progress {
            let percentage = ((i + 1) * 100 / total) as u32;
            progress.report(None, Some(percentage))?;
        }
    }
    if let Some(progress) = &progress {
        progress.end(None)?;
    }

    // Everything already went out as partial results.
    Ok(Some(Vec::new()))
}
