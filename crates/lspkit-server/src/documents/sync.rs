//! `textDocument/did*` notification handlers.

use lspkit::types::{SaveOptions, TextDocumentSyncKind, TextDocumentSyncOptions};
use lspkit::{CallContext, LspResult, MethodDefinition, MethodDirection, MethodSet};

use super::params::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams,
};
use super::store::DocumentStore;

pub const DID_OPEN: &str = "textDocument/didOpen";
pub const DID_CHANGE: &str = "textDocument/didChange";
pub const DID_SAVE: &str = "textDocument/didSave";
pub const DID_CLOSE: &str = "textDocument/didClose";

/// Session context that owns a [`DocumentStore`].
pub trait DocumentHost: Send + Sync + 'static {
    fn documents(&self) -> &DocumentStore;
}

impl DocumentHost for DocumentStore {
    fn documents(&self) -> &DocumentStore {
        self
    }
}

/// Sync options matching what the handlers below implement.
pub fn sync_capabilities() -> TextDocumentSyncOptions {
    TextDocumentSyncOptions {
        open_close: true,
        change: TextDocumentSyncKind::FULL,
        save: Some(SaveOptions { include_text: true }),
        ..Default::default()
    }
}

/// Register the four sync notifications on `methods`.
pub fn add_sync_methods<C: DocumentHost>(methods: &mut MethodSet<C>) {
    methods.add(MethodDefinition::notification(
        DID_OPEN,
        MethodDirection::ClientToServer,
        did_open::<C>,
    ));
    methods.add(MethodDefinition::notification(
        DID_CHANGE,
        MethodDirection::ClientToServer,
        did_change::<C>,
    ));
    methods.add(MethodDefinition::notification(
        DID_SAVE,
        MethodDirection::ClientToServer,
        did_save::<C>,
    ));
    methods.add(MethodDefinition::notification(
        DID_CLOSE,
        MethodDirection::ClientToServer,
        did_close::<C>,
    ));
}

async fn did_open<C: DocumentHost>(
    call: CallContext<C>,
    params: DidOpenTextDocumentParams,
) -> LspResult<()> {
    call.context()
        .documents()
        .open(params.text_document.into());
    Ok(())
}

async fn did_change<C: DocumentHost>(
    call: CallContext<C>,
    params: DidChangeTextDocumentParams,
) -> LspResult<()> {
    let DidChangeTextDocumentParams {
        text_document,
        mut content_changes,
    } = params;

    // Full sync: every change carries the whole text, so the last one wins.
    let Some(last) = content_changes.pop() else {
        tracing::debug!("Empty change for {}", text_document.uri);
        return Ok(());
    };
    if last.range.is_some() {
        tracing::warn!(
            "Ranged change for {} under full sync; using its text as the whole document",
            text_document.uri
        );
    }

    call.context()
        .documents()
        .replace(&text_document.uri, text_document.version, last.text)
}

async fn did_save<C: DocumentHost>(
    call: CallContext<C>,
    params: DidSaveTextDocumentParams,
) -> LspResult<()> {
    call.context()
        .documents()
        .save(&params.text_document.uri, params.text)
}

async fn did_close<C: DocumentHost>(
    call: CallContext<C>,
    params: DidCloseTextDocumentParams,
) -> LspResult<()> {
    call.context()
        .documents()
        .close(&params.text_document.uri)
        .map(|_| ())
}
