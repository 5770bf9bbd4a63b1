//! In-memory store of the documents the client has open.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lspkit::{LspError, LspResult};

use super::params::{DocumentUri, TextDocumentItem};

/// Server-side copy of one open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub uri: DocumentUri,
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

impl From<TextDocumentItem> for TextDocument {
    fn from(item: TextDocumentItem) -> Self {
        Self {
            uri: item.uri,
            language_id: item.language_id,
            version: item.version,
            text: item.text,
        }
    }
}

/// Open documents keyed by URI.
///
/// The lock is never held across an await point, so a plain `RwLock` is
/// enough even though handlers are async.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<DocumentUri, TextDocument>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a document. Reopening replaces the previous copy.
    pub fn open(&self, document: TextDocument) {
        let uri = document.uri.clone();
        if self.write().insert(uri.clone(), document).is_some() {
            tracing::warn!("Document reopened without close: {uri}");
        } else {
            tracing::debug!("Opened {uri}");
        }
    }

    /// Replace the full text of an open document.
    pub fn replace(&self, uri: &str, version: i32, text: String) -> LspResult<()> {
        let mut documents = self.write();
        let document = documents.get_mut(uri).ok_or_else(|| not_open(uri))?;
        if version < document.version {
            tracing::warn!(
                "Version of {uri} went backwards: {} -> {version}",
                document.version
            );
        }
        document.version = version;
        document.text = text;
        Ok(())
    }

    /// Record a save, optionally with the saved content.
    pub fn save(&self, uri: &str, text: Option<String>) -> LspResult<()> {
        let mut documents = self.write();
        let document = documents.get_mut(uri).ok_or_else(|| not_open(uri))?;
        if let Some(text) = text {
            document.text = text;
        }
        tracing::debug!("Saved {uri}");
        Ok(())
    }

    pub fn close(&self, uri: &str) -> LspResult<TextDocument> {
        let document = self.write().remove(uri).ok_or_else(|| not_open(uri))?;
        tracing::debug!("Closed {uri}");
        Ok(document)
    }

    pub fn get(&self, uri: &str) -> Option<TextDocument> {
        self.read().get(uri).cloned()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.read().contains_key(uri)
    }

    /// Sorted URIs of all open documents.
    pub fn uris(&self) -> Vec<DocumentUri> {
        let mut uris: Vec<_> = self.read().keys().cloned().collect();
        uris.sort();
        uris
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<DocumentUri, TextDocument>> {
        self.documents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<DocumentUri, TextDocument>> {
        self.documents.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_open(uri: &str) -> LspError {
    LspError::InvalidParams(format!("Document not open: {uri}"))
}
