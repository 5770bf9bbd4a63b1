//! Work-done progress reporting built on [`PartialResult`].

use std::sync::Arc;

use crate::partial::PartialResult;
use crate::port::Port;
use crate::types::{
    LspResult, ProgressToken, WorkDoneProgress, WorkDoneProgressBegin, WorkDoneProgressEnd,
    WorkDoneProgressParams, WorkDoneProgressReport,
};

/// Reports begin/report/end for one work-done token.
#[derive(Debug, Clone)]
pub struct WorkDoneReporter {
    inner: PartialResult<WorkDoneProgress>,
}

impl WorkDoneReporter {
    pub fn new(port: Arc<dyn Port>, token: ProgressToken) -> Self {
        Self {
            inner: PartialResult::new(port, token),
        }
    }

    /// Reporter for a client-supplied `workDoneToken`, if any.
    pub fn from_params(port: Arc<dyn Port>, params: &WorkDoneProgressParams) -> Option<Self> {
        params
            .work_done_token
            .clone()
            .map(|token| Self::new(port, token))
    }

    pub fn token(&self) -> &ProgressToken {
        self.inner.token()
    }

    pub fn begin(&self, title: impl Into<String>, cancellable: bool) -> LspResult<()> {
        self.inner
            .send(&WorkDoneProgress::Begin(WorkDoneProgressBegin {
                title: title.into(),
                cancellable: Some(cancellable),
                message: None,
                percentage: Some(0),
            }))
    }

    pub fn report(&self, message: Option<String>, percentage: Option<u32>) -> LspResult<()> {
        self.inner
            .send(&WorkDoneProgress::Report(WorkDoneProgressReport {
                cancellable: None,
                message,
                percentage: percentage.map(|p| p.min(100)),
            }))
    }

    pub fn end(&self, message: Option<String>) -> LspResult<()> {
        self.inner
            .send(&WorkDoneProgress::End(WorkDoneProgressEnd { message }))
    }
}
