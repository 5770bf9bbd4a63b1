//! Partial-result reporting over `$/progress`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::codec::encode_params;
use crate::port::Port;
use crate::types::{LspError, LspResult, ProgressParams, ProgressToken, PROGRESS_METHOD};

/// Streams values of shape `PR` to the peer, correlated by a progress token.
///
/// Each [`send`](Self::send) emits one `$/progress` notification. Ordering
/// against the final response is up to the caller.
pub struct PartialResult<PR> {
    port: Arc<dyn Port>,
    token: ProgressToken,
    _shape: PhantomData<fn(PR)>,
}

impl<PR> Clone for PartialResult<PR> {
    fn clone(&self) -> Self {
        Self {
            port: self.port.clone(),
            token: self.token.clone(),
            _shape: PhantomData,
        }
    }
}

impl<PR> fmt::Debug for PartialResult<PR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialResult")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl<PR: Serialize> PartialResult<PR> {
    pub fn new(port: Arc<dyn Port>, token: ProgressToken) -> Self {
        Self {
            port,
            token,
            _shape: PhantomData,
        }
    }

    pub fn token(&self) -> &ProgressToken {
        &self.token
    }

    /// Encode `value` and send it as a `$/progress` notification.
    pub fn send(&self, value: &PR) -> LspResult<()> {
        let params = ProgressParams::new(self.token.clone(), value)
            .map_err(|e| LspError::InternalError(format!("Failed to encode partial result: {e}")))?;
        self.port.notify(PROGRESS_METHOD, encode_params(&params)?)
    }
}
