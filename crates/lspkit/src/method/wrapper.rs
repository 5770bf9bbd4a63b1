//! Generic factories turning typed handlers into [`MethodDefinition`]s.
//!
//! Each factory captures the parameter and result shapes at registration
//! time, so the registry and the session only ever see raw JSON bodies.

use std::any::type_name;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::codec::{decode_params, encode_result};
use crate::partial::PartialResult;
use crate::session::CallContext;
use crate::types::{LspResult, PartialParams, RequestId};

use super::registry::{MethodDefinition, MethodDescriptor, MethodDirection, MethodHandler};

impl<C: Send + Sync + 'static> MethodDefinition<C> {
    /// Request over raw JSON bodies; shape names are informational.
    pub fn raw_request<F>(
        method: &str,
        direction: MethodDirection,
        params_type: &'static str,
        result_type: &'static str,
        process: F,
    ) -> Self
    where
        F: Fn(CallContext<C>, RequestId, Option<Value>) -> BoxFuture<'static, LspResult<Option<Value>>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(
            MethodDescriptor {
                name: method.to_string(),
                direction,
                params_type,
                result_type: Some(result_type),
            },
            MethodHandler::Request(Arc::new(process)),
        )
    }

    /// Notification over a raw JSON body.
    pub fn raw_notification<F>(
        method: &str,
        direction: MethodDirection,
        params_type: &'static str,
        process: F,
    ) -> Self
    where
        F: Fn(CallContext<C>, Option<Value>) -> BoxFuture<'static, LspResult<()>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(
            MethodDescriptor {
                name: method.to_string(),
                direction,
                params_type,
                result_type: None,
            },
            MethodHandler::Notification(Arc::new(process)),
        )
    }

    /// Typed request. Undecodable params fail with invalid params before
    /// `process` runs; `Ok(None)` produces an absent result body.
    pub fn request<P, R, F, Fut>(method: &str, direction: MethodDirection, process: F) -> Self
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(CallContext<C>, RequestId, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LspResult<Option<R>>> + Send + 'static,
    {
        let process = Arc::new(process);
        Self::raw_request(
            method,
            direction,
            type_name::<P>(),
            type_name::<R>(),
            move |call, id, params| {
                let decoded = decode_params::<P>(params);
                let process = process.clone();
                Box::pin(async move {
                    let result = process(call, id, decoded?).await?;
                    encode_result(result)
                })
            },
        )
    }

    /// Typed request whose params may carry a partial-result token.
    ///
    /// When the token is present `process` receives a [`PartialResult`]
    /// bound to it; otherwise it receives `None`.
    pub fn request_with_partial<P, R, PR, F, Fut>(
        method: &str,
        direction: MethodDirection,
        process: F,
    ) -> Self
    where
        P: DeserializeOwned + PartialParams + Send + 'static,
        R: Serialize + 'static,
        PR: Serialize + 'static,
        F: Fn(CallContext<C>, RequestId, P, Option<PartialResult<PR>>) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = LspResult<Option<R>>> + Send + 'static,
    {
        let process = Arc::new(process);
        Self::raw_request(
            method,
            direction,
            type_name::<P>(),
            type_name::<R>(),
            move |call, id, params| {
                let decoded = decode_params::<P>(params).map(|params| {
                    let partial = params
                        .partial_token()
                        .map(|token| PartialResult::new(call.port().clone(), token.clone()));
                    (params, partial)
                });
                let process = process.clone();
                Box::pin(async move {
                    let (params, partial) = decoded?;
                    let result = process(call, id, params, partial).await?;
                    encode_result(result)
                })
            },
        )
    }

    /// Typed notification. Undecodable params fail before `process` runs.
    pub fn notification<P, F, Fut>(method: &str, direction: MethodDirection, process: F) -> Self
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(CallContext<C>, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LspResult<()>> + Send + 'static,
    {
        let process = Arc::new(process);
        Self::raw_notification(method, direction, type_name::<P>(), move |call, params| {
            let decoded = decode_params::<P>(params);
            let process = process.clone();
            Box::pin(async move { process(call, decoded?).await })
        })
    }
}
