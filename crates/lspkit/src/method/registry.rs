//! Name-keyed table of type-erased method handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::session::CallContext;
use crate::types::{LspError, LspResult, RequestId};

/// Which peer is expected to send a method. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodDirection {
    ClientToServer,
    ServerToClient,
}

/// Static description of a registered method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub direction: MethodDirection,
    /// Type name of the parameter shape.
    pub params_type: &'static str,
    /// Type name of the result shape; `None` for notifications.
    pub result_type: Option<&'static str>,
}

/// Uniform request handler: raw params in, raw result out.
pub type RequestHandler<C> = Arc<
    dyn Fn(CallContext<C>, RequestId, Option<Value>) -> BoxFuture<'static, LspResult<Option<Value>>>
        + Send
        + Sync,
>;

/// Uniform notification handler: raw params in, nothing out.
pub type NotificationHandler<C> =
    Arc<dyn Fn(CallContext<C>, Option<Value>) -> BoxFuture<'static, LspResult<()>> + Send + Sync>;

pub enum MethodHandler<C> {
    Request(RequestHandler<C>),
    Notification(NotificationHandler<C>),
}

impl<C> Clone for MethodHandler<C> {
    fn clone(&self) -> Self {
        match self {
            MethodHandler::Request(h) => MethodHandler::Request(h.clone()),
            MethodHandler::Notification(h) => MethodHandler::Notification(h.clone()),
        }
    }
}

/// A descriptor bound to its handler.
pub struct MethodDefinition<C> {
    descriptor: MethodDescriptor,
    handler: MethodHandler<C>,
}

impl<C> Clone for MethodDefinition<C> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<C> fmt::Debug for MethodDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("descriptor", &self.descriptor)
            .field("request", &self.is_request())
            .finish_non_exhaustive()
    }
}

impl<C> MethodDefinition<C> {
    pub fn new(descriptor: MethodDescriptor, handler: MethodHandler<C>) -> Self {
        Self {
            descriptor,
            handler,
        }
    }

    pub fn method(&self) -> &str {
        &self.descriptor.name
    }

    pub fn direction(&self) -> MethodDirection {
        self.descriptor.direction
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    pub fn handler(&self) -> &MethodHandler<C> {
        &self.handler
    }

    pub fn is_request(&self) -> bool {
        matches!(self.handler, MethodHandler::Request(_))
    }

    /// Run the request wrapper. Fails if this method is a notification.
    pub async fn process_request(
        &self,
        call: CallContext<C>,
        id: RequestId,
        params: Option<Value>,
    ) -> LspResult<Option<Value>> {
        match &self.handler {
            MethodHandler::Request(handler) => handler(call, id, params).await,
            MethodHandler::Notification(_) => Err(LspError::InvalidRequest(format!(
                "{} is a notification, not a request",
                self.descriptor.name
            ))),
        }
    }

    /// Run the notification wrapper. Fails if this method is a request.
    pub async fn process_notification(
        &self,
        call: CallContext<C>,
        params: Option<Value>,
    ) -> LspResult<()> {
        match &self.handler {
            MethodHandler::Notification(handler) => handler(call, params).await,
            MethodHandler::Request(_) => Err(LspError::InvalidRequest(format!(
                "{} is a request, not a notification",
                self.descriptor.name
            ))),
        }
    }
}

/// Set of method definitions keyed by case-sensitive method name.
pub struct MethodSet<C> {
    names: HashMap<String, MethodDefinition<C>>,
}

impl<C> Default for MethodSet<C> {
    fn default() -> Self {
        Self {
            names: HashMap::new(),
        }
    }
}

impl<C> Clone for MethodSet<C> {
    fn clone(&self) -> Self {
        Self {
            names: self.names.clone(),
        }
    }
}

impl<C> fmt::Debug for MethodSet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("MethodSet").field("methods", &names).finish()
    }
}

impl<C> MethodSet<C> {
    /// An empty set with no bindings at all.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, method: &str) -> Option<&MethodDefinition<C>> {
        self.names.get(method)
    }

    /// Bind a definition under its name, replacing any previous binding.
    pub fn add(&mut self, definition: MethodDefinition<C>) {
        let name = definition.method().to_string();
        if self.names.insert(name.clone(), definition).is_some() {
            tracing::debug!("Replaced handler for {name}");
        }
    }

    pub fn contains(&self, method: &str) -> bool {
        self.names.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.names.values().map(MethodDefinition::descriptor)
    }
}

impl<C: Send + Sync + 'static> MethodSet<C> {
    /// A set pre-populated with the four lifecycle methods.
    pub fn standard() -> Self {
        let mut set = Self::new();
        crate::lifecycle::add_lifecycle_methods(&mut set);
        set
    }
}
