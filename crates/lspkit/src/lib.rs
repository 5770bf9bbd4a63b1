//! Method dispatch, session lifecycle and partial results for
//! language-server style JSON-RPC.
//!
//! A [`Session`] owns the lifecycle state of one peer and a shared
//! [`MethodSet`]. Handlers are registered through the typed factories on
//! [`MethodDefinition`] and receive a [`CallContext`] plus decoded params.

pub mod codec;
pub mod headers;
mod lifecycle;
pub mod method;
pub mod partial;
pub mod port;
pub mod progress;
pub mod session;
pub mod types;
pub mod validator;

pub use headers::HeaderSet;
pub use method::{MethodDefinition, MethodDescriptor, MethodDirection, MethodSet};
pub use partial::PartialResult;
pub use port::{ChannelPort, Port};
pub use progress::WorkDoneReporter;
pub use session::{CallContext, EventHandler, LifecycleState, PeerInfo, Session, SessionBuilder};
pub use types::{LspError, LspResult};
