//! Method registry and the typed wrappers that populate it.

pub mod registry;
pub mod wrapper;

pub use registry::{
    MethodDefinition, MethodDescriptor, MethodDirection, MethodHandler, MethodSet,
    NotificationHandler, RequestHandler,
};
