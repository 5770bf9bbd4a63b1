//! Text document synchronization: open-document store and the
//! `textDocument/did*` notifications that keep it current.

pub mod params;
pub mod store;
pub mod sync;

pub use params::*;
pub use store::{DocumentStore, TextDocument};
pub use sync::{add_sync_methods, sync_capabilities, DocumentHost};
