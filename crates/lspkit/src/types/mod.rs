//! Protocol data types used by the dispatch core.

pub mod capabilities;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod progress;

pub use capabilities::*;
pub use error::*;
pub use lifecycle::*;
pub use message::*;
pub use progress::*;
