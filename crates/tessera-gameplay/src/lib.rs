//! # Tessera Gameplay
//!
//! Event layer for Tessera.
//!
//! This crate sits between the map world and the presentation layer:
//! - Event model with typed payload constructors and parsers
//! - Event sets with item and trigger locks
//! - Shared event catalog for one-shot tracking
//! - Event handler: FIFO queue with a single poll cursor
//! - Actor references handed back to the world
//! - Key state and inventory used by the presentation layer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod catalog;
pub mod conversation;
pub mod event;
pub mod event_set;
pub mod handler;
pub mod inventory;
pub mod key_handler;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::catalog::*;
    pub use crate::conversation::*;
    pub use crate::event::*;
    pub use crate::event_set::*;
    pub use crate::handler::*;
    pub use crate::inventory::*;
    pub use crate::key_handler::*;
}

pub use prelude::*;
