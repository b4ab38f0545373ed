//! # Tessera Common
//!
//! Common types, utilities, and shared abstractions for Tessera.
//!
//! This crate provides foundational types used across all Tessera subsystems:
//! - Tile coordinates
//! - ID types (ThingId, ItemId, MapId)
//! - Audio request types shared by events and the audio handler
//! - Version information for data files
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod audio;
pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audio::*;
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
