//! # Tessera Kernel
//!
//! Audio core for Tessera.
//!
//! This crate owns everything between a [`SoundRequest`](tessera_common::SoundRequest)
//! and the speakers:
//! - Decoded clips ([`AudioClip`])
//! - Playable assets with fade, loop and volume settings ([`Sound`])
//! - Music and sound registries ([`AudioRegistry`])
//! - The per-frame request dispatcher with two-slot music cross-fading
//!   ([`SoundHandler`])
//! - The [`Mixer`] backend boundary with a rodio device implementation and a
//!   headless simulation
//!
//! ## Frame contract
//!
//! Gameplay code enqueues requests through a cloned
//! [`SoundTrigger`](tessera_common::SoundTrigger) at any time. Once per frame
//! the game loop calls [`SoundHandler::process`] followed by
//! [`SoundHandler::update`] with the frame time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod clip;
pub mod headless_mixer;
pub mod mixer;
pub mod registry;
pub mod rodio_mixer;
pub mod sound;
pub mod sound_handler;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clip::*;
    pub use crate::headless_mixer::*;
    pub use crate::mixer::*;
    pub use crate::registry::*;
    pub use crate::rodio_mixer::*;
    pub use crate::sound::*;
    pub use crate::sound_handler::*;
}

pub use prelude::*;
