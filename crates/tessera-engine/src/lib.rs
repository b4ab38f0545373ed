//! # Tessera Engine
//!
//! Ties the audio kernel and the event layer together:
//! - Engine configuration ([`config`])
//! - Audio manifest loading ([`audio_manifest`])
//! - Event scripts ([`script`])
//! - The presentation boundary ([`presentation`])
//! - The single-threaded frame loop ([`game_loop`])
//! - Frame pacing ([`timing`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod audio_manifest;
pub mod config;
pub mod game_loop;
pub mod presentation;
pub mod script;
pub mod timing;

#[cfg(test)]
mod e2e_tests;

pub use config::EngineConfig;
pub use game_loop::{FrameReport, Game, PLAYER};
pub use presentation::{BattleOutcome, LoggingPresentation, Presentation, Presented};
pub use script::EventScript;
