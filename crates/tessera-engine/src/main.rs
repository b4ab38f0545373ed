//! # Tessera
//!
//! Replays an event script through the full event and audio pipeline.
//!
//! ```text
//! tessera [--config PATH] [--headless] [SCRIPT]
//! ```
//!
//! The script path falls back to `script_path` from the configuration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tessera_engine::audio_manifest::load_manifest;
use tessera_engine::timing::FrameClock;
use tessera_engine::{EngineConfig, EventScript, Game, LoggingPresentation};
use tessera_gameplay::EventCatalog;
use tessera_kernel::{HeadlessMixer, Mixer, RodioMixer, SoundHandler};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "usage: tessera [--config PATH] [--headless] [SCRIPT]";

/// Command line options.
#[derive(Debug, Default)]
struct CliArgs {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    headless: bool,
    help: bool,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => {
                    parsed.config = Some(args.next().context("--config needs a path")?.into());
                },
                "--headless" => parsed.headless = true,
                "-h" | "--help" => parsed.help = true,
                other if other.starts_with('-') => bail!("unknown option {other}\n{USAGE}"),
                other => parsed.script = Some(PathBuf::from(other)),
            }
        }
        Ok(parsed)
    }
}

/// Open the output device, or the simulated mixer if that fails.
fn open_mixer(use_device: bool) -> Box<dyn Mixer> {
    if use_device {
        match RodioMixer::new() {
            Ok(mixer) => {
                info!("Audio device opened");
                return Box::new(mixer);
            },
            Err(e) => warn!("{e}; continuing with the headless mixer"),
        }
    }
    info!("Using the headless mixer");
    Box::new(HeadlessMixer::new())
}

/// Main entry point.
fn main() -> Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };

    // Initialize tracing
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .with_context(|| format!("invalid log filter {:?}", config.log_filter))?,
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Tessera starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let Some(script_path) = args.script.or_else(|| config.script_path.clone()) else {
        info!("No event script given, nothing to replay");
        println!("{USAGE}");
        return Ok(());
    };
    let script = EventScript::load(&script_path)
        .with_context(|| format!("loading script {}", script_path.display()))?;

    let mut audio = SoundHandler::with_capacity(
        open_mixer(config.open_audio_device && !args.headless),
        config.audio_queue_capacity,
    );
    audio.set_volumes(config.volumes());

    if config.manifest_path.exists() {
        load_manifest(&mut audio, &config.manifest_path)
            .with_context(|| format!("loading {}", config.manifest_path.display()))?;
    } else {
        warn!(
            "Audio manifest {} not found, audio requests will be dropped",
            config.manifest_path.display()
        );
    }

    let catalog = EventCatalog::new().into_shared();
    let sets = script.install(&mut catalog.write());
    let mut game = Game::new(audio, catalog, LoggingPresentation::default());

    let max_frames = u64::from(config.max_frames);
    let frames = if config.pace_frames {
        let mut clock = FrameClock::new(config.target_fps);
        game.run_script(&script, &sets, max_frames, || clock.pace())
    } else {
        let step = config.frame_duration();
        game.run_script(&script, &sets, max_frames, || step)
    };

    let inventory = game.presentation().inventory();
    info!(
        "Replayed {} frames; inventory holds {} item types",
        frames,
        inventory.slot_count()
    );
    for (item, count) in inventory.iter() {
        info!("  {:?} x{}", item, count);
    }

    game.audio_mut().remove_all();
    info!("Tessera shutdown complete");
    Ok(())
}
