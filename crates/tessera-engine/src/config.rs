//! Engine configuration.
//!
//! Frame pacing, audio and data file settings. Configuration is read from
//! and written to a TOML file; a missing or broken file falls back to the
//! defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tessera_common::DEFAULT_SOUND_QUEUE_CAPACITY;
use tessera_kernel::MixVolumes;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "tessera.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Frame Settings ===
    /// Target frames per second
    pub target_fps: u32,
    /// Frames to run before a replay stops on its own (0 = until the
    /// script ends and the audio falls silent)
    pub max_frames: u32,
    /// Sleep between frames to hold the target rate
    pub pace_frames: bool,

    // === Audio Settings ===
    /// Open the output device (falls back to the headless mixer on failure)
    pub open_audio_device: bool,
    /// Audio requests reserved per frame (the queue grows past this)
    pub audio_queue_capacity: usize,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Data Files ===
    /// Audio manifest (music and sound tables)
    pub manifest_path: PathBuf,
    /// Event script replayed at startup
    pub script_path: Option<PathBuf>,

    // === Debug Settings ===
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frames: 0,
            pace_frames: true,

            open_audio_device: true,
            audio_queue_capacity: DEFAULT_SOUND_QUEUE_CAPACITY,
            master_volume: 1.0,
            music_volume: 0.7,
            sfx_volume: 1.0,

            manifest_path: PathBuf::from("assets/audio.toml"),
            script_path: None,

            log_filter: "tessera=info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from [`CONFIG_FILE`] in the working directory.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.target_fps = self.target_fps.clamp(1, 240);
        self.audio_queue_capacity = self.audio_queue_capacity.clamp(1, 4096);

        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);

        if self.log_filter.trim().is_empty() {
            self.log_filter = Self::default().log_filter;
        }
    }

    /// Category volumes for the mixer.
    #[must_use]
    pub fn volumes(&self) -> MixVolumes {
        MixVolumes {
            master: self.master_volume,
            music: self.music_volume,
            sfx: self.sfx_volume,
        }
        .clamped()
    }

    /// Length of one frame at the target rate.
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}
