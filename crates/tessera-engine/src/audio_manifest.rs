//! Audio manifest loading.
//!
//! The manifest is a TOML file listing every music track and sound effect:
//!
//! ```toml
//! version = { major = 1, minor = 0, patch = 0 }
//!
//! [[music]]
//! id = 100
//! path = "music/town.ogg"
//! fade = 1000
//! vol = 200
//!
//! [[sound]]
//! id = 7
//! path = "sfx/door.wav"
//! ```
//!
//! Paths are relative to the manifest's directory. Entries whose file
//! cannot be decoded are logged and skipped; the rest still load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tessera_common::{SchemaVersion, SoundId, TesseraError, TesseraResult};
use tessera_kernel::{Mixer, Sound, SoundHandler, MAX_VOLUME};
use tracing::{debug, info, warn};

/// One music or sound entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioEntry {
    /// Asset id.
    pub id: u32,
    /// Audio file, relative to the manifest.
    pub path: PathBuf,
    /// Fade time in milliseconds.
    #[serde(default)]
    pub fade: u32,
    /// Volume (0-255).
    #[serde(default = "default_volume")]
    pub vol: u8,
    /// Extra passes after the first (-1 = forever). Unset keeps the
    /// category default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loops: Option<i32>,
}

const fn default_volume() -> u8 {
    MAX_VOLUME
}

impl AudioEntry {
    fn configure(&self, sound: &mut Sound) {
        sound.set_fade_time(self.fade);
        sound.set_volume(self.vol);
        if let Some(loops) = self.loops {
            sound.set_loop_count(loops);
        }
    }
}

/// Music and sound tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioManifest {
    /// File format version.
    #[serde(default)]
    pub version: SchemaVersion,
    /// Music tracks.
    #[serde(default)]
    pub music: Vec<AudioEntry>,
    /// Sound effects.
    #[serde(default)]
    pub sound: Vec<AudioEntry>,
}

/// Outcome of applying a manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestReport {
    /// Music tracks loaded.
    pub music: usize,
    /// Sound effects loaded.
    pub sounds: usize,
    /// Entries skipped.
    pub failed: usize,
}

impl AudioManifest {
    /// Parse manifest text. `file` names the source in errors.
    pub fn parse(text: &str, file: &str) -> TesseraResult<Self> {
        let manifest: Self = toml::from_str(text).map_err(|e| TesseraError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        })?;

        if !SchemaVersion::AUDIO_MANIFEST.is_compatible_with(&manifest.version) {
            return Err(TesseraError::VersionMismatch {
                expected: SchemaVersion::AUDIO_MANIFEST,
                actual: manifest.version,
            });
        }
        Ok(manifest)
    }

    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> TesseraResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Decode every entry into the handler's registries.
    ///
    /// `base` is the directory entry paths are relative to. A failed entry
    /// keeps whatever the registry held for its id before; a new id that
    /// fails is removed again.
    pub fn apply<M: Mixer>(&self, handler: &mut SoundHandler<M>, base: &Path) -> ManifestReport {
        let mut report = ManifestReport::default();

        for entry in &self.music {
            let id = SoundId::new(entry.id);
            let sound = handler.registry_mut().create_audio_music(id);
            entry.configure(sound);
            match sound.set_sound_file(base.join(&entry.path)) {
                Ok(()) => {
                    debug!("Loaded music {} from {:?}", id, entry.path);
                    report.music += 1;
                },
                Err(e) => {
                    warn!("Skipping music {}: {}", id, e);
                    if !sound.is_loaded() {
                        handler.registry_mut().remove_music(id);
                    }
                    report.failed += 1;
                },
            }
        }

        for entry in &self.sound {
            let id = SoundId::new(entry.id);
            let sound = handler.registry_mut().create_audio_sound(id);
            entry.configure(sound);
            match sound.set_sound_file(base.join(&entry.path)) {
                Ok(()) => {
                    debug!("Loaded sound {} from {:?}", id, entry.path);
                    report.sounds += 1;
                },
                Err(e) => {
                    warn!("Skipping sound {}: {}", id, e);
                    if !sound.is_loaded() {
                        handler.registry_mut().remove_sound(id);
                    }
                    report.failed += 1;
                },
            }
        }

        info!(
            "Audio manifest: {} music, {} sounds, {} skipped",
            report.music, report.sounds, report.failed
        );
        report
    }
}

/// Load a manifest file into the handler. Entry paths resolve against the
/// manifest's directory.
pub fn load_manifest<M: Mixer>(
    handler: &mut SoundHandler<M>,
    path: impl AsRef<Path>,
) -> TesseraResult<ManifestReport> {
    let path = path.as_ref();
    let manifest = AudioManifest::load(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(manifest.apply(handler, base))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;
    use tessera_kernel::HeadlessMixer;

    /// Write a short 16-bit mono PCM wav file.
    pub(crate) fn write_wav(path: &Path, frames: u32) {
        let sample_rate: u32 = 8000;
        let data_len = frames * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(44 + data_len as usize, 0);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dir");
        }
        fs::write(path, bytes).expect("write wav");
    }

    #[test]
    fn test_parse_defaults() {
        let manifest = AudioManifest::parse(
            r#"
            [[music]]
            id = 100
            path = "town.wav"
            fade = 1000
            "#,
            "inline",
        )
        .expect("parse");

        assert_eq!(manifest.music.len(), 1);
        assert!(manifest.sound.is_empty());
        assert_eq!(manifest.music[0].vol, 255);
        assert_eq!(manifest.music[0].loops, None);
    }

    #[test]
    fn test_rejects_newer_version() {
        let err = AudioManifest::parse(
            "version = { major = 2, minor = 0, patch = 0 }",
            "inline",
        )
        .expect_err("version");
        assert!(matches!(err, TesseraError::VersionMismatch { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = AudioManifest::parse("[[music]]\nid = \"x\"", "audio.toml").expect_err("parse");
        match err {
            TesseraError::Parse { file, .. } => assert_eq!(file, "audio.toml"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = TempDir::new().expect("temp dir");
        write_wav(&dir.path().join("music/town.wav"), 800);
        write_wav(&dir.path().join("sfx/door.wav"), 80);

        let manifest_path = dir.path().join("audio.toml");
        fs::write(
            &manifest_path,
            r#"
            [[music]]
            id = 100
            path = "music/town.wav"
            fade = 500
            vol = 128

            [[music]]
            id = 101
            path = "music/missing.wav"

            [[sound]]
            id = 7
            path = "sfx/door.wav"
            loops = 2
            "#,
        )
        .expect("write manifest");

        let mut handler = SoundHandler::new(HeadlessMixer::new());
        let report = load_manifest(&mut handler, &manifest_path).expect("load");

        assert_eq!(
            report,
            ManifestReport {
                music: 1,
                sounds: 1,
                failed: 1
            }
        );

        let registry = handler.registry();
        let town = registry
            .get_audio_music(SoundId::new(100))
            .expect("town loaded");
        assert_eq!(town.fade_time(), 500);
        assert_eq!(town.volume(), 128);
        assert!(town.loops_forever());
        assert!(registry.get_audio_music(SoundId::new(101)).is_none());

        let door = registry.get_audio_sound(SoundId::new(7)).expect("door");
        assert_eq!(door.loop_count(), 2);
        assert!(door.is_loaded());
    }

    #[test]
    fn test_missing_manifest_is_io_error() {
        let mut handler = SoundHandler::new(HeadlessMixer::new());
        let err = load_manifest(&mut handler, "/nonexistent/audio.toml").expect_err("missing");
        assert!(matches!(err, TesseraError::Io(_)));
    }
}
