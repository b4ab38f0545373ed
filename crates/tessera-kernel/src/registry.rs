//! Music and sound registries.
//!
//! Music and sound effects live in two disjoint id spaces. Inserting an
//! asset under an id that is already taken replaces (and drops) the old one.

use std::collections::HashMap;

use tessera_common::{SoundChannel, SoundId};
use tracing::debug;

use crate::mixer::{AudioError, AudioResult};
use crate::sound::{Sound, LOOP_FOREVER};

/// Owner of every loaded audio asset.
#[derive(Debug, Default)]
pub struct AudioRegistry {
    music: HashMap<SoundId, Sound>,
    sounds: HashMap<SoundId, Sound>,
}

fn checked_id(sound: &Sound) -> AudioResult<SoundId> {
    let id = sound.id().ok_or(AudioError::InvalidId)?;
    if !sound.is_loaded() {
        return Err(AudioError::NotLoaded(Some(id)));
    }
    Ok(id)
}

impl AudioRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a music track. The track is bound to the first music slot
    /// and set to loop forever.
    pub fn add_music(&mut self, mut sound: Sound) -> AudioResult<()> {
        let id = checked_id(&sound)?;
        sound.set_channel(SoundChannel::Music1);
        sound.set_loop_count(LOOP_FOREVER);
        if self.music.insert(id, sound).is_some() {
            debug!("Replaced music {}", id);
        }
        Ok(())
    }

    /// Register a sound effect. The effect is bound to the tile channel
    /// and plays once.
    pub fn add_sound(&mut self, mut sound: Sound) -> AudioResult<()> {
        let id = checked_id(&sound)?;
        sound.set_channel(SoundChannel::Tiles);
        sound.set_loop_count(0);
        if self.sounds.insert(id, sound).is_some() {
            debug!("Replaced sound {}", id);
        }
        Ok(())
    }

    /// Look up a music track.
    #[must_use]
    pub fn get_audio_music(&self, id: SoundId) -> Option<&Sound> {
        self.music.get(&id)
    }

    /// Look up a sound effect.
    #[must_use]
    pub fn get_audio_sound(&self, id: SoundId) -> Option<&Sound> {
        self.sounds.get(&id)
    }

    /// Look up a music track mutably.
    pub fn get_audio_music_mut(&mut self, id: SoundId) -> Option<&mut Sound> {
        self.music.get_mut(&id)
    }

    /// Look up a sound effect mutably.
    pub fn get_audio_sound_mut(&mut self, id: SoundId) -> Option<&mut Sound> {
        self.sounds.get_mut(&id)
    }

    /// Look up a music track, registering an empty one if absent.
    pub fn create_audio_music(&mut self, id: SoundId) -> &mut Sound {
        self.music.entry(id).or_insert_with(|| {
            let mut sound = Sound::with_id(id);
            sound.set_channel(SoundChannel::Music1);
            sound.set_loop_forever();
            sound
        })
    }

    /// Look up a sound effect, registering an empty one if absent.
    pub fn create_audio_sound(&mut self, id: SoundId) -> &mut Sound {
        self.sounds.entry(id).or_insert_with(|| {
            let mut sound = Sound::with_id(id);
            sound.set_channel(SoundChannel::Tiles);
            sound
        })
    }

    /// Remove a music track. Returns true if it existed.
    pub fn remove_music(&mut self, id: SoundId) -> bool {
        self.music.remove(&id).is_some()
    }

    /// Remove a sound effect. Returns true if it existed.
    pub fn remove_sound(&mut self, id: SoundId) -> bool {
        self.sounds.remove(&id).is_some()
    }

    /// Remove every asset.
    pub fn remove_all(&mut self) {
        self.music.clear();
        self.sounds.clear();
    }

    /// Number of music tracks.
    #[must_use]
    pub fn music_count(&self) -> usize {
        self.music.len()
    }

    /// Number of sound effects.
    #[must_use]
    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }
}
