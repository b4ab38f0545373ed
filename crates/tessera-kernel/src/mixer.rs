//! Mixer boundary.
//!
//! The audio handler drives playback exclusively through [`Mixer`]: a small
//! channel-oriented command set (play, halt, fade out) plus a cheap
//! `channel_playing` query. Two implementations ship with the kernel:
//!
//! - [`RodioMixer`](crate::rodio_mixer::RodioMixer): real output device
//! - [`HeadlessMixer`](crate::headless_mixer::HeadlessMixer): simulated
//!   channels for machines without audio and for tests

use std::path::PathBuf;
use std::time::Duration;

use tessera_common::{SoundChannel, SoundId};
use thiserror::Error;

use crate::clip::AudioClip;

/// Maximum per-asset volume.
pub const MAX_VOLUME: u8 = 255;

/// Audio error types.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to initialize audio device.
    #[error("Failed to initialize audio device: {0}")]
    DeviceInitFailed(String),

    /// Failed to create audio sink.
    #[error("Failed to create audio sink: {0}")]
    SinkCreationFailed(String),

    /// Failed to load audio file.
    #[error("Failed to load audio file '{path}': {message}")]
    IoLoad {
        /// Path to the file that failed to load.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to decode audio data.
    #[error("Failed to decode audio: {0}")]
    DecodeFailed(String),

    /// Asset has no id and cannot be registered.
    #[error("Audio asset has no valid id")]
    InvalidId,

    /// Asset has no decoded data.
    #[error("Audio asset {0:?} has no decoded data")]
    NotLoaded(Option<SoundId>),

    /// Asset is not bound to a channel.
    #[error("Audio asset is not bound to a channel")]
    ChannelUnassigned,

    /// Channel is occupied and the caller asked not to stop it.
    #[error("Channel {0:?} is busy")]
    ChannelBusy(SoundChannel),

    /// Cross-fade against the asset's own channel.
    #[error("Cannot cross-fade channel {0:?} against itself")]
    SameChannel(SoundChannel),
}

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Playback parameters taken from an asset at play time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayParams {
    /// Fade-in duration in milliseconds (0 = start at full volume).
    pub fade_ms: u32,
    /// Extra passes after the first; -1 loops forever.
    pub loop_count: i32,
    /// Asset volume (0-255).
    pub volume: u8,
}

impl Default for PlayParams {
    fn default() -> Self {
        Self {
            fade_ms: 0,
            loop_count: 0,
            volume: MAX_VOLUME,
        }
    }
}

impl PlayParams {
    /// Total number of passes, or `None` when looping forever.
    #[must_use]
    pub fn passes(&self) -> Option<u32> {
        u32::try_from(self.loop_count).ok().map(|n| n.saturating_add(1))
    }

    /// Fade-in as a duration.
    #[must_use]
    pub fn fade(&self) -> Duration {
        Duration::from_millis(u64::from(self.fade_ms))
    }

    /// Asset volume scaled to 0.0-1.0.
    #[must_use]
    pub fn gain(&self) -> f32 {
        f32::from(self.volume) / f32::from(MAX_VOLUME)
    }
}

/// Category volumes applied on top of per-asset volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixVolumes {
    /// Master volume (0.0 - 1.0).
    pub master: f32,
    /// Music volume (0.0 - 1.0).
    pub music: f32,
    /// Everything that is not music (0.0 - 1.0).
    pub sfx: f32,
}

impl Default for MixVolumes {
    fn default() -> Self {
        Self {
            master: 1.0,
            music: 0.7,
            sfx: 1.0,
        }
    }
}

impl MixVolumes {
    /// Returns the effective volume for a channel (includes master).
    #[must_use]
    pub fn effective(&self, channel: SoundChannel) -> f32 {
        let category = if channel.is_music() {
            self.music
        } else {
            self.sfx
        };
        (self.master * category).clamp(0.0, 1.0)
    }

    /// Clamp values to valid ranges.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            master: self.master.clamp(0.0, 1.0),
            music: self.music.clamp(0.0, 1.0),
            sfx: self.sfx.clamp(0.0, 1.0),
        }
    }
}

/// Channel-oriented playback backend.
///
/// All methods are called from the game loop thread. `channel_playing`
/// must stay true while a channel is fading out.
pub trait Mixer {
    /// Returns true if anything is audible on the channel.
    fn channel_playing(&self, channel: SoundChannel) -> bool;

    /// Stops the channel immediately.
    fn halt_channel(&mut self, channel: SoundChannel);

    /// Fades the channel out and stops it. A zero fade halts immediately.
    fn fade_out_channel(&mut self, channel: SoundChannel, fade_ms: u32);

    /// Starts a clip on the channel, replacing whatever occupied it.
    fn play(&mut self, channel: SoundChannel, clip: &AudioClip, params: PlayParams)
        -> AudioResult<()>;

    /// Starts a clip on `channel` while fading `out_channel` over the same
    /// duration.
    fn cross_fade(
        &mut self,
        channel: SoundChannel,
        clip: &AudioClip,
        params: PlayParams,
        out_channel: SoundChannel,
    ) -> AudioResult<()> {
        self.play(channel, clip, params)?;
        self.fade_out_channel(out_channel, params.fade_ms);
        Ok(())
    }

    /// Replaces the category volumes.
    fn set_volumes(&mut self, volumes: MixVolumes);

    /// Advances fades and reaps finished channels. Called once per frame.
    fn update(&mut self, _elapsed: Duration) {}
}

impl<M: Mixer + ?Sized> Mixer for Box<M> {
    fn channel_playing(&self, channel: SoundChannel) -> bool {
        (**self).channel_playing(channel)
    }

    fn halt_channel(&mut self, channel: SoundChannel) {
        (**self).halt_channel(channel);
    }

    fn fade_out_channel(&mut self, channel: SoundChannel, fade_ms: u32) {
        (**self).fade_out_channel(channel, fade_ms);
    }

    fn play(
        &mut self,
        channel: SoundChannel,
        clip: &AudioClip,
        params: PlayParams,
    ) -> AudioResult<()> {
        (**self).play(channel, clip, params)
    }

    fn cross_fade(
        &mut self,
        channel: SoundChannel,
        clip: &AudioClip,
        params: PlayParams,
        out_channel: SoundChannel,
    ) -> AudioResult<()> {
        (**self).cross_fade(channel, clip, params, out_channel)
    }

    fn set_volumes(&mut self, volumes: MixVolumes) {
        (**self).set_volumes(volumes);
    }

    fn update(&mut self, elapsed: Duration) {
        (**self).update(elapsed);
    }
}
