//! Playable audio assets.
//!
//! A [`Sound`] pairs decoded sample data with the playback settings the
//! dispatcher needs: the channel it is bound to, a fade time shared by
//! fade-in, fade-out and cross-fade, a loop count and a volume.

use std::path::Path;

use tessera_common::{SoundChannel, SoundId};
use tracing::debug;

use crate::clip::AudioClip;
use crate::mixer::{AudioError, AudioResult, Mixer, PlayParams, MAX_VOLUME};

/// Loop count meaning "repeat forever".
pub const LOOP_FOREVER: i32 = -1;

/// One music track or sound effect.
#[derive(Debug, Clone)]
pub struct Sound {
    id: Option<SoundId>,
    channel: SoundChannel,
    /// Fade duration in milliseconds (0 = no fade).
    fade_time: u32,
    /// Extra passes after the first; [`LOOP_FOREVER`] loops forever.
    loop_count: i32,
    volume: u8,
    raw_data: Option<AudioClip>,
}

impl Default for Sound {
    fn default() -> Self {
        Self {
            id: None,
            channel: SoundChannel::Unassigned,
            fade_time: 0,
            loop_count: 0,
            volume: MAX_VOLUME,
            raw_data: None,
        }
    }
}

impl Sound {
    /// Create an empty, unbound asset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty asset with the given id.
    #[must_use]
    pub fn with_id(id: SoundId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Asset id, if any.
    #[must_use]
    pub const fn id(&self) -> Option<SoundId> {
        self.id
    }

    /// Set the asset id.
    pub fn set_id(&mut self, id: SoundId) {
        self.id = Some(id);
    }

    /// Bound channel.
    #[must_use]
    pub const fn channel(&self) -> SoundChannel {
        self.channel
    }

    /// Bind the asset to a channel.
    pub fn set_channel(&mut self, channel: SoundChannel) {
        self.channel = channel;
    }

    /// Fade time in milliseconds.
    #[must_use]
    pub const fn fade_time(&self) -> u32 {
        self.fade_time
    }

    /// Set the fade time in milliseconds.
    pub fn set_fade_time(&mut self, fade_ms: u32) {
        self.fade_time = fade_ms;
    }

    /// Loop count (-1 = forever).
    #[must_use]
    pub const fn loop_count(&self) -> i32 {
        self.loop_count
    }

    /// Set the loop count. Anything below -1 is treated as forever.
    pub fn set_loop_count(&mut self, loop_count: i32) {
        self.loop_count = loop_count.max(LOOP_FOREVER);
    }

    /// Loop this asset forever.
    pub fn set_loop_forever(&mut self) {
        self.loop_count = LOOP_FOREVER;
    }

    /// Returns true if the asset loops forever.
    #[must_use]
    pub const fn loops_forever(&self) -> bool {
        self.loop_count == LOOP_FOREVER
    }

    /// Volume (0-255).
    #[must_use]
    pub const fn volume(&self) -> u8 {
        self.volume
    }

    /// Set the volume (0-255).
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
    }

    /// Decode an audio file into this asset.
    pub fn set_sound_file(&mut self, path: impl AsRef<Path>) -> AudioResult<()> {
        self.raw_data = Some(AudioClip::from_file(path)?);
        Ok(())
    }

    /// Decode an in-memory audio file into this asset.
    pub fn set_sound_data(&mut self, data: Vec<u8>) -> AudioResult<()> {
        self.raw_data = Some(AudioClip::from_bytes(data)?);
        Ok(())
    }

    /// Attach already decoded sample data.
    pub fn set_clip(&mut self, clip: AudioClip) {
        self.raw_data = Some(clip);
    }

    /// Decoded sample data, if loaded.
    #[must_use]
    pub const fn clip(&self) -> Option<&AudioClip> {
        self.raw_data.as_ref()
    }

    /// Returns true if sample data is present.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.raw_data.is_some()
    }

    /// Playback parameters for the mixer.
    #[must_use]
    pub const fn params(&self) -> PlayParams {
        PlayParams {
            fade_ms: self.fade_time,
            loop_count: self.loop_count,
            volume: self.volume,
        }
    }

    fn playable(&self) -> AudioResult<&AudioClip> {
        if !self.channel.is_assigned() {
            return Err(AudioError::ChannelUnassigned);
        }
        self.raw_data.as_ref().ok_or(AudioError::NotLoaded(self.id))
    }

    /// Start playback on the bound channel.
    ///
    /// An occupied channel is replaced when `stop_channel` is true and
    /// reported as [`AudioError::ChannelBusy`] otherwise.
    pub fn play<M: Mixer + ?Sized>(&self, mixer: &mut M, stop_channel: bool) -> AudioResult<()> {
        let clip = self.playable()?;
        if mixer.channel_playing(self.channel) {
            if !stop_channel {
                return Err(AudioError::ChannelBusy(self.channel));
            }
            mixer.halt_channel(self.channel);
        }

        debug!("Playing {:?} on {:?}", self.id, self.channel);
        mixer.play(self.channel, clip, self.params())
    }

    /// Stop the bound channel, fading out over the fade time when set.
    ///
    /// With `stop_channel` false the command is only issued while the
    /// channel is playing. Returns true if a command was issued.
    pub fn stop<M: Mixer + ?Sized>(&self, mixer: &mut M, stop_channel: bool) -> bool {
        if !self.channel.is_assigned() {
            return false;
        }
        if !stop_channel && !mixer.channel_playing(self.channel) {
            return false;
        }

        if self.fade_time > 0 {
            mixer.fade_out_channel(self.channel, self.fade_time);
        } else {
            mixer.halt_channel(self.channel);
        }
        true
    }

    /// Fade in on the bound channel while fading out `other_channel`.
    pub fn cross_fade<M: Mixer + ?Sized>(
        &self,
        mixer: &mut M,
        other_channel: SoundChannel,
    ) -> AudioResult<()> {
        let clip = self.playable()?;
        if other_channel == self.channel {
            return Err(AudioError::SameChannel(self.channel));
        }

        debug!(
            "Cross-fading {:?} on {:?} against {:?} ({} ms)",
            self.id, self.channel, other_channel, self.fade_time
        );
        mixer.cross_fade(self.channel, clip, self.params(), other_channel)
    }
}
