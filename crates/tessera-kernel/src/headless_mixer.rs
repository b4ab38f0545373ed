//! Simulated mixer.
//!
//! Tracks channel occupancy, clip lengths and fade-outs without an output
//! device. The engine falls back to it when no device can be opened, and
//! tests use its command log to observe dispatch decisions.

use std::time::Duration;

use tessera_common::SoundChannel;
use tracing::debug;

use crate::clip::AudioClip;
use crate::mixer::{AudioError, AudioResult, MixVolumes, Mixer, PlayParams};

/// A command received by the headless mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerCommand {
    /// A clip was started.
    Play {
        /// Target channel.
        channel: SoundChannel,
        /// Parameters used.
        params: PlayParams,
    },
    /// A channel started fading out.
    FadeOut {
        /// Fading channel.
        channel: SoundChannel,
        /// Fade duration in milliseconds.
        fade_ms: u32,
    },
    /// A channel was stopped immediately.
    Halt {
        /// Halted channel.
        channel: SoundChannel,
    },
}

/// Simulated state of one channel.
#[derive(Debug, Clone, Copy)]
struct ChannelState {
    /// Time left until the clip ends (`None` loops forever).
    remaining: Option<Duration>,
    /// Time left until a fade-out completes.
    fade_out: Option<Duration>,
}

/// Mixer that simulates playback in memory.
#[derive(Debug, Default)]
pub struct HeadlessMixer {
    channels: [Option<ChannelState>; SoundChannel::COUNT],
    log: Vec<MixerCommand>,
    volumes: MixVolumes,
}

impl HeadlessMixer {
    /// Create a mixer with every channel idle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> &[MixerCommand] {
        &self.log
    }

    /// Take and clear the command log.
    pub fn take_commands(&mut self) -> Vec<MixerCommand> {
        std::mem::take(&mut self.log)
    }

    /// Returns true if the channel is in the middle of a fade-out.
    #[must_use]
    pub fn is_fading_out(&self, channel: SoundChannel) -> bool {
        self.state(channel).is_some_and(|s| s.fade_out.is_some())
    }

    /// Channels currently playing, in mixer order.
    #[must_use]
    pub fn playing_channels(&self) -> Vec<SoundChannel> {
        SoundChannel::all()
            .into_iter()
            .filter(|c| self.channel_playing(*c))
            .collect()
    }

    /// Current category volumes.
    #[must_use]
    pub const fn volumes(&self) -> MixVolumes {
        self.volumes
    }

    fn state(&self, channel: SoundChannel) -> Option<&ChannelState> {
        channel.index().and_then(|i| self.channels[i].as_ref())
    }

    fn slot(&mut self, channel: SoundChannel) -> Option<&mut Option<ChannelState>> {
        channel.index().map(|i| &mut self.channels[i])
    }
}

impl Mixer for HeadlessMixer {
    fn channel_playing(&self, channel: SoundChannel) -> bool {
        self.state(channel).is_some()
    }

    fn halt_channel(&mut self, channel: SoundChannel) {
        if let Some(slot) = self.slot(channel) {
            *slot = None;
            self.log.push(MixerCommand::Halt { channel });
        }
    }

    fn fade_out_channel(&mut self, channel: SoundChannel, fade_ms: u32) {
        if fade_ms == 0 {
            self.halt_channel(channel);
            return;
        }
        let Some(slot) = self.slot(channel) else {
            return;
        };
        if let Some(state) = slot.as_mut() {
            state.fade_out = Some(Duration::from_millis(u64::from(fade_ms)));
        }
        self.log.push(MixerCommand::FadeOut { channel, fade_ms });
    }

    fn play(
        &mut self,
        channel: SoundChannel,
        clip: &AudioClip,
        params: PlayParams,
    ) -> AudioResult<()> {
        let slot = self.slot(channel).ok_or(AudioError::ChannelUnassigned)?;
        let remaining = params.passes().map(|n| clip.duration() * n);
        *slot = Some(ChannelState {
            remaining,
            fade_out: None,
        });
        self.log.push(MixerCommand::Play { channel, params });
        debug!("Headless play on {:?} for {:?}", channel, remaining);
        Ok(())
    }

    fn set_volumes(&mut self, volumes: MixVolumes) {
        self.volumes = volumes.clamped();
    }

    fn update(&mut self, elapsed: Duration) {
        for slot in &mut self.channels {
            let Some(state) = slot.as_mut() else {
                continue;
            };
            let finished_fade = match state.fade_out.as_mut() {
                Some(left) if *left <= elapsed => true,
                Some(left) => {
                    *left -= elapsed;
                    false
                },
                None => false,
            };
            let finished_clip = match state.remaining.as_mut() {
                Some(left) if *left <= elapsed => true,
                Some(left) => {
                    *left -= elapsed;
                    false
                },
                None => false,
            };
            if finished_fade || finished_clip {
                *slot = None;
            }
        }
    }
}
