//! Mixer backed by a rodio output device.
//!
//! Each logical channel owns at most one [`Sink`]. Starting a clip on a
//! channel replaces its sink; fade-outs ramp the sink volume down from
//! [`Mixer::update`] and stop it once the ramp completes.

use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tessera_common::SoundChannel;
use tracing::{debug, info};

use crate::clip::AudioClip;
use crate::mixer::{AudioError, AudioResult, MixVolumes, Mixer, PlayParams};

/// In-progress fade-out.
#[derive(Debug, Clone, Copy)]
struct FadeOut {
    elapsed: Duration,
    duration: Duration,
}

/// A sink bound to one channel.
struct ChannelSink {
    sink: Sink,
    /// Asset gain (0.0-1.0) before category volumes.
    gain: f32,
    fade_out: Option<FadeOut>,
}

impl std::fmt::Debug for ChannelSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSink")
            .field("gain", &self.gain)
            .field("fade_out", &self.fade_out)
            .field("empty", &self.sink.empty())
            .finish_non_exhaustive()
    }
}

/// Real audio output.
pub struct RodioMixer {
    /// The output stream (must be kept alive).
    _stream: OutputStream,
    /// Handle for creating sinks.
    handle: OutputStreamHandle,
    channels: [Option<ChannelSink>; SoundChannel::COUNT],
    volumes: MixVolumes,
}

impl std::fmt::Debug for RodioMixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioMixer")
            .field("channels", &self.channels)
            .field("volumes", &self.volumes)
            .finish_non_exhaustive()
    }
}

impl RodioMixer {
    /// Open the default output device.
    pub fn new() -> AudioResult<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::DeviceInitFailed(e.to_string()))?;

        info!("Audio device initialized");

        Ok(Self {
            _stream: stream,
            handle,
            channels: Default::default(),
            volumes: MixVolumes::default(),
        })
    }

    fn create_sink(&self) -> AudioResult<Sink> {
        Sink::try_new(&self.handle).map_err(|e| AudioError::SinkCreationFailed(e.to_string()))
    }

    fn slot_mut(&mut self, channel: SoundChannel) -> Option<&mut Option<ChannelSink>> {
        channel.index().map(|i| &mut self.channels[i])
    }
}

impl Mixer for RodioMixer {
    fn channel_playing(&self, channel: SoundChannel) -> bool {
        channel
            .index()
            .and_then(|i| self.channels[i].as_ref())
            .is_some_and(|c| !c.sink.empty())
    }

    fn halt_channel(&mut self, channel: SoundChannel) {
        if let Some(slot) = self.slot_mut(channel) {
            if let Some(current) = slot.take() {
                current.sink.stop();
                debug!("Halted {:?}", channel);
            }
        }
    }

    fn fade_out_channel(&mut self, channel: SoundChannel, fade_ms: u32) {
        if fade_ms == 0 {
            self.halt_channel(channel);
            return;
        }
        if let Some(Some(current)) = self.slot_mut(channel) {
            current.fade_out = Some(FadeOut {
                elapsed: Duration::ZERO,
                duration: Duration::from_millis(u64::from(fade_ms)),
            });
        }
    }

    fn play(
        &mut self,
        channel: SoundChannel,
        clip: &AudioClip,
        params: PlayParams,
    ) -> AudioResult<()> {
        if !channel.is_assigned() {
            return Err(AudioError::ChannelUnassigned);
        }
        self.halt_channel(channel);

        let sink = self.create_sink()?;
        let gain = params.gain();
        sink.set_volume(gain * self.volumes.effective(channel));

        sink.append(clip.source(params.passes()).fade_in(params.fade()));

        if let Some(slot) = self.slot_mut(channel) {
            *slot = Some(ChannelSink {
                sink,
                gain,
                fade_out: None,
            });
        }
        Ok(())
    }

    fn set_volumes(&mut self, volumes: MixVolumes) {
        self.volumes = volumes.clamped();
        for (channel, slot) in SoundChannel::all().into_iter().zip(&self.channels) {
            if let Some(current) = slot {
                if current.fade_out.is_none() {
                    current
                        .sink
                        .set_volume(current.gain * self.volumes.effective(channel));
                }
            }
        }
    }

    fn update(&mut self, elapsed: Duration) {
        let volumes = self.volumes;
        for (channel, slot) in SoundChannel::all().into_iter().zip(self.channels.iter_mut()) {
            let Some(current) = slot.as_mut() else {
                continue;
            };

            if let Some(fade) = current.fade_out.as_mut() {
                fade.elapsed += elapsed;
                if fade.elapsed >= fade.duration {
                    current.sink.stop();
                } else {
                    let remaining =
                        1.0 - fade.elapsed.as_secs_f32() / fade.duration.as_secs_f32();
                    current
                        .sink
                        .set_volume(current.gain * volumes.effective(channel) * remaining);
                }
            }

            if current.sink.empty() {
                *slot = None;
            }
        }
    }
}
