//! Audio request dispatcher.
//!
//! The [`SoundHandler`] owns every audio asset and the mixer. Gameplay code
//! holds a [`SoundTrigger`] and enqueues requests at any time; the game
//! loop calls [`SoundHandler::process`] once per frame to drain them.
//!
//! Music uses two slots so consecutive tracks can cross-fade:
//!
//! ```text
//!   playing before   | new track goes to | and
//!   -----------------+-------------------+---------------------------
//!   nothing          | Music1            | plays
//!   Music1           | Music2            | cross-fades against Music1
//!   Music2           | Music1            | cross-fades against Music2
//!   both             | (Music2 halted, then as "Music1")
//! ```
//!
//! A music request for a track that is already audible on either slot is
//! dropped, so repeated triggers inside a fade window are harmless. Sound
//! requests only play on an idle channel.

use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::Receiver;
use tessera_common::{
    sound_queue, SoundChannel, SoundId, SoundRequest, SoundTrigger, DEFAULT_SOUND_QUEUE_CAPACITY,
};
use tracing::{debug, info, warn};

use crate::mixer::{MixVolumes, Mixer};
use crate::registry::AudioRegistry;

/// Which registry entry occupies a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioKey {
    /// A music track.
    Music(SoundId),
    /// A sound effect.
    Sound(SoundId),
}

/// Owner of the audio registries, the mixer and the request queue.
#[derive(Debug)]
pub struct SoundHandler<M: Mixer> {
    registry: AudioRegistry,
    mixer: M,
    trigger: SoundTrigger,
    receiver: Receiver<SoundRequest>,
    /// Requests pulled off the channel but not dispatched yet.
    queue: Vec<SoundRequest>,
    /// Last asset started on each channel.
    owners: HashMap<SoundChannel, AudioKey>,
}

impl<M: Mixer> SoundHandler<M> {
    /// Create a handler with the default queue capacity.
    pub fn new(mixer: M) -> Self {
        Self::with_capacity(mixer, DEFAULT_SOUND_QUEUE_CAPACITY)
    }

    /// Create a handler with room for `capacity` pending requests. The
    /// queue grows past that if a frame needs it.
    pub fn with_capacity(mixer: M, capacity: usize) -> Self {
        let (trigger, receiver) = sound_queue();
        info!("Sound handler ready (queue capacity {})", capacity);
        Self {
            registry: AudioRegistry::new(),
            mixer,
            trigger,
            receiver,
            queue: Vec::with_capacity(capacity),
            owners: HashMap::new(),
        }
    }

    /// A sender for enqueuing requests from gameplay code.
    #[must_use]
    pub fn trigger(&self) -> SoundTrigger {
        self.trigger.clone()
    }

    /// Requests waiting for the next [`process`](Self::process), oldest
    /// first.
    pub fn queued(&mut self) -> &[SoundRequest] {
        self.sync_queue();
        &self.queue
    }

    fn sync_queue(&mut self) {
        self.queue.extend(self.receiver.try_iter());
    }

    /// Drain and dispatch every pending request in FIFO order.
    ///
    /// Returns the number of requests handled. The queue is empty
    /// afterwards whether or not individual requests were dropped.
    pub fn process(&mut self) -> usize {
        self.sync_queue();
        let pending = std::mem::take(&mut self.queue);
        let count = pending.len();

        for request in pending {
            match request {
                SoundRequest::Play { id, channel } if channel.is_music() => {
                    self.dispatch_music(id);
                },
                SoundRequest::Play { id, channel } if channel.is_assigned() => {
                    self.dispatch_sound(id, channel);
                },
                SoundRequest::Play { id, .. } => {
                    warn!("Dropping sound {} requested without a channel", id);
                },
                SoundRequest::Stop { channel } => self.halt(channel),
            }
        }

        count
    }

    fn is_audible(&self, key: AudioKey) -> bool {
        self.owners
            .iter()
            .any(|(channel, owner)| *owner == key && self.mixer.channel_playing(*channel))
    }

    fn dispatch_music(&mut self, id: SoundId) {
        let key = AudioKey::Music(id);
        match self.registry.get_audio_music(id) {
            Some(track) if track.is_loaded() => {},
            _ => {
                warn!("Dropping request for unknown music {}", id);
                return;
            },
        }
        if self.is_audible(key) {
            debug!("Music {} already playing", id);
            return;
        }

        let p1 = self.mixer.channel_playing(SoundChannel::Music1);
        let mut p2 = self.mixer.channel_playing(SoundChannel::Music2);
        if p1 && p2 {
            self.halt(SoundChannel::Music2);
            p2 = self.mixer.channel_playing(SoundChannel::Music2);
        }

        let (channel, fade_from) = match (p1, p2) {
            (false, false) => (SoundChannel::Music1, None),
            (true, false) => (SoundChannel::Music2, Some(SoundChannel::Music1)),
            (_, true) => (SoundChannel::Music1, Some(SoundChannel::Music2)),
        };

        let Some(track) = self.registry.get_audio_music_mut(id) else {
            return;
        };
        track.set_channel(channel);
        let result = match fade_from {
            None => track.play(&mut self.mixer, true),
            Some(out) => track.cross_fade(&mut self.mixer, out),
        };

        match result {
            Ok(()) => {
                debug!("Music {} on {:?} (fading out {:?})", id, channel, fade_from);
                self.owners.insert(channel, key);
            },
            Err(e) => warn!("Failed to start music {}: {}", id, e),
        }
    }

    fn dispatch_sound(&mut self, id: SoundId, channel: SoundChannel) {
        if self.mixer.channel_playing(channel) {
            debug!("Channel {:?} busy, dropping sound {}", channel, id);
            return;
        }
        let Some(effect) = self.registry.get_audio_sound_mut(id) else {
            warn!("Dropping request for unknown sound {}", id);
            return;
        };

        effect.set_channel(channel);
        match effect.play(&mut self.mixer, false) {
            Ok(()) => {
                self.owners.insert(channel, AudioKey::Sound(id));
            },
            Err(e) => warn!("Failed to play sound {}: {}", id, e),
        }
    }

    /// Halt a channel immediately.
    pub fn halt(&mut self, channel: SoundChannel) {
        if !channel.is_assigned() {
            return;
        }
        self.mixer.halt_channel(channel);
        self.owners.remove(&channel);
    }

    /// Advance the mixer and forget channels that went silent.
    pub fn update(&mut self, elapsed: Duration) {
        self.mixer.update(elapsed);
        let mixer = &self.mixer;
        self.owners.retain(|channel, _| mixer.channel_playing(*channel));
    }

    /// The asset audible on a channel, if any.
    #[must_use]
    pub fn playing_on(&self, channel: SoundChannel) -> Option<AudioKey> {
        self.owners
            .get(&channel)
            .copied()
            .filter(|_| self.mixer.channel_playing(channel))
    }

    fn halt_owned_by(&mut self, key: AudioKey) {
        let channels: Vec<SoundChannel> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == key)
            .map(|(channel, _)| *channel)
            .collect();
        for channel in channels {
            self.halt(channel);
        }
    }

    /// Remove a music track, halting it first if audible.
    pub fn remove_music(&mut self, id: SoundId) -> bool {
        self.halt_owned_by(AudioKey::Music(id));
        self.registry.remove_music(id)
    }

    /// Remove a sound effect, halting it first if audible.
    pub fn remove_sound(&mut self, id: SoundId) -> bool {
        self.halt_owned_by(AudioKey::Sound(id));
        self.registry.remove_sound(id)
    }

    /// Halt every channel and drop every asset.
    pub fn remove_all(&mut self) {
        for channel in SoundChannel::all() {
            self.halt(channel);
        }
        self.registry.remove_all();
    }

    /// The asset registries.
    #[must_use]
    pub const fn registry(&self) -> &AudioRegistry {
        &self.registry
    }

    /// The asset registries, mutably (for loading).
    pub fn registry_mut(&mut self) -> &mut AudioRegistry {
        &mut self.registry
    }

    /// The mixer backend.
    #[must_use]
    pub const fn mixer(&self) -> &M {
        &self.mixer
    }

    /// The mixer backend, mutably.
    pub fn mixer_mut(&mut self) -> &mut M {
        &mut self.mixer
    }

    /// Apply category volumes.
    pub fn set_volumes(&mut self, volumes: MixVolumes) {
        self.mixer.set_volumes(volumes);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::clip::AudioClip;
    use crate::headless_mixer::{HeadlessMixer, MixerCommand};
    use crate::sound::Sound;

    fn clip() -> AudioClip {
        AudioClip::silence(Duration::from_millis(500), 1000, 1)
    }

    fn handler() -> SoundHandler<HeadlessMixer> {
        let mut handler = SoundHandler::new(HeadlessMixer::new());
        for id in [100, 200, 300] {
            let mut track = Sound::with_id(SoundId::new(id));
            track.set_fade_time(1000);
            track.set_clip(clip());
            handler.registry_mut().add_music(track).expect("add music");
        }
        let mut effect = Sound::with_id(SoundId::new(7));
        effect.set_clip(clip());
        handler.registry_mut().add_sound(effect).expect("add sound");
        handler
    }

    fn music(id: u32) -> Option<AudioKey> {
        Some(AudioKey::Music(SoundId::new(id)))
    }

    #[test]
    fn test_first_track_plays_on_music1() {
        let mut handler = handler();
        let trigger = handler.trigger();
        trigger.trigger_music(SoundId::new(100));

        assert_eq!(handler.process(), 1);
        assert_eq!(handler.playing_on(SoundChannel::Music1), music(100));
        assert_eq!(handler.playing_on(SoundChannel::Music2), None);
        assert!(handler.queued().is_empty());
    }

    #[test]
    fn test_second_track_cross_fades() {
        let mut handler = handler();
        let trigger = handler.trigger();

        trigger.trigger_music(SoundId::new(100));
        handler.process();
        handler.update(Duration::from_secs(5));
        handler.mixer_mut().take_commands();

        trigger.trigger_music(SoundId::new(200));
        handler.process();

        assert_eq!(handler.playing_on(SoundChannel::Music2), music(200));
        assert!(handler.mixer().is_fading_out(SoundChannel::Music1));
        let commands = handler.mixer().commands();
        assert!(matches!(
            commands[0],
            MixerCommand::Play {
                channel: SoundChannel::Music2,
                ..
            }
        ));
        assert_eq!(
            commands[1],
            MixerCommand::FadeOut {
                channel: SoundChannel::Music1,
                fade_ms: 1000
            }
        );

        // Music1 falls silent once the fade completes.
        handler.update(Duration::from_millis(1000));
        assert_eq!(handler.playing_on(SoundChannel::Music1), None);
        assert_eq!(handler.playing_on(SoundChannel::Music2), music(200));
    }

    #[test]
    fn test_two_requests_in_one_frame() {
        let mut handler = handler();
        let trigger = handler.trigger();
        trigger.trigger_music(SoundId::new(100));
        trigger.trigger_music(SoundId::new(200));

        assert_eq!(handler.process(), 2);
        assert!(handler.queued().is_empty());

        let commands = handler.mixer().commands();
        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[0],
            MixerCommand::Play {
                channel: SoundChannel::Music1,
                ..
            }
        ));
        assert!(matches!(
            commands[1],
            MixerCommand::Play {
                channel: SoundChannel::Music2,
                ..
            }
        ));
        assert!(matches!(
            commands[2],
            MixerCommand::FadeOut {
                channel: SoundChannel::Music1,
                ..
            }
        ));
    }

    #[test]
    fn test_third_track_halts_music2() {
        let mut handler = handler();
        let trigger = handler.trigger();
        for id in [100, 200, 300] {
            trigger.trigger_music(SoundId::new(id));
        }
        handler.process();

        assert!(handler.mixer().commands().contains(&MixerCommand::Halt {
            channel: SoundChannel::Music2
        }));
        assert_eq!(handler.playing_on(SoundChannel::Music2), music(300));
        assert_eq!(handler.playing_on(SoundChannel::Music1), music(100));
    }

    #[test]
    fn test_repeated_music_is_idempotent() {
        let mut handler = handler();
        let trigger = handler.trigger();
        trigger.trigger_music(SoundId::new(100));
        trigger.trigger_music(SoundId::new(100));
        handler.process();

        trigger.trigger_music(SoundId::new(100));
        handler.process();

        assert_eq!(handler.mixer().commands().len(), 1);
        assert_eq!(handler.playing_on(SoundChannel::Music2), None);
    }

    #[test]
    fn test_single_music_request_leaves_one_slot() {
        let mut handler = handler();
        handler.trigger().trigger_music(SoundId::new(200));
        handler.process();
        let music_channels = handler
            .mixer()
            .playing_channels()
            .into_iter()
            .filter(|c| c.is_music())
            .count();
        assert_eq!(music_channels, 1);
    }

    #[test]
    fn test_sound_needs_idle_channel() {
        let mut handler = handler();
        let trigger = handler.trigger();
        trigger.trigger_sound(SoundId::new(7), SoundChannel::Triggers);
        trigger.trigger_sound(SoundId::new(7), SoundChannel::Triggers);
        handler.process();

        assert_eq!(handler.mixer().commands().len(), 1);
        assert_eq!(
            handler.playing_on(SoundChannel::Triggers),
            Some(AudioKey::Sound(SoundId::new(7)))
        );
    }

    #[test]
    fn test_unknown_and_unassigned_dropped() {
        let mut handler = handler();
        let trigger = handler.trigger();
        trigger.trigger_sound(SoundId::new(7), SoundChannel::Unassigned);
        trigger.trigger_sound(SoundId::new(99), SoundChannel::Menus);
        trigger.trigger_music(SoundId::new(99));

        assert_eq!(handler.process(), 3);
        assert!(handler.mixer().commands().is_empty());
    }

    #[test]
    fn test_stop_request_halts() {
        let mut handler = handler();
        let trigger = handler.trigger();
        trigger.trigger_sound(SoundId::new(7), SoundChannel::Tiles);
        trigger.stop_channel(SoundChannel::Tiles);
        handler.process();

        assert_eq!(handler.playing_on(SoundChannel::Tiles), None);
        assert_eq!(
            handler.mixer().commands().last(),
            Some(&MixerCommand::Halt {
                channel: SoundChannel::Tiles
            })
        );
    }

    #[test]
    fn test_remove_music_halts_owner() {
        let mut handler = handler();
        handler.trigger().trigger_music(SoundId::new(100));
        handler.process();

        assert!(handler.remove_music(SoundId::new(100)));
        assert!(!handler.mixer().channel_playing(SoundChannel::Music1));
        assert!(handler.registry().get_audio_music(SoundId::new(100)).is_none());
    }

    #[test]
    fn test_finished_sound_frees_channel() {
        let mut handler = handler();
        let trigger = handler.trigger();
        trigger.trigger_sound(SoundId::new(7), SoundChannel::Menus);
        handler.process();
        handler.update(Duration::from_millis(500));
        assert_eq!(handler.playing_on(SoundChannel::Menus), None);

        trigger.trigger_sound(SoundId::new(7), SoundChannel::Menus);
        handler.process();
        assert_eq!(handler.mixer().commands().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_last_requested_track_is_audible(
            frames in prop::collection::vec(prop::collection::vec(0usize..3, 1..4), 1..6)
        ) {
            let ids = [100u32, 200, 300];
            let mut handler = handler();
            let trigger = handler.trigger();

            for frame in frames {
                let last = ids[*frame.last().expect("non-empty")];
                for pick in frame {
                    trigger.trigger_music(SoundId::new(ids[pick]));
                }
                handler.process();

                let on_slots = [
                    handler.playing_on(SoundChannel::Music1),
                    handler.playing_on(SoundChannel::Music2),
                ];
                prop_assert!(on_slots.contains(&music(last)));
                handler.update(Duration::from_millis(400));
            }
        }
    }
}
