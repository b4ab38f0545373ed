//! Audio request types shared by the event layer and the audio handler.
//!
//! The event handler never touches audio assets directly. It sends
//! [`SoundRequest`]s through a [`SoundTrigger`], and the audio handler
//! drains them once per frame.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of requests the audio handler reserves room for.
pub const DEFAULT_SOUND_QUEUE_CAPACITY: usize = 256;

/// Identifier of a music track or sound effect.
///
/// Music ids and sound ids live in separate namespaces: music `7` and
/// sound `7` are different assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoundId(u32);

impl SoundId {
    /// Creates a sound ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Converts a signed id where negative values mean "no sound".
    #[must_use]
    pub fn from_signed(value: i32) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }
}

impl std::fmt::Display for SoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical mixer channel.
///
/// Music is reserved a pair of channels so one track can fade out while
/// the next fades in. Every other category gets a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoundChannel {
    /// Not bound to any channel yet.
    #[default]
    Unassigned,
    /// First music slot.
    Music1,
    /// Second music slot.
    Music2,
    /// First weather layer.
    Weather1,
    /// Second weather layer.
    Weather2,
    /// Menu sounds.
    Menus,
    /// Tile sounds.
    Tiles,
    /// Sounds emitted by map things.
    Things,
    /// Sounds emitted by map sections.
    Sectors,
    /// Sounds attached to consumed events.
    Triggers,
}

impl SoundChannel {
    /// Number of real (assignable) channels.
    pub const COUNT: usize = 9;

    /// Returns the mixer slot index, or `None` for [`SoundChannel::Unassigned`].
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Unassigned => None,
            Self::Music1 => Some(0),
            Self::Music2 => Some(1),
            Self::Weather1 => Some(2),
            Self::Weather2 => Some(3),
            Self::Menus => Some(4),
            Self::Tiles => Some(5),
            Self::Things => Some(6),
            Self::Sectors => Some(7),
            Self::Triggers => Some(8),
        }
    }

    /// Returns true for the two music slots.
    #[must_use]
    pub const fn is_music(self) -> bool {
        matches!(self, Self::Music1 | Self::Music2)
    }

    /// Returns true if the channel can carry playback.
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        !matches!(self, Self::Unassigned)
    }

    /// All assignable channels in mixer order.
    #[must_use]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Music1,
            Self::Music2,
            Self::Weather1,
            Self::Weather2,
            Self::Menus,
            Self::Tiles,
            Self::Things,
            Self::Sectors,
            Self::Triggers,
        ]
    }
}

/// A queued request for the audio handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundRequest {
    /// Play an asset on a channel. Music channels select the music
    /// registry, every other channel selects the sound registry.
    Play {
        /// Asset to play.
        id: SoundId,
        /// Requested channel.
        channel: SoundChannel,
    },
    /// Halt whatever occupies a channel.
    Stop {
        /// Channel to halt.
        channel: SoundChannel,
    },
}

impl SoundRequest {
    /// Returns the channel this request targets.
    #[must_use]
    pub const fn channel(&self) -> SoundChannel {
        match self {
            Self::Play { channel, .. } | Self::Stop { channel } => *channel,
        }
    }
}

/// Sending half of the audio request queue.
///
/// Cheap to clone; every holder enqueues into the same audio handler.
#[derive(Debug, Clone)]
pub struct SoundTrigger {
    sender: Sender<SoundRequest>,
}

impl SoundTrigger {
    /// Enqueues a request. Returns false only if the audio handler is
    /// gone.
    pub fn request(&self, request: SoundRequest) -> bool {
        match self.sender.send(request) {
            Ok(()) => true,
            Err(e) => {
                debug!("Audio handler gone, dropping {:?}", e.into_inner());
                false
            },
        }
    }

    /// Requests a sound effect on the given channel.
    pub fn trigger_sound(&self, id: SoundId, channel: SoundChannel) -> bool {
        self.request(SoundRequest::Play { id, channel })
    }

    /// Requests a music track. The dispatcher picks the actual music slot.
    pub fn trigger_music(&self, id: SoundId) -> bool {
        self.request(SoundRequest::Play {
            id,
            channel: SoundChannel::Music1,
        })
    }

    /// Requests that a channel be halted.
    pub fn stop_channel(&self, channel: SoundChannel) -> bool {
        self.request(SoundRequest::Stop { channel })
    }
}

/// Creates an audio request queue.
///
/// The queue is unbounded: every request made while polling reaches the
/// audio handler, however many events a frame consumes.
#[must_use]
pub fn sound_queue() -> (SoundTrigger, Receiver<SoundRequest>) {
    let (sender, receiver) = unbounded();
    (SoundTrigger { sender }, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_indices_are_unique() {
        let mut seen = [false; SoundChannel::COUNT];
        for channel in SoundChannel::all() {
            let idx = channel.index().expect("assigned channel has an index");
            assert!(!seen[idx]);
            seen[idx] = true;
        }
        assert_eq!(SoundChannel::Unassigned.index(), None);
    }

    #[test]
    fn test_trigger_music_targets_first_slot() {
        let (trigger, receiver) = sound_queue();
        assert!(trigger.trigger_music(SoundId::new(100)));
        assert_eq!(
            receiver.try_recv().ok(),
            Some(SoundRequest::Play {
                id: SoundId::new(100),
                channel: SoundChannel::Music1
            })
        );
    }

    #[test]
    fn test_burst_is_not_dropped() {
        let (trigger, receiver) = sound_queue();
        for id in 0..1000 {
            assert!(trigger.trigger_sound(SoundId::new(id), SoundChannel::Triggers));
        }
        assert_eq!(receiver.try_iter().count(), 1000);
    }

    #[test]
    fn test_disconnected_queue_drops() {
        let (trigger, receiver) = sound_queue();
        drop(receiver);
        assert!(!trigger.trigger_sound(SoundId::new(1), SoundChannel::Triggers));
    }

    #[test]
    fn test_signed_sound_id() {
        assert_eq!(SoundId::from_signed(-1), None);
        assert_eq!(SoundId::from_signed(7), Some(SoundId::new(7)));
    }
}
