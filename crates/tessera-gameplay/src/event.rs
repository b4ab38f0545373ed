//! Event model.
//!
//! An [`Event`] is a classified signal produced by world interaction and
//! consumed by the presentation layer. Its payload is a flat list of
//! integers whose layout depends on the classification, plus an optional
//! conversation and, for battles, optional win/lose follow-up events.
//!
//! | classification | ints                                                     |
//! |----------------|----------------------------------------------------------|
//! | StartConvo     | `[]` (conversation attached)                             |
//! | RunBattle      | `[flags]` (win/lose events attached)                     |
//! | PickupItem     | `[walkover]`                                             |
//! | GiveItem       | `[item, count]`                                          |
//! | TakeItem       | `[item, count]`                                          |
//! | Notification   | `[]` (text carried as a single conversation node)        |
//! | StartMap       | `[map]`                                                  |
//! | Teleport       | `[thing, x, y, section]`                                 |
//! | TriggerIo      | `[state]`                                                |
//! | UnlockIo       | `[io, mode, state, events, view, view_time]`             |
//! | UnlockThing    | `[thing, view, view_time]`                               |
//! | UnlockTile     | `[section, x, y, events, view, view_time]`               |
//! | JustSound      | `[music]` (sound id carried separately)                  |
//!
//! Constructors build well-formed events; the `data_*` parsers are their
//! inverse and return `None` when the classification or arity is wrong.
//! Unsigned values (ids, counts, flags, view times) are stored with their
//! bit pattern intact, so every `u32` reads back unchanged.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tessera_common::{ItemId, MapId, SectionTile, SoundChannel, SoundId, SoundRequest, ThingId};

use crate::conversation::Conversation;

/// Event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventClassification {
    /// No event. Never enqueued.
    #[default]
    NoEvent,
    /// Start a conversation.
    StartConvo,
    /// Launch a battle.
    RunBattle,
    /// Pick up a map item.
    PickupItem,
    /// Give items to the player.
    GiveItem,
    /// Take items from the player.
    TakeItem,
    /// Show a notification.
    Notification,
    /// Switch to another map.
    StartMap,
    /// Move a thing to another tile.
    Teleport,
    /// An interactive object changed state.
    TriggerIo,
    /// Unlock an interactive object.
    UnlockIo,
    /// Unlock a thing.
    UnlockThing,
    /// Unlock a tile.
    UnlockTile,
    /// Only play a sound.
    JustSound,
}

bitflags! {
    /// Battle options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct BattleFlags: u32 {
        /// The player may flee.
        const CAN_RUN = 0x01;
        /// Losing does not end the game.
        const SURVIVE_LOSS = 0x02;
        /// Restore the party once the battle is over.
        const HEAL_AFTER = 0x04;
        /// Keep the current map music during the battle.
        const KEEP_MUSIC = 0x08;
    }
}

bitflags! {
    /// What an interactive object unlock changes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct UnlockIoMode: u32 {
        /// Clear the object's own lock.
        const LOCK = 0x01;
        /// Jump the object to the given state.
        const STATE = 0x02;
        /// Re-enable events on the given state.
        const EVENTS = 0x04;
    }
}

bitflags! {
    /// Trigger kinds re-enabled by an unlock.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct UnlockEvents: u32 {
        /// Entering the tile or object.
        const ENTER = 0x01;
        /// Leaving the tile or object.
        const EXIT = 0x02;
        /// Using (action key) the object.
        const USE = 0x04;
        /// Walking over the object.
        const WALKOVER = 0x08;
    }
}

bitflags! {
    /// How the camera presents an unlock.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ViewMode: u32 {
        /// Scroll the camera to the target.
        const SCROLL = 0x01;
        /// Fade to the target.
        const FADE = 0x02;
        /// Return the camera to the player afterwards.
        const RETURN = 0x04;
    }
}

/// Camera presentation of an unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnlockView {
    /// Camera mode.
    pub mode: ViewMode,
    /// How long to show the target, in milliseconds.
    pub time_ms: u32,
}

impl UnlockView {
    /// No camera movement.
    pub const NONE: Self = Self {
        mode: ViewMode::empty(),
        time_ms: 0,
    };

    /// Create a view.
    #[must_use]
    pub const fn new(mode: ViewMode, time_ms: u32) -> Self {
        Self { mode, time_ms }
    }
}

/// Parsed battle payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleSetup {
    /// Battle options.
    pub flags: BattleFlags,
    /// Event to run when the player wins.
    pub win: Option<Event>,
    /// Event to run when the player loses.
    pub lose: Option<Event>,
}

/// Parsed give/take item payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTransfer {
    /// Item type.
    pub item: ItemId,
    /// Number of items.
    pub count: u32,
}

/// Parsed teleport payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeleportTarget {
    /// Thing to move.
    pub thing: ThingId,
    /// Destination.
    pub destination: SectionTile,
}

/// Parsed interactive object unlock payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockIo {
    /// Object to unlock.
    pub io: ThingId,
    /// What to change.
    pub mode: UnlockIoMode,
    /// Target state for [`UnlockIoMode::STATE`] and [`UnlockIoMode::EVENTS`].
    pub state: i32,
    /// Events to re-enable.
    pub events: UnlockEvents,
    /// Camera presentation.
    pub view: UnlockView,
}

/// Parsed thing unlock payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockThing {
    /// Thing to unlock.
    pub thing: ThingId,
    /// Camera presentation.
    pub view: UnlockView,
}

/// Parsed tile unlock payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockTile {
    /// Tile to unlock.
    pub tile: SectionTile,
    /// Events to re-enable.
    pub events: UnlockEvents,
    /// Camera presentation.
    pub view: UnlockView,
}

/// Parsed sound-only payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundCue {
    /// Track or effect to play.
    pub sound: SoundId,
    /// True for a music track, which goes to the music bus.
    pub music: bool,
}

#[allow(clippy::cast_possible_wrap)]
const fn int(value: u32) -> i32 {
    value as i32
}

const fn uint(value: i32) -> u32 {
    value as u32
}

/// A classified world event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    classification: EventClassification,
    one_shot: bool,
    has_exec: bool,
    sound_id: Option<SoundId>,
    ints: Vec<i32>,
    convo: Option<Conversation>,
    win_event: Option<Box<Event>>,
    lose_event: Option<Box<Event>>,
}

impl Event {
    fn with_ints(classification: EventClassification, ints: Vec<i32>) -> Self {
        Self {
            classification,
            ints,
            ..Self::default()
        }
    }

    /// An empty event of classification [`EventClassification::NoEvent`].
    #[must_use]
    pub fn blank() -> Self {
        Self::default()
    }

    /// Start a conversation.
    #[must_use]
    pub fn start_conversation(convo: Conversation) -> Self {
        Self {
            convo: Some(convo),
            ..Self::with_ints(EventClassification::StartConvo, Vec::new())
        }
    }

    /// Launch a battle with optional win/lose follow-ups.
    #[must_use]
    pub fn start_battle(flags: BattleFlags, win: Option<Event>, lose: Option<Event>) -> Self {
        Self {
            win_event: win.map(Box::new),
            lose_event: lose.map(Box::new),
            ..Self::with_ints(EventClassification::RunBattle, vec![int(flags.bits())])
        }
    }

    /// Pick up a map item, either by walking over it or by using it.
    #[must_use]
    pub fn pickup(walkover: bool) -> Self {
        Self::with_ints(EventClassification::PickupItem, vec![i32::from(walkover)])
    }

    /// Give items to the player.
    #[must_use]
    pub fn give_item(item: ItemId, count: u32) -> Self {
        Self::with_ints(
            EventClassification::GiveItem,
            vec![int(item.raw()), int(count)],
        )
    }

    /// Take items from the player.
    #[must_use]
    pub fn take_item(item: ItemId, count: u32) -> Self {
        Self::with_ints(
            EventClassification::TakeItem,
            vec![int(item.raw()), int(count)],
        )
    }

    /// Show a notification.
    #[must_use]
    pub fn notification(text: impl Into<String>) -> Self {
        Self {
            convo: Some(Conversation::new(text)),
            ..Self::with_ints(EventClassification::Notification, Vec::new())
        }
    }

    /// Switch to another map.
    #[must_use]
    pub fn start_map(map: MapId) -> Self {
        Self::with_ints(EventClassification::StartMap, vec![int(map.raw())])
    }

    /// Move a thing to a tile in a map section.
    #[must_use]
    pub fn teleport(thing: ThingId, x: i32, y: i32, section: i32) -> Self {
        Self::with_ints(
            EventClassification::Teleport,
            vec![int(thing.raw()), x, y, section],
        )
    }

    /// An interactive object changed to `state`.
    #[must_use]
    pub fn trigger_io(state: i32) -> Self {
        Self::with_ints(EventClassification::TriggerIo, vec![state])
    }

    /// Unlock an interactive object.
    #[must_use]
    pub fn unlock_io(
        io: ThingId,
        mode: UnlockIoMode,
        state: i32,
        events: UnlockEvents,
        view: UnlockView,
    ) -> Self {
        Self::with_ints(
            EventClassification::UnlockIo,
            vec![
                int(io.raw()),
                int(mode.bits()),
                state,
                int(events.bits()),
                int(view.mode.bits()),
                int(view.time_ms),
            ],
        )
    }

    /// Unlock a thing.
    #[must_use]
    pub fn unlock_thing(thing: ThingId, view: UnlockView) -> Self {
        Self::with_ints(
            EventClassification::UnlockThing,
            vec![int(thing.raw()), int(view.mode.bits()), int(view.time_ms)],
        )
    }

    /// Unlock a tile.
    #[must_use]
    pub fn unlock_tile(tile: SectionTile, events: UnlockEvents, view: UnlockView) -> Self {
        Self::with_ints(
            EventClassification::UnlockTile,
            vec![
                tile.section,
                tile.tile.x,
                tile.tile.y,
                int(events.bits()),
                int(view.mode.bits()),
                int(view.time_ms),
            ],
        )
    }

    /// Only play a sound effect.
    #[must_use]
    pub fn just_sound(sound: SoundId) -> Self {
        Self {
            sound_id: Some(sound),
            ..Self::with_ints(EventClassification::JustSound, vec![0])
        }
    }

    /// Only change the music. The track cross-fades against whatever is
    /// playing.
    #[must_use]
    pub fn just_music(track: SoundId) -> Self {
        Self {
            sound_id: Some(track),
            ..Self::with_ints(EventClassification::JustSound, vec![1])
        }
    }

    /// Attach a sound played when the event is consumed.
    #[must_use]
    pub fn with_sound(mut self, sound: SoundId) -> Self {
        self.sound_id = Some(sound);
        self
    }

    /// Mark the event as executable only once.
    #[must_use]
    pub fn with_one_shot(mut self, one_shot: bool) -> Self {
        self.one_shot = one_shot;
        self
    }

    /// Get the classification.
    #[must_use]
    pub const fn classification(&self) -> EventClassification {
        self.classification
    }

    /// Returns true for [`EventClassification::NoEvent`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.classification == EventClassification::NoEvent
    }

    /// Returns true if the event may execute only once.
    #[must_use]
    pub const fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    /// Set the one-shot flag.
    pub fn set_one_shot(&mut self, one_shot: bool) {
        self.one_shot = one_shot;
    }

    /// Returns true once the event has been consumed.
    #[must_use]
    pub const fn has_exec(&self) -> bool {
        self.has_exec
    }

    /// Returns true for a one-shot event that has already been consumed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.one_shot && self.has_exec
    }

    /// Latch the event as consumed.
    pub fn mark_executed(&mut self) {
        self.has_exec = true;
    }

    /// Clear the consumed latch (used when a session restarts).
    pub fn reset_executed(&mut self) {
        self.has_exec = false;
    }

    /// Sound played on consumption.
    #[must_use]
    pub const fn sound_id(&self) -> Option<SoundId> {
        self.sound_id
    }

    /// Audio request issued when the event is consumed.
    ///
    /// Music cues go to the music bus; every other sound plays on
    /// [`SoundChannel::Triggers`].
    #[must_use]
    pub fn sound_request(&self) -> Option<SoundRequest> {
        let id = self.sound_id?;
        let channel = match self.data_just_sound() {
            Some(cue) if cue.music => SoundChannel::Music1,
            _ => SoundChannel::Triggers,
        };
        Some(SoundRequest::Play { id, channel })
    }

    /// Set or clear the sound played on consumption.
    pub fn set_sound_id(&mut self, sound: Option<SoundId>) {
        self.sound_id = sound;
    }

    /// Raw integer payload.
    #[must_use]
    pub fn ints(&self) -> &[i32] {
        &self.ints
    }

    /// Attached conversation, if any.
    #[must_use]
    pub const fn convo(&self) -> Option<&Conversation> {
        self.convo.as_ref()
    }

    fn payload(&self, classification: EventClassification, arity: usize) -> Option<&[i32]> {
        (self.classification == classification && self.ints.len() == arity)
            .then_some(self.ints.as_slice())
    }

    /// Parse a conversation payload.
    #[must_use]
    pub fn data_conversation(&self) -> Option<&Conversation> {
        self.payload(EventClassification::StartConvo, 0)?;
        self.convo.as_ref()
    }

    /// Parse a battle payload.
    #[must_use]
    pub fn data_start_battle(&self) -> Option<BattleSetup> {
        let ints = self.payload(EventClassification::RunBattle, 1)?;
        Some(BattleSetup {
            flags: BattleFlags::from_bits_truncate(uint(ints[0])),
            win: self.win_event.as_deref().cloned(),
            lose: self.lose_event.as_deref().cloned(),
        })
    }

    /// Parse a pickup payload. Returns the walkover flag.
    #[must_use]
    pub fn data_pickup(&self) -> Option<bool> {
        let ints = self.payload(EventClassification::PickupItem, 1)?;
        Some(ints[0] != 0)
    }

    fn transfer(&self, classification: EventClassification) -> Option<ItemTransfer> {
        let ints = self.payload(classification, 2)?;
        Some(ItemTransfer {
            item: ItemId::new(uint(ints[0])),
            count: uint(ints[1]),
        })
    }

    /// Parse a give item payload.
    #[must_use]
    pub fn data_give_item(&self) -> Option<ItemTransfer> {
        self.transfer(EventClassification::GiveItem)
    }

    /// Parse a take item payload.
    #[must_use]
    pub fn data_take_item(&self) -> Option<ItemTransfer> {
        self.transfer(EventClassification::TakeItem)
    }

    /// Parse a notification payload.
    #[must_use]
    pub fn data_notification(&self) -> Option<&str> {
        self.payload(EventClassification::Notification, 0)?;
        self.convo.as_ref().map(|c| c.text.as_str())
    }

    /// Parse a map start payload.
    #[must_use]
    pub fn data_start_map(&self) -> Option<MapId> {
        let ints = self.payload(EventClassification::StartMap, 1)?;
        Some(MapId::new(uint(ints[0])))
    }

    /// Parse a teleport payload.
    #[must_use]
    pub fn data_teleport(&self) -> Option<TeleportTarget> {
        let ints = self.payload(EventClassification::Teleport, 4)?;
        Some(TeleportTarget {
            thing: ThingId::new(uint(ints[0])),
            destination: SectionTile::new(ints[3], ints[1], ints[2]),
        })
    }

    /// Parse an interactive object trigger payload. Returns the new state.
    #[must_use]
    pub fn data_trigger_io(&self) -> Option<i32> {
        let ints = self.payload(EventClassification::TriggerIo, 1)?;
        Some(ints[0])
    }

    /// Parse an interactive object unlock payload.
    #[must_use]
    pub fn data_unlock_io(&self) -> Option<UnlockIo> {
        let ints = self.payload(EventClassification::UnlockIo, 6)?;
        Some(UnlockIo {
            io: ThingId::new(uint(ints[0])),
            mode: UnlockIoMode::from_bits_truncate(uint(ints[1])),
            state: ints[2],
            events: UnlockEvents::from_bits_truncate(uint(ints[3])),
            view: UnlockView::new(ViewMode::from_bits_truncate(uint(ints[4])), uint(ints[5])),
        })
    }

    /// Parse a thing unlock payload.
    #[must_use]
    pub fn data_unlock_thing(&self) -> Option<UnlockThing> {
        let ints = self.payload(EventClassification::UnlockThing, 3)?;
        Some(UnlockThing {
            thing: ThingId::new(uint(ints[0])),
            view: UnlockView::new(ViewMode::from_bits_truncate(uint(ints[1])), uint(ints[2])),
        })
    }

    /// Parse a tile unlock payload.
    #[must_use]
    pub fn data_unlock_tile(&self) -> Option<UnlockTile> {
        let ints = self.payload(EventClassification::UnlockTile, 6)?;
        Some(UnlockTile {
            tile: SectionTile::new(ints[0], ints[1], ints[2]),
            events: UnlockEvents::from_bits_truncate(uint(ints[3])),
            view: UnlockView::new(ViewMode::from_bits_truncate(uint(ints[4])), uint(ints[5])),
        })
    }

    /// Parse a sound-only payload.
    #[must_use]
    pub fn data_just_sound(&self) -> Option<SoundCue> {
        let ints = self.payload(EventClassification::JustSound, 1)?;
        Some(SoundCue {
            sound: self.sound_id?,
            music: ints[0] != 0,
        })
    }
}
