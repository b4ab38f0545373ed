//! Event scripts.
//!
//! A script is a RON file describing what the world does and when: which
//! events and event sets exist, and which actions fire on which frame.
//! The binary replays scripts through the full frame loop, which makes them
//! handy both for demos and for reproducing event/audio bugs.
//!
//! ```ron
//! (
//!     version: (major: 1, minor: 1, patch: 0),
//!     sets: [
//!         (
//!             selection: First,
//!             lock: Item(item: 3, count: 1, consume: true),
//!             events: [(kind: Notification("The door opens."), one_shot: true)],
//!         ),
//!     ],
//!     actions: [
//!         (frame: 0, action: Music(100)),
//!         (frame: 5, action: EventSet(set: 0, source: Some(Io(12)))),
//!     ],
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_common::{
    ItemId, MapId, SchemaVersion, SectionTile, SoundChannel, SoundId, TesseraError,
    TesseraResult, ThingId,
};
use tessera_gameplay::{
    ActorRef, BattleFlags, Conversation, Event, EventCatalog, EventSelection, EventSet,
    EventSetRef, GameKey, Lock, UnlockEvents, UnlockIoMode, UnlockView,
};
use tracing::info;

/// A world actor named by raw thing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptActor {
    /// A person.
    Person(u32),
    /// A plain thing.
    Thing(u32),
    /// An interactive object.
    Io(u32),
}

impl From<ScriptActor> for ActorRef {
    fn from(actor: ScriptActor) -> Self {
        match actor {
            ScriptActor::Person(id) => Self::Person(ThingId::new(id)),
            ScriptActor::Thing(id) => Self::Thing(ThingId::new(id)),
            ScriptActor::Io(id) => Self::InteractiveObject(ThingId::new(id)),
        }
    }
}

/// Event payloads, one per classification a script can create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptEventKind {
    /// Start a conversation.
    Conversation(Conversation),
    /// Launch a battle.
    Battle {
        /// Battle options.
        #[serde(default)]
        flags: BattleFlags,
        /// Follow-up when the player wins.
        #[serde(default)]
        win: Option<Box<ScriptEvent>>,
        /// Follow-up when the player loses.
        #[serde(default)]
        lose: Option<Box<ScriptEvent>>,
    },
    /// Give items to the player.
    GiveItem {
        /// Item type.
        item: u32,
        /// Count.
        count: u32,
    },
    /// Take items from the player.
    TakeItem {
        /// Item type.
        item: u32,
        /// Count.
        count: u32,
    },
    /// Show a notification.
    Notification(String),
    /// Switch maps.
    StartMap(u32),
    /// Move a thing.
    Teleport {
        /// Thing to move.
        thing: u32,
        /// Section index.
        section: i32,
        /// Tile column.
        x: i32,
        /// Tile row.
        y: i32,
    },
    /// Unlock an interactive object.
    UnlockIo {
        /// The object.
        io: u32,
        /// What to change.
        #[serde(default)]
        mode: UnlockIoMode,
        /// Target state.
        #[serde(default)]
        state: i32,
        /// Triggers to re-enable.
        #[serde(default)]
        events: UnlockEvents,
        /// Camera presentation.
        #[serde(default)]
        view: UnlockView,
    },
    /// Unlock a thing.
    UnlockThing {
        /// The thing.
        thing: u32,
        /// Camera presentation.
        #[serde(default)]
        view: UnlockView,
    },
    /// Unlock a tile.
    UnlockTile {
        /// Section index.
        section: i32,
        /// Tile column.
        x: i32,
        /// Tile row.
        y: i32,
        /// Triggers to re-enable.
        #[serde(default)]
        events: UnlockEvents,
        /// Camera presentation.
        #[serde(default)]
        view: UnlockView,
    },
    /// Only play a sound effect.
    Sound(u32),
    /// Only change the music.
    Music(u32),
}

/// A scripted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// Payload.
    pub kind: ScriptEventKind,
    /// Execute at most once.
    #[serde(default)]
    pub one_shot: bool,
    /// Sound played when the event is consumed.
    #[serde(default)]
    pub sound: Option<u32>,
}

impl ScriptEvent {
    /// Build the runtime event.
    #[must_use]
    pub fn to_event(&self) -> Event {
        let event = match &self.kind {
            ScriptEventKind::Conversation(convo) => Event::start_conversation(convo.clone()),
            ScriptEventKind::Battle { flags, win, lose } => Event::start_battle(
                *flags,
                win.as_deref().map(Self::to_event),
                lose.as_deref().map(Self::to_event),
            ),
            ScriptEventKind::GiveItem { item, count } => {
                Event::give_item(ItemId::new(*item), *count)
            },
            ScriptEventKind::TakeItem { item, count } => {
                Event::take_item(ItemId::new(*item), *count)
            },
            ScriptEventKind::Notification(text) => Event::notification(text.clone()),
            ScriptEventKind::StartMap(map) => Event::start_map(MapId::new(*map)),
            ScriptEventKind::Teleport {
                thing,
                section,
                x,
                y,
            } => Event::teleport(ThingId::new(*thing), *x, *y, *section),
            ScriptEventKind::UnlockIo {
                io,
                mode,
                state,
                events,
                view,
            } => Event::unlock_io(ThingId::new(*io), *mode, *state, *events, *view),
            ScriptEventKind::UnlockThing { thing, view } => {
                Event::unlock_thing(ThingId::new(*thing), *view)
            },
            ScriptEventKind::UnlockTile {
                section,
                x,
                y,
                events,
                view,
            } => Event::unlock_tile(SectionTile::new(*section, *x, *y), *events, *view),
            ScriptEventKind::Sound(id) => Event::just_sound(SoundId::new(*id)),
            ScriptEventKind::Music(id) => Event::just_music(SoundId::new(*id)),
        };

        let event = event.with_one_shot(self.one_shot);
        match self.sound {
            Some(sound) => event.with_sound(SoundId::new(sound)),
            None => event,
        }
    }
}

/// Lock of a scripted event set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptLock {
    /// Not locked.
    #[default]
    Unlocked,
    /// Requires items.
    Item {
        /// Item type.
        item: u32,
        /// Required count.
        count: u32,
        /// Remove the items on unlock.
        #[serde(default)]
        consume: bool,
    },
    /// Requires an external unlock.
    Trigger,
}

impl From<ScriptLock> for Lock {
    fn from(lock: ScriptLock) -> Self {
        match lock {
            ScriptLock::Unlocked => Self::Unlocked,
            ScriptLock::Item {
                item,
                count,
                consume,
            } => Self::Item {
                item: ItemId::new(item),
                count,
                consume,
            },
            ScriptLock::Trigger => Self::Trigger,
        }
    }
}

/// A scripted event set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSet {
    /// Selection rule.
    #[serde(default)]
    pub selection: EventSelection,
    /// Lock.
    #[serde(default)]
    pub lock: ScriptLock,
    /// Members.
    pub events: Vec<ScriptEvent>,
}

/// Something the world does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptAction {
    /// Enqueue an event.
    Event {
        /// The event.
        event: ScriptEvent,
        /// Actor the event belongs to.
        #[serde(default)]
        source: Option<ScriptActor>,
    },
    /// Enqueue one of the script's event sets (by index).
    EventSet {
        /// Index into the script's sets.
        set: usize,
        /// Actor the set belongs to.
        #[serde(default)]
        source: Option<ScriptActor>,
    },
    /// Report an interactive object state change.
    IoTrigger {
        /// The object.
        io: u32,
        /// New state.
        state: i32,
    },
    /// Pick up a map item.
    Pickup {
        /// Thing carrying the item.
        thing: u32,
        /// Item type.
        item: u32,
        /// Stack size.
        count: u32,
        /// Walked over rather than used.
        #[serde(default)]
        walkover: bool,
    },
    /// Open a trigger-locked set (a switch was flipped).
    UnlockSet(usize),
    /// Request a music track.
    Music(u32),
    /// Request a sound effect.
    Sound {
        /// Sound id.
        id: u32,
        /// Target channel.
        channel: SoundChannel,
    },
    /// Halt a channel.
    Stop(SoundChannel),
    /// Press or release a key.
    Key {
        /// The key.
        key: GameKey,
        /// Pressed or released.
        pressed: bool,
    },
}

/// An action scheduled on a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedAction {
    /// Frame number (0-based).
    pub frame: u64,
    /// What happens.
    pub action: ScriptAction,
}

/// A complete event script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventScript {
    /// File format version.
    #[serde(default)]
    pub version: SchemaVersion,
    /// Event sets, referenced by index.
    #[serde(default)]
    pub sets: Vec<ScriptSet>,
    /// Scheduled actions.
    #[serde(default)]
    pub actions: Vec<TimedAction>,
}

impl EventScript {
    /// Parse script text. `file` names the source in errors.
    pub fn parse(text: &str, file: &str) -> TesseraResult<Self> {
        let mut script: Self = ron::from_str(text).map_err(|e| TesseraError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        })?;

        if !SchemaVersion::EVENT_SCRIPT.is_compatible_with(&script.version) {
            return Err(TesseraError::VersionMismatch {
                expected: SchemaVersion::EVENT_SCRIPT,
                actual: script.version,
            });
        }

        if let Some(bad) = script.actions.iter().find_map(|a| match a.action {
            ScriptAction::EventSet { set, .. } | ScriptAction::UnlockSet(set)
                if set >= script.sets.len() =>
            {
                Some(set)
            },
            _ => None,
        }) {
            return Err(TesseraError::Parse {
                file: file.to_string(),
                message: format!("action refers to set {bad}, script has {}", script.sets.len()),
            });
        }

        script.actions.sort_by_key(|a| a.frame);
        Ok(script)
    }

    /// Read and parse a script file.
    pub fn load(path: impl AsRef<Path>) -> TesseraResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let script = Self::parse(&text, &path.display().to_string())?;
        info!(
            "Loaded script {} ({} sets, {} actions)",
            path.display(),
            script.sets.len(),
            script.actions.len()
        );
        Ok(script)
    }

    /// Frame of the last action, if any.
    #[must_use]
    pub fn last_frame(&self) -> Option<u64> {
        self.actions.last().map(|a| a.frame)
    }

    /// Register the script's sets in a catalog. The returned refs are
    /// indexed like [`EventScript::sets`].
    pub fn install(&self, catalog: &mut EventCatalog) -> Vec<EventSetRef> {
        self.sets
            .iter()
            .map(|set| {
                let events = set.events.iter().map(ScriptEvent::to_event).collect();
                catalog.insert_set(
                    EventSet::from_events(set.selection, events).with_lock(set.lock.into()),
                )
            })
            .collect()
    }

    /// Actions scheduled on `frame`, in file order.
    pub fn actions_at(&self, frame: u64) -> impl Iterator<Item = &ScriptAction> + '_ {
        let start = self.actions.partition_point(|a| a.frame < frame);
        self.actions[start..]
            .iter()
            .take_while(move |a| a.frame == frame)
            .map(|a| &a.action)
    }
}
