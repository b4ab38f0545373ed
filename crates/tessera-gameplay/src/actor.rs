//! World actor references.
//!
//! The event layer never owns or inspects map objects. It stores these
//! lightweight references and hands them back to the caller, who resolves
//! them against the world.

use serde::{Deserialize, Serialize};
use tessera_common::{ItemId, ThingId};

/// Kinds of map actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// A walking character.
    Person,
    /// A static or animated thing.
    Thing,
    /// A thing with states that reacts to the player.
    InteractiveObject,
}

/// Capability to identify a world actor.
pub trait Identify {
    /// The actor's id.
    fn thing_id(&self) -> ThingId;

    /// The actor's kind.
    fn kind(&self) -> ActorKind;
}

/// Non-owning reference to a map actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRef {
    /// A person.
    Person(ThingId),
    /// A thing.
    Thing(ThingId),
    /// An interactive object.
    InteractiveObject(ThingId),
}

impl ActorRef {
    /// Returns true for interactive objects.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::InteractiveObject(_))
    }
}

impl Identify for ActorRef {
    fn thing_id(&self) -> ThingId {
        match self {
            Self::Person(id) | Self::Thing(id) | Self::InteractiveObject(id) => *id,
        }
    }

    fn kind(&self) -> ActorKind {
        match self {
            Self::Person(_) => ActorKind::Person,
            Self::Thing(_) => ActorKind::Thing,
            Self::InteractiveObject(_) => ActorKind::InteractiveObject,
        }
    }
}

impl std::fmt::Display for ActorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}", self.kind(), self.thing_id())
    }
}

/// Non-owning reference to an item lying on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    /// The map object carrying the item.
    pub thing: ThingId,
    /// Item type.
    pub item: ItemId,
    /// Stack size.
    pub count: u32,
}

impl ItemRef {
    /// Create an item reference.
    #[must_use]
    pub const fn new(thing: ThingId, item: ItemId, count: u32) -> Self {
        Self { thing, item, count }
    }
}

impl Identify for ItemRef {
    fn thing_id(&self) -> ThingId {
        self.thing
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Thing
    }
}
