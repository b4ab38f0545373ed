//! Event catalog.
//!
//! World objects do not own the events they fire. Events that must keep
//! state across executions (one-shots, sets with locks) live in an
//! [`EventCatalog`] arena and are addressed by stable ids. The catalog is
//! shared between the world and the event handler so that consuming an
//! event latches it for every later reference.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::event_set::EventSet;

/// Stable id of a catalog event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRef(u32);

impl EventRef {
    /// Returns the raw index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Stable id of a catalog event set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventSetRef(u32);

impl EventSetRef {
    /// Returns the raw index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Catalog shared between the world and the event handler.
pub type SharedCatalog = Arc<RwLock<EventCatalog>>;

/// Arena of events and event sets. Entries are never removed, so ids stay
/// valid for the lifetime of the catalog.
#[derive(Debug, Default)]
pub struct EventCatalog {
    events: Vec<Event>,
    sets: Vec<EventSet>,
}

impl EventCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the catalog for sharing.
    #[must_use]
    pub fn into_shared(self) -> SharedCatalog {
        Arc::new(RwLock::new(self))
    }

    /// Store an event.
    pub fn insert_event(&mut self, event: Event) -> EventRef {
        self.events.push(event);
        EventRef((self.events.len() - 1) as u32)
    }

    /// Store an event set.
    pub fn insert_set(&mut self, set: EventSet) -> EventSetRef {
        self.sets.push(set);
        EventSetRef((self.sets.len() - 1) as u32)
    }

    /// Look up an event.
    #[must_use]
    pub fn event(&self, id: EventRef) -> Option<&Event> {
        self.events.get(id.0 as usize)
    }

    /// Look up an event mutably.
    pub fn event_mut(&mut self, id: EventRef) -> Option<&mut Event> {
        self.events.get_mut(id.0 as usize)
    }

    /// Look up an event set.
    #[must_use]
    pub fn set(&self, id: EventSetRef) -> Option<&EventSet> {
        self.sets.get(id.0 as usize)
    }

    /// Look up an event set mutably.
    pub fn set_mut(&mut self, id: EventSetRef) -> Option<&mut EventSet> {
        self.sets.get_mut(id.0 as usize)
    }

    /// Number of stored events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of stored sets.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Clear every executed latch (new game).
    pub fn reset_executed(&mut self) {
        for event in &mut self.events {
            event.reset_executed();
        }
        for set in &mut self.sets {
            set.reset_executed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_set::EventSelection;

    #[test]
    fn test_ids_are_stable() {
        let mut catalog = EventCatalog::new();
        let a = catalog.insert_event(Event::notification("a"));
        let b = catalog.insert_event(Event::notification("b"));
        let s = catalog.insert_set(EventSet::new(EventSelection::Cycle));

        assert_ne!(a, b);
        assert_eq!(
            catalog.event(b).and_then(Event::data_notification),
            Some("b")
        );
        assert_eq!(catalog.set(s).map(EventSet::len), Some(0));
        assert_eq!(catalog.event_count(), 2);
        assert_eq!(catalog.set_count(), 1);
    }

    #[test]
    fn test_mutation_is_visible_through_share() {
        let mut catalog = EventCatalog::new();
        let id = catalog.insert_event(Event::notification("hi").with_one_shot(true));
        let shared = catalog.into_shared();
        let world_view = Arc::clone(&shared);

        if let Some(event) = shared.write().event_mut(id) {
            event.mark_executed();
        }
        assert!(world_view.read().event(id).is_some_and(Event::is_exhausted));

        world_view.write().reset_executed();
        assert!(!shared.read().event(id).is_some_and(Event::has_exec));
    }
}
