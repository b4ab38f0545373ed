//! Event sets and locks.
//!
//! An [`EventSet`] holds several events and presents one of them at a time.
//! Selection is deterministic per instance: the same set fed the same
//! sequence of calls yields the same events. Consumed one-shot members are
//! skipped; a set with nothing eligible yields no event.
//!
//! A set may be gated by a [`Lock`]. While locked it yields nothing. Item
//! locks are resolved by the caller (the event handler surfaces them, the
//! game checks the inventory), trigger locks by an explicit unlock call.

use serde::{Deserialize, Serialize};
use tessera_common::ItemId;
use tracing::debug;

use crate::event::{Event, EventClassification};

/// Lock state of an event set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lock {
    /// Not locked.
    #[default]
    Unlocked,
    /// Requires the player to hold items.
    Item {
        /// Required item.
        item: ItemId,
        /// Required count.
        count: u32,
        /// Whether unlocking consumes the items.
        consume: bool,
    },
    /// Requires an external unlock (switch, story flag).
    Trigger,
}

impl Lock {
    /// Returns true unless [`Lock::Unlocked`].
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        !matches!(self, Self::Unlocked)
    }

    /// Returns true for item locks.
    #[must_use]
    pub const fn is_item(&self) -> bool {
        matches!(self, Self::Item { .. })
    }
}

/// Result of trying items against a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The set was not locked.
    AlreadyUnlocked,
    /// The offered items did not satisfy the lock.
    Rejected,
    /// The lock opened. `consume` items should be removed from the player.
    Unlocked {
        /// Number of items to remove.
        consume: u32,
    },
}

/// How a set picks its next event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventSelection {
    /// Always the first eligible member.
    #[default]
    First,
    /// Members in order, wrapping around.
    Cycle,
    /// A seeded random eligible member.
    Random {
        /// Seed for the set's generator.
        seed: u64,
    },
}

/// A lockable container of events.
#[derive(Debug, Clone)]
pub struct EventSet {
    events: Vec<Event>,
    lock: Lock,
    selection: EventSelection,
    /// Next index to consider for [`EventSelection::Cycle`].
    cursor: usize,
    rng: fastrand::Rng,
    /// Pick made by a non-triggering call, reused by the next trigger.
    pending: Option<usize>,
}

impl Default for EventSet {
    fn default() -> Self {
        Self::new(EventSelection::First)
    }
}

impl EventSet {
    /// Create an empty, unlocked set.
    #[must_use]
    pub fn new(selection: EventSelection) -> Self {
        let seed = match selection {
            EventSelection::Random { seed } => seed,
            EventSelection::First | EventSelection::Cycle => 0,
        };
        Self {
            events: Vec::new(),
            lock: Lock::Unlocked,
            selection,
            cursor: 0,
            rng: fastrand::Rng::with_seed(seed),
            pending: None,
        }
    }

    /// Create a set from events.
    #[must_use]
    pub fn from_events(selection: EventSelection, events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::new(selection)
        }
    }

    /// Set the lock.
    #[must_use]
    pub fn with_lock(mut self, lock: Lock) -> Self {
        self.lock = lock;
        self
    }

    /// Append an event.
    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
        self.pending = None;
    }

    /// Members in order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Selection rule.
    #[must_use]
    pub const fn selection(&self) -> EventSelection {
        self.selection
    }

    /// Current lock.
    #[must_use]
    pub const fn lock(&self) -> Lock {
        self.lock
    }

    /// Replace the lock.
    pub fn set_locked(&mut self, lock: Lock) {
        debug!("Event set lock {:?} -> {:?}", self.lock, lock);
        self.lock = lock;
    }

    /// Open a trigger lock. Returns true if the lock opened.
    pub fn unlock_trigger(&mut self) -> bool {
        if self.lock == Lock::Trigger {
            self.set_locked(Lock::Unlocked);
            true
        } else {
            false
        }
    }

    /// Try to open an item lock with `held` items of type `item`.
    pub fn unlock_item(&mut self, item: ItemId, held: u32) -> UnlockOutcome {
        match self.lock {
            Lock::Unlocked => UnlockOutcome::AlreadyUnlocked,
            Lock::Item {
                item: required,
                count,
                consume,
            } if required == item && held >= count => {
                self.set_locked(Lock::Unlocked);
                UnlockOutcome::Unlocked {
                    consume: if consume { count } else { 0 },
                }
            },
            Lock::Item { .. } | Lock::Trigger => UnlockOutcome::Rejected,
        }
    }

    fn is_eligible(event: &Event) -> bool {
        !event.is_none() && !event.is_exhausted()
    }

    /// Returns true if at least one member can still execute.
    #[must_use]
    pub fn has_executable(&self) -> bool {
        self.events.iter().any(Self::is_eligible)
    }

    fn select(&mut self) -> Option<usize> {
        if let Some(index) = self.pending {
            if self.events.get(index).is_some_and(Self::is_eligible) {
                return Some(index);
            }
            self.pending = None;
        }

        let len = self.events.len();
        let pick = match self.selection {
            EventSelection::First => self.events.iter().position(Self::is_eligible),
            EventSelection::Cycle => (0..len)
                .map(|offset| (self.cursor + offset) % len)
                .find(|i| Self::is_eligible(&self.events[*i])),
            EventSelection::Random { .. } => {
                let eligible: Vec<usize> =
                    (0..len).filter(|i| Self::is_eligible(&self.events[*i])).collect();
                if eligible.is_empty() {
                    None
                } else {
                    Some(eligible[self.rng.usize(..eligible.len())])
                }
            },
        };
        self.pending = pick;
        pick
    }

    /// Classification of the event the next call would yield, without
    /// latching anything.
    pub fn peek_classification(&mut self) -> EventClassification {
        if self.lock.is_locked() {
            return EventClassification::NoEvent;
        }
        self.select()
            .map_or(EventClassification::NoEvent, |i| self.events[i].classification())
    }

    /// Select the current event.
    ///
    /// With `trigger` the selected event is latched as executed and the
    /// selection advances. Returns `None` while locked or when nothing is
    /// eligible.
    pub fn get_event(&mut self, trigger: bool) -> Option<Event> {
        if self.lock.is_locked() {
            return None;
        }
        let index = self.select()?;
        if trigger {
            self.events[index].mark_executed();
            self.pending = None;
            if self.selection == EventSelection::Cycle {
                self.cursor = (index + 1) % self.events.len();
            }
        }
        Some(self.events[index].clone())
    }

    /// Clear every member's executed latch.
    pub fn reset_executed(&mut self) {
        for event in &mut self.events {
            event.reset_executed();
        }
        self.cursor = 0;
        self.pending = None;
    }
}
