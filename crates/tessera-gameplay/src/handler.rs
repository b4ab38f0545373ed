//! Event queue and poll protocol.
//!
//! World objects enqueue [`EventExecution`] records at any time during a
//! frame. The presentation layer then walks the queue with a single cursor:
//!
//! 1. `poll_event_available` / `poll_event_type` inspect the current record
//!    without side effects.
//! 2. A typed poller (`poll_notification`, `poll_teleport_thing`, ...)
//!    returns the parsed payload if the classification matches. Success
//!    latches the event as executed and requests its sound on the
//!    [`SoundChannel::Triggers`] channel. A music cue (see
//!    [`Event::just_music`]) goes to the music bus instead.
//! 3. `poll_event` advances the cursor.
//!
//! Event sets locked by an item are not surfaced as events. Instead
//! `poll_lock_avail` reports the lock, the caller checks its inventory and
//! writes back an unlocked state with `poll_lock_set_data`, then polls again.

use tessera_common::{MapId, SoundChannel, SoundId, SoundRequest, SoundTrigger};
use thiserror::Error;
use tracing::debug;

use crate::actor::{ActorRef, ItemRef};
use crate::catalog::{EventRef, EventSetRef, SharedCatalog};
use crate::conversation::Conversation;
use crate::event::{
    BattleSetup, Event, EventClassification, ItemTransfer, SoundCue, TeleportTarget, UnlockIo,
    UnlockThing, UnlockTile,
};
use crate::event_set::{EventSet, Lock};
use crate::key_handler::SharedKeyHandler;

/// Event handler error types.
///
/// None of these escape the poll protocol: pollers report failure as
/// `None`/`false` and log the reason.
#[derive(Debug, Error)]
pub enum EventError {
    /// The cursor is past the end of the queue.
    #[error("No event at the poll cursor")]
    QueueExhausted,

    /// The current event does not have the requested payload.
    #[error("Expected a {expected:?} payload, found {found:?}")]
    BadPayload {
        /// Requested classification.
        expected: EventClassification,
        /// Classification of the current event.
        found: EventClassification,
    },

    /// The event set has nothing left to execute.
    #[error("Event set {0:?} has no executable events")]
    EmptySet(EventSetRef),

    /// The event set is locked.
    #[error("Event set {0:?} is locked")]
    Locked(EventSetRef),

    /// A one-shot event was already executed.
    #[error("One-shot event already executed")]
    Exhausted,

    /// The catalog has no such event.
    #[error("Unknown event {0:?}")]
    UnknownEvent(EventRef),

    /// The catalog has no such event set.
    #[error("Unknown event set {0:?}")]
    UnknownSet(EventSetRef),
}

/// Result type for event operations.
pub type EventResult<T> = Result<T, EventError>;

/// Which event a queued record executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPayload {
    /// A copy owned by the record.
    Inline(Event),
    /// An event in the shared catalog.
    Ref(EventRef),
    /// An event set in the shared catalog.
    Set(EventSetRef),
}

/// A queued event together with the actors involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventExecution {
    /// Event to execute.
    pub payload: ExecutionPayload,
    /// Actor that caused the event (usually the player).
    pub initiator: Option<ActorRef>,
    /// Actor the event belongs to.
    pub source: Option<ActorRef>,
    /// Map item for pickups.
    pub item: Option<ItemRef>,
}

/// State change reported by an interactive object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoTrigger {
    /// The object, if known.
    pub io: Option<ActorRef>,
    /// Its new state.
    pub state: i32,
}

/// Single-consumer event queue.
#[derive(Debug)]
pub struct EventHandler {
    queue: Vec<EventExecution>,
    /// Index of the current record; `queue.len()` once exhausted.
    cursor: usize,
    catalog: SharedCatalog,
    keys: SharedKeyHandler,
    sound: Option<SoundTrigger>,
}

impl EventHandler {
    /// Create a handler over a shared catalog and key handler.
    #[must_use]
    pub fn new(catalog: SharedCatalog, keys: SharedKeyHandler) -> Self {
        Self {
            queue: Vec::new(),
            cursor: 0,
            catalog,
            keys,
            sound: None,
        }
    }

    /// Bind the audio request queue.
    #[must_use]
    pub fn with_sound(mut self, sound: SoundTrigger) -> Self {
        self.sound = Some(sound);
        self
    }

    /// Bind or unbind the audio request queue.
    pub fn set_sound_trigger(&mut self, sound: Option<SoundTrigger>) {
        self.sound = sound;
    }

    /// The key handler.
    #[must_use]
    pub const fn key_handler(&self) -> &SharedKeyHandler {
        &self.keys
    }

    /// The shared event catalog.
    #[must_use]
    pub const fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    /// Records not yet passed by the cursor.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len() - self.cursor
    }

    fn push(
        &mut self,
        payload: ExecutionPayload,
        initiator: Option<ActorRef>,
        source: Option<ActorRef>,
        item: Option<ItemRef>,
    ) -> bool {
        self.queue.push(EventExecution {
            payload,
            initiator,
            source,
            item,
        });
        true
    }

    // ========================================================================
    // Enqueue
    // ========================================================================

    /// Enqueue a copy of an event. `NoEvent` is ignored.
    pub fn execute_event(
        &mut self,
        event: Event,
        initiator: Option<ActorRef>,
        source: Option<ActorRef>,
    ) -> bool {
        if event.is_none() {
            debug!("Ignoring NoEvent from {:?}", source);
            return false;
        }
        self.push(ExecutionPayload::Inline(event), initiator, source, None)
    }

    /// Enqueue a catalog event. Unknown, `NoEvent` and exhausted one-shot
    /// events are ignored.
    pub fn execute_event_ref(
        &mut self,
        event: EventRef,
        initiator: Option<ActorRef>,
        source: Option<ActorRef>,
    ) -> bool {
        let accepted = self
            .catalog
            .read()
            .event(event)
            .is_some_and(|e| !e.is_none() && !e.is_exhausted());
        if !accepted {
            debug!("Ignoring event {:?}", event);
            return false;
        }
        self.push(ExecutionPayload::Ref(event), initiator, source, None)
    }

    /// Enqueue a catalog event set. Unknown sets, empty sets and unlocked
    /// sets with nothing left to execute are ignored.
    pub fn execute_event_set(
        &mut self,
        set: EventSetRef,
        initiator: Option<ActorRef>,
        source: Option<ActorRef>,
    ) -> bool {
        let accepted = self.catalog.read().set(set).is_some_and(|s| {
            !s.is_empty() && (s.lock().is_locked() || s.has_executable())
        });
        if !accepted {
            debug!("Ignoring event set {:?}", set);
            return false;
        }
        self.push(ExecutionPayload::Set(set), initiator, source, None)
    }

    /// Enqueue a state change of an interactive object.
    pub fn execute_io_trigger(
        &mut self,
        io: ActorRef,
        state: i32,
        initiator: Option<ActorRef>,
    ) -> bool {
        self.push(
            ExecutionPayload::Inline(Event::trigger_io(state)),
            initiator,
            Some(io),
            None,
        )
    }

    /// Enqueue the pickup of a map item.
    pub fn execute_pickup(&mut self, item: ItemRef, walkover: bool) -> bool {
        self.push(
            ExecutionPayload::Inline(Event::pickup(walkover)),
            None,
            None,
            Some(item),
        )
    }

    // ========================================================================
    // Poll
    // ========================================================================

    fn current(&self) -> Option<&EventExecution> {
        self.queue.get(self.cursor)
    }

    /// Returns true if the cursor is on a record.
    #[must_use]
    pub fn poll_event_available(&self) -> bool {
        self.cursor < self.queue.len()
    }

    /// Classification of the current event, without consuming it.
    ///
    /// Locked sets and exhausted one-shots report `NoEvent`.
    #[must_use]
    pub fn poll_event_type(&self) -> EventClassification {
        let Some(record) = self.current() else {
            return EventClassification::NoEvent;
        };
        match &record.payload {
            ExecutionPayload::Inline(event) if !event.is_exhausted() => event.classification(),
            ExecutionPayload::Inline(_) => EventClassification::NoEvent,
            ExecutionPayload::Ref(id) => self
                .catalog
                .read()
                .event(*id)
                .filter(|e| !e.is_exhausted())
                .map_or(EventClassification::NoEvent, Event::classification),
            ExecutionPayload::Set(id) => self
                .catalog
                .write()
                .set_mut(*id)
                .map_or(EventClassification::NoEvent, EventSet::peek_classification),
        }
    }

    /// Advance the cursor. Returns true if a record is now current.
    ///
    /// Passing the last record drops the consumed records.
    pub fn poll_event(&mut self) -> bool {
        if self.cursor < self.queue.len() {
            self.cursor += 1;
        }
        if self.cursor >= self.queue.len() {
            self.queue.clear();
            self.cursor = 0;
            return false;
        }
        true
    }

    /// Drop every record and reset the cursor.
    pub fn poll_clear(&mut self) {
        if !self.queue.is_empty() {
            debug!("Clearing {} queued events", self.queue.len());
        }
        self.queue.clear();
        self.cursor = 0;
    }

    /// Actor that caused the current event.
    #[must_use]
    pub fn poll_initiator(&self) -> Option<ActorRef> {
        self.current().and_then(|r| r.initiator)
    }

    /// Actor the current event belongs to.
    #[must_use]
    pub fn poll_source(&self) -> Option<ActorRef> {
        self.current().and_then(|r| r.source)
    }

    fn checked<T>(
        event: &Event,
        expected: EventClassification,
        parse: impl FnOnce(&Event) -> Option<T>,
    ) -> EventResult<T> {
        if event.is_exhausted() {
            return Err(EventError::Exhausted);
        }
        let found = event.classification();
        if found != expected {
            return Err(EventError::BadPayload { expected, found });
        }
        parse(event).ok_or(EventError::BadPayload { expected, found })
    }

    /// Parse the current event and latch it as executed.
    fn consume<T>(
        &mut self,
        expected: EventClassification,
        parse: impl FnOnce(&Event) -> Option<T>,
    ) -> EventResult<T> {
        let record = self
            .queue
            .get_mut(self.cursor)
            .ok_or(EventError::QueueExhausted)?;

        let (value, sound) = match &mut record.payload {
            ExecutionPayload::Inline(event) => {
                let value = Self::checked(event, expected, parse)?;
                event.mark_executed();
                (value, event.sound_request())
            },
            ExecutionPayload::Ref(id) => {
                let id = *id;
                let mut catalog = self.catalog.write();
                let event = catalog.event_mut(id).ok_or(EventError::UnknownEvent(id))?;
                let value = Self::checked(event, expected, parse)?;
                event.mark_executed();
                (value, event.sound_request())
            },
            ExecutionPayload::Set(id) => {
                let id = *id;
                let mut catalog = self.catalog.write();
                let set = catalog.set_mut(id).ok_or(EventError::UnknownSet(id))?;
                if set.lock().is_locked() {
                    return Err(EventError::Locked(id));
                }
                let event = set.get_event(false).ok_or(EventError::EmptySet(id))?;
                let value = Self::checked(&event, expected, parse)?;
                set.get_event(true);
                (value, event.sound_request())
            },
        };

        if let Some(request) = sound {
            self.request(request);
        }
        Ok(value)
    }

    fn poll_with<T>(
        &mut self,
        expected: EventClassification,
        parse: impl FnOnce(&Event) -> Option<T>,
    ) -> Option<T> {
        match self.consume(expected, parse) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Poll for {:?} failed: {}", expected, e);
                None
            },
        }
    }

    /// Consume a conversation event.
    pub fn poll_conversation(&mut self) -> Option<Conversation> {
        self.poll_with(EventClassification::StartConvo, |e| {
            e.data_conversation().cloned()
        })
    }

    /// Consume a battle event.
    pub fn poll_battle(&mut self) -> Option<BattleSetup> {
        self.poll_with(EventClassification::RunBattle, Event::data_start_battle)
    }

    /// Consume a pickup. Returns the item and whether it was walked over.
    pub fn poll_pickup_item(&mut self) -> Option<(ItemRef, bool)> {
        let item = self.current().and_then(|r| r.item)?;
        let walkover = self.poll_with(EventClassification::PickupItem, Event::data_pickup)?;
        Some((item, walkover))
    }

    /// Consume a give item event.
    pub fn poll_give_item(&mut self) -> Option<ItemTransfer> {
        self.poll_with(EventClassification::GiveItem, Event::data_give_item)
    }

    /// Consume a take item event.
    pub fn poll_take_item(&mut self) -> Option<ItemTransfer> {
        self.poll_with(EventClassification::TakeItem, Event::data_take_item)
    }

    /// Consume a notification.
    pub fn poll_notification(&mut self) -> Option<String> {
        self.poll_with(EventClassification::Notification, |e| {
            e.data_notification().map(str::to_owned)
        })
    }

    /// Consume a map start event.
    pub fn poll_start_map(&mut self) -> Option<MapId> {
        self.poll_with(EventClassification::StartMap, Event::data_start_map)
    }

    /// Consume a teleport event.
    pub fn poll_teleport_thing(&mut self) -> Option<TeleportTarget> {
        self.poll_with(EventClassification::Teleport, Event::data_teleport)
    }

    /// Consume an interactive object trigger.
    pub fn poll_io_trigger(&mut self) -> Option<IoTrigger> {
        let io = self.poll_source();
        let state = self.poll_with(EventClassification::TriggerIo, Event::data_trigger_io)?;
        Some(IoTrigger { io, state })
    }

    /// Consume an interactive object unlock.
    pub fn poll_unlock_io(&mut self) -> Option<UnlockIo> {
        self.poll_with(EventClassification::UnlockIo, Event::data_unlock_io)
    }

    /// Consume a thing unlock.
    pub fn poll_unlock_thing(&mut self) -> Option<UnlockThing> {
        self.poll_with(EventClassification::UnlockThing, Event::data_unlock_thing)
    }

    /// Consume a tile unlock.
    pub fn poll_unlock_tile(&mut self) -> Option<UnlockTile> {
        self.poll_with(EventClassification::UnlockTile, Event::data_unlock_tile)
    }

    /// Consume a sound-only event. An effect is requested on the trigger
    /// channel like any other event sound; a music cue goes to the music
    /// bus.
    pub fn poll_sound(&mut self) -> Option<SoundCue> {
        self.poll_with(EventClassification::JustSound, Event::data_just_sound)
    }

    // ========================================================================
    // Lock sub-protocol
    // ========================================================================

    fn current_set(&self) -> Option<EventSetRef> {
        match self.current()?.payload {
            ExecutionPayload::Set(id) => Some(id),
            ExecutionPayload::Inline(_) | ExecutionPayload::Ref(_) => None,
        }
    }

    /// Returns true if the current record is a set waiting on an item lock.
    #[must_use]
    pub fn poll_lock_avail(&self) -> bool {
        self.poll_lock_get_data().is_some_and(|lock| lock.is_item())
    }

    /// Lock of the current record's event set.
    #[must_use]
    pub fn poll_lock_get_data(&self) -> Option<Lock> {
        let id = self.current_set()?;
        self.catalog.read().set(id).map(EventSet::lock)
    }

    /// Replace the lock of the current record's event set. Returns false if
    /// the current record is not a set.
    pub fn poll_lock_set_data(&mut self, lock: Lock) -> bool {
        let Some(id) = self.current_set() else {
            return false;
        };
        match self.catalog.write().set_mut(id) {
            Some(set) => {
                set.set_locked(lock);
                true
            },
            None => false,
        }
    }

    // ========================================================================
    // Audio forwarding
    // ========================================================================

    fn request(&self, request: SoundRequest) -> bool {
        match &self.sound {
            Some(sound) => sound.request(request),
            None => {
                debug!("No audio bound, dropping {:?}", request);
                false
            },
        }
    }

    /// Request a sound effect. Returns false if no audio queue is bound or
    /// the request was dropped.
    pub fn trigger_sound(&self, id: SoundId, channel: SoundChannel) -> bool {
        self.request(SoundRequest::Play { id, channel })
    }

    /// Request a music track.
    pub fn trigger_music(&self, id: SoundId) -> bool {
        self.request(SoundRequest::Play {
            id,
            channel: SoundChannel::Music1,
        })
    }

    /// Request that a channel be halted.
    pub fn stop_channel(&self, channel: SoundChannel) -> bool {
        self.request(SoundRequest::Stop { channel })
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::Receiver;
    use proptest::prelude::*;
    use tessera_common::{sound_queue, ItemId, SectionTile, ThingId};

    use super::*;
    use crate::catalog::EventCatalog;
    use crate::event_set::EventSelection;
    use crate::key_handler::KeyHandler;

    fn handler() -> (EventHandler, Receiver<SoundRequest>) {
        let (trigger, receiver) = sound_queue();
        let handler = EventHandler::new(
            EventCatalog::new().into_shared(),
            KeyHandler::new().into_shared(),
        )
        .with_sound(trigger);
        (handler, receiver)
    }

    fn player() -> Option<ActorRef> {
        Some(ActorRef::Person(ThingId::new(0)))
    }

    #[test]
    fn test_pickup_then_notification() {
        let (mut events, sounds) = handler();
        let apple = ItemRef::new(ThingId::new(30), ItemId::new(1), 1);

        assert!(events.execute_pickup(apple, true));
        assert!(events.execute_event(
            Event::notification("got apple").with_sound(SoundId::new(7)),
            player(),
            None,
        ));

        assert_eq!(events.poll_event_type(), EventClassification::PickupItem);
        assert_eq!(events.poll_pickup_item(), Some((apple, true)));
        assert!(events.poll_event());
        assert_eq!(events.poll_notification().as_deref(), Some("got apple"));

        let requests: Vec<_> = sounds.try_iter().collect();
        assert_eq!(
            requests,
            vec![SoundRequest::Play {
                id: SoundId::new(7),
                channel: SoundChannel::Triggers
            }]
        );
    }

    #[test]
    fn test_item_locked_set() {
        let (mut events, _sounds) = handler();
        let convo = Conversation::new("The chest opens.");
        let lock = Lock::Item {
            item: ItemId::new(3),
            count: 1,
            consume: true,
        };
        let set = events.catalog().write().insert_set(
            EventSet::from_events(
                EventSelection::First,
                vec![Event::start_conversation(convo.clone())],
            )
            .with_lock(lock),
        );

        assert!(events.execute_event_set(set, player(), None));
        assert_eq!(events.poll_event_type(), EventClassification::NoEvent);
        assert!(events.poll_lock_avail());
        assert_eq!(events.poll_conversation(), None);

        let current = events.poll_lock_get_data().expect("lock");
        assert!(current.is_item());
        assert!(events.poll_lock_set_data(Lock::Unlocked));

        assert!(!events.poll_lock_avail());
        assert_eq!(events.poll_event_type(), EventClassification::StartConvo);
        assert_eq!(events.poll_conversation(), Some(convo));
    }

    #[test]
    fn test_one_shot_ref_consumed_once() {
        let (mut events, _sounds) = handler();
        let id = events
            .catalog()
            .write()
            .insert_event(Event::notification("hi").with_one_shot(true));

        assert!(events.execute_event_ref(id, player(), None));
        assert_eq!(events.poll_notification().as_deref(), Some("hi"));
        assert!(!events.poll_event());

        assert!(!events.execute_event_ref(id, player(), None));
        assert!(!events.poll_event_available());
    }

    #[test]
    fn test_one_shot_enqueued_twice_runs_once() {
        let (mut events, _sounds) = handler();
        let id = events
            .catalog()
            .write()
            .insert_event(Event::notification("hi").with_one_shot(true));

        assert!(events.execute_event_ref(id, None, None));
        assert!(events.execute_event_ref(id, None, None));

        assert!(events.poll_notification().is_some());
        assert!(events.poll_event());
        assert_eq!(events.poll_event_type(), EventClassification::NoEvent);
        assert!(events.poll_notification().is_none());
    }

    #[test]
    fn test_teleport_payload() {
        let (mut events, _sounds) = handler();
        events.execute_event(Event::teleport(ThingId::new(5), 12, 34, 2), player(), None);

        let target = events.poll_teleport_thing().expect("teleport");
        assert_eq!(target.thing, ThingId::new(5));
        assert_eq!(target.destination, SectionTile::new(2, 12, 34));
    }

    #[test]
    fn test_no_event_is_never_enqueued() {
        let (mut events, _sounds) = handler();
        assert!(!events.execute_event(Event::blank(), None, None));

        let blank = events.catalog().write().insert_event(Event::blank());
        assert!(!events.execute_event_ref(blank, None, None));

        let empty = events
            .catalog()
            .write()
            .insert_set(EventSet::new(EventSelection::First));
        assert!(!events.execute_event_set(empty, None, None));

        assert!(!events.poll_event_available());
    }

    #[test]
    fn test_mismatched_poll_does_not_consume() {
        let (mut events, sounds) = handler();
        events.execute_event(
            Event::give_item(ItemId::new(2), 3).with_sound(SoundId::new(1)),
            None,
            None,
        );

        assert_eq!(events.poll_take_item(), None);
        assert_eq!(sounds.try_iter().count(), 0);
        assert_eq!(
            events.poll_give_item(),
            Some(ItemTransfer {
                item: ItemId::new(2),
                count: 3
            })
        );
        assert_eq!(sounds.try_iter().count(), 1);
    }

    #[test]
    fn test_io_trigger_carries_source() {
        let (mut events, _sounds) = handler();
        let lever = ActorRef::InteractiveObject(ThingId::new(12));
        events.execute_io_trigger(lever, 1, player());

        assert_eq!(events.poll_source(), Some(lever));
        assert_eq!(events.poll_initiator(), player());
        assert_eq!(
            events.poll_io_trigger(),
            Some(IoTrigger {
                io: Some(lever),
                state: 1
            })
        );
    }

    #[test]
    fn test_just_sound_requests_once() {
        let (mut events, sounds) = handler();
        events.execute_event(Event::just_sound(SoundId::new(4)), None, None);
        assert_eq!(
            events.poll_sound(),
            Some(SoundCue {
                sound: SoundId::new(4),
                music: false
            })
        );
        assert_eq!(
            sounds.try_iter().collect::<Vec<_>>(),
            vec![SoundRequest::Play {
                id: SoundId::new(4),
                channel: SoundChannel::Triggers
            }]
        );
    }

    #[test]
    fn test_music_cue_goes_to_music_bus() {
        let (mut events, sounds) = handler();
        events.execute_event(Event::just_music(SoundId::new(100)), None, None);
        assert_eq!(
            events.poll_sound(),
            Some(SoundCue {
                sound: SoundId::new(100),
                music: true
            })
        );
        assert_eq!(
            sounds.try_iter().collect::<Vec<_>>(),
            vec![SoundRequest::Play {
                id: SoundId::new(100),
                channel: SoundChannel::Music1
            }]
        );
    }

    #[test]
    fn test_every_consumption_requests_its_sound() {
        let (mut events, sounds) = handler();
        for state in 0..300 {
            events.execute_event(
                Event::trigger_io(state).with_sound(SoundId::new(7)),
                None,
                None,
            );
        }

        let mut consumed = 0;
        loop {
            if events.poll_io_trigger().is_some() {
                consumed += 1;
            }
            if !events.poll_event() {
                break;
            }
        }

        assert_eq!(consumed, 300);
        let requests: Vec<_> = sounds.try_iter().collect();
        assert_eq!(requests.len(), 300);
        assert!(requests.iter().all(|r| r.channel() == SoundChannel::Triggers));
    }

    #[test]
    fn test_poll_clear() {
        let (mut events, _sounds) = handler();
        events.execute_event(Event::notification("a"), None, None);
        events.execute_event(Event::notification("b"), None, None);
        assert_eq!(events.pending(), 2);

        events.poll_clear();
        assert!(!events.poll_event_available());
        assert_eq!(events.poll_event_type(), EventClassification::NoEvent);
        assert!(!events.poll_event());
    }

    #[test]
    fn test_set_members_latch_through_catalog() {
        let (mut events, _sounds) = handler();
        let set = events.catalog().write().insert_set(EventSet::from_events(
            EventSelection::First,
            vec![
                Event::notification("first").with_one_shot(true),
                Event::notification("later"),
            ],
        ));

        events.execute_event_set(set, None, None);
        assert_eq!(events.poll_notification().as_deref(), Some("first"));
        events.poll_event();

        events.execute_event_set(set, None, None);
        assert_eq!(events.poll_notification().as_deref(), Some("later"));
    }

    #[test]
    fn test_trigger_lock_is_not_an_item_lock() {
        let (mut events, _sounds) = handler();
        let set = events.catalog().write().insert_set(
            EventSet::from_events(EventSelection::First, vec![Event::notification("x")])
                .with_lock(Lock::Trigger),
        );
        events.execute_event_set(set, None, None);
        assert!(!events.poll_lock_avail());
        assert_eq!(events.poll_lock_get_data(), Some(Lock::Trigger));
        assert_eq!(events.poll_notification(), None);
    }

    #[test]
    fn test_audio_forwarding() {
        let (events, sounds) = handler();
        assert!(events.trigger_music(SoundId::new(100)));
        assert!(events.stop_channel(SoundChannel::Weather1));
        assert_eq!(
            sounds.try_iter().collect::<Vec<_>>(),
            vec![
                SoundRequest::Play {
                    id: SoundId::new(100),
                    channel: SoundChannel::Music1
                },
                SoundRequest::Stop {
                    channel: SoundChannel::Weather1
                },
            ]
        );

        let unbound = EventHandler::new(
            EventCatalog::new().into_shared(),
            KeyHandler::new().into_shared(),
        );
        assert!(!unbound.trigger_sound(SoundId::new(1), SoundChannel::Menus));
    }

    proptest! {
        #[test]
        fn prop_fifo_and_no_blank_events(entries in prop::collection::vec(prop::option::of(0i32..1000), 0..40)) {
            let (mut events, _sounds) = handler();
            for entry in &entries {
                let event = entry.map_or_else(Event::blank, Event::trigger_io);
                prop_assert_eq!(events.execute_event(event, None, None), entry.is_some());
            }

            let expected: Vec<i32> = entries.iter().flatten().copied().collect();
            let mut seen = Vec::new();
            if events.poll_event_available() {
                loop {
                    prop_assert_ne!(events.poll_event_type(), EventClassification::NoEvent);
                    seen.push(events.poll_io_trigger().expect("io trigger").state);
                    if !events.poll_event() {
                        break;
                    }
                }
            }
            prop_assert_eq!(seen, expected);
            prop_assert!(!events.poll_event_available());
        }
    }
}
