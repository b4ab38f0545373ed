//! Single-threaded frame loop.
//!
//! Each frame runs the same fixed sequence:
//!
//! 1. world actions enqueue events and audio requests ([`Game::apply`])
//! 2. every queued event is polled and handed to the [`Presentation`]
//! 3. the audio queue is dispatched ([`SoundHandler::process`])
//! 4. the mixer advances by the frame time and key edges are cleared
//!
//! Events enqueued while polling (battle follow-ups) run in the same frame.

use std::time::Duration;

use tessera_common::{ItemId, SoundChannel, SoundId, ThingId};
use tessera_gameplay::{
    ActorRef, EventClassification, EventHandler, EventSet, EventSetRef, ItemRef, KeyHandler,
    Lock, SharedCatalog,
};
use tessera_kernel::{Mixer, SoundHandler};
use tracing::{debug, info};

use crate::presentation::{BattleOutcome, Presentation};
use crate::script::{EventScript, ScriptAction};

/// The player character. Initiator of every scripted event.
pub const PLAYER: ActorRef = ActorRef::Person(ThingId::new(0));

/// What one frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number.
    pub frame: u64,
    /// Events handed to the presentation.
    pub events: usize,
    /// Queue records that yielded nothing (locked, exhausted, mismatched).
    pub skipped: usize,
    /// Audio requests dispatched.
    pub audio_requests: usize,
}

/// Event handler, audio handler and presentation wired together.
#[derive(Debug)]
pub struct Game<M: Mixer, P: Presentation> {
    events: EventHandler,
    audio: SoundHandler<M>,
    presentation: P,
    frame: u64,
}

impl<M: Mixer, P: Presentation> Game<M, P> {
    /// Wire an audio handler and a catalog to a presentation.
    pub fn new(audio: SoundHandler<M>, catalog: SharedCatalog, presentation: P) -> Self {
        let events =
            EventHandler::new(catalog, KeyHandler::new().into_shared()).with_sound(audio.trigger());
        Self {
            events,
            audio,
            presentation,
            frame: 0,
        }
    }

    /// The event handler.
    #[must_use]
    pub const fn events(&self) -> &EventHandler {
        &self.events
    }

    /// The event handler, mutably (for enqueuing).
    pub fn events_mut(&mut self) -> &mut EventHandler {
        &mut self.events
    }

    /// The audio handler.
    #[must_use]
    pub const fn audio(&self) -> &SoundHandler<M> {
        &self.audio
    }

    /// The audio handler, mutably.
    pub fn audio_mut(&mut self) -> &mut SoundHandler<M> {
        &mut self.audio
    }

    /// The presentation.
    #[must_use]
    pub const fn presentation(&self) -> &P {
        &self.presentation
    }

    /// The presentation, mutably.
    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// Frames run so far.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Returns true once no event is queued and only music is audible.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.events.pending() == 0
            && SoundChannel::all()
                .into_iter()
                .filter(|c| !c.is_music())
                .all(|c| !self.audio.mixer().channel_playing(c))
    }

    // ========================================================================
    // World actions
    // ========================================================================

    /// Perform a scripted world action. `sets` maps script set indices to
    /// catalog refs. Returns false if the action was ignored.
    pub fn apply(&mut self, action: &ScriptAction, sets: &[EventSetRef]) -> bool {
        match action {
            ScriptAction::Event { event, source } => {
                self.events
                    .execute_event(event.to_event(), Some(PLAYER), source.map(ActorRef::from))
            },
            ScriptAction::EventSet { set, source } => sets.get(*set).is_some_and(|set| {
                self.events
                    .execute_event_set(*set, Some(PLAYER), source.map(ActorRef::from))
            }),
            ScriptAction::IoTrigger { io, state } => self.events.execute_io_trigger(
                ActorRef::InteractiveObject(ThingId::new(*io)),
                *state,
                Some(PLAYER),
            ),
            ScriptAction::Pickup {
                thing,
                item,
                count,
                walkover,
            } => self.events.execute_pickup(
                ItemRef::new(ThingId::new(*thing), ItemId::new(*item), *count),
                *walkover,
            ),
            ScriptAction::UnlockSet(set) => sets.get(*set).is_some_and(|set| {
                self.events
                    .catalog()
                    .write()
                    .set_mut(*set)
                    .is_some_and(EventSet::unlock_trigger)
            }),
            ScriptAction::Music(id) => self.events.trigger_music(SoundId::new(*id)),
            ScriptAction::Sound { id, channel } => {
                self.events.trigger_sound(SoundId::new(*id), *channel)
            },
            ScriptAction::Stop(channel) => self.events.stop_channel(*channel),
            ScriptAction::Key { key, pressed } => {
                self.events.key_handler().write().set_key(*key, *pressed);
                true
            },
        }
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Run one frame: drain the event queue, dispatch audio, advance the
    /// mixer by `elapsed`.
    pub fn frame(&mut self, elapsed: Duration) -> FrameReport {
        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };

        while self.events.poll_event_available() {
            if self.dispatch_current() {
                report.events += 1;
            } else {
                report.skipped += 1;
            }
            self.events.poll_event();
        }

        report.audio_requests = self.audio.process();
        self.audio.update(elapsed);
        self.events.key_handler().write().end_frame();

        self.frame += 1;
        report
    }

    fn resolve_lock(&mut self) {
        let Some(Lock::Item {
            item,
            count,
            consume,
        }) = self.events.poll_lock_get_data()
        else {
            return;
        };
        if self.presentation.resolve_item_lock(item, count, consume) {
            self.events.poll_lock_set_data(Lock::Unlocked);
        } else {
            debug!("Item lock on {:?} stays closed", item);
        }
    }

    /// Hand the current record to the presentation. Returns true if an
    /// event was consumed.
    fn dispatch_current(&mut self) -> bool {
        if self.events.poll_lock_avail() {
            self.resolve_lock();
        }

        let source = self.events.poll_source();
        let presentation = &mut self.presentation;
        let events = &mut self.events;

        match events.poll_event_type() {
            EventClassification::NoEvent => false,
            EventClassification::StartConvo => events
                .poll_conversation()
                .map(|convo| presentation.conversation(&convo, source))
                .is_some(),
            EventClassification::RunBattle => {
                let Some(setup) = events.poll_battle() else {
                    return false;
                };
                let follow_up = match presentation.battle(&setup) {
                    BattleOutcome::Won => setup.win,
                    BattleOutcome::Lost => setup.lose,
                    BattleOutcome::Fled => None,
                };
                if let Some(event) = follow_up {
                    events.execute_event(event, Some(PLAYER), source);
                }
                true
            },
            EventClassification::PickupItem => events
                .poll_pickup_item()
                .map(|(item, walkover)| presentation.pickup(item, walkover))
                .is_some(),
            EventClassification::GiveItem => events
                .poll_give_item()
                .map(|transfer| presentation.give_item(transfer))
                .is_some(),
            EventClassification::TakeItem => events
                .poll_take_item()
                .map(|transfer| presentation.take_item(transfer))
                .is_some(),
            EventClassification::Notification => events
                .poll_notification()
                .map(|text| presentation.notification(&text))
                .is_some(),
            EventClassification::StartMap => events
                .poll_start_map()
                .map(|map| presentation.start_map(map))
                .is_some(),
            EventClassification::Teleport => events
                .poll_teleport_thing()
                .map(|target| presentation.teleport(target))
                .is_some(),
            EventClassification::TriggerIo => events
                .poll_io_trigger()
                .map(|trigger| presentation.io_trigger(trigger))
                .is_some(),
            EventClassification::UnlockIo => events
                .poll_unlock_io()
                .map(|unlock| presentation.unlock_io(unlock))
                .is_some(),
            EventClassification::UnlockThing => events
                .poll_unlock_thing()
                .map(|unlock| presentation.unlock_thing(unlock))
                .is_some(),
            EventClassification::UnlockTile => events
                .poll_unlock_tile()
                .map(|unlock| presentation.unlock_tile(unlock))
                .is_some(),
            EventClassification::JustSound => events
                .poll_sound()
                .map(|cue| presentation.sound(cue))
                .is_some(),
        }
    }

    // ========================================================================
    // Script replay
    // ========================================================================

    /// Replay a script from the current frame.
    ///
    /// `sets` comes from [`EventScript::install`] on this game's catalog.
    /// `next_step` supplies each frame's elapsed time. The replay ends once
    /// the last action has run and the game is settled, or after
    /// `max_frames` frames when non-zero. Returns the number of frames run.
    pub fn run_script(
        &mut self,
        script: &EventScript,
        sets: &[EventSetRef],
        max_frames: u64,
        mut next_step: impl FnMut() -> Duration,
    ) -> u64 {
        let start = self.frame;
        let last = script.last_frame().unwrap_or(0);

        loop {
            let local = self.frame - start;
            if max_frames > 0 && local >= max_frames {
                info!("Replay stopped at frame limit {}", max_frames);
                break;
            }
            if local > last && self.is_settled() {
                break;
            }

            for action in script.actions_at(local) {
                if !self.apply(action, sets) {
                    debug!("Frame {}: {:?} was ignored", local, action);
                }
            }

            let report = self.frame(next_step());
            if report.events + report.skipped + report.audio_requests > 0 {
                debug!("{:?}", report);
            }
        }

        self.frame - start
    }
}
