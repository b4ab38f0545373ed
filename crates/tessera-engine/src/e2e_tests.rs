//! End-to-end tests for the event and audio pipeline.
//!
//! Every test drives a [`Game`] with the headless mixer, so the whole path
//! from enqueue through polling, presentation, audio dispatch and mixer
//! playback is exercised without an output device.

use std::time::Duration;

use tessera_common::{ItemId, SectionTile, SoundChannel, SoundId, SoundRequest, ThingId};
use tessera_gameplay::{
    ActorRef, Conversation, Event, EventCatalog, EventClassification, EventSelection, EventSet,
    Inventory, ItemRef, Lock, SoundCue, TeleportTarget,
};
use tessera_kernel::{AudioClip, AudioKey, HeadlessMixer, MixerCommand, Sound, SoundHandler};

use crate::game_loop::{Game, PLAYER};
use crate::presentation::{LoggingPresentation, Presented};
use crate::script::EventScript;

const FRAME: Duration = Duration::from_millis(16);

fn clip(length: Duration) -> AudioClip {
    AudioClip::silence(length, 1000, 1)
}

/// Audio handler with music 100/200 (1 s fades) and sound 7 loaded.
fn audio() -> SoundHandler<HeadlessMixer> {
    let mut audio = SoundHandler::new(HeadlessMixer::new());
    for id in [100, 200] {
        let mut track = Sound::with_id(SoundId::new(id));
        track.set_fade_time(1000);
        track.set_clip(clip(Duration::from_secs(30)));
        audio.registry_mut().add_music(track).expect("add music");
    }
    let mut effect = Sound::with_id(SoundId::new(7));
    effect.set_clip(clip(Duration::from_millis(200)));
    audio.registry_mut().add_sound(effect).expect("add sound");
    audio
}

fn game_with(
    catalog: EventCatalog,
    presentation: LoggingPresentation,
) -> Game<HeadlessMixer, LoggingPresentation> {
    Game::new(audio(), catalog.into_shared(), presentation)
}

fn game() -> Game<HeadlessMixer, LoggingPresentation> {
    game_with(EventCatalog::new(), LoggingPresentation::default())
}

fn playing_on(
    game: &Game<HeadlessMixer, LoggingPresentation>,
    channel: SoundChannel,
) -> Option<AudioKey> {
    game.audio().playing_on(channel)
}

mod scenarios {
    use super::*;

    #[test]
    fn e2e_pickup_then_notification() {
        let mut game = game();
        let apple = ItemRef::new(ThingId::new(40), ItemId::new(2), 1);

        let events = game.events_mut();
        assert!(events.execute_pickup(apple, true));
        assert!(events.execute_event(
            Event::notification("got apple").with_sound(SoundId::new(7)),
            Some(PLAYER),
            None,
        ));

        assert_eq!(events.poll_event_type(), EventClassification::PickupItem);
        assert_eq!(events.poll_pickup_item(), Some((apple, true)));
        assert!(events.poll_event());
        assert_eq!(events.poll_notification().as_deref(), Some("got apple"));

        assert_eq!(
            game.audio_mut().queued(),
            &[SoundRequest::Play {
                id: SoundId::new(7),
                channel: SoundChannel::Triggers
            }]
        );

        game.frame(FRAME);
        assert_eq!(
            playing_on(&game, SoundChannel::Triggers),
            Some(AudioKey::Sound(SoundId::new(7)))
        );
        assert!(game.audio_mut().queued().is_empty());
    }

    #[test]
    fn e2e_pickup_then_notification_through_loop() {
        let mut game = game();
        let apple = ItemRef::new(ThingId::new(40), ItemId::new(2), 1);
        game.events_mut().execute_pickup(apple, true);
        game.events_mut().execute_event(
            Event::notification("got apple").with_sound(SoundId::new(7)),
            Some(PLAYER),
            None,
        );

        let report = game.frame(FRAME);
        assert_eq!(report.events, 2);
        assert_eq!(report.audio_requests, 1);
        assert_eq!(
            game.presentation().history(),
            &[
                Presented::Pickup(apple),
                Presented::Notification("got apple".into())
            ]
        );
        assert_eq!(game.presentation().inventory().count(ItemId::new(2)), 1);
    }

    #[test]
    fn e2e_music_cross_fade() {
        let mut game = game();

        game.events().trigger_music(SoundId::new(100));
        game.frame(FRAME);
        assert_eq!(
            playing_on(&game, SoundChannel::Music1),
            Some(AudioKey::Music(SoundId::new(100)))
        );
        assert_eq!(playing_on(&game, SoundChannel::Music2), None);

        // Let the fade-in finish
        for _ in 0..80 {
            game.frame(FRAME);
        }

        game.events().trigger_music(SoundId::new(200));
        game.frame(FRAME);
        assert_eq!(
            playing_on(&game, SoundChannel::Music2),
            Some(AudioKey::Music(SoundId::new(200)))
        );
        assert!(game.audio().mixer().is_fading_out(SoundChannel::Music1));

        for _ in 0..80 {
            game.frame(FRAME);
        }
        assert_eq!(playing_on(&game, SoundChannel::Music1), None);
        assert_eq!(
            playing_on(&game, SoundChannel::Music2),
            Some(AudioKey::Music(SoundId::new(200)))
        );
    }

    #[test]
    fn e2e_music_cue_events_cross_fade() {
        let mut game = game();

        game.events_mut()
            .execute_event(Event::just_music(SoundId::new(100)), Some(PLAYER), None);
        let report = game.frame(FRAME);
        assert_eq!((report.events, report.audio_requests), (1, 1));
        assert_eq!(
            playing_on(&game, SoundChannel::Music1),
            Some(AudioKey::Music(SoundId::new(100)))
        );

        for _ in 0..80 {
            game.frame(FRAME);
        }

        game.events_mut()
            .execute_event(Event::just_music(SoundId::new(200)), Some(PLAYER), None);
        game.frame(FRAME);
        assert_eq!(
            playing_on(&game, SoundChannel::Music2),
            Some(AudioKey::Music(SoundId::new(200)))
        );
        assert!(game.audio().mixer().is_fading_out(SoundChannel::Music1));
        assert_eq!(
            game.presentation().history(),
            &[
                Presented::Sound(SoundCue {
                    sound: SoundId::new(100),
                    music: true
                }),
                Presented::Sound(SoundCue {
                    sound: SoundId::new(200),
                    music: true
                }),
            ]
        );
    }

    #[test]
    fn e2e_busy_frame_keeps_every_sound_request() {
        let mut game = game();
        for state in 0..300 {
            game.events_mut().execute_io_trigger(
                ActorRef::InteractiveObject(ThingId::new(9)),
                state,
                Some(PLAYER),
            );
        }
        for _ in 0..300 {
            game.events_mut().execute_event(
                Event::notification("tick").with_sound(SoundId::new(7)),
                Some(PLAYER),
                None,
            );
        }

        let report = game.frame(FRAME);
        assert_eq!(report.events, 600);
        assert_eq!(report.audio_requests, 300);
        assert_eq!(
            playing_on(&game, SoundChannel::Triggers),
            Some(AudioKey::Sound(SoundId::new(7)))
        );
    }

    #[test]
    fn e2e_item_locked_event_set() {
        let mut catalog = EventCatalog::new();
        let door = catalog.insert_set(
            EventSet::from_events(
                EventSelection::First,
                vec![Event::start_conversation(
                    Conversation::new("The door creaks open.").with_speaker("Door"),
                )],
            )
            .with_lock(Lock::Item {
                item: ItemId::new(3),
                count: 1,
                consume: true,
            }),
        );

        let mut inventory = Inventory::new(8);
        inventory.add(ItemId::new(3), 1).expect("add key");
        let mut game = game_with(catalog, LoggingPresentation::new(inventory));

        assert!(game.events_mut().execute_event_set(door, Some(PLAYER), None));
        assert!(game.events().poll_lock_avail());

        let report = game.frame(FRAME);
        assert_eq!(report.events, 1);
        assert_eq!(
            game.presentation().history(),
            &[
                Presented::LockOpened(ItemId::new(3)),
                Presented::Conversation("The door creaks open.".into())
            ]
        );
        assert_eq!(game.presentation().inventory().count(ItemId::new(3)), 0);
        assert_eq!(
            game.events().catalog().read().set(door).map(EventSet::lock),
            Some(Lock::Unlocked)
        );
    }

    #[test]
    fn e2e_one_shot_latch() {
        let mut catalog = EventCatalog::new();
        let hello = catalog.insert_event(Event::notification("hi").with_one_shot(true));
        let mut game = game_with(catalog, LoggingPresentation::default());

        assert!(game.events_mut().execute_event_ref(hello, Some(PLAYER), None));
        game.frame(FRAME);
        assert_eq!(
            game.presentation().history(),
            &[Presented::Notification("hi".into())]
        );

        assert!(!game.events_mut().execute_event_ref(hello, Some(PLAYER), None));
        assert!(!game.events().poll_event_available());

        let report = game.frame(FRAME);
        assert_eq!(report.events + report.skipped, 0);
        assert_eq!(game.presentation().history().len(), 1);
    }

    #[test]
    fn e2e_teleport_payload() {
        let mut game = game();
        game.events_mut().execute_event(
            Event::teleport(ThingId::new(5), 12, 34, 2),
            Some(PLAYER),
            None,
        );
        game.frame(FRAME);

        assert_eq!(
            game.presentation().history(),
            &[Presented::Teleport(TeleportTarget {
                thing: ThingId::new(5),
                destination: SectionTile::new(2, 12, 34),
            })]
        );
    }

    #[test]
    fn e2e_two_simultaneous_music_requests() {
        let mut game = game();
        game.events().trigger_music(SoundId::new(100));
        game.events().trigger_music(SoundId::new(200));

        let report = game.frame(FRAME);
        assert_eq!(report.audio_requests, 2);
        assert!(game.audio_mut().queued().is_empty());

        let commands = game.audio().mixer().commands();
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
        assert_eq!(
            commands[2],
            MixerCommand::FadeOut {
                channel: SoundChannel::Music1,
                fade_ms: 1000
            }
        );
        assert_eq!(
            playing_on(&game, SoundChannel::Music2),
            Some(AudioKey::Music(SoundId::new(200)))
        );
    }
}

mod replay {
    use super::*;

    const SCRIPT: &str = r#"
        (
            version: (major: 1, minor: 1, patch: 0),
            sets: [
                (
                    lock: Item(item: 3, count: 1, consume: true),
                    events: [
                        (
                            kind: Conversation((speaker: Some("Door"), text: "It opens.")),
                            one_shot: true,
                        ),
                    ],
                ),
            ],
            actions: [
                (frame: 0, action: Music(100)),
                (frame: 1, action: Pickup(thing: 40, item: 3, count: 1, walkover: true)),
                (frame: 2, action: EventSet(set: 0, source: Some(Io(12)))),
                (frame: 3, action: EventSet(set: 0, source: Some(Io(12)))),
                (frame: 4, action: Event(
                    event: (kind: Teleport(thing: 5, section: 2, x: 12, y: 34), sound: Some(7)),
                )),
            ],
        )
    "#;

    #[test]
    fn e2e_script_replay() {
        let script = EventScript::parse(SCRIPT, "replay.ron").expect("parse");
        let mut catalog = EventCatalog::new();
        let sets = script.install(&mut catalog);
        let mut game = game_with(catalog, LoggingPresentation::default());

        let frames = game.run_script(&script, &sets, 0, || FRAME);

        // The teleport sound keeps the replay alive until it ends
        assert!(frames > 5, "ran {frames} frames");
        assert!(frames < 100, "ran {frames} frames");

        assert_eq!(
            game.presentation().history(),
            &[
                Presented::Pickup(ItemRef::new(ThingId::new(40), ItemId::new(3), 1)),
                Presented::LockOpened(ItemId::new(3)),
                Presented::Conversation("It opens.".into()),
                Presented::Teleport(TeleportTarget {
                    thing: ThingId::new(5),
                    destination: SectionTile::new(2, 12, 34),
                }),
            ]
        );
        assert_eq!(game.presentation().inventory().count(ItemId::new(3)), 0);
        assert_eq!(
            playing_on(&game, SoundChannel::Music1),
            Some(AudioKey::Music(SoundId::new(100)))
        );
        assert!(game.is_settled());
    }

    #[test]
    fn e2e_replay_frame_limit() {
        let script = EventScript::parse(SCRIPT, "replay.ron").expect("parse");
        let mut catalog = EventCatalog::new();
        let sets = script.install(&mut catalog);
        let mut game = game_with(catalog, LoggingPresentation::default());

        assert_eq!(game.run_script(&script, &sets, 3, || FRAME), 3);
        assert_eq!(game.frame_count(), 3);
        assert_eq!(game.presentation().history().len(), 3);
    }
}
