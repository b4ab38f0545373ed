//! Presentation boundary.
//!
//! The frame loop polls each queued event and hands its payload to a
//! [`Presentation`]. A real game shows dialogue boxes, runs battles and
//! moves the camera here; the binary ships [`LoggingPresentation`], which
//! logs what it would do and keeps a player [`Inventory`] so item events
//! and item locks have real effects.

use tessera_common::{ItemId, MapId};
use tessera_gameplay::{
    ActorRef, BattleFlags, BattleSetup, Conversation, Inventory, IoTrigger, ItemRef,
    ItemTransfer, SoundCue, TeleportTarget, UnlockIo, UnlockThing, UnlockTile,
};
use tracing::{info, warn};

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// The player won; the win follow-up runs.
    Won,
    /// The player lost; the lose follow-up runs.
    Lost,
    /// The player ran; nothing follows.
    Fled,
}

/// Receiver of polled events.
pub trait Presentation {
    /// Show a conversation.
    fn conversation(&mut self, convo: &Conversation, source: Option<ActorRef>);

    /// Run a battle to completion.
    fn battle(&mut self, setup: &BattleSetup) -> BattleOutcome;

    /// The player picked up a map item.
    fn pickup(&mut self, item: ItemRef, walkover: bool);

    /// Items were given to the player.
    fn give_item(&mut self, transfer: ItemTransfer);

    /// Items were taken from the player.
    fn take_item(&mut self, transfer: ItemTransfer);

    /// Show a notification.
    fn notification(&mut self, text: &str);

    /// Switch maps.
    fn start_map(&mut self, map: MapId);

    /// Move a thing.
    fn teleport(&mut self, target: TeleportTarget);

    /// An interactive object changed state.
    fn io_trigger(&mut self, trigger: IoTrigger);

    /// Unlock an interactive object.
    fn unlock_io(&mut self, unlock: UnlockIo);

    /// Unlock a thing.
    fn unlock_thing(&mut self, unlock: UnlockThing);

    /// Unlock a tile.
    fn unlock_tile(&mut self, unlock: UnlockTile);

    /// A sound-only event fired. The sound itself is already requested.
    fn sound(&mut self, _cue: SoundCue) {}

    /// Decide an item lock. Returning true opens the lock; any items to
    /// consume must be removed here.
    fn resolve_item_lock(&mut self, item: ItemId, count: u32, consume: bool) -> bool;
}

/// What [`LoggingPresentation`] was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presented {
    /// Conversation opening line.
    Conversation(String),
    /// Battle flags.
    Battle(BattleFlags),
    /// Pickup.
    Pickup(ItemRef),
    /// Items received.
    GiveItem(ItemTransfer),
    /// Items removed.
    TakeItem(ItemTransfer),
    /// Notification text.
    Notification(String),
    /// Map switch.
    StartMap(MapId),
    /// Teleport.
    Teleport(TeleportTarget),
    /// Interactive object state.
    IoTrigger(IoTrigger),
    /// Interactive object unlock.
    UnlockIo(UnlockIo),
    /// Thing unlock.
    UnlockThing(UnlockThing),
    /// Tile unlock.
    UnlockTile(UnlockTile),
    /// Sound-only event.
    Sound(SoundCue),
    /// Item lock opened.
    LockOpened(ItemId),
    /// Item lock stayed closed.
    LockRejected(ItemId),
}

/// Presentation that logs every event and tracks an inventory.
#[derive(Debug, Clone)]
pub struct LoggingPresentation {
    inventory: Inventory,
    history: Vec<Presented>,
    battle_outcome: BattleOutcome,
}

impl Default for LoggingPresentation {
    fn default() -> Self {
        Self::new(Inventory::new(DEFAULT_INVENTORY_SLOTS))
    }
}

/// Distinct item types the default inventory holds.
pub const DEFAULT_INVENTORY_SLOTS: u32 = 32;

impl LoggingPresentation {
    /// Create a presentation around an inventory. Battles are won.
    #[must_use]
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory,
            history: Vec::new(),
            battle_outcome: BattleOutcome::Won,
        }
    }

    /// Decide how every following battle ends.
    #[must_use]
    pub fn with_battle_outcome(mut self, outcome: BattleOutcome) -> Self {
        self.battle_outcome = outcome;
        self
    }

    /// The player's inventory.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The player's inventory, mutably.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Everything shown so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Presented] {
        &self.history
    }

    /// Take and clear the history.
    pub fn take_history(&mut self) -> Vec<Presented> {
        std::mem::take(&mut self.history)
    }

    fn receive(&mut self, item: ItemId, count: u32) {
        if let Err(e) = self.inventory.add(item, count) {
            warn!("Could not add {} x{:?}: {}", count, item, e);
        }
    }
}

impl Presentation for LoggingPresentation {
    fn conversation(&mut self, convo: &Conversation, source: Option<ActorRef>) {
        let speaker = convo.speaker.as_deref().unwrap_or("?");
        match source {
            Some(actor) => info!("[{}] {}: {}", actor, speaker, convo.text),
            None => info!("{}: {}", speaker, convo.text),
        }
        self.history.push(Presented::Conversation(convo.text.clone()));
    }

    fn battle(&mut self, setup: &BattleSetup) -> BattleOutcome {
        info!("Battle ({:?}) -> {:?}", setup.flags, self.battle_outcome);
        self.history.push(Presented::Battle(setup.flags));
        self.battle_outcome
    }

    fn pickup(&mut self, item: ItemRef, walkover: bool) {
        info!(
            "Picked up {} x{:?} from {} ({})",
            item.count,
            item.item,
            item.thing,
            if walkover { "walked over" } else { "used" }
        );
        self.receive(item.item, item.count);
        self.history.push(Presented::Pickup(item));
    }

    fn give_item(&mut self, transfer: ItemTransfer) {
        info!("Received {} x{:?}", transfer.count, transfer.item);
        self.receive(transfer.item, transfer.count);
        self.history.push(Presented::GiveItem(transfer));
    }

    fn take_item(&mut self, transfer: ItemTransfer) {
        match self.inventory.remove(transfer.item, transfer.count) {
            Ok(()) => info!("Lost {} x{:?}", transfer.count, transfer.item),
            Err(e) => warn!("Could not take {:?}: {}", transfer.item, e),
        }
        self.history.push(Presented::TakeItem(transfer));
    }

    fn notification(&mut self, text: &str) {
        info!("Notification: {}", text);
        self.history.push(Presented::Notification(text.to_string()));
    }

    fn start_map(&mut self, map: MapId) {
        info!("Starting map {:?}", map);
        self.history.push(Presented::StartMap(map));
    }

    fn teleport(&mut self, target: TeleportTarget) {
        info!(
            "Teleporting {} to section {} ({}, {})",
            target.thing, target.destination.section, target.destination.tile.x,
            target.destination.tile.y
        );
        self.history.push(Presented::Teleport(target));
    }

    fn io_trigger(&mut self, trigger: IoTrigger) {
        info!("{:?} changed to state {}", trigger.io, trigger.state);
        self.history.push(Presented::IoTrigger(trigger));
    }

    fn unlock_io(&mut self, unlock: UnlockIo) {
        info!("Unlocking {} ({:?})", unlock.io, unlock.mode);
        self.history.push(Presented::UnlockIo(unlock));
    }

    fn unlock_thing(&mut self, unlock: UnlockThing) {
        info!("Unlocking {}", unlock.thing);
        self.history.push(Presented::UnlockThing(unlock));
    }

    fn unlock_tile(&mut self, unlock: UnlockTile) {
        info!("Unlocking tile {:?}", unlock.tile);
        self.history.push(Presented::UnlockTile(unlock));
    }

    fn sound(&mut self, cue: SoundCue) {
        if cue.music {
            info!("Music changes to {}", cue.sound);
        }
        self.history.push(Presented::Sound(cue));
    }

    fn resolve_item_lock(&mut self, item: ItemId, count: u32, consume: bool) -> bool {
        if !self.inventory.has(item, count) {
            info!("Locked: needs {} x{:?}", count, item);
            self.history.push(Presented::LockRejected(item));
            return false;
        }
        if consume {
            if let Err(e) = self.inventory.remove(item, count) {
                warn!("Could not consume lock items: {}", e);
                return false;
            }
        }
        info!("Unlocked with {} x{:?}", count, item);
        self.history.push(Presented::LockOpened(item));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_lock_consumes() {
        let mut presentation = LoggingPresentation::default();
        let key = ItemId::new(3);

        assert!(!presentation.resolve_item_lock(key, 1, true));
        presentation.give_item(ItemTransfer { item: key, count: 2 });

        assert!(presentation.resolve_item_lock(key, 1, true));
        assert_eq!(presentation.inventory().count(key), 1);
        assert!(presentation.resolve_item_lock(key, 1, false));
        assert_eq!(presentation.inventory().count(key), 1);

        assert_eq!(
            presentation.history().last(),
            Some(&Presented::LockOpened(key))
        );
    }

    #[test]
    fn test_take_more_than_held_keeps_inventory() {
        let mut presentation = LoggingPresentation::default();
        let gold = ItemId::new(1);
        presentation.give_item(ItemTransfer {
            item: gold,
            count: 5,
        });
        presentation.take_item(ItemTransfer {
            item: gold,
            count: 9,
        });
        assert_eq!(presentation.inventory().count(gold), 5);
    }
}
