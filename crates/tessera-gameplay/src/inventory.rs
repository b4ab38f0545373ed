//! Player inventory.
//!
//! The event layer never consults the inventory. The presentation layer
//! uses it to apply give/take events and to answer item locks.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tessera_common::ItemId;
use thiserror::Error;

/// Inventory error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// Fewer items held than requested
    #[error("Not enough items: need {needed}, have {have}")]
    NotEnough {
        /// Amount requested
        needed: u32,
        /// Amount held
        have: u32,
    },
    /// No free slot for a new item type
    #[error("Inventory full: {slots} item types")]
    Full {
        /// Slot limit
        slots: u32,
    },
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Item counts keyed by item type, limited to a number of distinct types.
///
/// Iteration is in item id order.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    items: BTreeMap<ItemId, u32>,
    slots: u32,
}

impl Inventory {
    /// Creates an empty inventory holding up to `slots` item types.
    #[must_use]
    pub fn new(slots: u32) -> Self {
        Self {
            items: BTreeMap::new(),
            slots,
        }
    }

    /// Number of distinct item types held.
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.items.len() as u32
    }

    /// Count held of `item`.
    #[must_use]
    pub fn count(&self, item: ItemId) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    /// Returns true if at least `amount` of `item` is held.
    #[must_use]
    pub fn has(&self, item: ItemId, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Adds items. Fails only if `item` is new and every slot is taken.
    pub fn add(&mut self, item: ItemId, amount: u32) -> InventoryResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let full = self.slot_count() >= self.slots;
        match self.items.entry(item) {
            Entry::Occupied(mut held) => {
                let total = held.get().saturating_add(amount);
                held.insert(total);
            },
            Entry::Vacant(_) if full => return Err(InventoryError::Full { slots: self.slots }),
            Entry::Vacant(slot) => {
                slot.insert(amount);
            },
        }
        Ok(())
    }

    /// Removes items, freeing the slot when the count reaches zero. Nothing
    /// changes on failure.
    pub fn remove(&mut self, item: ItemId, amount: u32) -> InventoryResult<()> {
        let have = self.count(item);
        if have < amount {
            return Err(InventoryError::NotEnough {
                needed: amount,
                have,
            });
        }
        if let Entry::Occupied(mut held) = self.items.entry(item) {
            if have == amount {
                held.remove();
            } else {
                held.insert(have - amount);
            }
        }
        Ok(())
    }

    /// Held items in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.items.iter().map(|(&id, &count)| (id, count))
    }
}
