//! Logical key state.
//!
//! The event handler only carries a [`KeyHandler`] so the presentation layer
//! can reach it while handling polled events (for example to wait for the
//! action key before closing a notification). Nothing in the event layer
//! reads key state itself.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Key handler shared between the input layer and the event handler.
pub type SharedKeyHandler = Arc<RwLock<KeyHandler>>;

/// Logical game keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKey {
    /// Move up
    Up,
    /// Move down
    Down,
    /// Move left
    Left,
    /// Move right
    Right,
    /// Confirm / interact
    Action,
    /// Back / cancel
    Cancel,
    /// Open the menu
    Menu,
}

/// State of a key (pressed, just pressed, released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    /// Whether the key is currently held down
    pub pressed: bool,
    /// Whether the key was just pressed this frame
    pub just_pressed: bool,
    /// Whether the key was just released this frame
    pub just_released: bool,
}

impl KeyState {
    /// Update the state based on whether the key is currently pressed.
    pub fn update(&mut self, is_pressed: bool) {
        self.just_pressed = is_pressed && !self.pressed;
        self.just_released = !is_pressed && self.pressed;
        self.pressed = is_pressed;
    }

    /// Clear the frame-specific state (just_pressed, just_released).
    pub fn clear_frame(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }
}

/// Per-frame key state tracker.
#[derive(Debug, Clone, Default)]
pub struct KeyHandler {
    states: HashMap<GameKey, KeyState>,
}

impl KeyHandler {
    /// Create a handler with every key released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the handler for sharing.
    #[must_use]
    pub fn into_shared(self) -> SharedKeyHandler {
        Arc::new(RwLock::new(self))
    }

    /// Record a key press or release.
    pub fn set_key(&mut self, key: GameKey, pressed: bool) {
        self.states.entry(key).or_default().update(pressed);
    }

    /// Clear frame-specific state. Call at the end of each frame.
    pub fn end_frame(&mut self) {
        for state in self.states.values_mut() {
            state.clear_frame();
        }
    }

    /// Check if a key is currently held.
    #[must_use]
    pub fn is_held(&self, key: GameKey) -> bool {
        self.states.get(&key).is_some_and(|state| state.pressed)
    }

    /// Check if a key was just pressed this frame.
    #[must_use]
    pub fn just_pressed(&self, key: GameKey) -> bool {
        self.states.get(&key).is_some_and(|state| state.just_pressed)
    }

    /// Check if a key was just released this frame.
    #[must_use]
    pub fn just_released(&self, key: GameKey) -> bool {
        self.states.get(&key).is_some_and(|state| state.just_released)
    }
}
