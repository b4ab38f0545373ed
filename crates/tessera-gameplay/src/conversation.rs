//! Conversation trees carried by events.
//!
//! The event layer treats conversations as opaque payload: it stores them,
//! hands them to the presentation layer and never walks them itself.
//! Notifications reuse the type as a single node without a speaker.

use serde::{Deserialize, Serialize};

/// A node in a conversation tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Speaker name, if any.
    pub speaker: Option<String>,
    /// The text to display.
    pub text: String,
    /// Follow-up nodes (player responses or continued dialogue).
    #[serde(default)]
    pub responses: Vec<Conversation>,
}

impl Conversation {
    /// Create a node without a speaker.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            speaker: None,
            text: text.into(),
            responses: Vec::new(),
        }
    }

    /// Set the speaker.
    #[must_use]
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    /// Append a follow-up node.
    #[must_use]
    pub fn with_response(mut self, response: Conversation) -> Self {
        self.responses.push(response);
        self
    }

    /// Returns true if this node has no follow-ups.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.responses.is_empty()
    }

    /// Total number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.responses.iter().map(Self::node_count).sum::<usize>()
    }
}
