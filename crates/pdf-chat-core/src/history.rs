//! Bounded conversation history.
//!
//! The cap is an amnesia policy, not a sliding window: once the flattened
//! message count (two messages per [`Turn`]) exceeds the limit, every turn
//! is dropped at once.

use crate::models::Turn;

/// Default flattened message limit.
pub const DEFAULT_MAX_MESSAGES: usize = 100;

#[derive(Debug, Clone)]
pub struct History {
    turns: Vec<Turn>,
    max_messages: usize,
}

impl History {
    pub fn new(max_messages: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_messages,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of messages when the turns are flattened (user + assistant).
    pub fn message_count(&self) -> usize {
        self.turns.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Clear the history if it has grown past the cap.
    ///
    /// Returns `true` when a reset happened.
    pub fn enforce_cap(&mut self) -> bool {
        if self.message_count() > self.max_messages {
            self.turns.clear();
            true
        } else {
            false
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}
