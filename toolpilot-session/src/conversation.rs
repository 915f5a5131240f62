use crate::turn::{Role, Turn};

/// Ordered, append-only record of a single query.
///
/// Turns are never edited or removed once appended. [`Conversation::snapshot`]
/// hands out an owned copy so persistence never observes a half-built state.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation seeded with the user's query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(query)],
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn last_assistant(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|turn| turn.role() == Role::Assistant)
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}
