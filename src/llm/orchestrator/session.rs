//! Conversation state owned by one orchestrator

use crate::llm::core::types::{Message, UsageMetadata};

/// Accumulated chat history and token usage
///
/// Lives exactly as long as the orchestrator that owns it; nothing is
/// persisted.
#[derive(Debug, Default)]
pub struct ConversationSession {
    messages: Vec<Message>,
    usage: UsageMetadata,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn usage(&self) -> UsageMetadata {
        self.usage
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn record_usage(&mut self, usage: &UsageMetadata) {
        self.usage.add(usage);
    }

    /// Drop everything after `len` messages; used to undo a failed turn
    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.usage = UsageMetadata::default();
    }
}
