// In-memory conversation state for Huddle
// The message ordering and dedup invariants live here

use log::debug;

use crate::models::{ChatSummary, Message};

/// Ordered, deduplicated message list for the selected conversation.
///
/// The list holds at most one entry per identifier and is re-sorted by
/// `(created_at, id)` on every mutation, so interleaved arrival of an HTTP
/// confirmation and its live echo cannot leave the list out of order.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        MessageLog::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// Insert a message, discarding it when the identifier is already
    /// present. Returns whether the list changed.
    pub fn insert(&mut self, msg: Message) -> bool {
        if self.contains(&msg.id) {
            debug!("Discarding duplicate message {}", msg.id);
            return false;
        }
        self.messages.push(msg);
        self.sort();
        true
    }

    /// Remove an entry by identifier. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// Swap a temporary entry for its server-confirmed copy in a single
    /// mutation. The temp entry goes away unconditionally; the confirmed
    /// copy is skipped when its identifier is already present (the live
    /// echo may have delivered the same confirmation first).
    pub fn confirm(&mut self, temp_id: &str, confirmed: Message) -> bool {
        self.messages.retain(|m| m.id != temp_id);
        if self.contains(&confirmed.id) {
            debug!(
                "Confirmed message {} already present, dropping the copy",
                confirmed.id
            );
            self.sort();
            return false;
        }
        self.messages.push(confirmed);
        self.sort();
        true
    }

    /// Replace the list wholesale from a history fetch. Duplicated
    /// identifiers resolve last-write-wins.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        let mut deduped: Vec<Message> = Vec::with_capacity(messages.len());
        for msg in messages {
            if let Some(slot) = deduped.iter_mut().find(|m| m.id == msg.id) {
                *slot = msg;
            } else {
                deduped.push(msg);
            }
        }
        self.messages = deduped;
        self.sort();
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Clone of the current list, in display order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn sort(&mut self) {
        self.messages
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    }
}

/// The parallel chat summary list, kept most-recently-updated first.
#[derive(Debug, Default)]
pub struct ChatSummaries {
    chats: Vec<ChatSummary>,
}

impl ChatSummaries {
    pub fn new() -> Self {
        ChatSummaries::default()
    }

    pub fn replace_all(&mut self, chats: Vec<ChatSummary>) {
        self.chats = chats;
        self.sort();
    }

    /// Update the last message and timestamp of the conversation that has
    /// `contact_id` among its participants, then restore the sort order.
    /// A conversation that is not in the list yet is left for the next
    /// full fetch to pick up.
    pub fn touch(&mut self, contact_id: &str, message: &Message) -> bool {
        let Some(chat) = self
            .chats
            .iter_mut()
            .find(|c| c.participants.iter().any(|p| p.id == contact_id))
        else {
            debug!("No chat summary for contact {}, skipping touch", contact_id);
            return false;
        };
        chat.last_message = Some(message.clone());
        chat.updated_at = message.created_at;
        self.sort();
        true
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn snapshot(&self) -> Vec<ChatSummary> {
        self.chats.clone()
    }

    fn sort(&mut self) {
        self.chats
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    }
}
