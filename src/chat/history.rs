// Conversation history for Huddle
// Wholesale history fetches with a stale-response guard on selection switches

use anyhow::Result;
use log::{debug, error, info, warn};
use std::sync::atomic::Ordering;

use super::ChatClient;
use crate::models::{ChatSummary, Contact, Message};

impl ChatClient {
    /// Select a counterparty: the message list clears immediately, the live
    /// subscription re-scopes, and that conversation's history is fetched.
    pub async fn select_contact(&self, contact: Contact) {
        let epoch = self.state.selection_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut selected) = self.state.selected.lock() {
            *selected = Some(contact.clone());
        }
        if let Ok(mut log) = self.state.messages.lock() {
            log.clear();
        }
        self.subscribe_live();
        self.fetch_history_guarded(&contact.id, epoch).await;
    }

    /// Re-fetch the selected conversation without clearing it first.
    pub async fn refresh_history(&self) {
        let Some(contact) = self.selected_contact() else {
            debug!("No counterparty selected, skipping history refresh");
            return;
        };
        let epoch = self.state.selection_epoch.load(Ordering::SeqCst);
        self.fetch_history_guarded(&contact.id, epoch).await;
    }

    /// Fetch `user_id`'s history and replace the list wholesale, unless the
    /// selection moved on while the request was in flight. Fetch failures
    /// are logged and leave the list at its previous value.
    async fn fetch_history_guarded(&self, user_id: &str, epoch: u64) {
        self.state.history_loading.store(true, Ordering::SeqCst);
        let result = self.gateway.fetch_history(user_id).await;
        // Cleared on every path, success or not.
        self.state.history_loading.store(false, Ordering::SeqCst);

        match result {
            Ok(raw) => {
                if self.state.selection_epoch.load(Ordering::SeqCst) != epoch {
                    info!("Discarding stale history response for {}", user_id);
                    return;
                }
                let mut messages = Vec::with_capacity(raw.len());
                for entry in raw {
                    match Message::try_from(entry) {
                        Ok(msg) => messages.push(msg),
                        Err(e) => warn!("Dropping malformed history entry: {}", e),
                    }
                }
                info!("Loaded {} messages with {}", messages.len(), user_id);
                if let Ok(mut log) = self.state.messages.lock() {
                    log.replace_all(messages);
                }
            }
            Err(e) => {
                error!("Failed to fetch history with {}: {}", user_id, e);
            }
        }
    }

    /// Fetch the chat summary list, most recently updated first.
    pub async fn load_chats(&self) -> Result<Vec<ChatSummary>> {
        let raw = self.gateway.fetch_chats().await?;
        let chats: Vec<ChatSummary> = raw.into_iter().map(ChatSummary::from).collect();
        info!("Loaded {} chats", chats.len());
        if let Ok(mut held) = self.state.chats.lock() {
            held.replace_all(chats.clone());
        }
        Ok(chats)
    }
}
