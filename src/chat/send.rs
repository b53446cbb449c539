// Optimistic send pipeline for Huddle
// The local copy shows immediately and reconciles with the confirmation

use chrono::Utc;
use log::{debug, error, info, warn};
use uuid::Uuid;

use super::ChatClient;
use crate::models::{Message, MessageDraft, TEMP_ID_PREFIX};

impl ChatClient {
    /// Send a draft to the selected counterparty.
    ///
    /// With no selection, no identity, or an empty draft this is a logged
    /// no-op. A failed send rolls the optimistic copy back and stays silent
    /// beyond the log; nothing is retried and nothing propagates to the
    /// embedding surface.
    pub async fn send_message(&self, draft: MessageDraft) {
        if draft.is_empty() {
            debug!("Empty draft, nothing to send");
            return;
        }
        if self.user_id.is_empty() {
            warn!("No authenticated identity, dropping send");
            return;
        }
        let Some(counterparty) = self.selected_contact() else {
            warn!("No counterparty selected, dropping send");
            return;
        };

        let temp_id = format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4());
        let optimistic = Message {
            id: temp_id.clone(),
            sender_id: self.user_id.clone(),
            receiver_id: counterparty.id.clone(),
            text: draft.text.clone(),
            image: draft.image.clone(),
            created_at: Utc::now(),
            is_optimistic: true,
        };
        if let Ok(mut log) = self.state.messages.lock() {
            // A colliding temp id cannot survive the insert dedup, but the
            // removal keeps the intent explicit.
            log.remove(&temp_id);
            log.insert(optimistic);
        }

        let confirmed = match self.gateway.send_message(&counterparty.id, &draft).await {
            Ok(raw) => match Message::try_from(raw) {
                Ok(confirmed) => confirmed,
                Err(e) => {
                    error!("Send confirmation failed validation, rolling back: {}", e);
                    self.rollback(&temp_id);
                    return;
                }
            },
            Err(e) => {
                error!("Failed to send message to {}: {}", counterparty.id, e);
                self.rollback(&temp_id);
                return;
            }
        };

        info!("Send to {} confirmed as {}", counterparty.id, confirmed.id);
        // Single mutation: the temp entry and the confirmed copy can never
        // coexist in the list, even against a racing live echo.
        if let Ok(mut log) = self.state.messages.lock() {
            log.confirm(&temp_id, confirmed.clone());
        }
        if let Ok(mut chats) = self.state.chats.lock() {
            chats.touch(&counterparty.id, &confirmed);
        }

        self.notifier.sound_cue();
        self.notifier.message_sent(&counterparty);
    }

    fn rollback(&self, temp_id: &str) {
        if let Ok(mut log) = self.state.messages.lock() {
            log.remove(temp_id);
        }
    }
}
