// Live event subscriptions for Huddle
// Inbound handlers are scoped to the selected counterparty and re-bound on
// every selection switch

use log::{debug, info, warn};
use std::sync::Arc;

use super::{ChatClient, ChatState, EventKind, LiveEvent, Notifier};
use crate::models::{
    Contact, Message, PresenceUpdate, RawMessage, RawPresenceUpdate, RawTypingEvent, TypingEvent,
};

impl ChatClient {
    /// Bind the per-conversation handlers. A no-op unless the connection is
    /// live and a counterparty is selected. Existing bindings are detached
    /// first, so re-subscribing for the same or a different counterparty
    /// can never double-deliver.
    pub fn subscribe_live(&self) {
        if !self.live.is_connected() {
            debug!("Live connection not available, skipping subscribe");
            return;
        }
        let Some(counterparty) = self.selected_contact() else {
            debug!("No counterparty selected, skipping subscribe");
            return;
        };

        self.live.off(EventKind::NewMessage);
        self.live.off(EventKind::MessageSent);

        // newMessage: an inbound message from the selected counterparty.
        {
            let state = self.state.clone();
            let notifier = self.notifier.clone();
            let counterparty = counterparty.clone();
            self.live.on(
                EventKind::NewMessage,
                Box::new(move |event| {
                    handle_new_message(&state, &notifier, &counterparty, event);
                }),
            );
        }

        // messageSent: echo of our own send confirmed from another session.
        {
            let state = self.state.clone();
            let counterparty_id = counterparty.id.clone();
            self.live.on(
                EventKind::MessageSent,
                Box::new(move |event| {
                    handle_message_sent(&state, &counterparty_id, event);
                }),
            );
        }

        // Selection-independent consumption survives the re-bind.
        self.attach_global_handlers();
        info!("Subscribed to live events for {}", counterparty.id);
    }

    /// Detach every known event binding. Safe to call when already detached
    /// or when the connection has gone away.
    pub fn unsubscribe_live(&self) {
        self.live.off_all();
        debug!("Detached all live event handlers");
    }

    /// Presence and typing indicators are consumed regardless of selection.
    pub(crate) fn attach_global_handlers(&self) {
        let state = self.state.clone();
        self.live.on(
            EventKind::UserOnlineStatus,
            Box::new(move |event| {
                handle_online_status(&state, event);
            }),
        );
        let state = self.state.clone();
        self.live.on(
            EventKind::UserTyping,
            Box::new(move |event| {
                handle_typing(&state, event);
            }),
        );
    }
}

/// Decode and validate a message payload, dropping malformed events with a
/// warning instead of surfacing them.
fn decode_message(event: &LiveEvent) -> Option<Message> {
    let raw: RawMessage = match serde_json::from_value(event.payload.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Dropping undecodable {} payload: {}", event.kind.name(), e);
            return None;
        }
    };
    match Message::try_from(raw) {
        Ok(msg) => Some(msg),
        Err(e) => {
            warn!("Dropping {} event: {}", event.kind.name(), e);
            None
        }
    }
}

fn handle_new_message(
    state: &Arc<ChatState>,
    notifier: &Arc<Notifier>,
    counterparty: &Contact,
    event: &LiveEvent,
) {
    let Some(msg) = decode_message(event) else { return };
    if msg.sender_id != counterparty.id {
        debug!("Ignoring message from unselected sender {}", msg.sender_id);
        return;
    }
    let inserted = state
        .messages
        .lock()
        .map(|mut log| log.insert(msg.clone()))
        .unwrap_or(false);
    if !inserted {
        // Duplicate delivery; the first copy already did the work.
        return;
    }
    if let Ok(mut chats) = state.chats.lock() {
        chats.touch(&msg.sender_id, &msg);
    }
    notifier.sound_cue();
    notifier.message_received(counterparty, msg.preview());
}

fn handle_message_sent(state: &Arc<ChatState>, counterparty_id: &str, event: &LiveEvent) {
    let Some(msg) = decode_message(event) else { return };
    if msg.receiver_id != counterparty_id {
        debug!("Ignoring sent echo addressed to {}", msg.receiver_id);
        return;
    }
    let inserted = state
        .messages
        .lock()
        .map(|mut log| log.insert(msg.clone()))
        .unwrap_or(false);
    if !inserted {
        return;
    }
    if let Ok(mut chats) = state.chats.lock() {
        chats.touch(counterparty_id, &msg);
    }
}

fn handle_online_status(state: &Arc<ChatState>, event: &LiveEvent) {
    let raw: RawPresenceUpdate = match serde_json::from_value(event.payload.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Dropping undecodable userOnlineStatus payload: {}", e);
            return;
        }
    };
    match PresenceUpdate::try_from(raw) {
        Ok(update) => {
            if let Ok(mut presence) = state.presence.lock() {
                presence.insert(update.user_id, update.status);
            }
        }
        Err(e) => warn!("Dropping userOnlineStatus event: {}", e),
    }
}

fn handle_typing(state: &Arc<ChatState>, event: &LiveEvent) {
    let raw: RawTypingEvent = match serde_json::from_value(event.payload.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Dropping undecodable userTyping payload: {}", e);
            return;
        }
    };
    let typing = match TypingEvent::try_from(raw) {
        Ok(typing) => typing,
        Err(e) => {
            warn!("Dropping userTyping event: {}", e);
            return;
        }
    };
    if let Ok(mut typing_tx) = state.typing_tx.lock() {
        let closed = match typing_tx.as_ref() {
            Some(tx) => tx.send(typing).is_err(),
            None => false,
        };
        if closed {
            // Receiver dropped; stop forwarding until someone re-subscribes.
            *typing_tx = None;
        }
    }
}
