// Chat synchronization client for Huddle
// This file ties the gateway, live connection, state, and notifier together;
// the per-concern operations live in the submodules

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub mod api;
pub mod contacts;
pub mod events;
pub mod history;
pub mod live;
pub mod notify;
pub mod send;
pub mod store;

pub use api::{HttpGateway, MessageGateway};
pub use live::{EventKind, LiveConnection, LiveEvent};
pub use notify::{Alert, Notifier};

use crate::models::{ChatSummary, Contact, ContactStatus, Message, TypingEvent};
use store::{ChatSummaries, MessageLog};

/// Shared mutable state of one chat surface. Single-owner by convention:
/// mutated only from this surface's own calls and its bound event handlers.
pub(crate) struct ChatState {
    pub messages: Mutex<MessageLog>,
    pub chats: Mutex<ChatSummaries>,
    pub contacts: Mutex<Vec<Contact>>,
    pub selected: Mutex<Option<Contact>>,
    pub presence: Mutex<HashMap<String, ContactStatus>>,
    pub typing_tx: Mutex<Option<mpsc::UnboundedSender<TypingEvent>>>,
    pub history_loading: AtomicBool,
    // Bumped on every selection switch; history responses carrying a stale
    // epoch are discarded instead of overwriting the current conversation.
    pub selection_epoch: AtomicU64,
}

impl ChatState {
    fn new() -> Arc<Self> {
        Arc::new(ChatState {
            messages: Mutex::new(MessageLog::new()),
            chats: Mutex::new(ChatSummaries::new()),
            contacts: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
            presence: Mutex::new(HashMap::new()),
            typing_tx: Mutex::new(None),
            history_loading: AtomicBool::new(false),
            selection_epoch: AtomicU64::new(0),
        })
    }
}

/// One chat surface: the authenticated identity, its backend collaborators,
/// and the in-memory conversation state they synchronize.
pub struct ChatClient {
    user_id: String,
    gateway: Arc<dyn MessageGateway>,
    live: Arc<LiveConnection>,
    notifier: Arc<Notifier>,
    state: Arc<ChatState>,
}

impl ChatClient {
    /// Session, transport, and notifier handles are passed in explicitly;
    /// the client never reaches for ambient globals.
    pub fn new(
        user_id: &str,
        gateway: Arc<dyn MessageGateway>,
        live: Arc<LiveConnection>,
        notifier: Arc<Notifier>,
    ) -> Self {
        let client = ChatClient {
            user_id: user_id.to_string(),
            gateway,
            live,
            notifier,
            state: ChatState::new(),
        };
        // Presence and typing consumption is selection-independent.
        client.attach_global_handlers();
        client
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn live(&self) -> &Arc<LiveConnection> {
        &self.live
    }

    /// Current message list of the selected conversation, in display order.
    pub fn messages(&self) -> Vec<Message> {
        self.state
            .messages
            .lock()
            .map(|log| log.snapshot())
            .unwrap_or_default()
    }

    /// Chat summary list, most recently updated first.
    pub fn chats(&self) -> Vec<ChatSummary> {
        self.state
            .chats
            .lock()
            .map(|chats| chats.snapshot())
            .unwrap_or_default()
    }

    pub fn selected_contact(&self) -> Option<Contact> {
        self.state.selected.lock().ok().and_then(|s| s.clone())
    }

    pub fn is_loading_history(&self) -> bool {
        self.state.history_loading.load(Ordering::SeqCst)
    }

    /// Last pushed online status for a user; unknown users read as offline.
    pub fn contact_status(&self, user_id: &str) -> ContactStatus {
        self.state
            .presence
            .lock()
            .ok()
            .and_then(|p| p.get(user_id).copied())
            .unwrap_or(ContactStatus::Offline)
    }

    /// Receive inbound typing indicators. Subscribing again replaces the
    /// previous receiver.
    pub fn subscribe_typing(&self) -> mpsc::UnboundedReceiver<TypingEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut typing_tx) = self.state.typing_tx.lock() {
            *typing_tx = Some(tx);
        }
        rx
    }
}
