// Common test utilities for integration tests
// This module contains shared code for all integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::LevelFilter;
use tokio::sync::mpsc;

use huddle::chat::{
    Alert, ChatClient, EventKind, LiveConnection, LiveEvent, MessageGateway, Notifier,
};
use huddle::models::{Contact, MessageDraft, RawChatSummary, RawMessage};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Debounce window used by test notifiers, kept short so burst tests run
/// quickly.
pub const SHORT_DEBOUNCE: Duration = Duration::from_millis(40);

/// Fixed base timestamp for deterministic ordering assertions.
pub fn ts(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
}

pub fn contact(id: &str, email: &str) -> Contact {
    Contact {
        id: id.to_string(),
        email: email.to_string(),
        first_name: None,
        last_name: None,
        profile_pic: None,
        is_admin: false,
    }
}

pub fn admin_contact(id: &str, email: &str) -> Contact {
    Contact {
        is_admin: true,
        ..contact(id, email)
    }
}

pub fn raw_message(id: &str, sender: &str, receiver: &str, text: &str, offset_secs: i64) -> RawMessage {
    RawMessage {
        id: Some(id.to_string()),
        sender_id: Some(sender.to_string()),
        receiver_id: Some(receiver.to_string()),
        text: Some(text.to_string()),
        image: None,
        created_at: Some(ts(offset_secs)),
    }
}

/// Build the JSON payload of a live message event. `id: None` produces the
/// malformed shape the handlers must drop.
pub fn message_payload(
    id: Option<&str>,
    sender: &str,
    receiver: &str,
    text: &str,
    offset_secs: i64,
) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "senderId": sender,
        "receiverId": receiver,
        "text": text,
        "createdAt": ts(offset_secs).to_rfc3339(),
    });
    if let Some(id) = id {
        payload["_id"] = serde_json::Value::String(id.to_string());
    }
    payload
}

pub fn emit(live: &LiveConnection, kind: EventKind, payload: serde_json::Value) {
    live.emit(LiveEvent { kind, payload });
}

/// In-memory stand-in for the HTTP backend collaborator.
pub struct FakeGateway {
    pub contacts: Mutex<Vec<Contact>>,
    pub chats: Mutex<Vec<RawChatSummary>>,
    pub history: Mutex<HashMap<String, Vec<RawMessage>>>,
    /// Response for the next send; `Err` simulates a network failure.
    pub send_response: Mutex<Option<Result<RawMessage, String>>>,
    pub fail_history: Mutex<bool>,
    pub send_delay: Mutex<Option<Duration>>,
    pub history_delay: Mutex<Option<Duration>>,
    pub send_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeGateway {
            contacts: Mutex::new(Vec::new()),
            chats: Mutex::new(Vec::new()),
            history: Mutex::new(HashMap::new()),
            send_response: Mutex::new(None),
            fail_history: Mutex::new(false),
            send_delay: Mutex::new(None),
            history_delay: Mutex::new(None),
            send_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        })
    }

    pub fn with_contacts(contacts: Vec<Contact>) -> Arc<Self> {
        let gateway = Self::new();
        *gateway.contacts.lock().unwrap() = contacts;
        gateway
    }

    pub fn set_send_ok(&self, raw: RawMessage) {
        *self.send_response.lock().unwrap() = Some(Ok(raw));
    }

    pub fn set_send_err(&self, message: &str) {
        *self.send_response.lock().unwrap() = Some(Err(message.to_string()));
    }

    pub fn set_history(&self, user_id: &str, entries: Vec<RawMessage>) {
        self.history
            .lock()
            .unwrap()
            .insert(user_id.to_string(), entries);
    }

    pub fn set_fail_history(&self, fail: bool) {
        *self.fail_history.lock().unwrap() = fail;
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_history_delay(&self, delay: Duration) {
        *self.history_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_chats(&self, chats: Vec<RawChatSummary>) {
        *self.chats.lock().unwrap() = chats;
    }
}

#[async_trait]
impl MessageGateway for FakeGateway {
    async fn fetch_contacts(&self) -> Result<Vec<Contact>> {
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn fetch_chats(&self) -> Result<Vec<RawChatSummary>> {
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn fetch_history(&self, user_id: &str) -> Result<Vec<RawMessage>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.history_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_history.lock().unwrap() {
            return Err(anyhow!("simulated history failure"));
        }
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(&self, _user_id: &str, _draft: &MessageDraft) -> Result<RawMessage> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.send_response.lock().unwrap().take() {
            Some(Ok(raw)) => Ok(raw),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("no send response configured")),
        }
    }
}

/// A fully wired client against fakes: detached live connection, short
/// debounce window, window reported unfocused so notifications fire.
pub struct TestHarness {
    pub client: Arc<ChatClient>,
    pub gateway: Arc<FakeGateway>,
    pub live: Arc<LiveConnection>,
    pub notifier: Arc<Notifier>,
    pub alerts: mpsc::UnboundedReceiver<Alert>,
}

pub fn setup_harness(contacts: Vec<Contact>) -> TestHarness {
    setup_logging();
    let gateway = FakeGateway::with_contacts(contacts);
    let live = LiveConnection::detached();
    let (notifier, alerts) = Notifier::with_window(true, SHORT_DEBOUNCE);
    notifier.set_window_focused(false);
    let gateway_dyn: Arc<dyn MessageGateway> = gateway.clone();
    let client = Arc::new(ChatClient::new(
        "user-a",
        gateway_dyn,
        live.clone(),
        notifier.clone(),
    ));
    TestHarness {
        client,
        gateway,
        live,
        notifier,
        alerts,
    }
}
