// Live event connection for Huddle
// Push-based delivery from the backend over a WebSocket stream

use anyhow::{anyhow, Result};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Event names the backend pushes over the live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewMessage,
    MessageSent,
    UserTyping,
    UserOnlineStatus,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::NewMessage,
        EventKind::MessageSent,
        EventKind::UserTyping,
        EventKind::UserOnlineStatus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::NewMessage => "newMessage",
            EventKind::MessageSent => "messageSent",
            EventKind::UserTyping => "userTyping",
            EventKind::UserOnlineStatus => "userOnlineStatus",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        EventKind::ALL.iter().copied().find(|k| k.name() == name)
    }
}

/// A decoded push event: the name plus its still-untyped payload. Typed
/// validation happens in the bound handler so malformed payloads can be
/// dropped with a warning instead of tearing the stream down.
#[derive(Debug, Clone)]
pub struct LiveEvent {
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

/// Wire framing of a push event.
#[derive(Deserialize)]
struct WireEvent {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

pub type EventHandler = Box<dyn Fn(&LiveEvent) + Send + Sync>;

/// Handle on the push connection. Handler bindings are owned here: at most
/// one handler per event name, and binding again replaces the previous one,
/// so a re-subscribe can never double-deliver.
pub struct LiveConnection {
    handlers: Mutex<HashMap<EventKind, EventHandler>>,
    connected: AtomicBool,
}

impl LiveConnection {
    fn new(connected: bool) -> Arc<Self> {
        Arc::new(LiveConnection {
            handlers: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(connected),
        })
    }

    /// A connection with no transport behind it, reported as connected.
    /// Tests and embedding surfaces feed events in through `emit`.
    pub fn detached() -> Arc<Self> {
        Self::new(true)
    }

    /// A connection that reports as disconnected. Subscribe attempts
    /// against it are no-ops.
    pub fn offline() -> Arc<Self> {
        Self::new(false)
    }

    /// Open the WebSocket and spawn the reader task that feeds bound
    /// handlers until the stream ends.
    pub async fn connect(url: &str) -> Result<Arc<Self>> {
        info!("Connecting to live event stream at {}", url);
        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| anyhow!("Live connection to {} failed: {}", url, e))?;
        let conn = Self::new(true);
        let reader = conn.clone();
        tokio::spawn(async move {
            let (_write, mut read) = ws.split();
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => reader.dispatch(&text),
                    Ok(WsMessage::Close(_)) => {
                        info!("Live connection closed by server");
                        break;
                    }
                    // Ping/pong and binary frames carry no events.
                    Ok(_) => {}
                    Err(e) => {
                        error!("Live connection errored: {}", e);
                        break;
                    }
                }
            }
            reader.connected.store(false, Ordering::SeqCst);
            info!("Live event stream ended");
        });
        Ok(conn)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Bind a handler, replacing any previous binding for the same event.
    pub fn on(&self, kind: EventKind, handler: EventHandler) {
        if let Ok(mut handlers) = self.handlers.lock() {
            if handlers.insert(kind, handler).is_some() {
                debug!("Replaced existing handler for {}", kind.name());
            }
        } else {
            error!("Failed to acquire handler table lock for {}", kind.name());
        }
    }

    /// Detach the handler for an event, if any. Safe to call when already
    /// detached.
    pub fn off(&self, kind: EventKind) -> bool {
        match self.handlers.lock() {
            Ok(mut handlers) => handlers.remove(&kind).is_some(),
            Err(_) => {
                error!("Failed to acquire handler table lock for {}", kind.name());
                false
            }
        }
    }

    /// Detach every known event binding.
    pub fn off_all(&self) {
        for kind in EventKind::ALL {
            self.off(kind);
        }
    }

    /// Deliver an event to its bound handler, if any.
    pub fn emit(&self, event: LiveEvent) {
        if let Ok(handlers) = self.handlers.lock() {
            if let Some(handler) = handlers.get(&event.kind) {
                handler(&event);
            } else {
                debug!("No handler bound for {}", event.kind.name());
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<WireEvent>(text) {
            Ok(wire) => match EventKind::from_name(&wire.event) {
                Some(kind) => self.emit(LiveEvent {
                    kind,
                    payload: wire.data,
                }),
                None => debug!("Ignoring unknown live event `{}`", wire.event),
            },
            Err(e) => warn!("Dropping malformed live event frame: {}", e),
        }
    }
}
