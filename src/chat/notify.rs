// Notification dispatch for Huddle
// Bursts of events collapse into a single user-visible alert per window

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::Contact;

/// How long rapid repeated triggers coalesce before one alert is emitted.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// What the embedding surface receives on the notification channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Show a notification. `contact_id` lets the surface focus the window
    /// and re-select the conversation when the notification is activated.
    Notify {
        title: String,
        body: String,
        contact_id: String,
    },
    /// Play the notification sound cue.
    Sound,
}

/// Coalesces rapid triggers into a single delayed emission. Each trigger
/// inside the window aborts the scheduled task and re-arms the timer, so a
/// burst of N triggers emits exactly once, after the window elapses.
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `action` to run after the window, cancelling any emission
    /// already scheduled. Must be called from within a tokio runtime.
    pub fn trigger<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(task) = pending.take() {
                task.abort();
            }
            let window = self.window;
            *pending = Some(tokio::spawn(async move {
                tokio::time::sleep(window).await;
                action();
            }));
        }
    }

    /// Drop any scheduled emission without firing it.
    pub fn cancel(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(task) = pending.take() {
                task.abort();
            }
        }
    }
}

/// Dispatches sound cues and debounced notifications to the embedding
/// surface. Received and sent notifications debounce independently.
pub struct Notifier {
    tx: mpsc::UnboundedSender<Alert>,
    sound_enabled: AtomicBool,
    window_focused: AtomicBool,
    received: Debouncer,
    sent: Debouncer,
}

impl Notifier {
    pub fn new(sound_enabled: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<Alert>) {
        Self::with_window(sound_enabled, DEBOUNCE_WINDOW)
    }

    /// Same as `new` with an explicit debounce window. Tests shrink the
    /// window to keep themselves fast.
    pub fn with_window(
        sound_enabled: bool,
        window: Duration,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(Notifier {
            tx,
            sound_enabled: AtomicBool::new(sound_enabled),
            window_focused: AtomicBool::new(true),
            received: Debouncer::new(window),
            sent: Debouncer::new(window),
        });
        (notifier, rx)
    }

    /// The embedding surface reports focus changes here; notifications are
    /// suppressed while the window is focused.
    pub fn set_window_focused(&self, focused: bool) {
        self.window_focused.store(focused, Ordering::SeqCst);
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::SeqCst)
    }

    /// Best-effort sound cue; delivery failures are swallowed.
    pub fn sound_cue(&self) {
        if self.sound_enabled() {
            let _ = self.tx.send(Alert::Sound);
        }
    }

    /// Debounced alert for an inbound message while the window is away.
    pub fn message_received(&self, sender: &Contact, body: &str) {
        if self.window_focused.load(Ordering::SeqCst) {
            debug!("Window focused, skipping received notification");
            return;
        }
        let tx = self.tx.clone();
        let alert = Alert::Notify {
            title: sender.display_label().to_string(),
            body: body.to_string(),
            contact_id: sender.id.clone(),
        };
        self.received.trigger(move || {
            let _ = tx.send(alert);
        });
    }

    /// Debounced confirmation that a send went out, naming the counterparty.
    pub fn message_sent(&self, counterparty: &Contact) {
        if self.window_focused.load(Ordering::SeqCst) {
            debug!("Window focused, skipping sent notification");
            return;
        }
        let tx = self.tx.clone();
        let alert = Alert::Notify {
            title: counterparty.display_label().to_string(),
            body: "Message sent".to_string(),
            contact_id: counterparty.id.clone(),
        };
        self.sent.trigger(move || {
            let _ = tx.send(alert);
        });
    }
}
