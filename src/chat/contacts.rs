// Contact directory for Huddle
// Fetches the addressable counterparties and resolves targets by email

use anyhow::Result;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::ChatClient;
use crate::models::Contact;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

impl ChatClient {
    /// Fetch the full contact list from the backend. No paging, filtering,
    /// or search happens at this layer.
    pub async fn load_contacts(&self) -> Result<Vec<Contact>> {
        let contacts = self.gateway.fetch_contacts().await?;
        info!("Loaded {} contacts", contacts.len());
        if let Ok(mut held) = self.state.contacts.lock() {
            *held = contacts.clone();
        }
        Ok(contacts)
    }

    /// The last fetched contact list.
    pub fn contacts(&self) -> Vec<Contact> {
        self.state
            .contacts
            .lock()
            .map(|held| held.clone())
            .unwrap_or_default()
    }

    /// Locate a single contact by case-insensitive email match within the
    /// fetched list. An absent target is logged and returns `None`.
    pub fn find_contact_by_email(&self, email: &str) -> Option<Contact> {
        if !Self::is_valid_email(email) {
            warn!("Rejecting malformed target email: {}", email);
            return None;
        }
        let needle = email.to_lowercase();
        let found = self.state.contacts.lock().ok().and_then(|held| {
            held.iter()
                .find(|c| c.email.to_lowercase() == needle)
                .cloned()
        });
        if found.is_none() {
            warn!("No contact with email {}", email);
        }
        found
    }

    /// Basic shape check for an email address.
    pub fn is_valid_email(email: &str) -> bool {
        EMAIL_RE.is_match(email)
    }
}
