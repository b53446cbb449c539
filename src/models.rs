use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Prefix for locally-generated identifiers on unconfirmed messages.
// The server never issues ids with this shape.
pub const TEMP_ID_PREFIX: &str = "temp-";

// Body shown for a message that carries an image and no text.
pub const IMAGE_PLACEHOLDER: &str = "Sent an image";

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("payload missing required field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl Contact {
    /// Label used in notifications: admins surface as "Support",
    /// everyone else as first name, falling back to email.
    pub fn display_label(&self) -> &str {
        if self.is_admin {
            "Support"
        } else {
            self.first_name.as_deref().unwrap_or(&self.email)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    // Set only on client-synthesized messages awaiting confirmation.
    pub is_optimistic: bool,
}

impl Message {
    pub fn is_temp(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }

    /// One-line body for notifications and summary previews.
    pub fn preview(&self) -> &str {
        self.text.as_deref().unwrap_or(IMAGE_PLACEHOLDER)
    }
}

/// Wire shape of a message as the backend sends it. Every field is optional
/// here; conversion into `Message` rejects payloads with required fields
/// missing rather than trusting the shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawMessage> for Message {
    type Error = ModelError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let id = raw.id.ok_or(ModelError::MissingField("_id"))?;
        let sender_id = raw.sender_id.ok_or(ModelError::MissingField("senderId"))?;
        let receiver_id = raw
            .receiver_id
            .ok_or(ModelError::MissingField("receiverId"))?;
        Ok(Message {
            id,
            sender_id,
            receiver_id,
            text: raw.text,
            image: raw.image,
            // Backends that omit the timestamp get stamped on arrival.
            created_at: raw.created_at.unwrap_or_else(Utc::now),
            is_optimistic: false,
        })
    }
}

/// Outbound content for a send: text and/or an image reference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MessageDraft {
    pub fn text(body: &str) -> Self {
        MessageDraft {
            text: Some(body.to_string()),
            image: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatSummary {
    pub id: String,
    pub participants: Vec<Contact>,
    pub last_message: Option<Message>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSummary {
    /// The participant that is not the given identity.
    pub fn counterparty(&self, user_id: &str) -> Option<&Contact> {
        self.participants.iter().find(|c| c.id != user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChatSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub participants: Vec<Contact>,
    #[serde(default)]
    pub last_message: Option<RawMessage>,
    pub updated_at: DateTime<Utc>,
}

impl From<RawChatSummary> for ChatSummary {
    fn from(raw: RawChatSummary) -> Self {
        ChatSummary {
            id: raw.id,
            participants: raw.participants,
            // An unparseable last message degrades the preview, nothing else.
            last_message: raw.last_message.and_then(|m| Message::try_from(m).ok()),
            updated_at: raw.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPresenceUpdate {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresenceUpdate {
    pub user_id: String,
    pub status: ContactStatus,
}

impl TryFrom<RawPresenceUpdate> for PresenceUpdate {
    type Error = ModelError;

    fn try_from(raw: RawPresenceUpdate) -> Result<Self, Self::Error> {
        let user_id = raw.user_id.ok_or(ModelError::MissingField("userId"))?;
        let status = match raw.online {
            Some(true) => ContactStatus::Online,
            _ => ContactStatus::Offline,
        };
        Ok(PresenceUpdate { user_id, status })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTypingEvent {
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub is_typing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypingEvent {
    pub sender_id: String,
    pub is_typing: bool,
}

impl TryFrom<RawTypingEvent> for TypingEvent {
    type Error = ModelError;

    fn try_from(raw: RawTypingEvent) -> Result<Self, Self::Error> {
        let sender_id = raw.sender_id.ok_or(ModelError::MissingField("senderId"))?;
        Ok(TypingEvent {
            sender_id,
            is_typing: raw.is_typing.unwrap_or(true),
        })
    }
}
