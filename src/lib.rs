// Re-export needed modules for the binary and integration tests
pub mod chat;
pub mod models;
pub mod prefs;

// Re-export main types for convenience
pub use chat::ChatClient;
pub use models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::store::{ChatSummaries, MessageLog};
    use chrono::{Duration, TimeZone, Utc};

    fn contact(id: &str, email: &str, is_admin: bool) -> Contact {
        Contact {
            id: id.to_string(),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            profile_pic: None,
            is_admin,
        }
    }

    fn message(id: &str, sender: &str, receiver: &str, text: &str, offset_secs: i64) -> Message {
        Message {
            id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            text: Some(text.to_string()),
            image: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap(),
            is_optimistic: false,
        }
    }

    #[test]
    fn test_display_label() {
        let support = Contact {
            is_admin: true,
            first_name: Some("Ada".to_string()),
            ..contact("u1", "support@example.com", true)
        };
        assert_eq!(support.display_label(), "Support");

        let named = Contact {
            first_name: Some("Ada".to_string()),
            ..contact("u2", "ada@example.com", false)
        };
        assert_eq!(named.display_label(), "Ada");

        let anonymous = contact("u3", "anon@example.com", false);
        assert_eq!(anonymous.display_label(), "anon@example.com");
    }

    #[test]
    fn test_message_preview_and_temp_ids() {
        let msg = message("m1", "a", "b", "hello", 0);
        assert_eq!(msg.preview(), "hello");
        assert!(!msg.is_temp());

        let image_only = Message {
            text: None,
            image: Some("cdn://pic.png".to_string()),
            ..message("m2", "a", "b", "", 1)
        };
        assert_eq!(image_only.preview(), IMAGE_PLACEHOLDER);

        let temp = Message {
            id: format!("{}abc", TEMP_ID_PREFIX),
            ..message("x", "a", "b", "hi", 2)
        };
        assert!(temp.is_temp());
    }

    #[test]
    fn test_raw_message_validation_fails_closed() {
        let raw: RawMessage = serde_json::from_value(serde_json::json!({
            "senderId": "a",
            "receiverId": "b",
            "text": "no id here"
        }))
        .unwrap();
        assert_eq!(
            Message::try_from(raw).unwrap_err(),
            ModelError::MissingField("_id")
        );

        let raw: RawMessage = serde_json::from_value(serde_json::json!({
            "_id": "m1",
            "receiverId": "b"
        }))
        .unwrap();
        assert_eq!(
            Message::try_from(raw).unwrap_err(),
            ModelError::MissingField("senderId")
        );
    }

    #[test]
    fn test_message_log_dedup_and_order() {
        let mut log = MessageLog::new();
        assert!(log.insert(message("m2", "a", "b", "second", 10)));
        assert!(log.insert(message("m1", "a", "b", "first", 0)));
        // Same identifier arriving again is discarded.
        assert!(!log.insert(message("m2", "a", "b", "second again", 20)));

        let ids: Vec<String> = log.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec!["m1".to_string(), "m2".to_string()]);
    }

    #[test]
    fn test_message_log_confirm_swaps_atomically() {
        let mut log = MessageLog::new();
        let temp_id = format!("{}1", TEMP_ID_PREFIX);
        let mut optimistic = message(&temp_id, "a", "b", "hi", 0);
        optimistic.is_optimistic = true;
        log.insert(optimistic);

        assert!(log.confirm(&temp_id, message("m1", "a", "b", "hi", 0)));
        assert_eq!(log.len(), 1);
        assert!(log.contains("m1"));
        assert!(!log.contains(&temp_id));

        // When the live echo already inserted the confirmation, the temp
        // entry still goes away and no second copy appears.
        let temp_id2 = format!("{}2", TEMP_ID_PREFIX);
        log.insert(message(&temp_id2, "a", "b", "again", 1));
        log.insert(message("m2", "a", "b", "again", 1));
        assert!(!log.confirm(&temp_id2, message("m2", "a", "b", "again", 1)));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_message_log_replace_all_last_write_wins() {
        let mut log = MessageLog::new();
        log.insert(message("stale", "a", "b", "old", 0));

        log.replace_all(vec![
            message("m1", "a", "b", "v1", 0),
            message("m2", "a", "b", "other", 5),
            message("m1", "a", "b", "v2", 0),
        ]);

        assert_eq!(log.len(), 2);
        let m1 = log.iter().find(|m| m.id == "m1").unwrap();
        assert_eq!(m1.text.as_deref(), Some("v2"));
        assert!(!log.contains("stale"));
    }

    #[test]
    fn test_chat_summaries_touch_resorts() {
        let older = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let newer = older + Duration::seconds(100);
        let mut chats = ChatSummaries::new();
        chats.replace_all(vec![
            ChatSummary {
                id: "c1".to_string(),
                participants: vec![contact("me", "me@example.com", false), contact("b", "b@example.com", false)],
                last_message: None,
                updated_at: older,
            },
            ChatSummary {
                id: "c2".to_string(),
                participants: vec![contact("me", "me@example.com", false), contact("c", "c@example.com", false)],
                last_message: None,
                updated_at: newer,
            },
        ]);
        assert_eq!(chats.snapshot()[0].id, "c2");

        // A new message in the older chat moves it to the front.
        let bump = Message {
            created_at: newer + Duration::seconds(50),
            ..message("m9", "b", "me", "ping", 0)
        };
        assert!(chats.touch("b", &bump));
        let snapshot = chats.snapshot();
        assert_eq!(snapshot[0].id, "c1");
        assert_eq!(
            snapshot[0].last_message.as_ref().map(|m| m.id.as_str()),
            Some("m9")
        );
    }

    #[test]
    fn test_draft_is_empty() {
        assert!(MessageDraft::default().is_empty());
        assert!(!MessageDraft::text("hello").is_empty());
        let image_only = MessageDraft {
            text: None,
            image: Some("cdn://pic.png".to_string()),
        };
        assert!(!image_only.is_empty());
    }
}
