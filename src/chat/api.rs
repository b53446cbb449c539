// HTTP collaborator endpoints for Huddle
// The backend stays authoritative; this layer only fetches and posts JSON

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use crate::models::{Contact, MessageDraft, RawChatSummary, RawMessage};

/// Request/response seam to the backend. The HTTP client below is the live
/// implementation; tests substitute an in-memory fake so the pipelines can
/// be exercised without a server.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// `GET /api/messages/contacts`
    async fn fetch_contacts(&self) -> Result<Vec<Contact>>;

    /// `GET /api/messages/chats`
    async fn fetch_chats(&self) -> Result<Vec<RawChatSummary>>;

    /// `GET /api/messages/{userId}`
    async fn fetch_history(&self, user_id: &str) -> Result<Vec<RawMessage>>;

    /// `POST /api/messages/send/{userId}`
    async fn send_message(&self, user_id: &str, draft: &MessageDraft) -> Result<RawMessage>;
}

pub struct HttpGateway {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(HttpGateway {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| anyhow!("Request to {} failed: {}", url, e))?;
        if !resp.status().is_success() {
            return Err(anyhow!("{} returned HTTP {}", url, resp.status()));
        }
        resp.json::<T>()
            .await
            .map_err(|e| anyhow!("Failed to decode response from {}: {}", url, e))
    }
}

#[async_trait]
impl MessageGateway for HttpGateway {
    async fn fetch_contacts(&self) -> Result<Vec<Contact>> {
        self.get_json("/api/messages/contacts").await
    }

    async fn fetch_chats(&self) -> Result<Vec<RawChatSummary>> {
        self.get_json("/api/messages/chats").await
    }

    async fn fetch_history(&self, user_id: &str) -> Result<Vec<RawMessage>> {
        self.get_json(&format!("/api/messages/{}", user_id)).await
    }

    async fn send_message(&self, user_id: &str, draft: &MessageDraft) -> Result<RawMessage> {
        let url = self.url(&format!("/api/messages/send/{}", user_id));
        debug!("POST {}", url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(draft)
            .send()
            .await
            .map_err(|e| anyhow!("Request to {} failed: {}", url, e))?;
        if !resp.status().is_success() {
            return Err(anyhow!("{} returned HTTP {}", url, resp.status()));
        }
        resp.json::<RawMessage>()
            .await
            .map_err(|e| anyhow!("Failed to decode send response from {}: {}", url, e))
    }
}
