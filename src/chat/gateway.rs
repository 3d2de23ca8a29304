//! HTTP client for the local session gateway.
//!
//! The gateway owns the real chat-protocol connection and exposes a small
//! JSON API. Every request is tagged with the session name so a single
//! gateway can serve several accounts.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | connect | `POST /v1/session/connect` |
//! | me | `GET /v1/session/me` |
//! | resolve | `GET /v1/peers/resolve?username=<name>` |
//! | send | `POST /v1/peers/{id}/messages` |
//! | history | `GET /v1/peers/{id}/messages?limit=<n>` |
//! | click | `POST /v1/peers/{id}/messages/{message_id}/click` |

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::types::{ChatError, ChatResult, Credentials, Message, Peer};
use super::ChatClient;
use crate::config::GatewaySettings;

/// Header carrying the session name on every request
pub const SESSION_HEADER: &str = "X-Session-Name";

/// [`ChatClient`] backed by the session gateway's HTTP API
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    session_name: String,
}

#[derive(Deserialize)]
struct History {
    #[serde(default)]
    messages: Vec<Message>,
}

impl GatewayClient {
    pub fn new(settings: &GatewaySettings, session_name: impl Into<String>) -> ChatResult<Self> {
        let http = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            session_name: session_name.into(),
        })
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .header(SESSION_HEADER, &self.session_name)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.url(path))
            .header(SESSION_HEADER, &self.session_name)
    }
}

/// Turn non-2xx answers into [`ChatError::Rejected`]
async fn check(response: reqwest::Response) -> ChatResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ChatError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ChatClient for GatewayClient {
    async fn connect(&self, credentials: &Credentials) -> ChatResult<()> {
        debug!(session = %credentials.session_name, "connecting session");
        let payload = json!({
            "session_name": credentials.session_name,
            "api_id": credentials.api_id,
            "api_hash": credentials.api_hash,
            "phone_number": credentials.phone_number,
            "password": credentials.password,
            "system_version": credentials.system_version,
        });
        let response = self.post("/v1/session/connect").json(&payload).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn resolve(&self, username: &str) -> ChatResult<Peer> {
        let username = username.trim_start_matches('@');
        debug!(username, "resolving peer");
        let response = self
            .get("/v1/peers/resolve")
            .query(&[("username", username)])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn send_message(&self, peer: &Peer, text: &str) -> ChatResult<()> {
        debug!(peer = peer.id, text, "sending message");
        let response = self
            .post(&format!("/v1/peers/{}/messages", peer.id))
            .json(&json!({ "text": text }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn recent_messages(&self, peer: &Peer, limit: usize) -> ChatResult<Vec<Message>> {
        let response = self
            .get(&format!("/v1/peers/{}/messages", peer.id))
            .query(&[("limit", limit)])
            .send()
            .await?;
        let history: History = check(response).await?.json().await?;
        debug!(peer = peer.id, count = history.messages.len(), "fetched history");
        Ok(history.messages)
    }

    async fn click(&self, peer: &Peer, message_id: i64, row: usize, column: usize) -> ChatResult<()> {
        debug!(peer = peer.id, message_id, row, column, "clicking button");
        let response = self
            .post(&format!("/v1/peers/{}/messages/{}/click", peer.id, message_id))
            .json(&json!({ "row": row, "column": column }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn me(&self) -> ChatResult<Peer> {
        let response = self.get("/v1/session/me").send().await?;
        Ok(check(response).await?.json().await?)
    }
}
