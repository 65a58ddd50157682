//! HTTP client for the WhatsApp bridge.
//!
//! The bridge owns the WhatsApp session and exposes it as a small REST API:
//! - `GET  /groups/{id}`              → `{"name": ".."}`
//! - `GET  /groups/{id}/participants` → `{"participants": [".."]}`
//! - `POST /messages`                 ← `{"to": "..", "text": ".."}`
//! - `GET  /session`                  → `{"connected": bool}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

use subbot_common::config::AppConfig;
use subbot_common::error::AppError;
use subbot_common::types::{GroupId, GroupInfo, MemberId};
use subbot_notifier::GroupClient;

use crate::reconnect::SessionProbe;

#[derive(Debug, Deserialize)]
struct ParticipantsResponse {
    participants: Vec<MemberId>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    connected: bool,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    to: &'a MemberId,
    text: &'a str,
}

/// REST client for the bridge. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl BridgeClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| AppError::Config(format!("invalid bridge URL: {}", base_url)))?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.bridge_url.clone(),
            config.bridge_token.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// Endpoint URL below the base. Each segment is percent-encoded, so an
    /// id containing `/`, `?` or `#` stays a single path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get(&self, segments: &[&str]) -> Result<Response, reqwest::Error> {
        self.authorize(self.http.get(self.url(segments))).send().await
    }
}

/// Read the body of a failed response for the error message.
async fn failure_reason(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.is_empty() => format!("{}: {}", status, body),
        _ => status.to_string(),
    }
}

#[async_trait]
impl GroupClient for BridgeClient {
    async fn group_info(&self, group_id: &GroupId) -> Result<GroupInfo, AppError> {
        let response = self
            .get(&["groups", group_id.as_str()])
            .await
            .map_err(|e| AppError::GroupLookup(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<GroupInfo>()
                .await
                .map_err(|e| AppError::GroupLookup(format!("invalid group info: {}", e))),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("group {}", group_id))),
            _ => Err(AppError::GroupLookup(failure_reason(response).await)),
        }
    }

    async fn group_members(&self, group_id: &GroupId) -> Result<Vec<MemberId>, AppError> {
        let response = self
            .get(&["groups", group_id.as_str(), "participants"])
            .await
            .map_err(|e| AppError::GroupLookup(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<ParticipantsResponse>()
                .await
                .map(|body| body.participants)
                .map_err(|e| AppError::GroupLookup(format!("invalid participant list: {}", e))),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("group {}", group_id))),
            _ => Err(AppError::GroupLookup(failure_reason(response).await)),
        }
    }

    async fn send_direct_message(&self, recipient: &MemberId, text: &str) -> Result<(), AppError> {
        let request = self
            .http
            .post(self.url(&["messages"]))
            .json(&SendMessageRequest { to: recipient, text });

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::TransportSend(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::TransportSend(failure_reason(response).await))
        }
    }
}

#[async_trait]
impl SessionProbe for BridgeClient {
    async fn is_connected(&self) -> Result<bool, AppError> {
        let response = self.get(&["session"]).await?;
        if !response.status().is_success() {
            return Err(AppError::Unavailable(failure_reason(response).await));
        }
        Ok(response.json::<SessionResponse>().await?.connected)
    }
}
