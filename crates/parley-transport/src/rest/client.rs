//! REST client for the chat service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::{
    ApiError, ApiResult, BotProfile, ChatClient, Envelope, MessageEdit, MessageReceipt, StorageMap,
};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use tracing::{debug, info};

use crate::queue::{DEFAULT_RETRY_DELAY, EventQueue, QueueApi};
use crate::wire::{
    self, EventsResponse, ProfileResponse, RegisterResponse, SendMessageForm, SendResponse,
    StorageResponse,
};

/// Connection settings for [`RestClient`].
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Base URL of the server, e.g. `https://chat.example.com`.
    pub site: String,
    /// Bot account email (basic-auth user).
    pub email: String,
    /// Bot API key (basic-auth password).
    pub api_key: String,
    /// Sent as the `User-Agent`.
    pub client_name: String,
    /// Timeout for ordinary requests.
    pub timeout: Duration,
    /// Timeout for a single long-poll request; must exceed the server's
    /// heartbeat interval.
    pub poll_timeout: Duration,
    /// Pause before retrying a failed long-poll.
    pub retry_delay: Duration,
}

impl RestClientConfig {
    /// Creates a config with default timeouts.
    pub fn new(
        site: impl Into<String>,
        email: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            email: email.into(),
            api_key: api_key.into(),
            client_name: "ParleyBot".into(),
            timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(90),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Sets the client name reported to the server.
    pub fn client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = client_name.into();
        self
    }
}

/// [`ChatClient`] and [`QueueApi`] over the server's REST API.
pub struct RestClient {
    http: Client,
    base_url: String,
    email: String,
    api_key: String,
    timeout: Duration,
    poll_timeout: Duration,
    retry_delay: Duration,
}

impl RestClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// [`ApiError::Transport`] if the HTTP client cannot be set up.
    pub fn new(config: RestClientConfig) -> ApiResult<Self> {
        let http = ClientBuilder::new()
            .user_agent(config.client_name.as_str())
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("failed to create HTTP client: {e}")))?;

        let base_url = format!("{}/api/v1", config.site.trim_end_matches('/'));
        info!(url = %base_url, email = %config.email, "Created REST client");

        Ok(Self {
            http,
            base_url,
            email: config.email,
            api_key: config.api_key,
            timeout: config.timeout,
            poll_timeout: config.poll_timeout,
            retry_delay: config.retry_delay,
        })
    }

    /// Creates an [`EventQueue`] polling through this client.
    pub fn event_queue(self: &Arc<Self>) -> EventQueue<Arc<Self>> {
        EventQueue::new(Arc::clone(self)).with_retry_delay(self.retry_delay)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> ApiResult<T> {
        let response = request
            .basic_auth(&self.email, Some(&self.api_key))
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest)?;
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => wire::into_result(body),
            Err(_) if status.is_server_error() => Err(ApiError::transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text
            ))),
            Err(e) if status.is_success() => Err(ApiError::decode(e.to_string())),
            Err(_) => Err(ApiError::remote(format!("HTTP_{}", status.as_u16()), text)),
        }
    }
}

fn map_reqwest(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else if error.is_decode() {
        ApiError::decode(error.to_string())
    } else {
        ApiError::transport(error.to_string())
    }
}

#[async_trait]
impl ChatClient for RestClient {
    async fn get_profile(&self) -> ApiResult<BotProfile> {
        let profile: ProfileResponse = self
            .call(self.http.get(self.url("users/me")), self.timeout)
            .await?;
        Ok(profile.into())
    }

    async fn get_storage(&self) -> ApiResult<StorageMap> {
        let response: StorageResponse = self
            .call(self.http.get(self.url("bot_storage")), self.timeout)
            .await?;
        Ok(response.storage)
    }

    async fn update_storage(&self, entries: StorageMap) -> ApiResult<()> {
        let storage = wire::storage_field(&entries)?;
        let request = self
            .http
            .put(self.url("bot_storage"))
            .form(&[("storage", storage.as_str())]);
        let _: IgnoredAny = self.call(request, self.timeout).await?;
        debug!(keys = entries.len(), "Updated bot storage");
        Ok(())
    }

    async fn send_message(&self, envelope: &Envelope) -> ApiResult<MessageReceipt> {
        let form = SendMessageForm::from(envelope);
        let request = self.http.post(self.url("messages")).form(&form);
        let sent: SendResponse = self.call(request, self.timeout).await?;
        Ok(MessageReceipt { id: sent.id })
    }

    async fn update_message(&self, edit: &MessageEdit) -> ApiResult<()> {
        let request = self
            .http
            .patch(self.url(&format!("messages/{}", edit.message_id)))
            .form(&[("content", edit.content.as_str())]);
        let _: IgnoredAny = self.call(request, self.timeout).await?;
        Ok(())
    }
}

#[async_trait]
impl QueueApi for RestClient {
    async fn register_queue(&self) -> ApiResult<RegisterResponse> {
        let event_types = wire::event_types_field();
        let request = self
            .http
            .post(self.url("register"))
            .form(&[("event_types", event_types.as_str())]);
        self.call(request, self.timeout).await
    }

    async fn poll_events(&self, queue_id: &str, last_event_id: i64) -> ApiResult<Vec<Value>> {
        let last_event_id = last_event_id.to_string();
        let request = self.http.get(self.url("events")).query(&[
            ("queue_id", queue_id),
            ("last_event_id", last_event_id.as_str()),
        ]);
        let response: EventsResponse = self.call(request, self.poll_timeout).await?;
        Ok(response.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = RestClient::new(
            RestClientConfig::new("https://chat.example.com/", "bot@example.com", "key")
                .client_name("ParleyHelloworldBot"),
        )
        .unwrap();
        assert_eq!(
            client.url("users/me"),
            "https://chat.example.com/api/v1/users/me"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = RestClientConfig::new("https://chat.example.com", "b@example.com", "k");
        assert_eq!(config.client_name, "ParleyBot");
        assert!(config.poll_timeout > config.timeout);
    }
}
