//! LINE Messaging API client: reply messages and message content download.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum LineApiError {
    #[error("line request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("line api error: {0}")]
    Api(String),
}

/// Outbound side of the bot: what the dispatcher needs from the messaging platform.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Reply to the conversation addressed by `reply_token` with one text message.
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), LineApiError>;

    /// Download the binary content of an image, video, or audio message.
    async fn fetch_message_content(&self, message_id: &str) -> Result<Bytes, LineApiError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<SendMessage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SendMessage<'a> {
    Text { text: &'a str },
}

/// reqwest-backed client for the Messaging API (api.line.me) and content API (api-data.line.me).
#[derive(Clone)]
pub struct LineClient {
    api_base: String,
    data_api_base: String,
    access_token: String,
    client: reqwest::Client,
}

impl LineClient {
    pub fn new(
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        data_api_base: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            data_api_base: data_api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            client: reqwest::Client::new(),
        }
    }
}

async fn check_status(res: reqwest::Response, what: &str) -> Result<reqwest::Response, LineApiError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    Err(LineApiError::Api(format!("{} failed: {} {}", what, status, body)))
}

#[async_trait]
impl MessagingClient for LineClient {
    /// POST /v2/bot/message/reply
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), LineApiError> {
        let url = format!("{}/v2/bot/message/reply", self.api_base);
        let body = ReplyRequest {
            reply_token,
            messages: vec![SendMessage::Text { text }],
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        check_status(res, "reply").await?;
        Ok(())
    }

    /// GET /v2/bot/message/{messageId}/content
    async fn fetch_message_content(&self, message_id: &str) -> Result<Bytes, LineApiError> {
        let url = format!(
            "{}/v2/bot/message/{}/content",
            self.data_api_base, message_id
        );
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let res = check_status(res, "get content").await?;
        Ok(res.bytes().await?)
    }
}
