//! Telegram Bot API client.
//!
//! `ChatPlatform` is the narrow surface the handlers and the notifier talk to;
//! `TelegramClient` implements it over HTTPS and adds the update-source calls
//! (`getUpdates`, `setWebhook`, `deleteWebhook`) used by the runtime.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub mod types;

pub use types::{Document, File, Message, ParseMode, SentMessage, Update};

/// Hard cap Telegram puts on a single text message.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Long-poll timeout passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u64 = 30;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Telegram API error ({code}): {description}")]
    Api { code: i64, description: String },

    #[error("Telegram response had no result")]
    MissingResult,

    #[error("File {0} has no download path")]
    MissingFilePath(String),
}

// reqwest errors carry the request URL, which embeds the bot token.
impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Http(e.without_url())
    }
}

/// Everything the bot needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<SentMessage, TelegramError>;

    async fn edit_message_text(&self, message: SentMessage, text: &str)
        -> Result<(), TelegramError>;

    async fn delete_message(&self, message: SentMessage) -> Result<(), TelegramError>;

    async fn get_file(&self, file_id: &str) -> Result<File, TelegramError>;

    async fn download_file(&self, file: &File) -> Result<Bytes, TelegramError>;
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<P, T>(&self, method: &str, params: &P, timeout: Duration) -> Result<T, TelegramError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(params)
            .send()
            .await?;

        // Telegram reports failures inside the JSON envelope, with a 4xx status.
        let envelope: types::ApiResponse<T> = response.json().await?;
        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope.description.unwrap_or_default(),
            });
        }
        debug!(method, "Telegram call succeeded");
        envelope.result.ok_or(TelegramError::MissingResult)
    }

    /// Long-polls for updates newer than `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let params = json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });
        self.call(
            "getUpdates",
            &params,
            Duration::from_secs(POLL_TIMEOUT_SECS) + REQUEST_TIMEOUT,
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TelegramError> {
        let mut params = json!({ "url": url, "allowed_updates": ["message"] });
        if let Some(secret) = secret {
            params["secret_token"] = json!(secret);
        }
        let _: bool = self.call("setWebhook", &params, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let _: bool = self
            .call("deleteWebhook", &json!({}), REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<SentMessage, TelegramError> {
        let mut params = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            params["parse_mode"] = json!(mode);
        }
        let message: Message = self.call("sendMessage", &params, REQUEST_TIMEOUT).await?;
        Ok(SentMessage {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit_message_text(
        &self,
        message: SentMessage,
        text: &str,
    ) -> Result<(), TelegramError> {
        let params = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        // Answers with the edited Message; only success matters here.
        let _: serde_json::Value = self
            .call("editMessageText", &params, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message: SentMessage) -> Result<(), TelegramError> {
        let params = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
        });
        let _: bool = self.call("deleteMessage", &params, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        self.call("getFile", &json!({ "file_id": file_id }), REQUEST_TIMEOUT)
            .await
    }

    async fn download_file(&self, file: &File) -> Result<Bytes, TelegramError> {
        let path = file
            .file_path
            .as_deref()
            .ok_or_else(|| TelegramError::MissingFilePath(file.file_id.clone()))?;
        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, path);

        let bytes = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url_trims_trailing_slash() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc".to_string()).unwrap();
        assert_eq!(
            client.method_url("getMe"),
            "https://api.telegram.org/bot123:abc/getMe"
        );
    }

    #[test]
    fn test_api_error_display_has_no_token() {
        let err = TelegramError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Telegram API error (403): Forbidden: bot was blocked by the user"
        );
    }
}
