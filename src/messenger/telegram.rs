//! Telegram Bot API delivery.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::debug;
use log::info;
use log::warn;
use serde_json::Value;
use wreq::Client;
use wreq::multipart::Form;
use wreq::multipart::Part;

use crate::config::TelegramConfig;
use crate::messenger::MessageSender;
use crate::messenger::error::SendError;

/// Telegram rejects photo captions longer than this many characters.
pub const MAX_CAPTION_CHARS: usize = 1024;

// Telegram allows a bot about 20 messages per minute in a single group.
const SENDS_PER_MINUTE: NonZeroU32 = NonZeroU32::new(20).unwrap();

pub struct TelegramSender {
    client: Client,
    api_url: String,
    token: String,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
}

impl TelegramSender {
    pub fn new(config: &TelegramConfig) -> Result<Self, SendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SendError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            limiter: RateLimiter::direct(Quota::per_minute(SENDS_PER_MINUTE)),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Error text with the bot token removed; request errors embed the URL.
    fn redact(&self, text: String) -> String {
        if self.token.is_empty() {
            return text;
        }
        text.replace(&self.token, "<redacted>")
    }

    /// Takes one send slot, waiting for the next one when the quota is used
    /// up. Returns whether it had to wait.
    async fn throttle(&self) -> bool {
        if self.limiter.check().is_ok() {
            return false;
        }
        info!("Telegram send rate limit reached. Waiting...");
        self.limiter.until_ready().await;
        true
    }

    async fn post(&self, method: &str, form: Form) -> Result<Value, SendError> {
        self.throttle().await;

        debug!("Calling Telegram method {}", method);
        let response = self
            .client
            .post(self.endpoint(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SendError::RequestFailed(self.redact(e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SendError::RequestFailed(self.redact(e.to_string())))?;
        let resp: Value = match serde_json::from_str(&body) {
            Ok(resp) => resp,
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => return Err(e.into()),
        };

        let ok = resp.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
        if !status.is_success() || !ok {
            let description = resp
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown API error")
                .to_string();
            return Err(SendError::Api {
                status: status.as_u16(),
                description,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send_photo(
        &self,
        chat_id: &str,
        photo: &[u8],
        caption: &str,
    ) -> Result<(), SendError> {
        let caption = truncate_caption(caption);
        let part = Part::bytes(photo.to_vec())
            .file_name("poster.png")
            .mime_str("image/png")
            .map_err(|e| SendError::RequestFailed(e.to_string()))?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption)
            .part("photo", part);

        self.post("sendPhoto", form).await?;
        Ok(())
    }
}

/// Cuts `caption` down to [`MAX_CAPTION_CHARS`] characters.
pub fn truncate_caption(caption: &str) -> String {
    if caption.chars().count() <= MAX_CAPTION_CHARS {
        return caption.to_string();
    }
    warn!(
        "Caption is longer than {} characters and will be truncated",
        MAX_CAPTION_CHARS
    );
    caption.chars().take(MAX_CAPTION_CHARS).collect()
}
