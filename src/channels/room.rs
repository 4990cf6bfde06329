//! Chat Room Relay
//!
//! Posts transcription text into a group chat room. The webhook notifier
//! delivers JSON to an incoming-webhook URL; the log notifier is used when no
//! room is configured.

use crate::config::RoomConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Relay errors
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Room webhook returned HTTP {0}")]
    Status(u16),
}

/// Destination for relayed call events
#[async_trait]
pub trait RoomNotifier: Send + Sync {
    /// Post `text` to the room
    async fn notify(&self, text: &str) -> Result<(), RelayError>;
}

/// Group chat message body
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoomMessage<'a> {
    pub room: &'a str,
    pub nick: &'a str,
    pub text: &'a str,
}

/// Delivers room messages by POSTing JSON to a webhook URL
#[derive(Debug, Clone)]
pub struct WebhookRoomNotifier {
    client: reqwest::Client,
    url: String,
    room: String,
    nick: String,
}

impl WebhookRoomNotifier {
    pub fn new(config: &RoomConfig, url: String) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url,
            room: config.room.clone(),
            nick: config.nick.clone(),
        })
    }

    /// Message that would be posted for `text`
    pub fn message<'a>(&'a self, text: &'a str) -> RoomMessage<'a> {
        RoomMessage {
            room: &self.room,
            nick: &self.nick,
            text,
        }
    }
}

#[async_trait]
impl RoomNotifier for WebhookRoomNotifier {
    async fn notify(&self, text: &str) -> Result<(), RelayError> {
        if text.trim().is_empty() {
            debug!(room = %self.room, "Skipping empty room message");
            return Ok(());
        }

        let response = self
            .client
            .post(&self.url)
            .json(&self.message(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(room = %self.room, status = status.as_u16(), "Room webhook rejected message");
            return Err(RelayError::Status(status.as_u16()));
        }
        info!(room = %self.room, chars = text.len(), "Relayed message to room");
        Ok(())
    }
}

/// Writes room messages to the log only
#[derive(Debug, Clone, Default)]
pub struct LogRoomNotifier {
    room: String,
}

impl LogRoomNotifier {
    pub fn new(room: impl Into<String>) -> Self {
        Self { room: room.into() }
    }
}

#[async_trait]
impl RoomNotifier for LogRoomNotifier {
    async fn notify(&self, text: &str) -> Result<(), RelayError> {
        if !text.trim().is_empty() {
            info!(room = %self.room, text = %text, "Room message");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_config() -> RoomConfig {
        RoomConfig {
            webhook_url: None,
            room: "ops@conference.example.com".to_string(),
            nick: "stenotype".to_string(),
        }
    }

    #[test]
    fn test_message_shape() {
        let notifier =
            WebhookRoomNotifier::new(&room_config(), "http://127.0.0.1:9/hook".to_string())
                .unwrap();
        let json = serde_json::to_value(notifier.message("hello")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "room": "ops@conference.example.com",
                "nick": "stenotype",
                "text": "hello"
            })
        );
    }

    #[tokio::test]
    async fn test_empty_text_not_sent() {
        // Unroutable URL: any real send would fail
        let notifier =
            WebhookRoomNotifier::new(&room_config(), "http://127.0.0.1:9/hook".to_string())
                .unwrap();
        assert!(notifier.notify("   ").await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_http_error() {
        let notifier =
            WebhookRoomNotifier::new(&room_config(), "http://127.0.0.1:9/hook".to_string())
                .unwrap();
        assert!(matches!(
            notifier.notify("hello").await,
            Err(RelayError::Http(_))
        ));
    }

    #[tokio::test]
    async fn test_log_notifier_always_ok() {
        let notifier = LogRoomNotifier::new("ops");
        assert!(notifier.notify("hello").await.is_ok());
        assert!(notifier.notify("").await.is_ok());
    }
}
