//! Telegram Bot API notifier.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use super::Notifier;
use crate::error::NotifyError;

const API_BASE: &str = "https://api.telegram.org";

/// JSON payload for the `sendMessage` endpoint. Plain text, no parse mode.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
}

pub struct TelegramNotifier {
    client: Client,
    token: SecretString,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: SecretString, chat_id: String) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client for Telegram")?;

        info!("Telegram notifier initialised");
        Ok(Self { client, token, chat_id })
    }

    fn send_url(&self) -> String {
        format!("{API_BASE}/bot{}/sendMessage", self.token.expose_secret())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
        };

        let response = self.client.post(self.send_url()).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(NotifyError::Api(error_text));
        }

        Ok(())
    }
}
