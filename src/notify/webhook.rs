use async_trait::async_trait;
use serde::Serialize;

use crate::notify::{InviteMessage, InviteNotifier, NotifyError};

// Hands the message to an HTTP mail relay; the relay owns actual
// delivery, retries, and bounces.
pub struct WebhookNotifier {
    base_url: String,
    accept_base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OutboundMail<'a> {
    to: &'a str,
    subject: String,
    body: String,
}

impl WebhookNotifier {
    pub fn new(base_url: String, accept_base_url: String) -> Self {
        Self {
            base_url,
            accept_base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl InviteNotifier for WebhookNotifier {
    async fn send_invite(&self, message: &InviteMessage) -> Result<(), NotifyError> {
        let payload = OutboundMail {
            to: &message.to_email,
            subject: message.subject(),
            body: message.body(&self.accept_base_url),
        };

        let response = self
            .client
            .post(format!("{}/send", self.base_url.trim_end_matches('/')))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(format!(
                "relay returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
