pub mod webhook;

use async_trait::async_trait;
use thiserror::Error;

use crate::calendar::Role;

pub use webhook::WebhookNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InviteMessage {
    pub to_email: String,
    pub calendar_name: String,
    pub inviter_email: String,
    pub role: Role,
    pub token: String,
}

impl InviteMessage {
    pub fn subject(&self) -> String {
        format!("[Calendar] Invitation to {}", self.calendar_name)
    }

    pub fn accept_link(&self, base_url: &str) -> String {
        format!(
            "{}/invite/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(&self.token)
        )
    }

    pub fn body(&self, base_url: &str) -> String {
        format!(
            "You were invited to a calendar.\n\n\
             Calendar: {}\n\
             Inviter: {}\n\
             Role: {}\n\n\
             Accept/Decline:\n{}\n\n\
             (If you cannot open the link, copy & paste into your browser.)\n",
            self.calendar_name,
            self.inviter_email,
            self.role,
            self.accept_link(base_url),
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InviteNotifier: Send + Sync {
    async fn send_invite(&self, message: &InviteMessage) -> Result<(), NotifyError>;
}

// Default sink when no outbound channel is configured.
pub struct LogNotifier;

#[async_trait]
impl InviteNotifier for LogNotifier {
    async fn send_invite(&self, message: &InviteMessage) -> Result<(), NotifyError> {
        tracing::info!(
            to = %message.to_email,
            calendar = %message.calendar_name,
            role = %message.role,
            "invite notification (log only)"
        );
        Ok(())
    }
}
