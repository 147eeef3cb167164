use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
    Revoked,
}

impl InviteStatus {
    pub fn is_pending(self) -> bool {
        self == InviteStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InviteStatus::Pending => "PENDING",
            InviteStatus::Accepted => "ACCEPTED",
            InviteStatus::Declined => "DECLINED",
            InviteStatus::Revoked => "REVOKED",
        }
    }

    pub fn parse(value: &str) -> Option<InviteStatus> {
        match value {
            "PENDING" => Some(InviteStatus::Pending),
            "ACCEPTED" => Some(InviteStatus::Accepted),
            "DECLINED" => Some(InviteStatus::Declined),
            "REVOKED" => Some(InviteStatus::Revoked),
            _ => None,
        }
    }
}

impl std::fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Immutable once issued, except for the status field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invite {
    pub id: i64,
    pub calendar_id: i64,
    pub invitee_email: String,
    pub role: Role,
    pub token: String,
    pub status: InviteStatus,
    pub invited_by: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// What an unauthenticated token lookup discloses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitePreview {
    pub calendar_id: i64,
    pub calendar_name: String,
    pub inviter_email: String,
    pub role: Role,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub invitee_email: String,
}

impl Invite {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// Unguessable lookup key; the token is the authorization artifact for
// the public preview endpoint.
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}
