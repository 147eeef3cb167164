use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Invite is not pending")]
    InviteNotPending,
    #[error("Invite email mismatch. Please login as invitee.")]
    InviteEmailMismatch,
    #[error("Invite has expired")]
    InviteExpired,
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn forbidden(required: &str) -> Self {
        ServiceError::Forbidden(format!("{required} permission required"))
    }
}
