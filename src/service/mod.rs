pub mod authz;
pub mod calendars;
pub mod events;
pub mod invites;

use std::sync::Arc;

pub use events::{CreateEventRequest, UpdateEventRequest};

use crate::calendar::{Principal, User};
use crate::config::InviteConfig;
use crate::error::ServiceError;
use crate::notify::InviteNotifier;
use crate::store::Store;

pub struct Service {
    pub(crate) store: Store,
    pub(crate) notifier: Arc<dyn InviteNotifier>,
    pub(crate) invites: InviteConfig,
}

impl Service {
    pub fn new(store: Store, notifier: Arc<dyn InviteNotifier>, invites: InviteConfig) -> Self {
        Self {
            store,
            notifier,
            invites,
        }
    }

    pub fn current_user(&self, principal: &Principal) -> Result<User, ServiceError> {
        self.store
            .find_user_by_id(principal.user_id)?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))
    }

    // Credential hashing and session issuance live outside this crate;
    // this only materializes the account row.
    pub fn register_email_user(
        &self,
        email: &str,
        password_hash: Option<&str>,
        display_name: &str,
    ) -> Result<i64, ServiceError> {
        if self.store.exists_by_email(email)? {
            return Err(ServiceError::Conflict("Email already exists".to_string()));
        }
        Ok(self.store.create_email_user(email, password_hash, display_name)?)
    }
}

// Boundary helper for callers that may arrive without a session.
pub fn require_principal(principal: Option<&Principal>) -> Result<&Principal, ServiceError> {
    principal.ok_or(ServiceError::Unauthenticated)
}
