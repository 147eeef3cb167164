use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use regex::Regex;

use crate::calendar::{generate_token, Action, Invite, InvitePreview, Principal, Role};
use crate::error::ServiceError;
use crate::notify::{InviteMessage, InviteNotifier};
use crate::service::Service;

fn email_shape() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid pattern"))
}

impl Service {
    pub async fn issue_invite(
        &self,
        principal: &Principal,
        calendar_id: i64,
        invitee_email: &str,
        role: Role,
    ) -> Result<String, ServiceError> {
        self.authorize(calendar_id, principal, Action::IssueInvite)?;
        if !email_shape().is_match(invitee_email) {
            return Err(ServiceError::InvalidArgument(format!(
                "Invalid email address: {invitee_email}"
            )));
        }

        let token = generate_token();
        let now = Utc::now();
        let expires_at = now + Duration::days(self.invites.expiry_days as i64);
        self.store.create_invite(
            calendar_id,
            invitee_email,
            role,
            &token,
            principal.user_id,
            now,
            expires_at,
        )?;

        let calendar_name = self
            .store
            .calendar_name(calendar_id)?
            .ok_or_else(|| ServiceError::NotFound("Calendar".to_string()))?;
        tracing::info!(calendar_id, invitee = invitee_email, %role, "invite issued");

        // Delivery is the relay's problem; the invite row is already
        // committed and must survive a notification failure.
        spawn_notification(
            Arc::clone(&self.notifier),
            InviteMessage {
                to_email: invitee_email.to_string(),
                calendar_name,
                inviter_email: principal.email.clone(),
                role,
                token: token.clone(),
            },
        );

        Ok(token)
    }

    // Public by design: the unguessable token is the authorization
    // artifact here, not a session.
    pub fn lookup_invite(&self, token: &str) -> Result<InvitePreview, ServiceError> {
        self.store
            .invite_preview(token)?
            .ok_or_else(|| ServiceError::NotFound("Invite".to_string()))
    }

    pub fn accept_invite(&self, principal: &Principal, token: &str) -> Result<(), ServiceError> {
        let invite = self.checked_pending_invite(principal, token)?;
        self.store.accept_invite(&invite.token, principal.user_id)?;
        tracing::info!(
            calendar_id = invite.calendar_id,
            user_id = principal.user_id,
            role = %invite.role,
            "invite accepted"
        );
        Ok(())
    }

    pub fn decline_invite(&self, principal: &Principal, token: &str) -> Result<(), ServiceError> {
        let invite = self.checked_pending_invite(principal, token)?;
        self.store.decline_invite(&invite.token)?;
        Ok(())
    }

    pub fn revoke_invite(
        &self,
        principal: &Principal,
        calendar_id: i64,
        invite_id: i64,
    ) -> Result<(), ServiceError> {
        self.authorize(calendar_id, principal, Action::RevokeInvite)?;
        let invite = self
            .store
            .find_invite_by_id(invite_id)?
            .filter(|invite| invite.calendar_id == calendar_id)
            .ok_or_else(|| ServiceError::NotFound("Invite".to_string()))?;
        // Already-settled invites are left alone so revocation can be
        // retried safely.
        self.store.revoke_invite(invite.id)?;
        Ok(())
    }

    pub fn list_invites(
        &self,
        principal: &Principal,
        calendar_id: i64,
    ) -> Result<Vec<Invite>, ServiceError> {
        self.authorize(calendar_id, principal, Action::ListInvites)?;
        Ok(self.store.list_pending_invites(calendar_id)?)
    }

    pub fn sweep_expired_invites(&self) -> Result<usize, ServiceError> {
        let swept = self.store.expire_pending_invites(Utc::now())?;
        if swept > 0 {
            tracing::info!(swept, "expired pending invites revoked");
        }
        Ok(swept)
    }

    fn checked_pending_invite(
        &self,
        principal: &Principal,
        token: &str,
    ) -> Result<Invite, ServiceError> {
        let invite = self
            .store
            .find_invite_by_token(token)?
            .ok_or_else(|| ServiceError::NotFound("Invite".to_string()))?;
        if !invite.status.is_pending() {
            return Err(ServiceError::InviteNotPending);
        }
        if invite.is_expired(Utc::now()) {
            return Err(ServiceError::InviteExpired);
        }
        if !principal.email.eq_ignore_ascii_case(&invite.invitee_email) {
            return Err(ServiceError::InviteEmailMismatch);
        }
        Ok(invite)
    }
}

fn spawn_notification(notifier: Arc<dyn InviteNotifier>, message: InviteMessage) {
    tokio::spawn(async move {
        if let Err(err) = notifier.send_invite(&message).await {
            tracing::warn!(error = %err, to = %message.to_email, "invite notification failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::InviteStatus;
    use crate::config::InviteConfig;
    use crate::notify::{MockInviteNotifier, NotifyError};
    use crate::service::testutil::*;
    use crate::store::Store;

    fn service_with_notifier(notifier: Arc<dyn InviteNotifier>) -> Service {
        let store = Store::open_in_memory().unwrap();
        store.initialize().unwrap();
        Service::new(
            store,
            notifier,
            InviteConfig {
                expiry_days: 7,
                accept_base_url: "http://localhost:5173".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn invite_flows_from_issue_to_accept() {
        let service = test_service();
        let owner = seed_principal(&service, "alice@x.com");
        let invitee = seed_principal(&service, "e@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();

        let token = service
            .issue_invite(&owner, cal, "e@x.com", Role::Editor)
            .await
            .unwrap();

        // Anyone holding the token can preview, no session required.
        let preview = service.lookup_invite(&token).unwrap();
        assert_eq!(preview.calendar_name, "Team");
        assert_eq!(preview.role, Role::Editor);
        assert_eq!(preview.status, InviteStatus::Pending);
        let days_left = (preview.expires_at - Utc::now()).num_days();
        assert!((6..=7).contains(&days_left));

        service.accept_invite(&invitee, &token).unwrap();

        assert_eq!(
            service.store.role_of(cal, invitee.user_id).unwrap(),
            Some(Role::Editor)
        );
        let second = service.accept_invite(&invitee, &token);
        assert!(matches!(second, Err(ServiceError::InviteNotPending)));
    }

    #[tokio::test]
    async fn accept_with_wrong_email_creates_no_membership() {
        let service = test_service();
        let owner = seed_principal(&service, "alice@x.com");
        let bob = seed_principal(&service, "bob@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();
        let token = service
            .issue_invite(&owner, cal, "alice2@x.com", Role::Editor)
            .await
            .unwrap();

        let result = service.accept_invite(&bob, &token);

        assert!(matches!(result, Err(ServiceError::InviteEmailMismatch)));
        assert_eq!(service.store.role_of(cal, bob.user_id).unwrap(), None);
        let preview = service.lookup_invite(&token).unwrap();
        assert_eq!(preview.status, InviteStatus::Pending);
    }

    #[tokio::test]
    async fn invitee_email_match_ignores_case() {
        let service = test_service();
        let owner = seed_principal(&service, "alice@x.com");
        let invitee = seed_principal(&service, "E@X.COM");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();
        let token = service
            .issue_invite(&owner, cal, "e@x.com", Role::FreeBusy)
            .await
            .unwrap();

        service.accept_invite(&invitee, &token).unwrap();

        assert_eq!(
            service.store.role_of(cal, invitee.user_id).unwrap(),
            Some(Role::FreeBusy)
        );
    }

    #[tokio::test]
    async fn decline_settles_without_membership() {
        let service = test_service();
        let owner = seed_principal(&service, "alice@x.com");
        let invitee = seed_principal(&service, "e@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();
        let token = service
            .issue_invite(&owner, cal, "e@x.com", Role::Editor)
            .await
            .unwrap();

        service.decline_invite(&invitee, &token).unwrap();

        assert_eq!(service.store.role_of(cal, invitee.user_id).unwrap(), None);
        let preview = service.lookup_invite(&token).unwrap();
        assert_eq!(preview.status, InviteStatus::Declined);
        assert!(matches!(
            service.accept_invite(&invitee, &token),
            Err(ServiceError::InviteNotPending)
        ));
    }

    #[tokio::test]
    async fn revoke_is_idempotent_and_owner_only() {
        let service = test_service();
        let owner = seed_principal(&service, "alice@x.com");
        let invitee = seed_principal(&service, "e@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();
        let token = service
            .issue_invite(&owner, cal, "e@x.com", Role::Editor)
            .await
            .unwrap();
        let invite_id = service.list_invites(&owner, cal).unwrap()[0].id;

        assert!(matches!(
            service.revoke_invite(&invitee, cal, invite_id),
            Err(ServiceError::Forbidden(_))
        ));

        service.revoke_invite(&owner, cal, invite_id).unwrap();
        let preview = service.lookup_invite(&token).unwrap();
        assert_eq!(preview.status, InviteStatus::Revoked);

        // Second revoke is a quiet no-op.
        service.revoke_invite(&owner, cal, invite_id).unwrap();
        assert_eq!(
            service.lookup_invite(&token).unwrap().status,
            InviteStatus::Revoked
        );
    }

    #[tokio::test]
    async fn revoke_checks_the_invite_belongs_to_the_calendar() {
        let service = test_service();
        let owner = seed_principal(&service, "alice@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();
        let other = service.create_calendar(&owner, "Side", None).unwrap();
        service
            .issue_invite(&owner, cal, "e@x.com", Role::Editor)
            .await
            .unwrap();
        let invite_id = service.list_invites(&owner, cal).unwrap()[0].id;

        let result = service.revoke_invite(&owner, other, invite_id);

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn expired_invite_is_not_acceptable() {
        let service = test_service();
        let owner = seed_principal(&service, "alice@x.com");
        let invitee = seed_principal(&service, "e@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();
        let token = generate_token();
        let now = Utc::now();
        service
            .store
            .create_invite(cal, "e@x.com", Role::Editor, &token, owner.user_id,
                now - Duration::days(8), now - Duration::days(1))
            .unwrap();

        let result = service.accept_invite(&invitee, &token);

        assert!(matches!(result, Err(ServiceError::InviteExpired)));
        assert_eq!(service.store.role_of(cal, invitee.user_id).unwrap(), None);
    }

    #[tokio::test]
    async fn issuing_requires_owner_and_a_plausible_email() {
        let service = test_service();
        let owner = seed_principal(&service, "alice@x.com");
        let stranger = seed_principal(&service, "bob@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();

        assert!(matches!(
            service.issue_invite(&stranger, cal, "e@x.com", Role::Editor).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            service.issue_invite(&owner, cal, "not-an-email", Role::Editor).await,
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn notification_carries_the_composed_message() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut mock = MockInviteNotifier::new();
        mock.expect_send_invite().returning(move |message| {
            tx.send(message.clone()).ok();
            Ok(())
        });
        let service = service_with_notifier(Arc::new(mock));
        let owner = seed_principal(&service, "alice@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();

        let token = service
            .issue_invite(&owner, cal, "e@x.com", Role::Editor)
            .await
            .unwrap();

        let message = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.to_email, "e@x.com");
        assert_eq!(message.calendar_name, "Team");
        assert_eq!(message.inviter_email, "alice@x.com");
        assert_eq!(message.role, Role::Editor);
        assert_eq!(message.token, token);
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_the_invite() {
        let mut mock = MockInviteNotifier::new();
        mock.expect_send_invite()
            .returning(|_| Err(NotifyError::Rejected("relay down".to_string())));
        let service = service_with_notifier(Arc::new(mock));
        let owner = seed_principal(&service, "alice@x.com");
        let cal = service.create_calendar(&owner, "Team", None).unwrap();

        let token = service
            .issue_invite(&owner, cal, "e@x.com", Role::Editor)
            .await
            .unwrap();

        let preview = service.lookup_invite(&token).unwrap();
        assert_eq!(preview.status, InviteStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let service = test_service();
        let ghost = seed_principal(&service, "ghost@x.com");

        assert!(matches!(
            service.lookup_invite("nope"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.accept_invite(&ghost, "nope"),
            Err(ServiceError::NotFound(_))
        ));
    }
}
