use chrono::Utc;

use crate::calendar::{Action, CalendarSummary, Member, Principal, Role};
use crate::error::ServiceError;
use crate::service::Service;

impl Service {
    pub fn list_calendars(&self, principal: &Principal) -> Result<Vec<CalendarSummary>, ServiceError> {
        Ok(self.store.list_calendars_for_user(principal.user_id)?)
    }

    pub fn create_calendar(
        &self,
        principal: &Principal,
        name: &str,
        color: Option<&str>,
    ) -> Result<i64, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Calendar name must not be blank".to_string(),
            ));
        }
        let id = self
            .store
            .create_calendar(principal.user_id, name, color, Utc::now())?;
        tracing::info!(calendar_id = id, user_id = principal.user_id, "calendar created");
        Ok(id)
    }

    pub fn update_calendar(
        &self,
        principal: &Principal,
        calendar_id: i64,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), ServiceError> {
        self.authorize(calendar_id, principal, Action::UpdateCalendar)?;
        self.store
            .update_calendar(calendar_id, name, color, Utc::now())?;
        Ok(())
    }

    pub fn delete_calendar(
        &self,
        principal: &Principal,
        calendar_id: i64,
    ) -> Result<(), ServiceError> {
        self.authorize(calendar_id, principal, Action::DeleteCalendar)?;
        self.store.delete_calendar(calendar_id)?;
        tracing::info!(calendar_id, user_id = principal.user_id, "calendar deleted");
        Ok(())
    }

    pub fn list_members(
        &self,
        principal: &Principal,
        calendar_id: i64,
    ) -> Result<Vec<Member>, ServiceError> {
        self.authorize(calendar_id, principal, Action::ListMembers)?;
        Ok(self.store.list_members(calendar_id)?)
    }

    pub fn change_role(
        &self,
        principal: &Principal,
        calendar_id: i64,
        target_user_id: i64,
        new_role: Role,
    ) -> Result<(), ServiceError> {
        self.authorize(calendar_id, principal, Action::ChangeRole)?;
        if new_role != Role::Owner {
            self.guard_last_owner(calendar_id, target_user_id)?;
        }
        let changed = self
            .store
            .set_member_role(calendar_id, target_user_id, new_role)?;
        if changed == 0 {
            return Err(ServiceError::NotFound("Member".to_string()));
        }
        Ok(())
    }

    pub fn remove_member(
        &self,
        principal: &Principal,
        calendar_id: i64,
        target_user_id: i64,
    ) -> Result<(), ServiceError> {
        self.authorize(calendar_id, principal, Action::RemoveMember)?;
        self.guard_last_owner(calendar_id, target_user_id)?;
        let changed = self.store.remove_member(calendar_id, target_user_id)?;
        if changed == 0 {
            return Err(ServiceError::NotFound("Member".to_string()));
        }
        Ok(())
    }

    // A calendar must keep at least one OWNER; otherwise nobody could
    // manage, invite to, or delete it anymore.
    fn guard_last_owner(&self, calendar_id: i64, target_user_id: i64) -> Result<(), ServiceError> {
        let target_role = self.store.role_of(calendar_id, target_user_id)?;
        if target_role == Some(Role::Owner) && self.store.count_owners(calendar_id)? <= 1 {
            return Err(ServiceError::Conflict(
                "Calendar must retain at least one owner".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn created_calendar_shows_up_with_owner_role() {
        let service = test_service();
        let alice = seed_principal(&service, "alice@x.com");

        let id = service.create_calendar(&alice, "Team", None).unwrap();

        let calendars = service.list_calendars(&alice).unwrap();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].id, id);
        assert_eq!(calendars[0].role, Role::Owner);
    }

    #[test]
    fn blank_calendar_name_is_rejected() {
        let service = test_service();
        let alice = seed_principal(&service, "alice@x.com");

        let result = service.create_calendar(&alice, "   ", None);

        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    }

    #[test]
    fn only_an_owner_may_update_or_delete() {
        let service = test_service();
        let alice = seed_principal(&service, "alice@x.com");
        let bob = seed_principal(&service, "bob@x.com");
        let cal = service.create_calendar(&alice, "Team", None).unwrap();
        service
            .store
            .conn
            .execute(
                "INSERT INTO calendar_members (calendar_id, user_id, role) VALUES (?1, ?2, 'EDITOR')",
                rusqlite::params![cal, bob.user_id],
            )
            .unwrap();

        assert!(matches!(
            service.update_calendar(&bob, cal, Some("Mine"), None),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete_calendar(&bob, cal),
            Err(ServiceError::Forbidden(_))
        ));

        service.update_calendar(&alice, cal, Some("Crew"), None).unwrap();
        service.delete_calendar(&alice, cal).unwrap();
        assert!(service.list_calendars(&alice).unwrap().is_empty());
    }

    #[test]
    fn member_listing_is_owner_only() {
        let service = test_service();
        let alice = seed_principal(&service, "alice@x.com");
        let bob = seed_principal(&service, "bob@x.com");
        let cal = service.create_calendar(&alice, "Team", None).unwrap();
        service
            .store
            .conn
            .execute(
                "INSERT INTO calendar_members (calendar_id, user_id, role) VALUES (?1, ?2, 'EDITOR')",
                rusqlite::params![cal, bob.user_id],
            )
            .unwrap();

        assert!(matches!(
            service.list_members(&bob, cal),
            Err(ServiceError::Forbidden(_))
        ));

        let members = service.list_members(&alice, cal).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].role, Role::Owner);
    }

    #[test]
    fn change_role_overwrites_without_duplicating() {
        let service = test_service();
        let alice = seed_principal(&service, "alice@x.com");
        let bob = seed_principal(&service, "bob@x.com");
        let cal = service.create_calendar(&alice, "Team", None).unwrap();
        service
            .store
            .conn
            .execute(
                "INSERT INTO calendar_members (calendar_id, user_id, role) VALUES (?1, ?2, 'FREEBUSY')",
                rusqlite::params![cal, bob.user_id],
            )
            .unwrap();

        service
            .change_role(&alice, cal, bob.user_id, Role::Editor)
            .unwrap();

        let members = service.list_members(&alice, cal).unwrap();
        assert_eq!(members.len(), 2);
        let bob_row = members.iter().find(|m| m.user_id == bob.user_id).unwrap();
        assert_eq!(bob_row.role, Role::Editor);
    }

    #[test]
    fn changing_role_of_a_stranger_is_not_found() {
        let service = test_service();
        let alice = seed_principal(&service, "alice@x.com");
        let bob = seed_principal(&service, "bob@x.com");
        let cal = service.create_calendar(&alice, "Team", None).unwrap();

        let result = service.change_role(&alice, cal, bob.user_id, Role::Editor);

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn sole_owner_cannot_be_demoted_or_removed() {
        let service = test_service();
        let alice = seed_principal(&service, "alice@x.com");
        let cal = service.create_calendar(&alice, "Team", None).unwrap();

        assert!(matches!(
            service.change_role(&alice, cal, alice.user_id, Role::Editor),
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            service.remove_member(&alice, cal, alice.user_id),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn owner_can_step_down_once_another_owner_exists() {
        let service = test_service();
        let alice = seed_principal(&service, "alice@x.com");
        let bob = seed_principal(&service, "bob@x.com");
        let cal = service.create_calendar(&alice, "Team", None).unwrap();
        service
            .store
            .conn
            .execute(
                "INSERT INTO calendar_members (calendar_id, user_id, role) VALUES (?1, ?2, 'OWNER')",
                rusqlite::params![cal, bob.user_id],
            )
            .unwrap();

        service
            .change_role(&alice, cal, alice.user_id, Role::Editor)
            .unwrap();

        assert_eq!(
            service.store.role_of(cal, alice.user_id).unwrap(),
            Some(Role::Editor)
        );
    }
}
