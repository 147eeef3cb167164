use crate::calendar::{Action, Principal, Role};
use crate::error::ServiceError;
use crate::service::Service;

// Every mutation and sensitive read funnels through here: resolve the
// principal's role on the calendar, then consult the permission matrix.
// Non-members and under-privileged members both get Forbidden; denial
// never downgrades the request.
impl Service {
    pub(crate) fn authorize(
        &self,
        calendar_id: i64,
        principal: &Principal,
        action: Action,
    ) -> Result<Role, ServiceError> {
        let role = self.store.role_of(calendar_id, principal.user_id)?;
        match role {
            Some(role) if role.allows(action) => Ok(role),
            _ => {
                tracing::warn!(
                    calendar_id,
                    user_id = principal.user_id,
                    ?action,
                    "authorization denied"
                );
                Err(ServiceError::forbidden(required_label(action)))
            }
        }
    }

    pub(crate) fn membership_role(
        &self,
        calendar_id: i64,
        principal: &Principal,
    ) -> Result<Option<Role>, ServiceError> {
        Ok(self.store.role_of(calendar_id, principal.user_id)?)
    }
}

fn required_label(action: Action) -> &'static str {
    match action {
        Action::UpdateCalendar
        | Action::DeleteCalendar
        | Action::ListMembers
        | Action::ChangeRole
        | Action::RemoveMember
        | Action::IssueInvite
        | Action::ListInvites
        | Action::RevokeInvite => "Owner",
        Action::CreateEvent | Action::UpdateEvent | Action::DeleteEvent => "Editor",
        Action::ListEvents => "Member",
    }
}
