use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Editor,
    FreeBusy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    UpdateCalendar,
    DeleteCalendar,
    ListMembers,
    ChangeRole,
    RemoveMember,
    IssueInvite,
    ListInvites,
    RevokeInvite,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    ListEvents,
}

impl Role {
    pub fn allows(self, action: Action) -> bool {
        match action {
            Action::UpdateCalendar
            | Action::DeleteCalendar
            | Action::ListMembers
            | Action::ChangeRole
            | Action::RemoveMember
            | Action::IssueInvite
            | Action::ListInvites
            | Action::RevokeInvite => self == Role::Owner,
            Action::CreateEvent | Action::UpdateEvent | Action::DeleteEvent => {
                matches!(self, Role::Owner | Role::Editor)
            }
            // FreeBusy members may list too; they get the redacted view.
            Action::ListEvents => true,
        }
    }

    pub fn sees_event_details(self) -> bool {
        matches!(self, Role::Owner | Role::Editor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Editor => "EDITOR",
            Role::FreeBusy => "FREEBUSY",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "OWNER" => Some(Role::Owner),
            "EDITOR" => Some(Role::Editor),
            "FREEBUSY" => Some(Role::FreeBusy),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
