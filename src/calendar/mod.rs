pub mod calendar;
pub mod event;
pub mod invite;
pub mod role;
pub mod user;

pub use calendar::{Calendar, CalendarSummary, Member};
pub use event::{Event, EventItem, Reminder, BUSY_TITLE};
pub use invite::{generate_token, Invite, InvitePreview, InviteStatus};
pub use role::{Action, Role};
pub use user::{AuthProvider, Principal, User};
