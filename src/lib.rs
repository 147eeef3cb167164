pub mod calendar;
pub mod config;
pub mod error;
pub mod notify;
pub mod service;
pub mod store;

pub use calendar::{Event, EventItem, Invite, InviteStatus, Principal, Role};
pub use config::Config;
pub use error::ServiceError;
pub use service::Service;
pub use store::Store;
