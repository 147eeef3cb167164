pub mod calendars;
pub mod db;
pub mod events;
pub mod row;
pub mod sharing;
pub mod users;

pub use db::{Store, StoreError};
