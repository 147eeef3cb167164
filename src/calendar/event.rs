use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub calendar_id: i64,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: bool,
    pub note: Option<String>,
}

// At most one reminder per event; absence means no reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub minutes_before: u32,
}

// One entry of an event listing, after the visibility filter ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventItem {
    pub id: i64,
    pub calendar_id: i64,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: bool,
    pub note: Option<String>,
    pub reminder_minutes_before: Option<u32>,
}

pub const BUSY_TITLE: &str = "Busy";

impl Event {
    // Half-open interval test: touching endpoints do not overlap.
    pub fn overlaps_window(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start_at < to && self.end_at > from
    }

    pub fn overlaps(&self, other: &Event) -> bool {
        self.overlaps_window(other.start_at, other.end_at)
    }

    pub fn detailed(&self, reminder: Option<Reminder>) -> EventItem {
        EventItem {
            id: self.id,
            calendar_id: self.calendar_id,
            title: self.title.clone(),
            start_at: self.start_at,
            end_at: self.end_at,
            all_day: self.all_day,
            note: self.note.clone(),
            reminder_minutes_before: reminder.map(|r| r.minutes_before),
        }
    }

    // Free/busy view: keep the when, hide the what.
    pub fn redacted(&self) -> EventItem {
        EventItem {
            id: self.id,
            calendar_id: self.calendar_id,
            title: BUSY_TITLE.to_string(),
            start_at: self.start_at,
            end_at: self.end_at,
            all_day: self.all_day,
            note: None,
            reminder_minutes_before: None,
        }
    }
}
