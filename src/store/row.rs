use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

use crate::calendar::{
    AuthProvider, Calendar, Event, Invite, InvitePreview, InviteStatus, Member, Role, User,
};

// Timestamps are stored as fixed-width UTC RFC 3339 text ("...Z", whole
// seconds) so that SQL text comparison orders chronologically.
pub fn encode_ts(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn decode_ts(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp {text:?}: {e}")))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn ts_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    decode_ts(idx, &text)
}

fn role_column(row: &Row, idx: usize) -> rusqlite::Result<Role> {
    let text: String = row.get(idx)?;
    Role::parse(&text).ok_or_else(|| conversion_error(idx, format!("unknown role {text:?}")))
}

fn status_column(row: &Row, idx: usize) -> rusqlite::Result<InviteStatus> {
    let text: String = row.get(idx)?;
    InviteStatus::parse(&text)
        .ok_or_else(|| conversion_error(idx, format!("unknown invite status {text:?}")))
}

fn provider_column(row: &Row, idx: usize) -> rusqlite::Result<AuthProvider> {
    let text: String = row.get(idx)?;
    AuthProvider::parse(&text)
        .ok_or_else(|| conversion_error(idx, format!("unknown provider {text:?}")))
}

// Each mapper expects the columns of its *_COLUMNS list, in order.

pub const USER_COLUMNS: &str = "id, email, display_name, provider";

pub fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        provider: provider_column(row, 3)?,
    })
}

pub const CALENDAR_COLUMNS: &str = "id, name, color, created_by";

pub fn calendar_from_row(row: &Row) -> rusqlite::Result<Calendar> {
    Ok(Calendar {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_by: row.get(3)?,
    })
}

pub fn member_from_row(row: &Row) -> rusqlite::Result<Member> {
    Ok(Member {
        user_id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        role: role_column(row, 3)?,
    })
}

pub const INVITE_COLUMNS: &str =
    "id, calendar_id, invitee_email, role, token, status, invited_by, created_at, expires_at";

pub fn invite_from_row(row: &Row) -> rusqlite::Result<Invite> {
    Ok(Invite {
        id: row.get(0)?,
        calendar_id: row.get(1)?,
        invitee_email: row.get(2)?,
        role: role_column(row, 3)?,
        token: row.get(4)?,
        status: status_column(row, 5)?,
        invited_by: row.get(6)?,
        created_at: ts_column(row, 7)?,
        expires_at: ts_column(row, 8)?,
    })
}

pub fn invite_preview_from_row(row: &Row) -> rusqlite::Result<InvitePreview> {
    Ok(InvitePreview {
        calendar_id: row.get(0)?,
        calendar_name: row.get(1)?,
        inviter_email: row.get(2)?,
        role: role_column(row, 3)?,
        status: status_column(row, 4)?,
        expires_at: ts_column(row, 5)?,
        invitee_email: row.get(6)?,
    })
}

pub const EVENT_COLUMNS: &str = "id, calendar_id, title, start_at, end_at, all_day, note";

pub fn event_from_row(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        calendar_id: row.get(1)?,
        title: row.get(2)?,
        start_at: ts_column(row, 3)?,
        end_at: ts_column(row, 4)?,
        all_day: row.get(5)?,
        note: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_round_trip() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();

        let text = encode_ts(instant);

        assert_eq!(text, "2024-03-05T08:30:00Z");
        assert_eq!(decode_ts(0, &text).unwrap(), instant);
    }

    #[test]
    fn encoded_timestamps_order_lexicographically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 11, 5, 8, 30, 0).unwrap();

        assert!(encode_ts(earlier) < encode_ts(later));
    }

    #[test]
    fn rejects_malformed_timestamp() {
        assert!(decode_ts(0, "yesterday").is_err());
    }
}
