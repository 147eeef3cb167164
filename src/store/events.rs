use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::calendar::{Event, Reminder};
use crate::store::db::{Store, StoreError};
use crate::store::row::{encode_ts, event_from_row, EVENT_COLUMNS};

impl Store {
    // Open-interval overlap: start < to AND end > from. Soft-deleted
    // rows are invisible here and everywhere below.
    pub fn list_events(
        &self,
        calendar_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE calendar_id = ?1 AND deleted_at IS NULL
               AND start_at < ?2 AND end_at > ?3
             ORDER BY start_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map(
            params![calendar_id, encode_ts(to), encode_ts(from)],
            event_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1 AND deleted_at IS NULL"),
                [event_id],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_event(
        &self,
        calendar_id: i64,
        title: &str,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        all_day: bool,
        note: Option<&str>,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO events
                 (calendar_id, title, start_at, end_at, all_day, note,
                  created_by, updated_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?8)",
            params![
                calendar_id,
                title,
                encode_ts(start_at),
                encode_ts(end_at),
                all_day,
                note,
                user_id,
                encode_ts(now),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_event(
        &self,
        event_id: i64,
        title: Option<&str>,
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
        all_day: Option<bool>,
        note: Option<&str>,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE events SET
                 title = coalesce(?1, title),
                 start_at = coalesce(?2, start_at),
                 end_at = coalesce(?3, end_at),
                 all_day = coalesce(?4, all_day),
                 note = coalesce(?5, note),
                 updated_by = ?6, updated_at = ?7
             WHERE id = ?8 AND deleted_at IS NULL",
            params![
                title,
                start_at.map(encode_ts),
                end_at.map(encode_ts),
                all_day,
                note,
                user_id,
                encode_ts(now),
                event_id,
            ],
        )?;
        Ok(changed)
    }

    pub fn soft_delete_event(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE events SET deleted_at = ?1, updated_by = ?2, updated_at = ?1
             WHERE id = ?3 AND deleted_at IS NULL",
            params![encode_ts(now), user_id, event_id],
        )?;
        Ok(changed)
    }

    pub fn reminder_for_event(&self, event_id: i64) -> Result<Option<Reminder>, StoreError> {
        let minutes: Option<u32> = self
            .conn
            .query_row(
                "SELECT minutes_before FROM event_reminders WHERE event_id = ?1",
                [event_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(minutes.map(|minutes_before| Reminder { minutes_before }))
    }

    // None clears the reminder; at most one row per event either way.
    pub fn upsert_reminder(
        &self,
        event_id: i64,
        minutes_before: Option<u32>,
    ) -> Result<(), StoreError> {
        match minutes_before {
            None => {
                self.conn.execute(
                    "DELETE FROM event_reminders WHERE event_id = ?1",
                    [event_id],
                )?;
            }
            Some(minutes) => {
                self.conn.execute(
                    "INSERT INTO event_reminders (event_id, minutes_before) VALUES (?1, ?2)
                     ON CONFLICT (event_id) DO UPDATE SET minutes_before = excluded.minutes_before",
                    params![event_id, minutes],
                )?;
            }
        }
        Ok(())
    }
}
