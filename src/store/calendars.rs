use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::calendar::{Calendar, CalendarSummary, Role};
use crate::store::db::{Store, StoreError};
use crate::store::row::{calendar_from_row, encode_ts, CALENDAR_COLUMNS};

impl Store {
    // Creating a calendar and seeding the creator's OWNER membership is
    // one transaction so a calendar never exists without an owner.
    pub fn create_calendar(
        &self,
        owner_user_id: i64,
        name: &str,
        color: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO calendars (name, color, created_by, created_at, updated_at)
             VALUES (?1, coalesce(?2, '#4f46e5'), ?3, ?4, ?4)",
            params![name, color, owner_user_id, encode_ts(now)],
        )?;
        let calendar_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO calendar_members (calendar_id, user_id, role) VALUES (?1, ?2, 'OWNER')",
            params![calendar_id, owner_user_id],
        )?;
        tx.commit()?;
        Ok(calendar_id)
    }

    pub fn list_calendars_for_user(&self, user_id: i64) -> Result<Vec<CalendarSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.color, cm.role
             FROM calendars c JOIN calendar_members cm ON cm.calendar_id = c.id
             WHERE cm.user_id = ?1 ORDER BY c.id ASC",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            let role_text: String = row.get(3)?;
            let role = Role::parse(&role_text).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("unknown role {role_text:?}").into(),
                )
            })?;
            Ok(CalendarSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                role,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn role_of(&self, calendar_id: i64, user_id: i64) -> Result<Option<Role>, StoreError> {
        let role_text: Option<String> = self
            .conn
            .query_row(
                "SELECT role FROM calendar_members WHERE calendar_id = ?1 AND user_id = ?2",
                params![calendar_id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        match role_text {
            None => Ok(None),
            Some(text) => Role::parse(&text)
                .map(Some)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown role {text:?}"))),
        }
    }

    pub fn get_calendar(&self, calendar_id: i64) -> Result<Option<Calendar>, StoreError> {
        let calendar = self
            .conn
            .query_row(
                &format!("SELECT {CALENDAR_COLUMNS} FROM calendars WHERE id = ?1"),
                [calendar_id],
                calendar_from_row,
            )
            .optional()?;
        Ok(calendar)
    }

    pub fn calendar_name(&self, calendar_id: i64) -> Result<Option<String>, StoreError> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM calendars WHERE id = ?1",
                [calendar_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    pub fn update_calendar(
        &self,
        calendar_id: i64,
        name: Option<&str>,
        color: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE calendars SET name = coalesce(?1, name), color = coalesce(?2, color),
             updated_at = ?3 WHERE id = ?4",
            params![name, color, encode_ts(now), calendar_id],
        )?;
        Ok(changed)
    }

    // Memberships, invites, and events go with the calendar (FK cascade).
    pub fn delete_calendar(&self, calendar_id: i64) -> Result<usize, StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM calendars WHERE id = ?1", [calendar_id])?;
        Ok(changed)
    }
}
