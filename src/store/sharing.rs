use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::calendar::{Invite, InvitePreview, Member, Role};
use crate::store::db::{Store, StoreError};
use crate::store::row::{
    encode_ts, invite_from_row, invite_preview_from_row, member_from_row, INVITE_COLUMNS,
};

impl Store {
    pub fn list_members(&self, calendar_id: i64) -> Result<Vec<Member>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT cm.user_id, u.email, u.display_name, cm.role
             FROM calendar_members cm JOIN users u ON u.id = cm.user_id
             WHERE cm.calendar_id = ?1
             ORDER BY CASE cm.role WHEN 'OWNER' THEN 0 WHEN 'EDITOR' THEN 1 ELSE 2 END ASC,
                      u.email ASC",
        )?;
        let rows = stmt.query_map([calendar_id], member_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn set_member_role(
        &self,
        calendar_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE calendar_members SET role = ?1 WHERE calendar_id = ?2 AND user_id = ?3",
            params![role.as_str(), calendar_id, user_id],
        )?;
        Ok(changed)
    }

    pub fn remove_member(&self, calendar_id: i64, user_id: i64) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM calendar_members WHERE calendar_id = ?1 AND user_id = ?2",
            params![calendar_id, user_id],
        )?;
        Ok(changed)
    }

    pub fn count_owners(&self, calendar_id: i64) -> Result<i64, StoreError> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM calendar_members WHERE calendar_id = ?1 AND role = 'OWNER'",
            [calendar_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_invite(
        &self,
        calendar_id: i64,
        invitee_email: &str,
        role: Role,
        token: &str,
        invited_by: i64,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO calendar_invites
                 (calendar_id, invitee_email, role, token, status, invited_by, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?6, ?7)",
            params![
                calendar_id,
                invitee_email,
                role.as_str(),
                token,
                invited_by,
                encode_ts(created_at),
                encode_ts(expires_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_invite_by_token(&self, token: &str) -> Result<Option<Invite>, StoreError> {
        let invite = self
            .conn
            .query_row(
                &format!("SELECT {INVITE_COLUMNS} FROM calendar_invites WHERE token = ?1"),
                [token],
                invite_from_row,
            )
            .optional()?;
        Ok(invite)
    }

    pub fn find_invite_by_id(&self, invite_id: i64) -> Result<Option<Invite>, StoreError> {
        let invite = self
            .conn
            .query_row(
                &format!("SELECT {INVITE_COLUMNS} FROM calendar_invites WHERE id = ?1"),
                [invite_id],
                invite_from_row,
            )
            .optional()?;
        Ok(invite)
    }

    pub fn invite_preview(&self, token: &str) -> Result<Option<InvitePreview>, StoreError> {
        let preview = self
            .conn
            .query_row(
                "SELECT i.calendar_id, c.name, u.email, i.role, i.status, i.expires_at, i.invitee_email
                 FROM calendar_invites i
                 JOIN calendars c ON c.id = i.calendar_id
                 JOIN users u ON u.id = i.invited_by
                 WHERE i.token = ?1",
                [token],
                invite_preview_from_row,
            )
            .optional()?;
        Ok(preview)
    }

    pub fn list_pending_invites(&self, calendar_id: i64) -> Result<Vec<Invite>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INVITE_COLUMNS} FROM calendar_invites
             WHERE calendar_id = ?1 AND status = 'PENDING'
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([calendar_id], invite_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // Membership upsert and status flip are one transaction: no path
    // leaves a membership behind a still-PENDING invite, or an ACCEPTED
    // invite without its membership.
    pub fn accept_invite(&self, token: &str, user_id: i64) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO calendar_members (calendar_id, user_id, role)
             SELECT calendar_id, ?1, role FROM calendar_invites WHERE token = ?2
             ON CONFLICT (calendar_id, user_id) DO UPDATE SET role = excluded.role",
            params![user_id, token],
        )?;
        tx.execute(
            "UPDATE calendar_invites SET status = 'ACCEPTED' WHERE token = ?1 AND status = 'PENDING'",
            [token],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn decline_invite(&self, token: &str) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE calendar_invites SET status = 'DECLINED' WHERE token = ?1 AND status = 'PENDING'",
            [token],
        )?;
        Ok(changed)
    }

    pub fn revoke_invite(&self, invite_id: i64) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE calendar_invites SET status = 'REVOKED' WHERE id = ?1 AND status = 'PENDING'",
            [invite_id],
        )?;
        Ok(changed)
    }

    pub fn expire_pending_invites(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let changed = self.conn.execute(
            "UPDATE calendar_invites SET status = 'REVOKED'
             WHERE status = 'PENDING' AND expires_at <= ?1",
            [encode_ts(now)],
        )?;
        Ok(changed)
    }
}
