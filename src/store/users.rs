use rusqlite::{params, OptionalExtension};

use crate::calendar::User;
use crate::store::db::{Store, StoreError};
use crate::store::row::{user_from_row, USER_COLUMNS};

impl Store {
    pub fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            [email],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn find_user_id_by_email(&self, email: &str) -> Result<Option<i64>, StoreError> {
        let id = self
            .conn
            .query_row("SELECT id FROM users WHERE email = ?1", [email], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(id)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                [email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn create_email_user(
        &self,
        email: &str,
        password_hash: Option<&str>,
        display_name: &str,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO users (email, password_hash, display_name, provider)
             VALUES (?1, ?2, ?3, 'EMAIL')",
            params![email, password_hash, display_name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // Switching an account to Google is one-way: the password credential
    // is cleared and the provider stays GOOGLE from then on.
    pub fn upsert_google_user(
        &self,
        email: &str,
        display_name: &str,
        provider_id: &str,
    ) -> Result<i64, StoreError> {
        let id = self.conn.query_row(
            "INSERT INTO users (email, password_hash, display_name, provider, provider_id)
             VALUES (?1, NULL, ?2, 'GOOGLE', ?3)
             ON CONFLICT (email) DO UPDATE SET
                 provider = 'GOOGLE',
                 provider_id = excluded.provider_id,
                 display_name = coalesce(excluded.display_name, users.display_name),
                 password_hash = NULL
             RETURNING id",
            params![email, display_name, provider_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}
