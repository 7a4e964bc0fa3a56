use crate::models::{SignatureRow, UserRow};
use crate::Database;
use anyhow::Result;
use chrono::{DateTime, Utc};
use petition_types::models::NewSignature;
use rusqlite::{Connection, Row};

const SIGNATURE_COLUMNS: &str = "id, name, nationalId, comment, anonymous, signed";

/// Same layout as the `strftime` default on `signatures.signed`, so seeded
/// and live rows sort together.
const SIGNED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

impl Database {
    // -- Users --

    /// Insert a user, or replace the password of an existing one. Returns the id.
    pub fn upsert_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let id = conn.query_row(
                "INSERT INTO users (username, password) VALUES (?1, ?2)
                 ON CONFLICT(username) DO UPDATE SET password = excluded.password
                 RETURNING id",
                (username, password_hash),
                |row| row.get(0),
            )?;
            Ok(id)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password FROM users WHERE username = ?1",
                [username],
                map_user,
            )
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password FROM users WHERE id = ?1",
                [id],
                map_user,
            )
            .optional()
        })
    }

    // -- Signatures --

    pub fn insert_signature(&self, new: &NewSignature) -> Result<SignatureRow> {
        self.with_conn_mut(|conn| {
            let row = conn.query_row(
                &format!(
                    "INSERT INTO signatures (name, nationalId, comment, anonymous)
                     VALUES (?1, ?2, ?3, ?4)
                     RETURNING {SIGNATURE_COLUMNS}"
                ),
                rusqlite::params![new.name, new.national_id, new.comment, new.anonymous],
                map_signature,
            )?;
            Ok(row)
        })
    }

    /// Insert signatures with explicit timestamps in one transaction.
    /// Used for test data; all rows are rolled back if any is rejected.
    pub fn insert_signatures_at(&self, rows: &[(NewSignature, DateTime<Utc>)]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO signatures (name, nationalId, comment, anonymous, signed)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (new, signed) in rows {
                    stmt.execute(rusqlite::params![
                        new.name,
                        new.national_id,
                        new.comment,
                        new.anonymous,
                        signed.format(SIGNED_FORMAT).to_string(),
                    ])?;
                }
            }
            tx.commit()?;
            Ok(rows.len())
        })
    }

    /// Newest first. An offset past the end yields an empty page.
    pub fn list_signatures(&self, limit: i64, offset: i64) -> Result<Vec<SignatureRow>> {
        self.with_conn(|conn| query_signatures(conn, limit.max(0), offset.max(0)))
    }

    pub fn count_signatures(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM signatures", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    /// Returns whether a row was removed; a missing id is not an error.
    pub fn delete_signature(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM signatures WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}

fn query_signatures(conn: &Connection, limit: i64, offset: i64) -> Result<Vec<SignatureRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SIGNATURE_COLUMNS}
         FROM signatures
         ORDER BY signed DESC, id DESC
         LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = stmt
        .query_map([limit, offset], map_signature)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
    })
}

fn map_signature(row: &Row<'_>) -> rusqlite::Result<SignatureRow> {
    Ok(SignatureRow {
        id: row.get(0)?,
        name: row.get(1)?,
        national_id: row.get(2)?,
        comment: row.get(3)?,
        anonymous: row.get(4)?,
        signed: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
