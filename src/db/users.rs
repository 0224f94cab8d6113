//! Account storage.

use super::Database;
use crate::error::ApiError;
use crate::types::{User, UserCredentials};
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

fn get_user_internal(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
            params![user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl Database {
    /// Insert a new account. `password_hash` must already be hashed.
    ///
    /// Fails with `AlreadyExists` when the username is taken.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                params![username, password_hash],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(ApiError::username_taken().into());
                }
                Err(e) => return Err(e.into()),
            }

            let id = conn.last_insert_rowid();
            get_user_internal(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", id))
        })
    }

    /// Get an account by id.
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_internal(conn, user_id))
    }

    /// Look up an account and its stored hash by username.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<UserCredentials>> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT id, username, created_at, password FROM users WHERE username = ?1",
                    params![username],
                    |row| {
                        Ok(UserCredentials {
                            user: User {
                                id: row.get(0)?,
                                username: row.get(1)?,
                                created_at: row.get(2)?,
                            },
                            password_hash: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(found)
        })
    }
}
