//! Task CRUD, scoped to an owner.
//!
//! Every statement that touches an existing row carries the owner filter in
//! its own `WHERE` clause, so the ownership check and the mutation are one
//! statement. A row outside the scope looks exactly like a missing row.

use super::Database;
use crate::error::ApiError;
use crate::types::{Scope, Task, TaskPatch};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};

const TASK_COLUMNS: &str = "id, text, done, created_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let done: Option<i64> = row.get("done")?;
    Ok(Task {
        id: row.get("id")?,
        text: row.get("text")?,
        done: done.unwrap_or(0) != 0,
        created_at: row.get("created_at")?,
    })
}

/// SQL fragment restricting rows to `scope`, bound through `:owner`.
fn owner_filter(scope: Scope, joiner: &str) -> String {
    match scope {
        Scope::Owner(_) => format!(" {} user_id = :owner", joiner),
        Scope::Global => String::new(),
    }
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, scope: Scope, task_id: i64) -> Result<Option<Task>> {
    let owner = scope.owner_id();
    let sql = format!(
        "SELECT {} FROM tasks WHERE id = :id{}",
        TASK_COLUMNS,
        owner_filter(scope, "AND")
    );
    let mut params: Vec<(&str, &dyn ToSql)> = vec![(":id", &task_id as &dyn ToSql)];
    if owner.is_some() {
        params.push((":owner", &owner as &dyn ToSql));
    }

    let task = conn
        .query_row(&sql, params.as_slice(), parse_task_row)
        .optional()?;
    Ok(task)
}

impl Database {
    /// List tasks in scope, newest first.
    pub fn list_tasks(&self, scope: Scope) -> Result<Vec<Task>> {
        let owner = scope.owner_id();
        let sql = format!(
            "SELECT {} FROM tasks{} ORDER BY id DESC",
            TASK_COLUMNS,
            owner_filter(scope, "WHERE")
        );

        self.with_conn(|conn| {
            let mut params: Vec<(&str, &dyn ToSql)> = Vec::new();
            if owner.is_some() {
                params.push((":owner", &owner as &dyn ToSql));
            }

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params.as_slice(), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Get a single task if it exists and is in scope.
    pub fn get_task(&self, scope: Scope, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, scope, task_id))
    }

    /// Create an incomplete task owned by the scope's user (or nobody).
    ///
    /// Rejects text that is empty after trimming.
    pub fn create_task(&self, scope: Scope, text: &str) -> Result<Task> {
        if text.trim().is_empty() {
            return Err(ApiError::missing_field("text").into());
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (text, done, user_id) VALUES (?1, 0, ?2)",
                rusqlite::params![text, scope.owner_id()],
            )?;
            let id = conn.last_insert_rowid();
            get_task_internal(conn, scope, id)?
                .ok_or_else(|| anyhow::anyhow!("task {} vanished after insert", id))
        })
    }

    /// Apply a partial update and return the updated task.
    ///
    /// Fails with `TaskNotFound` when the task is missing or outside the scope.
    pub fn update_task(&self, scope: Scope, task_id: i64, patch: &TaskPatch) -> Result<Task> {
        if let Some(text) = &patch.text
            && text.trim().is_empty()
        {
            return Err(ApiError::invalid_value("text", "text must not be empty").into());
        }

        self.with_conn(|conn| {
            if !patch.is_empty() {
                let owner = scope.owner_id();
                let done = patch.done.map(i64::from);
                let sql = format!(
                    "UPDATE tasks
                     SET text = COALESCE(:text, text), done = COALESCE(:done, done)
                     WHERE id = :id{}",
                    owner_filter(scope, "AND")
                );
                let mut params: Vec<(&str, &dyn ToSql)> = vec![
                    (":text", &patch.text as &dyn ToSql),
                    (":done", &done as &dyn ToSql),
                    (":id", &task_id as &dyn ToSql),
                ];
                if owner.is_some() {
                    params.push((":owner", &owner as &dyn ToSql));
                }

                let affected = conn.execute(&sql, params.as_slice())?;
                if affected == 0 {
                    return Err(ApiError::task_not_found().into());
                }
            }

            get_task_internal(conn, scope, task_id)?.ok_or_else(|| ApiError::task_not_found().into())
        })
    }

    /// Permanently delete a task.
    ///
    /// Fails with `TaskNotFound` when the task is missing or outside the scope.
    pub fn delete_task(&self, scope: Scope, task_id: i64) -> Result<()> {
        let owner = scope.owner_id();
        let sql = format!(
            "DELETE FROM tasks WHERE id = :id{}",
            owner_filter(scope, "AND")
        );

        self.with_conn(|conn| {
            let mut params: Vec<(&str, &dyn ToSql)> = vec![(":id", &task_id as &dyn ToSql)];
            if owner.is_some() {
                params.push((":owner", &owner as &dyn ToSql));
            }

            let affected = conn.execute(&sql, params.as_slice())?;
            if affected == 0 {
                return Err(ApiError::task_not_found().into());
            }
            Ok(())
        })
    }
}
