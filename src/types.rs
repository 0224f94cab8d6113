//! Core types for the task store.

use serde::{Deserialize, Serialize};

/// Account record as exposed over the API. The password hash never leaves
/// the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

/// Account row including the stored bcrypt hash, used only for login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub done: bool,
    pub created_at: String,
}

/// Task as rendered by the anonymous variant, where `done` travels as 0/1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTask {
    pub id: i64,
    pub text: String,
    pub done: i64,
    pub created_at: String,
}

impl From<Task> for LegacyTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            text: task.text,
            done: i64::from(task.done),
            created_at: task.created_at,
        }
    }
}

/// Partial update for a task. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub done: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.done.is_none()
    }
}

/// Which tasks a request may see and touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only tasks whose `user_id` matches.
    Owner(i64),
    /// Every task; used when the server runs without accounts.
    Global,
}

impl Scope {
    /// Owner id to store on newly created tasks.
    pub fn owner_id(&self) -> Option<i64> {
        match self {
            Scope::Owner(id) => Some(*id),
            Scope::Global => None,
        }
    }
}
