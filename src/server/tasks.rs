//! Task routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use super::AppState;
use super::extract::{Caller, JsonBody, JsonBodyOrEmpty};
use crate::error::{ApiError, ApiResult};
use crate::types::{LegacyTask, Task, TaskPatch};

/// A task as returned to the client.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TaskView {
    /// `done` as a boolean.
    Flag(Task),
    /// `done` as 0/1.
    Integer(LegacyTask),
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub text: Option<String>,
}

/// `done` as sent by either client generation.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum DoneFlag {
    Bool(bool),
    Int(i64),
}

impl DoneFlag {
    fn into_bool(self) -> ApiResult<bool> {
        match self {
            DoneFlag::Bool(done) => Ok(done),
            DoneFlag::Int(0) => Ok(false),
            DoneFlag::Int(1) => Ok(true),
            DoneFlag::Int(_) => Err(ApiError::invalid_value(
                "done",
                "done must be a boolean or 0/1",
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub text: Option<String>,
    pub done: Option<DoneFlag>,
}

impl UpdateTaskRequest {
    fn into_patch(self) -> ApiResult<TaskPatch> {
        Ok(TaskPatch {
            text: self.text,
            done: self.done.map(DoneFlag::into_bool).transpose()?,
        })
    }
}

/// Ids that are not integers can never name a task.
fn parse_task_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| ApiError::task_not_found())
}

pub async fn list_tasks(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<TaskView>>> {
    let tasks = state.db().list_tasks(caller.scope)?;
    Ok(Json(tasks.into_iter().map(|t| caller.view(t)).collect()))
}

pub async fn create_task(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let text = body.text.ok_or_else(|| ApiError::missing_field("text"))?;
    let task = state.db().create_task(caller.scope, &text)?;

    info!(task_id = task.id, owner = ?caller.scope.owner_id(), "Created task");
    Ok((StatusCode::CREATED, Json(caller.view(task))))
}

pub async fn update_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(task_id): Path<String>,
    JsonBodyOrEmpty(body): JsonBodyOrEmpty<UpdateTaskRequest>,
) -> ApiResult<Json<TaskView>> {
    let task_id = parse_task_id(&task_id)?;
    let patch = body.into_patch()?;
    let task = state.db().update_task(caller.scope, task_id, &patch)?;

    info!(task_id, done = task.done, "Updated task");
    Ok(Json(caller.view(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    caller: Caller,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let task_id = parse_task_id(&task_id)?;
    state.db().delete_task(caller.scope, task_id)?;

    info!(task_id, "Deleted task");
    Ok(Json(json!({ "success": true })))
}
