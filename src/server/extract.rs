//! Request extractors: JSON bodies and the calling identity.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::AppState;
use super::tasks::TaskView;
use crate::config::AuthMode;
use crate::error::ApiError;
use crate::types::{LegacyTask, Scope, Task};

/// `Json<T>` whose rejections are reported as 400 with the API's error shape.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::malformed_body(rejection.body_text())),
        }
    }
}

/// Like [`JsonBody`], but a request without a body yields `T::default()`.
#[derive(Debug)]
pub struct JsonBodyOrEmpty<T>(pub T);

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

impl<S, T> FromRequest<S> for JsonBodyOrEmpty<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = is_json_content_type(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::malformed_body(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBodyOrEmpty(T::default()));
        }
        if !is_json {
            return Err(ApiError::malformed_body(
                "Expected request with `Content-Type: application/json`",
            ));
        }
        match Json::<T>::from_bytes(&bytes) {
            Ok(Json(value)) => Ok(JsonBodyOrEmpty(value)),
            Err(rejection) => Err(ApiError::malformed_body(rejection.body_text())),
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// Exactly two space-separated parts with the scheme `Bearer`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    let (scheme, token) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || scheme != "Bearer" || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Who is calling, and therefore which tasks they may touch.
#[derive(Debug, Clone)]
pub struct Caller {
    pub scope: Scope,
    pub mode: AuthMode,
}

impl Caller {
    /// Render a task in the wire shape of the current mode.
    pub fn view(&self, task: Task) -> TaskView {
        match self.mode {
            AuthMode::Token => TaskView::Flag(task),
            AuthMode::Anonymous => TaskView::Integer(LegacyTask::from(task)),
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mode = state.auth().mode;
        if mode == AuthMode::Anonymous {
            return Ok(Caller {
                scope: Scope::Global,
                mode,
            });
        }

        let Some(token) = bearer_token(&parts.headers) else {
            debug!("Missing or malformed Authorization header");
            return Err(ApiError::unauthorized());
        };

        let claims = state.tokens().verify(token).map_err(|e| {
            debug!(reason = %e, "Session token rejected");
            ApiError::unauthorized()
        })?;

        // A valid signature can outlive its account, e.g. after the database is recreated.
        match state.db().get_user(claims.id)? {
            Some(user) if user.username == claims.username => {}
            _ => {
                debug!(user_id = claims.id, "Session token names an unknown account");
                return Err(ApiError::unauthorized());
            }
        }

        Ok(Caller {
            scope: Scope::Owner(claims.id),
            mode,
        })
    }
}
