//! Registration and login.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::AppState;
use super::extract::JsonBody;
use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::types::User;

/// Body of `/register` and `/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Both fields present and non-empty.
    fn into_parts(self) -> ApiResult<(String, String)> {
        match (self.username, self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok((username, password))
            }
            _ => Err(ApiError::missing_credentials()),
        }
    }
}

/// A freshly issued session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let (username, password) = body.into_parts()?;

    let cost = state.auth().bcrypt_cost;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(ApiError::internal)??;

    let user = state.db().create_user(&username, &hash)?;
    let token = state.tokens().issue(&user).map_err(ApiError::internal)?;

    info!(user_id = user.id, username = %user.username, "Registered user");
    Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (username, password) = body.into_parts()?;

    let Some(credentials) = state.db().find_user_by_username(&username)? else {
        debug!(username = %username, "Login for unknown username");
        return Err(ApiError::invalid_credentials());
    };

    let stored_hash = credentials.password_hash;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(ApiError::internal)?;
    if !valid {
        debug!(user_id = credentials.user.id, "Login with wrong password");
        return Err(ApiError::invalid_credentials());
    }

    let user = credentials.user;
    let token = state.tokens().issue(&user).map_err(ApiError::internal)?;

    info!(user_id = user.id, "User logged in");
    Ok(Json(SessionResponse { user, token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: Option<&str>, password: Option<&str>) -> CredentialsRequest {
        CredentialsRequest {
            username: username.map(String::from),
            password: password.map(String::from),
        }
    }

    #[test]
    fn credentials_require_both_fields() {
        assert!(request(Some("alice"), Some("secret123")).into_parts().is_ok());
        assert!(request(None, Some("secret123")).into_parts().is_err());
        assert!(request(Some("alice"), None).into_parts().is_err());
        assert!(request(Some(""), Some("secret123")).into_parts().is_err());
        assert!(request(Some("alice"), Some("")).into_parts().is_err());
    }
}
