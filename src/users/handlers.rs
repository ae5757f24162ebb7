use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{AddUserRequest, ApiMessage, UserListResponse, UserSummary},
        repo::is_unique_violation,
        repo_types::User,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/users", get(list_users).post(add_user))
}

/// GET /ping
pub async fn ping() -> Json<ApiMessage> {
    Json(ApiMessage::success("pong!"))
}

/// GET /users
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = User::list_all(&state.db).await.map_err(|e| {
        error!(error = %e, "list users failed");
        ApiError::InvalidPayload
    })?;

    let users: Vec<UserSummary> = users.into_iter().map(UserSummary::from).collect();
    Ok(Json(UserListResponse::new(users)))
}

/// POST /users
///
/// Optimistic check-then-insert: a concurrent insert of the same email can
/// still trip the unique constraint, which is reported as a generic invalid
/// payload after the store rolls the statement back.
#[instrument(skip(state, payload))]
pub async fn add_user(
    State(state): State<AppState>,
    payload: Result<Json<AddUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiMessage>), ApiError> {
    let Json(body) = payload.map_err(|e| {
        warn!(error = %e, "unparseable user payload");
        ApiError::InvalidPayload
    })?;

    let (Some(username), Some(email)) = (body.username, body.email) else {
        return Err(ApiError::InvalidPayload);
    };
    let email = email.trim().to_lowercase();

    let existing = User::find_by_email(&state.db, &email).await.map_err(|e| {
        error!(error = %e, "find_by_email failed");
        ApiError::InvalidPayload
    })?;
    if existing.is_some() {
        return Err(ApiError::EmailTaken);
    }

    match User::create_bare(&state.db, &username, &email).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            Json(ApiMessage::success(format!("{} was added!", user.email))),
        )),
        Err(e) if is_unique_violation(&e) => {
            warn!(%email, "lost insert race on email");
            Err(ApiError::InvalidPayload)
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            Err(ApiError::InvalidPayload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ping_returns_pong_envelope() {
        let Json(body) = ping().await;
        assert_eq!(body.status, "success");
        assert_eq!(body.message, "pong!");
    }
}
