use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use thiserror::Error;

use crate::users::dto::ApiMessage;

/// Errors surfaced by the JSON endpoints. Everything maps to a 400 fail
/// envelope; store errors are folded into the generic payload message rather
/// than leaking to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid payload.")]
    InvalidPayload,
    #[error("Sorry. That email already exists.")]
    EmailTaken,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(ApiMessage::fail(self.to_string()))).into_response()
    }
}
