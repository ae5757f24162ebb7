use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::User;

/// `{status, message}` envelope used by /ping, POST /users and error paths.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub status: &'static str,
    pub message: String,
}

impl ApiMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail",
            message: message.into(),
        }
    }
}

/// Request body for POST /users. Both fields are required; `Option` here so
/// a missing field is reported as an invalid payload instead of a serde
/// rejection.
#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Public fields of a user as returned by GET /users.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// `{status, data: {users: [...]}}` envelope for GET /users.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub status: &'static str,
    pub data: UserListData,
}

#[derive(Debug, Serialize)]
pub struct UserListData {
    pub users: Vec<UserSummary>,
}

impl UserListResponse {
    pub fn new(users: Vec<UserSummary>) -> Self {
        Self {
            status: "success",
            data: UserListData { users },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let json = serde_json::to_value(ApiMessage::success("pong!")).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "pong!");
    }

    #[test]
    fn fail_envelope_shape() {
        let json = serde_json::to_value(ApiMessage::fail("Invalid payload.")).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "Invalid payload.");
    }

    #[test]
    fn add_user_request_tolerates_missing_fields() {
        let req: AddUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.username.is_none());
        assert!(req.email.is_none());

        let req: AddUserRequest =
            serde_json::from_str(r#"{"username":"a","email":"a@x.com"}"#).unwrap();
        assert_eq!(req.username.as_deref(), Some("a"));
        assert_eq!(req.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn user_list_nests_under_data() {
        let user = User {
            id: Uuid::new_v4(),
            username: Some("a".into()),
            email: "a@x.com".into(),
            password_hash: None,
            first_name: None,
            last_name: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_value(UserListResponse::new(vec![user.into()])).unwrap();
        assert_eq!(json["status"], "success");
        let users = json["data"]["users"].as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["email"], "a@x.com");
        assert_eq!(users[0]["username"], "a");
        assert_eq!(users[0]["created_at"], "1970-01-01T00:00:00Z");
    }
}
