use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::users::User;

/// Persist a new session for `user_id` under the hashed token.
pub async fn create_session(
    db: &PgPool,
    token_hash: &[u8],
    user_id: Uuid,
    ttl_minutes: i64,
) -> anyhow::Result<()> {
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);
    sqlx::query(
        r#"
        INSERT INTO sessions (token_hash, user_id, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(())
}

/// Resolve a hashed session token to its user. Expired sessions do not
/// authenticate.
pub async fn lookup_session_user(db: &PgPool, token_hash: &[u8]) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name, u.created_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1 AND s.expires_at > now()
        "#,
    )
    .bind(token_hash)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Remove a session. Deleting an unknown hash is a no-op.
pub async fn delete_session(db: &PgPool, token_hash: &[u8]) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE token_hash = $1
        "#,
    )
    .bind(token_hash)
    .execute(db)
    .await?;
    Ok(())
}
