//! Cookie-backed sessions.
//!
//! A session is an opaque random token handed to the browser in an HttpOnly
//! cookie; the database stores only its SHA-256 digest alongside the user id
//! and an expiry. Gated handlers take [`AuthSession`] as an extractor and
//! unauthenticated requests are redirected to /login before handler logic
//! runs.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{InvalidHeaderValue, COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    response::Redirect,
};
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::error;

use crate::auth::repo;
use crate::config::SessionConfig;
use crate::state::AppState;
use crate::users::User;

/// Create a new session token. The raw value is only sent in the cookie; the
/// database stores a hash.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a session token so raw values never touch the database.
pub fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Build the `Set-Cookie` value establishing a session.
pub fn session_cookie(
    config: &SessionConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let name = &config.cookie_name;
    let max_age = config.ttl_minutes * 60;
    let mut cookie = format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(config: &SessionConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let name = &config.cookie_name;
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the raw session token out of the Cookie header, if present.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == cookie_name {
            return Some(val.to_string());
        }
    }
    None
}

/// Authenticated request context: the logged-in user plus the hash of the
/// session that established it (needed to end the session on logout).
pub struct AuthSession {
    pub user: User,
    pub token_hash: Vec<u8>,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, &state.config.session.cookie_name)
            .ok_or_else(|| Redirect::to("/login"))?;
        let token_hash = hash_token(&token);

        match repo::lookup_session_user(&state.db, &token_hash).await {
            Ok(Some(user)) => Ok(AuthSession { user, token_hash }),
            Ok(None) => Err(Redirect::to("/login")),
            Err(e) => {
                error!(error = %e, "session lookup failed");
                Err(Redirect::to("/login"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            cookie_name: "userhub_session".into(),
            cookie_secure: false,
            ttl_minutes: 60,
        }
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes, base64 no-pad
        assert_eq!(a.len(), 43);
        assert!(!a.contains('=') && !a.contains('+') && !a.contains('/'));
    }

    #[test]
    fn hash_is_deterministic_and_token_sensitive() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), hash_token("other-token"));
        assert_eq!(hash_token(&token).len(), 32);
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie(&config(), "tok123").unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("userhub_session=tok123"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age=3600"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn secure_flag_follows_config() {
        let mut cfg = config();
        cfg.cookie_secure = true;
        let cookie = session_cookie(&cfg, "tok").unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&config()).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("userhub_session=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn extract_token_finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; userhub_session=tok42; lang=en"),
        );
        assert_eq!(
            extract_token(&headers, "userhub_session").as_deref(),
            Some("tok42")
        );
    }

    #[test]
    fn extract_token_missing_cookie() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers, "userhub_session").is_none());

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(extract_token(&headers, "userhub_session").is_none());
    }

    #[tokio::test]
    async fn missing_cookie_redirects_before_touching_the_store() {
        let state = AppState::fake();
        let request = axum::http::Request::builder()
            .uri("/profile")
            .body(())
            .unwrap();
        let (mut parts, ()) = request.into_parts();

        let result = AuthSession::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());
    }

    #[test]
    fn cookie_roundtrip_hashes_to_same_key() {
        let token = generate_token();
        let cookie = session_cookie(&config(), &token).unwrap();

        // Simulate the browser echoing the cookie back.
        let sent = cookie.to_str().unwrap().split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(sent).unwrap());

        let echoed = extract_token(&headers, "userhub_session").unwrap();
        assert_eq!(hash_token(&echoed), hash_token(&token));
    }
}
