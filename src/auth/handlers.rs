use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, SignupForm},
        password::{hash_password, verify_optional},
        repo,
        session::{self, AuthSession},
    },
    state::AppState,
    templates,
    users::{repo::is_unique_violation, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", get(signup_form).post(signup))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/profile", get(profile))
}

/// GET /signup
pub async fn signup_form() -> Html<String> {
    Html(templates::signup_page(
        &SignupForm::default(),
        &Default::default(),
    ))
}

/// POST /signup
///
/// On success the new user is logged in immediately and sent to /profile. A
/// duplicate email surfaces as a field error on re-render; the store rolls
/// the failed insert back, so no partial row survives.
#[instrument(skip(state, form))]
pub async fn signup(
    State(state): State<AppState>,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, (StatusCode, String)> {
    form.normalize();
    let mut errors = form.validate();

    if errors.is_empty() {
        let hash = hash_password(&form.password).map_err(internal)?;

        match User::create_with_password(
            &state.db,
            form.first_name.trim(),
            form.last_name.trim(),
            &form.email,
            &hash,
        )
        .await
        {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "user signed up");
                return start_session(&state, &user).await.map_err(internal);
            }
            Err(e) if is_unique_violation(&e) => {
                warn!(email = %form.email, "signup email already taken");
                errors.add("email", "This email is taken");
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                return Err(internal(e));
            }
        }
    }

    Ok(Html(templates::signup_page(&form, &errors)).into_response())
}

/// GET /login
pub async fn login_form() -> Html<String> {
    Html(templates::login_page(
        &LoginForm::default(),
        &Default::default(),
    ))
}

/// POST /login
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, (StatusCode, String)> {
    form.normalize();
    let mut errors = form.validate();

    if errors.is_empty() {
        match User::find_by_email(&state.db, &form.email).await {
            Ok(Some(user)) => {
                let ok = verify_optional(&form.password, user.password_hash.as_deref())
                    .map_err(internal)?;
                if ok {
                    info!(user_id = %user.id, email = %user.email, "user logged in");
                    return start_session(&state, &user).await.map_err(internal);
                }
                warn!(email = %form.email, user_id = %user.id, "login invalid password");
                errors.add("password", "Incorrect Password");
            }
            Ok(None) => {
                warn!(email = %form.email, "login unknown email");
                errors.add("email", "Incorrect Email");
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(internal(e));
            }
        }
    }

    Ok(Html(templates::login_page(&form, &errors)).into_response())
}

/// GET /logout
///
/// Gated: the extractor redirects unauthenticated requests to /login before
/// this body runs.
#[instrument(skip(state, auth))]
pub async fn logout(State(state): State<AppState>, auth: AuthSession) -> Response {
    if let Err(e) = repo::delete_session(&state.db, &auth.token_hash).await {
        error!(error = %e, user_id = %auth.user.id, "delete session failed");
    } else {
        info!(user_id = %auth.user.id, "user logged out");
    }

    let mut headers = HeaderMap::new();
    if let Ok(cookie) = session::clear_session_cookie(&state.config.session) {
        headers.insert(SET_COOKIE, cookie);
    }
    (headers, Redirect::to("/login")).into_response()
}

/// GET /profile
#[instrument(skip(auth))]
pub async fn profile(auth: AuthSession) -> Html<String> {
    Html(templates::profile_page(&auth.user))
}

/// Insert a session row and answer with the cookie plus a redirect to
/// /profile.
async fn start_session(state: &AppState, user: &User) -> anyhow::Result<Response> {
    let token = session::generate_token();
    let token_hash = session::hash_token(&token);
    repo::create_session(
        &state.db,
        &token_hash,
        user.id,
        state.config.session.ttl_minutes,
    )
    .await?;

    let cookie = session::session_cookie(&state.config.session, &token)?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((headers, Redirect::to("/profile")).into_response())
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
