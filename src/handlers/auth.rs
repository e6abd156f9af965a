// handlers/auth.rs - account registration and session endpoints
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth;
use crate::database::models::account::{self, NewAccount, Role};
use crate::error::ApiError;
use crate::middleware::auth::authenticate;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - create an account and open a session
///
/// The session token is issued immediately in an HttpOnly cookie, so a
/// fresh signup can browse and apply without a separate login round trip.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role: Role = payload
        .role
        .parse()
        .map_err(|_| ApiError::validation("Role must be either 'owner' or 'tenant'"))?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Please provide a name"));
    }
    if payload.name.len() > 60 {
        return Err(ApiError::validation("Name cannot be more than 60 characters"));
    }
    if !is_plausible_email(&payload.email) {
        return Err(ApiError::validation("Please provide a valid email"));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::validation("Password should be at least 6 characters"));
    }
    if payload.phone.as_deref().is_some_and(|p| p.len() > 20) {
        return Err(ApiError::validation(
            "Phone number cannot be more than 20 characters",
        ));
    }

    if account::email_taken(&state.pool, &payload.email).await? {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let new_account = NewAccount {
        name: payload.name.trim(),
        email: &payload.email,
        password_hash: &password_hash,
        role,
        phone: payload.phone.as_deref(),
    };

    let created = account::insert(&state.pool, new_account).await.map_err(|e| {
        // The unique index backstops the pre-check under concurrent signups
        if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
            ApiError::conflict("An account with this email already exists")
        } else {
            ApiError::from(e)
        }
    })?;

    let token = auth::generate_token(auth::Claims::new(created.id))?;
    tracing::info!(account = %created.id, role = ?created.role, "account registered");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, auth::session_cookie_header(&token))],
        Json(json!({
            "message": "Account created successfully",
            "user": created,
        })),
    ))
}

/// POST /auth/login - verify credentials and open a session
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // One generic message for both unknown email and wrong password
    let invalid = || ApiError::unauthenticated("Invalid email or password");

    let row = account::find_login_by_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(invalid)?;

    if !auth::verify_password(&payload.password, &row.password_hash)? {
        return Err(invalid());
    }

    let token = auth::generate_token(auth::Claims::new(row.account.id))?;

    Ok((
        [(header::SET_COOKIE, auth::session_cookie_header(&token))],
        Json(json!({
            "message": "Logged in successfully",
            "user": row.account,
        })),
    ))
}

/// POST /auth/logout - drop the session cookie
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, auth::clear_session_cookie_header())],
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// GET /auth/me - the account behind the current session
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&headers, &state.pool).await?;
    Ok(Json(json!({ "user": user })))
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("a@b.com"));
        assert!(is_plausible_email("first.last@sub.domain.org"));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@missing-local.com"));
        assert!(!is_plausible_email("x@nodot"));
        assert!(!is_plausible_email("x@.leading"));
        assert!(!is_plausible_email("x@trailing."));
    }
}
