use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;

use crate::auth;
use crate::database::models::account::{self, Account, Role};
use crate::error::ApiError;
use crate::AppState;

/// Authenticated account attached to the request by a role gate.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Account);

/// Identity resolver: session cookie -> verified claims -> account row.
///
/// Every failure mode (no cookie, bad signature, expired token, vanished
/// account) reports 401; callers cannot distinguish them.
pub async fn authenticate(headers: &HeaderMap, pool: &PgPool) -> Result<Account, ApiError> {
    let token = auth::session_cookie_from_headers(headers)
        .ok_or_else(|| ApiError::unauthenticated("Access denied. No token provided."))?;

    let claims = auth::verify_token(&token).map_err(|e| {
        tracing::debug!("session token rejected: {}", e);
        ApiError::unauthenticated("Invalid or expired token.")
    })?;

    let account = account::find_by_id(pool, claims.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Invalid or expired token."))?;

    Ok(account)
}

/// Route-group gate: only property owners pass.
pub async fn require_owner(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, &[Role::Owner], request, next).await
}

/// Route-group gate: only tenants pass.
pub async fn require_tenant(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, &[Role::Tenant], request, next).await
}

/// Route-group gate: any authenticated account passes.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, &[Role::Owner, Role::Tenant], request, next).await
}

async fn gate(
    state: &AppState,
    allowed: &[Role],
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account = authenticate(request.headers(), &state.pool).await?;

    if !allowed.contains(&account.role) {
        tracing::debug!(
            account = %account.id,
            role = ?account.role,
            "role gate refused request"
        );
        return Err(ApiError::forbidden("Access denied. Insufficient permissions."));
    }

    request.extensions_mut().insert(CurrentUser(account));
    Ok(next.run(request).await)
}
