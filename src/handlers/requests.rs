// handlers/requests.rs - rental application lifecycle endpoints
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::property;
use crate::database::models::request::{self, NewRequest, RequestStatus};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /requests - the caller's side of the table
///
/// Owners see applications against their properties, tenants see the
/// applications they filed.
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<RequestStatus>().map_err(|_| {
                ApiError::validation("Status must be one of 'pending', 'approved', 'rejected'")
            })
        })
        .transpose()?;

    let requests = request::list_for(&state.pool, caller.id, caller.role, status).await?;
    Ok(Json(json!({ "requests": requests })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub property_id: Uuid,
    pub owner_id: Uuid,
    pub message: Option<String>,
    pub move_in_date: NaiveDate,
}

/// POST /requests - file a rental application (tenant only)
///
/// A tenant may hold at most one non-rejected application per property. The
/// pre-check produces the friendly 400; the partial unique index closes the
/// race two concurrent creates would otherwise win together.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(tenant)): Extension<CurrentUser>,
    Json(payload): Json<CreateRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.message.as_deref().is_some_and(|m| m.len() > 500) {
        return Err(ApiError::validation(
            "Message cannot be more than 500 characters",
        ));
    }

    if request::has_active(&state.pool, payload.property_id, tenant.id).await? {
        return Err(ApiError::conflict(
            "You already have an active request for this property",
        ));
    }

    let new = NewRequest {
        property_id: payload.property_id,
        tenant_id: tenant.id,
        owner_id: payload.owner_id,
        message: payload.message,
        move_in_date: payload.move_in_date,
    };

    let id = request::insert(&state.pool, new).await.map_err(|e| {
        let duplicate = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        let missing_reference = e
            .as_database_error()
            .is_some_and(|db| db.is_foreign_key_violation());
        if duplicate {
            ApiError::conflict("You already have an active request for this property")
        } else if missing_reference {
            ApiError::not_found("Property not found")
        } else {
            ApiError::from(e)
        }
    })?;

    let created = request::fetch_with_parties(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::internal("Internal server error"))?;

    tracing::info!(request = %id, tenant = %tenant.id, property = %payload.property_id, "rental request created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Rental request created successfully",
            "request": created,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequestBody {
    pub status: String,
}

/// PUT /requests/:id - approve or reject an application (owner only)
///
/// Approval also marks the property unavailable. The two writes are separate
/// statements, not a transaction; a crash in between leaves an approved
/// request on a still-listed property. Rejection never re-lists a property.
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequestBody>,
) -> Result<Json<Value>, ApiError> {
    let status: RequestStatus = payload.status.parse().map_err(|_| {
        ApiError::validation("Status must be one of 'pending', 'approved', 'rejected'")
    })?;

    let property_id = request::set_status_owned(&state.pool, id, owner.id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Request not found or unauthorized"))?;

    if status == RequestStatus::Approved {
        property::mark_unavailable(&state.pool, property_id).await?;
        tracing::info!(property = %property_id, request = %id, "property marked unavailable after approval");
    }

    let updated = request::fetch_with_parties(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::internal("Internal server error"))?;

    Ok(Json(json!({
        "message": "Request updated successfully",
        "request": updated,
    })))
}
