// handlers/properties.rs - property listing and management endpoints
use axum::{
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::property::{
    self, ListScope, NewProperty, PropertyChanges, PropertyFilters,
};
use crate::error::ApiError;
use crate::middleware::auth::{authenticate, CurrentUser};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub location: Option<String>,
    pub min_rent: Option<i64>,
    pub max_rent: Option<i64>,
    pub rooms: Option<i32>,
    pub owner_id: Option<String>,
}

/// GET /properties - browse listings
///
/// Without `ownerId` this is the public view (available properties only).
/// `ownerId=current` resolves the session and scopes to the caller's own
/// listings; any other literal id scopes to that owner without requiring a
/// session at all.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let scope = match query.owner_id.as_deref() {
        Some("current") => {
            let caller = authenticate(&headers, &state.pool).await?;
            ListScope::Owner(caller.id)
        }
        Some(raw) => {
            let owner_id = Uuid::parse_str(raw)
                .map_err(|_| ApiError::validation("ownerId must be a valid id"))?;
            ListScope::Owner(owner_id)
        }
        None => ListScope::Public,
    };

    let filters = PropertyFilters {
        location: query.location,
        min_rent: query.min_rent,
        max_rent: query.max_rent,
        rooms: query.rooms,
    };

    let properties = property::list(&state.pool, scope, &filters).await?;
    Ok(Json(json!({ "properties": properties })))
}

/// GET /properties/:id - public detail view
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let found = property::fetch_with_owner(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Property not found"))?;
    Ok(Json(json!({ "property": found })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub rent: i64,
    pub rooms: i32,
    #[serde(default = "default_bathrooms")]
    pub bathrooms: i32,
    pub area: Option<i32>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

fn default_bathrooms() -> i32 {
    1
}

/// POST /properties - list a new property (owner only)
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Json(payload): Json<CreatePropertyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_fields(
        Some(payload.title.as_str()),
        Some(payload.description.as_str()),
        Some(payload.location.as_str()),
        Some(payload.rent),
        Some(payload.rooms),
        Some(payload.bathrooms),
        payload.area,
    )?;

    let new = NewProperty {
        owner_id: owner.id,
        title: payload.title,
        description: payload.description,
        location: payload.location,
        rent: payload.rent,
        rooms: payload.rooms,
        bathrooms: payload.bathrooms,
        area: payload.area,
        images: payload.images,
        amenities: payload.amenities,
    };

    let id = property::insert(&state.pool, new).await?;
    let created = property::fetch_with_owner(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::internal("Internal server error"))?;

    tracing::info!(property = %id, owner = %owner.id, "property created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Property created successfully",
            "property": created,
        })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub rent: Option<i64>,
    pub rooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub images: Option<Vec<String>>,
    pub availability: Option<bool>,
    pub amenities: Option<Vec<String>>,
}

/// PUT /properties/:id - partial update, scoped to the caller's own property
///
/// A missing property and someone else's property are both reported 404, so
/// non-owners cannot probe for existence.
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePropertyRequest>,
) -> Result<Json<Value>, ApiError> {
    validate_fields(
        payload.title.as_deref(),
        payload.description.as_deref(),
        payload.location.as_deref(),
        payload.rent,
        payload.rooms,
        payload.bathrooms,
        payload.area,
    )?;

    let changes = PropertyChanges {
        title: payload.title,
        description: payload.description,
        location: payload.location,
        rent: payload.rent,
        rooms: payload.rooms,
        bathrooms: payload.bathrooms,
        area: payload.area,
        images: payload.images,
        availability: payload.availability,
        amenities: payload.amenities,
    };

    let updated = property::update_owned(&state.pool, id, owner.id, changes).await?;
    if !updated {
        return Err(ApiError::not_found("Property not found or unauthorized"));
    }

    let refreshed = property::fetch_with_owner(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Property not found or unauthorized"))?;

    Ok(Json(json!({
        "message": "Property updated successfully",
        "property": refreshed,
    })))
}

/// DELETE /properties/:id - same ownership-scoped predicate as update
pub async fn remove(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let deleted = property::delete_owned(&state.pool, id, owner.id).await?;
    if !deleted {
        return Err(ApiError::not_found("Property not found or unauthorized"));
    }

    tracing::info!(property = %id, owner = %owner.id, "property deleted");
    Ok(Json(json!({ "message": "Property deleted successfully" })))
}

/// Shared bounds check for create (all fields present) and update (only the
/// provided ones). Messages mirror the listing form's expectations.
fn validate_fields(
    title: Option<&str>,
    description: Option<&str>,
    location: Option<&str>,
    rent: Option<i64>,
    rooms: Option<i32>,
    bathrooms: Option<i32>,
    area: Option<i32>,
) -> Result<(), ApiError> {
    let mut errors: HashMap<String, String> = HashMap::new();

    match title {
        Some(t) if t.trim().is_empty() => {
            errors.insert("title".into(), "Please provide a title".into());
        }
        Some(t) if t.len() > 100 => {
            errors.insert("title".into(), "Title cannot be more than 100 characters".into());
        }
        _ => {}
    }
    match description {
        Some(d) if d.trim().is_empty() => {
            errors.insert("description".into(), "Please provide a description".into());
        }
        Some(d) if d.len() > 1000 => {
            errors.insert(
                "description".into(),
                "Description cannot be more than 1000 characters".into(),
            );
        }
        _ => {}
    }
    if location.is_some_and(|l| l.trim().is_empty()) {
        errors.insert("location".into(), "Please provide a location".into());
    }
    if rent.is_some_and(|r| r < 0) {
        errors.insert("rent".into(), "Rent cannot be negative".into());
    }
    if rooms.is_some_and(|r| r < 1) {
        errors.insert("rooms".into(), "Property must have at least 1 room".into());
    }
    if bathrooms.is_some_and(|b| b < 1) {
        errors.insert(
            "bathrooms".into(),
            "Property must have at least 1 bathroom".into(),
        );
    }
    if area.is_some_and(|a| a < 1) {
        errors.insert("area".into(), "Area must be positive".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_fields("Property validation failed", errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_payload_within_bounds_passes() {
        assert!(validate_fields(
            Some("2BHK near the park"),
            Some("Bright and airy"),
            Some("Bangalore"),
            Some(18000),
            Some(2),
            Some(1),
            Some(1100),
        )
        .is_ok());
    }

    #[test]
    fn bounds_violations_are_reported_per_field() {
        let err = validate_fields(
            Some(""),
            Some("ok"),
            Some("ok"),
            Some(-1),
            Some(0),
            Some(0),
            Some(0),
        )
        .unwrap_err();
        let body = err.to_json();
        assert_eq!(err.status_code(), 400);
        for field in ["title", "rent", "rooms", "bathrooms", "area"] {
            assert!(
                body["fieldErrors"][field].is_string(),
                "expected an error for {field}: {body}"
            );
        }
    }

    #[test]
    fn partial_update_only_checks_provided_fields() {
        // rent alone, in range: nothing else should be required
        assert!(validate_fields(None, None, None, Some(0), None, None, None).is_ok());
        assert!(validate_fields(None, None, None, None, Some(0), None, None).is_err());
    }
}
