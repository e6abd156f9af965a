use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::account::{PartyInfo, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::str::FromStr for RequestStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(()),
        }
    }
}

/// A tenant's rental application. `owner_id` is denormalized from the
/// property at creation time and never re-synced.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RentalRequest {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub move_in_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Condensed property fields shown alongside a request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub rent: i64,
    pub images: Vec<String>,
}

#[derive(Debug, FromRow)]
pub struct RequestWithPartiesRow {
    #[sqlx(flatten)]
    pub request: RentalRequest,
    pub property_title: String,
    pub property_location: String,
    pub property_rent: i64,
    pub property_images: Vec<String>,
    pub tenant_name: String,
    pub tenant_email: String,
    pub tenant_phone: Option<String>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWithParties {
    #[serde(flatten)]
    pub request: RentalRequest,
    pub property: PropertySummary,
    pub tenant: PartyInfo,
    pub owner: PartyInfo,
}

impl From<RequestWithPartiesRow> for RequestWithParties {
    fn from(row: RequestWithPartiesRow) -> Self {
        let property = PropertySummary {
            id: row.request.property_id,
            title: row.property_title,
            location: row.property_location,
            rent: row.property_rent,
            images: row.property_images,
        };
        let tenant = PartyInfo {
            id: row.request.tenant_id,
            name: row.tenant_name,
            email: row.tenant_email,
            phone: row.tenant_phone,
        };
        let owner = PartyInfo {
            id: row.request.owner_id,
            name: row.owner_name,
            email: row.owner_email,
            phone: row.owner_phone,
        };
        RequestWithParties {
            request: row.request,
            property,
            tenant,
            owner,
        }
    }
}

const REQUEST_WITH_PARTIES_SELECT: &str = "SELECT r.id, r.property_id, r.tenant_id, r.owner_id, \
     r.status, r.message, r.move_in_date, r.created_at, r.responded_at, \
     p.title AS property_title, p.location AS property_location, p.rent AS property_rent, \
     p.images AS property_images, \
     t.name AS tenant_name, t.email AS tenant_email, t.phone AS tenant_phone, \
     o.name AS owner_name, o.email AS owner_email, o.phone AS owner_phone \
     FROM requests r \
     JOIN properties p ON p.id = r.property_id \
     JOIN accounts t ON t.id = r.tenant_id \
     JOIN accounts o ON o.id = r.owner_id";

/// Requests visible to `caller`: an owner sees requests on their properties,
/// a tenant sees their own applications.
pub async fn list_for(
    pool: &PgPool,
    caller_id: Uuid,
    caller_role: Role,
    status: Option<RequestStatus>,
) -> Result<Vec<RequestWithParties>, sqlx::Error> {
    let scope_column = match caller_role {
        Role::Owner => "r.owner_id",
        Role::Tenant => "r.tenant_id",
    };
    let mut sql = format!("{REQUEST_WITH_PARTIES_SELECT} WHERE {scope_column} = $1");
    if status.is_some() {
        sql.push_str(" AND r.status = $2");
    }
    sql.push_str(" ORDER BY r.created_at DESC");

    let mut query = sqlx::query_as::<_, RequestWithPartiesRow>(&sql).bind(caller_id);
    if let Some(status) = status {
        query = query.bind(status);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn fetch_with_parties(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<RequestWithParties>, sqlx::Error> {
    let row: Option<RequestWithPartiesRow> =
        sqlx::query_as(&format!("{REQUEST_WITH_PARTIES_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Into::into))
}

/// Does the tenant already have a pending or approved request on the property?
pub async fn has_active(
    pool: &PgPool,
    property_id: Uuid,
    tenant_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM requests \
         WHERE property_id = $1 AND tenant_id = $2 AND status <> 'rejected'",
    )
    .bind(property_id)
    .bind(tenant_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub struct NewRequest {
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
    pub message: Option<String>,
    pub move_in_date: NaiveDate,
}

pub async fn insert(pool: &PgPool, new: NewRequest) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO requests (property_id, tenant_id, owner_id, message, move_in_date)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(new.property_id)
    .bind(new.tenant_id)
    .bind(new.owner_id)
    .bind(new.message)
    .bind(new.move_in_date)
    .fetch_one(pool)
    .await
}

/// Set the status of a request the caller owns, stamping `responded_at`.
/// Returns the referenced property id, or None when the request is missing
/// or belongs to someone else (reported identically).
pub async fn set_status_owned(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    status: RequestStatus,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE requests SET status = $1, responded_at = now() \
         WHERE id = $2 AND owner_id = $3 \
         RETURNING property_id",
    )
    .bind(status)
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_from_wire_strings() {
        assert_eq!("pending".parse::<RequestStatus>(), Ok(RequestStatus::Pending));
        assert_eq!("approved".parse::<RequestStatus>(), Ok(RequestStatus::Approved));
        assert_eq!("rejected".parse::<RequestStatus>(), Ok(RequestStatus::Rejected));
        assert!("cancelled".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Approved).unwrap(),
            "\"approved\""
        );
    }
}
