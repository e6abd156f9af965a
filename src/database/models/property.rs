use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::account::PartyInfo;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub rent: i64,
    pub rooms: i32,
    pub bathrooms: i32,
    pub area: Option<i32>,
    pub images: Vec<String>,
    pub availability: bool,
    pub amenities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Owner contact columns aliased in the join.
#[derive(Debug, FromRow)]
pub struct OwnerJoin {
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct PropertyWithOwnerRow {
    #[sqlx(flatten)]
    pub property: Property,
    #[sqlx(flatten)]
    pub owner: OwnerJoin,
}

/// A property joined with its owner's contact projection, as returned by
/// every property read.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyWithOwner {
    #[serde(flatten)]
    pub property: Property,
    pub owner: PartyInfo,
}

impl From<PropertyWithOwnerRow> for PropertyWithOwner {
    fn from(row: PropertyWithOwnerRow) -> Self {
        let owner = PartyInfo {
            id: row.property.owner_id,
            name: row.owner.owner_name,
            email: row.owner.owner_email,
            phone: row.owner.owner_phone,
        };
        PropertyWithOwner {
            property: row.property,
            owner,
        }
    }
}

const PROPERTY_WITH_OWNER_SELECT: &str = "SELECT p.id, p.owner_id, p.title, p.description, \
     p.location, p.rent, p.rooms, p.bathrooms, p.area, p.images, p.availability, p.amenities, \
     p.created_at, a.name AS owner_name, a.email AS owner_email, a.phone AS owner_phone \
     FROM properties p JOIN accounts a ON a.id = p.owner_id";

/// Owner scope for a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Public listing: available properties only.
    Public,
    /// Everything a given owner has listed, available or not.
    Owner(Uuid),
}

#[derive(Debug, Default)]
pub struct PropertyFilters {
    pub location: Option<String>,
    pub min_rent: Option<i64>,
    pub max_rent: Option<i64>,
    pub rooms: Option<i32>,
}

fn list_query(scope: ListScope, filters: &PropertyFilters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(PROPERTY_WITH_OWNER_SELECT);
    qb.push(" WHERE ");
    match scope {
        ListScope::Owner(owner_id) => {
            qb.push("p.owner_id = ").push_bind(owner_id);
        }
        ListScope::Public => {
            qb.push("p.availability = TRUE");
        }
    }
    if let Some(location) = filters.location.as_ref().filter(|s| !s.is_empty()) {
        qb.push(" AND p.location ILIKE ").push_bind(format!("%{location}%"));
    }
    if let Some(min) = filters.min_rent {
        qb.push(" AND p.rent >= ").push_bind(min);
    }
    if let Some(max) = filters.max_rent {
        qb.push(" AND p.rent <= ").push_bind(max);
    }
    if let Some(rooms) = filters.rooms {
        qb.push(" AND p.rooms = ").push_bind(rooms);
    }
    qb.push(" ORDER BY p.created_at DESC");
    qb
}

pub async fn list(
    pool: &PgPool,
    scope: ListScope,
    filters: &PropertyFilters,
) -> Result<Vec<PropertyWithOwner>, sqlx::Error> {
    let rows: Vec<PropertyWithOwnerRow> = list_query(scope, filters)
        .build_query_as()
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn fetch_with_owner(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<PropertyWithOwner>, sqlx::Error> {
    let row: Option<PropertyWithOwnerRow> =
        sqlx::query_as(&format!("{PROPERTY_WITH_OWNER_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Into::into))
}

pub struct NewProperty {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub rent: i64,
    pub rooms: i32,
    pub bathrooms: i32,
    pub area: Option<i32>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
}

pub async fn insert(pool: &PgPool, new: NewProperty) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO properties (owner_id, title, description, location, rent, rooms, bathrooms, \
         area, images, amenities)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING id",
    )
    .bind(new.owner_id)
    .bind(new.title)
    .bind(new.description)
    .bind(new.location)
    .bind(new.rent)
    .bind(new.rooms)
    .bind(new.bathrooms)
    .bind(new.area)
    .bind(new.images)
    .bind(new.amenities)
    .fetch_one(pool)
    .await
}

/// Partial update of the fields a caller supplied.
#[derive(Debug, Default)]
pub struct PropertyChanges {
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

impl PropertyChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.rent.is_none()
            && self.rooms.is_none()
            && self.bathrooms.is_none()
            && self.area.is_none()
            && self.images.is_none()
            && self.availability.is_none()
            && self.amenities.is_none()
    }
}

/// Apply `changes` to the property, but only if the caller owns it.
/// Returns false when no such property belongs to the owner (which the API
/// deliberately reports the same way as "does not exist").
pub async fn update_owned(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    changes: PropertyChanges,
) -> Result<bool, sqlx::Error> {
    if changes.is_empty() {
        // Nothing to set; the ownership probe alone decides the outcome.
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE id = $1 AND owner_id = $2")
                .bind(id)
                .bind(owner_id)
                .fetch_one(pool)
                .await?;
        return Ok(count > 0);
    }

    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE properties SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(title) = changes.title {
            set.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = changes.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(location) = changes.location {
            set.push("location = ").push_bind_unseparated(location);
        }
        if let Some(rent) = changes.rent {
            set.push("rent = ").push_bind_unseparated(rent);
        }
        if let Some(rooms) = changes.rooms {
            set.push("rooms = ").push_bind_unseparated(rooms);
        }
        if let Some(bathrooms) = changes.bathrooms {
            set.push("bathrooms = ").push_bind_unseparated(bathrooms);
        }
        if let Some(area) = changes.area {
            set.push("area = ").push_bind_unseparated(area);
        }
        if let Some(images) = changes.images {
            set.push("images = ").push_bind_unseparated(images);
        }
        if let Some(availability) = changes.availability {
            set.push("availability = ").push_bind_unseparated(availability);
        }
        if let Some(amenities) = changes.amenities {
            set.push("amenities = ").push_bind_unseparated(amenities);
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" AND owner_id = ").push_bind(owner_id);

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a property the caller owns. Same ownership-scoped predicate as
/// `update_owned`.
pub async fn delete_owned(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM properties WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_unavailable(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE properties SET availability = FALSE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_scope_filters_on_availability() {
        let sql = list_query(ListScope::Public, &PropertyFilters::default()).into_sql();
        assert!(sql.contains("WHERE p.availability = TRUE"));
        assert!(sql.ends_with("ORDER BY p.created_at DESC"));
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn owner_scope_ignores_availability() {
        let sql =
            list_query(ListScope::Owner(Uuid::new_v4()), &PropertyFilters::default()).into_sql();
        assert!(sql.contains("p.owner_id ="));
        assert!(!sql.contains("availability"));
    }

    #[test]
    fn filters_compose_into_predicates() {
        let filters = PropertyFilters {
            location: Some("Bangalore".to_string()),
            min_rent: Some(5000),
            max_rent: Some(20000),
            rooms: Some(2),
        };
        let sql = list_query(ListScope::Public, &filters).into_sql();
        assert!(sql.contains("p.location ILIKE"));
        assert!(sql.contains("p.rent >="));
        assert!(sql.contains("p.rent <="));
        assert!(sql.contains("p.rooms ="));
    }

    #[test]
    fn blank_location_is_not_a_filter() {
        let filters = PropertyFilters {
            location: Some(String::new()),
            ..Default::default()
        };
        let sql = list_query(ListScope::Public, &filters).into_sql();
        assert!(!sql.contains("ILIKE"));
    }
}
