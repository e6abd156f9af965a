use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Account role. A closed set; every authorization decision dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Tenant,
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "tenant" => Ok(Role::Tenant),
            _ => Err(()),
        }
    }
}

/// An account as exposed to clients. There is no password field here at all;
/// the bcrypt hash is only ever selected through `LoginRow` on the login path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Contact projection joined onto properties, requests and payments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Account plus credentials, for password verification only.
#[derive(Debug, FromRow)]
pub struct LoginRow {
    #[sqlx(flatten)]
    pub account: Account,
    pub password_hash: String,
}

const ACCOUNT_COLUMNS: &str = "id, name, email, role, phone, created_at";

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_login_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<LoginRow>, sqlx::Error> {
    sqlx::query_as::<_, LoginRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts WHERE email = lower($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE email = lower($1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub struct NewAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub phone: Option<&'a str>,
}

pub async fn insert(pool: &PgPool, new: NewAccount<'_>) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "INSERT INTO accounts (name, email, password_hash, role, phone)
         VALUES ($1, lower($2), $3, $4, $5)
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(new.name)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.role)
    .bind(new.phone)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_from_wire_strings() {
        assert_eq!("owner".parse::<Role>(), Ok(Role::Owner));
        assert_eq!("tenant".parse::<Role>(), Ok(Role::Tenant));
        assert!("admin".parse::<Role>().is_err());
        assert!("Owner".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"owner\"");
        assert_eq!(serde_json::to_string(&Role::Tenant).unwrap(), "\"tenant\"");
    }
}
