use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::account::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// A rent payment backed by an external payment-intent. Created `pending`;
/// only the webhook handler moves it to `completed`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    pub owner_id: Uuid,
    pub amount: i64,
    pub payment_intent_id: String,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub month: String,
    pub year: i32,
}

#[derive(Debug, FromRow)]
pub struct PaymentWithPartiesRow {
    #[sqlx(flatten)]
    pub payment: Payment,
    pub property_title: String,
    pub property_location: String,
    pub tenant_name: String,
    pub tenant_email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithParties {
    #[serde(flatten)]
    pub payment: Payment,
    pub property: PaymentPropertySummary,
    pub tenant: PaymentTenantSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPropertySummary {
    pub id: Uuid,
    pub title: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTenantSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<PaymentWithPartiesRow> for PaymentWithParties {
    fn from(row: PaymentWithPartiesRow) -> Self {
        let property = PaymentPropertySummary {
            id: row.payment.property_id,
            title: row.property_title,
            location: row.property_location,
        };
        let tenant = PaymentTenantSummary {
            id: row.payment.tenant_id,
            name: row.tenant_name,
            email: row.tenant_email,
        };
        PaymentWithParties {
            payment: row.payment,
            property,
            tenant,
        }
    }
}

const PAYMENT_WITH_PARTIES_SELECT: &str = "SELECT pay.id, pay.tenant_id, pay.property_id, \
     pay.owner_id, pay.amount, pay.payment_intent_id, pay.status, pay.payment_date, \
     pay.due_date, pay.month, pay.year, \
     p.title AS property_title, p.location AS property_location, \
     t.name AS tenant_name, t.email AS tenant_email \
     FROM payments pay \
     JOIN properties p ON p.id = pay.property_id \
     JOIN accounts t ON t.id = pay.tenant_id";

/// Payments visible to `caller`: tenants see what they paid, owners what
/// they were paid.
pub async fn list_for(
    pool: &PgPool,
    caller_id: Uuid,
    caller_role: Role,
) -> Result<Vec<PaymentWithParties>, sqlx::Error> {
    let scope_column = match caller_role {
        Role::Tenant => "pay.tenant_id",
        Role::Owner => "pay.owner_id",
    };
    let sql = format!(
        "{PAYMENT_WITH_PARTIES_SELECT} WHERE {scope_column} = $1 ORDER BY pay.payment_date DESC"
    );
    let rows: Vec<PaymentWithPartiesRow> = sqlx::query_as(&sql)
        .bind(caller_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub struct NewPayment {
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    pub owner_id: Uuid,
    pub amount: i64,
    pub payment_intent_id: String,
    pub due_date: NaiveDate,
    pub month: String,
    pub year: i32,
}

pub async fn insert(pool: &PgPool, new: NewPayment) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (tenant_id, property_id, owner_id, amount, payment_intent_id, \
         due_date, month, year)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id, tenant_id, property_id, owner_id, amount, payment_intent_id, status, \
         payment_date, due_date, month, year",
    )
    .bind(new.tenant_id)
    .bind(new.property_id)
    .bind(new.owner_id)
    .bind(new.amount)
    .bind(new.payment_intent_id)
    .bind(new.due_date)
    .bind(new.month)
    .bind(new.year)
    .fetch_one(pool)
    .await
}

/// Reconcile a processor-confirmed payment. Returns how many rows matched
/// the intent id (zero when the intent is unknown locally).
pub async fn mark_completed(pool: &PgPool, payment_intent_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE payments SET status = 'completed' WHERE payment_intent_id = $1")
        .bind(payment_intent_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
