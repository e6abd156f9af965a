// handlers/payments.rs - rent payment endpoints and processor webhook
use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::models::payment::{self, NewPayment};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::services::stripe;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentBody {
    pub property_id: Uuid,
    pub owner_id: Uuid,
    pub amount: i64,
    pub month: u32,
    pub year: i32,
}

/// POST /payments - start a rent payment (tenant only)
///
/// The processor intent is created first; if it fails, nothing is persisted
/// and the processor's message comes back as a 500. The local record is
/// `pending` until the webhook confirms settlement.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(tenant)): Extension<CurrentUser>,
    Json(payload): Json<CreatePaymentBody>,
) -> Result<Json<Value>, ApiError> {
    if payload.amount < 0 {
        return Err(ApiError::validation("Amount cannot be negative"));
    }
    let due_date = first_of_month(payload.year, payload.month)
        .ok_or_else(|| ApiError::validation("Invalid month or year"))?;
    let amount_minor = payload
        .amount
        .checked_mul(100)
        .ok_or_else(|| ApiError::validation("Amount is too large"))?;

    let metadata = [
        ("tenantId", tenant.id.to_string()),
        ("propertyId", payload.property_id.to_string()),
        ("month", payload.month.to_string()),
        ("year", payload.year.to_string()),
    ];

    let intent = state
        .payments
        .create_payment_intent(amount_minor, "usd", &metadata)
        .await?;

    let new = NewPayment {
        tenant_id: tenant.id,
        property_id: payload.property_id,
        owner_id: payload.owner_id,
        amount: payload.amount,
        payment_intent_id: intent.id,
        due_date,
        month: payload.month.to_string(),
        year: payload.year,
    };

    let created = payment::insert(&state.pool, new).await?;
    tracing::info!(payment = %created.id, tenant = %tenant.id, "payment intent created");

    Ok(Json(json!({
        "clientSecret": intent.client_secret,
        "payment": created,
    })))
}

/// GET /payments - the caller's payment history
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let payments = payment::list_for(&state.pool, caller.id, caller.role).await?;
    Ok(Json(json!({ "payments": payments })))
}

/// POST /payments/webhook - processor-reported settlement
///
/// The signature is checked before anything touches the database. After
/// that, the processor always gets its acknowledgment: a failed local
/// update is logged and swallowed so the processor does not retry forever
/// against a persistent fault.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let cfg = &config::config().stripe;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    stripe::verify_webhook_signature(
        body.as_bytes(),
        signature,
        &cfg.webhook_secret,
        cfg.webhook_tolerance_secs,
        Utc::now().timestamp(),
    )
    .map_err(|e| ApiError::validation(format!("Webhook signature verification failed: {e}")))?;

    let event: Value = serde_json::from_str(&body)
        .map_err(|_| ApiError::validation("Webhook payload is not valid JSON"))?;

    if event["type"] == "payment_intent.succeeded" {
        match event["data"]["object"]["id"].as_str() {
            Some(intent_id) => match payment::mark_completed(&state.pool, intent_id).await {
                Ok(0) => {
                    tracing::warn!(intent = intent_id, "settlement reported for unknown payment intent");
                }
                Ok(_) => {
                    tracing::info!(intent = intent_id, "payment marked completed");
                }
                Err(e) => {
                    tracing::error!(intent = intent_id, error = %e, "failed to reconcile completed payment");
                }
            },
            None => {
                tracing::warn!("settlement event without a payment intent id");
            }
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// Rent for a month is due on the first of that month.
fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_is_first_of_month() {
        assert_eq!(
            first_of_month(2025, 7),
            NaiveDate::from_ymd_opt(2025, 7, 1)
        );
    }

    #[test]
    fn out_of_range_months_rejected() {
        assert!(first_of_month(2025, 0).is_none());
        assert!(first_of_month(2025, 13).is_none());
    }
}
