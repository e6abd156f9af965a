// Payment processor client and webhook signature verification.
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use super::GatewayError;
use crate::config;

type HmacSha256 = Hmac<Sha256>;

/// An authorized-but-not-yet-settled charge, as the processor reports it.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount_minor` minor currency units.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent, GatewayError>;
}

pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn from_config() -> Self {
        let cfg = &config::config().stripe;
        Self::new(cfg.api_base.clone(), cfg.secret_key.clone())
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent, GatewayError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_string()),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("Payment intent creation failed")
                .to_string();
            tracing::warn!(%status, "payment processor rejected intent creation: {}", message);
            return Err(GatewayError::Api(message));
        }

        #[derive(Deserialize)]
        struct IntentResponse {
            id: String,
            client_secret: String,
        }

        let intent: IntentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing or malformed signature header")]
    Malformed,
    #[error("timestamp outside tolerance")]
    StaleTimestamp,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a `t=<unix>,v1=<hex>` webhook signature header against the raw
/// request payload. The signed message is `"{t}.{payload}"`, MACed with
/// HMAC-SHA256 under the shared webhook secret. Unknown schemes in the
/// header are ignored; any one matching `v1` candidate passes.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value.parse().map_err(|_| SignatureError::Malformed)?),
            "v1" => candidates.push(hex::decode(value).map_err(|_| SignatureError::Malformed)?),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::StaleTimestamp);
    }

    for candidate in &candidates {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::Malformed)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(candidate).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::Mismatch)
}

/// Produce a signature header for `payload` the way the processor would.
/// Used by the test suite and local webhook tooling.
pub fn sign_webhook_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn signed_payload_verifies() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign_webhook_payload(payload, SECRET, NOW);
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 300, NOW),
            Ok(())
        );
    }

    #[test]
    fn tampered_payload_rejected() {
        let header = sign_webhook_payload(b"original", SECRET, NOW);
        assert_eq!(
            verify_webhook_signature(b"tampered", &header, SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn wrong_secret_rejected() {
        let header = sign_webhook_payload(b"payload", SECRET, NOW);
        assert_eq!(
            verify_webhook_signature(b"payload", &header, "whsec_other", 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_timestamp_rejected() {
        let header = sign_webhook_payload(b"payload", SECRET, NOW - 301);
        assert_eq!(
            verify_webhook_signature(b"payload", &header, SECRET, 300, NOW),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn malformed_headers_rejected() {
        for header in ["", "v1=deadbeef", "t=123", "t=abc,v1=deadbeef", "t=123,v1=nothex"] {
            assert_eq!(
                verify_webhook_signature(b"payload", header, SECRET, 300, NOW),
                Err(SignatureError::Malformed),
                "header {header:?} should be malformed"
            );
        }
    }

    #[test]
    fn extra_schemes_ignored() {
        let payload = b"payload";
        let valid = sign_webhook_payload(payload, SECRET, NOW);
        let header = format!("{valid},v0=00ff");
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 300, NOW),
            Ok(())
        );
    }
}
