pub mod cloudinary;
pub mod stripe;

use thiserror::Error;

/// Failure talking to an external collaborator. `Api` carries the upstream's
/// own error text, which is safe to surface to clients.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Api(String),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected upstream response: {0}")]
    InvalidResponse(String),
}
