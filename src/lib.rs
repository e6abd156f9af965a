pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::cloudinary::ImageStore;
use crate::services::stripe::PaymentGateway;

/// Shared per-process state handed to every handler.
///
/// The pool is an explicit dependency rather than a process global; external
/// collaborators sit behind trait objects so tests can swap them out.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub payments: Arc<dyn PaymentGateway>,
    pub images: Arc<dyn ImageStore>,
}
