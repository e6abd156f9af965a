use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use homelet_api::middleware::auth::{require_auth, require_owner, require_tenant};
use homelet_api::services::cloudinary::CloudinaryClient;
use homelet_api::services::stripe::StripeClient;
use homelet_api::{config, database, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting homelet API in {:?} mode", config.environment);

    let pool = database::connect()
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));
    database::migrate(&pool)
        .await
        .unwrap_or_else(|e| panic!("failed to run migrations: {}", e));

    let state = AppState {
        pool,
        payments: Arc::new(StripeClient::from_config()),
        images: Arc::new(CloudinaryClient::from_config()),
    };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("HOMELET_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Homelet API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Sessions and accounts
        .merge(auth_routes())
        // Listings
        .merge(property_routes(&state))
        // Rental applications
        .merge(request_routes(&state))
        // Rent payments
        .merge(payment_routes(&state))
        // Listing photos
        .merge(upload_routes(&state))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use homelet_api::handlers::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
}

fn property_routes(state: &AppState) -> Router<AppState> {
    use homelet_api::handlers::properties;

    // Browsing is public; managing listings is owners only
    let owner_only = Router::new()
        .route("/properties", post(properties::create))
        .route(
            "/properties/:id",
            put(properties::update).delete(properties::remove),
        )
        .route_layer(from_fn_with_state(state.clone(), require_owner));

    Router::new()
        .route("/properties", get(properties::list))
        .route("/properties/:id", get(properties::fetch))
        .merge(owner_only)
}

fn request_routes(state: &AppState) -> Router<AppState> {
    use homelet_api::handlers::requests;

    let any_account = Router::new()
        .route("/requests", get(requests::list))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let tenant_only = Router::new()
        .route("/requests", post(requests::create))
        .route_layer(from_fn_with_state(state.clone(), require_tenant));

    let owner_only = Router::new()
        .route("/requests/:id", put(requests::update))
        .route_layer(from_fn_with_state(state.clone(), require_owner));

    any_account.merge(tenant_only).merge(owner_only)
}

fn payment_routes(state: &AppState) -> Router<AppState> {
    use homelet_api::handlers::payments;

    let any_account = Router::new()
        .route("/payments", get(payments::list))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let tenant_only = Router::new()
        .route("/payments", post(payments::create))
        .route_layer(from_fn_with_state(state.clone(), require_tenant));

    // Authenticated by signature, not by session
    let webhook = Router::new().route("/payments/webhook", post(payments::webhook));

    any_account.merge(tenant_only).merge(webhook)
}

fn upload_routes(state: &AppState) -> Router<AppState> {
    use homelet_api::handlers::upload;

    Router::new()
        .route("/upload", post(upload::upload))
        .route_layer(from_fn_with_state(state.clone(), require_owner))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Homelet API",
        "version": version,
        "description": "Rental property management backend",
        "endpoints": {
            "auth": "/auth/register, /auth/login, /auth/logout, /auth/me",
            "properties": "/properties[/:id]",
            "requests": "/requests[/:id]",
            "payments": "/payments, /payments/webhook",
            "upload": "/upload",
            "health": "/health",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "error": "database unavailable",
                "databaseError": e.to_string()
            })),
        ),
    }
}
