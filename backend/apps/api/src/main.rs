//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; application-level errors go
//! through `kernel::error::AppError`.

use auth::PgStore;
use auth::config::{AuthConfig, Environment, ProviderConfig};
use axum::http;
use axum::http::{Method, header};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Auth configuration
    let config = auth_config_from_env();

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    // Router assembly
    let app = auth::api_router(PgStore::new(pool), config)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let addr: SocketAddr = bind_addr.parse()?;

    tracing::info!(%addr, "API server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the auth configuration from environment variables.
fn auth_config_from_env() -> AuthConfig {
    let mut config = match env::var("APP_ENV").as_deref() {
        Ok("test") => AuthConfig::test(),
        _ => AuthConfig::default(),
    };

    let defaults = ProviderConfig::default();
    config.provider = ProviderConfig {
        client_url: env::var("OAUTH_CLIENT_URL").unwrap_or(defaults.client_url),
        authorize_url: env::var("OAUTH_AUTHORIZE_URL").unwrap_or(defaults.authorize_url),
        token_url: env::var("OAUTH_TOKEN_URL").unwrap_or(defaults.token_url),
        introspect_url: env::var("OAUTH_INTROSPECT_URL").unwrap_or(defaults.introspect_url),
    };

    if config.environment == Environment::Test {
        tracing::warn!("running with test configuration: hard deletes and 2FA bypass enabled");
    }

    config
}
