//! AutoSure Core - API Server Binary
//!
//! Starts the HTTP API server for the claims platform.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin autosure-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8000 API_DATABASE_URL=postgres://... cargo run --bin autosure-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8000)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 86400)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_REDIS_URL` - Redis URL for the response cache (optional)
//! * `API_SCORING_URL` - Damage scoring service URL (optional; heuristic fallback)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_accidents::adapters::{HttpDamagePredictor, ScoringServiceConfig};
use domain_accidents::prediction::HeuristicPredictor;
use domain_accidents::DamagePredictor;
use infra_cache::{CacheConfig, ResponseCache};
use infra_db::{create_pool, DatabaseConfig};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, establishes database and cache
/// connections, and starts the HTTP server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting AutoSure Core API Server"
    );

    // Database
    let pool = create_pool(DatabaseConfig::new(config.database_url.clone())).await?;
    verify_database(&pool).await?;

    // Response cache; missing Redis degrades to disabled, not to failure
    let cache = ResponseCache::connect(CacheConfig {
        redis_url: config.redis_url.clone(),
        ..Default::default()
    })
    .await?;

    // Damage predictor: the scoring service when configured, else heuristic
    let predictor: Arc<dyn DamagePredictor> = match &config.scoring_url {
        Some(url) => Arc::new(HttpDamagePredictor::new(ScoringServiceConfig {
            base_url: url.clone(),
            ..Default::default()
        })?),
        None => {
            tracing::warn!("API_SCORING_URL not set, using heuristic damage predictor");
            Arc::new(HeuristicPredictor)
        }
    };

    let state = AppState::new(pool, config.clone(), cache, predictor);
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables.
///
/// Falls back to default values if environment variables are not set.
fn load_config() -> Result<ApiConfig, Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env().unwrap_or_else(|_| ApiConfig {
        host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        port: std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000),
        jwt_secret: std::env::var("API_JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production".to_string()),
        jwt_expiration_secs: std::env::var("API_JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400),
        database_url: std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("API_DATABASE_URL"))
            .unwrap_or_else(|_| "postgres://localhost/autosure".to_string()),
        redis_url: std::env::var("API_REDIS_URL")
            .or_else(|_| std::env::var("REDIS_URL"))
            .ok(),
        scoring_url: std::env::var("API_SCORING_URL").ok(),
        log_level: std::env::var("API_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string()),
    });

    Ok(config)
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Verifies database connectivity with a simple query before serving.
async fn verify_database(pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Verifying database connectivity...");
    sqlx::query("SELECT 1").execute(pool).await?;
    tracing::info!("Database ready");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// This enables graceful shutdown of the server, allowing in-flight
/// requests to complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
