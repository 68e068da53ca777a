//! paypal-relay server binary.
//!
//! Loads configuration, connects storage, wires the adapters into the proxy
//! router, and serves.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use paypal_relay::adapters::http::proxy::{proxy_router, ProxyAppState};
use paypal_relay::adapters::notifier::HttpCallbackNotifier;
use paypal_relay::adapters::order_context::RedisOrderContextStore;
use paypal_relay::adapters::paypal::{PaypalGateway, PaypalGatewayConfig};
use paypal_relay::adapters::postgres::{PostgresSiteRepository, PostgresTransactionLedger};
use paypal_relay::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        paypal_environment = %config.paypal.environment,
        "starting paypal-relay"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let redis_client = redis::Client::open(config.redis.url.clone())?;
    let redis_conn = redis_client.get_multiplexed_tokio_connection().await?;

    let mut gateway_config = PaypalGatewayConfig::new(
        config.paypal.client_id.clone(),
        config.paypal.client_secret.clone(),
        config.paypal.parsed_environment()?,
    );
    if let Some(webhook_id) = &config.paypal.webhook_id {
        gateway_config = gateway_config.with_webhook_id(webhook_id.clone());
    }

    let verify_webhook_signatures = config.paypal.webhook_verification_enabled();
    if !verify_webhook_signatures {
        tracing::warn!(
            "no PayPal webhook_id configured; inbound webhooks will not be verified"
        );
    }

    let state = ProxyAppState {
        sites: Arc::new(PostgresSiteRepository::new(pool.clone())),
        ledger: Arc::new(PostgresTransactionLedger::new(pool.clone())),
        contexts: Arc::new(RedisOrderContextStore::new(redis_conn)),
        gateway: Arc::new(PaypalGateway::new(gateway_config)),
        notifier: Arc::new(HttpCallbackNotifier::new()),
        verify_webhook_signatures,
    };

    let cors = match config.server.cors_origins_list().as_slice() {
        [] => CorsLayer::permissive(),
        origins => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new().allow_origin(origins)
        }
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .nest("/proxy/v1", proxy_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
