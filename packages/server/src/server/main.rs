// Main entry point for the referral portal API server

use std::sync::Arc;

use anyhow::{Context, Result};
use referral_core::domains::auth::JwtService;
use referral_core::kernel::scheduled_tasks::start_scheduler;
use referral_core::kernel::{
    BaseSmsSender, MemoryStore, PgStore, ServerDeps, SystemClock, TwilioAdapter,
};
use referral_core::server::{build_app, middleware::with_rate_limit};
use referral_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twilio::{TwilioOptions, TwilioService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,referral_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting referral portal API");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let twilio = Arc::new(TwilioService::new(TwilioOptions {
        account_sid: config.twilio_account_sid.clone(),
        auth_token: config.twilio_auth_token.clone(),
        from_number: config.twilio_from_number.clone(),
    }));
    let sms: Arc<dyn BaseSmsSender> = Arc::new(TwilioAdapter::new(twilio));
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let deps = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Migrations complete");

            ServerDeps::with_store(
                Arc::new(PgStore::new(pool)),
                sms,
                Arc::new(SystemClock),
                jwt_service,
                config.test_identifier_enabled,
                config.admin_identifiers.clone(),
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
            ServerDeps::with_store(
                Arc::new(MemoryStore::new()),
                sms,
                Arc::new(SystemClock),
                jwt_service,
                config.test_identifier_enabled,
                config.admin_identifiers.clone(),
            )
        }
    };

    // Kept alive for the life of the server
    let _scheduler = start_scheduler(deps.clone())
        .await
        .context("Failed to start scheduled tasks")?;

    let app = with_rate_limit(build_app(deps, &config.allowed_origins))?;

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
