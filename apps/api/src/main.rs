use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use booking_cell::store::{BookingStore, MemoryStore, PgStore, ReminderRepository};
use booking_cell::BookingState;
use reminder_cell::{ReminderScheduler, TracingSender};
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting salon booking API server");

    let config = AppConfig::from_env();

    let (store, reminders): (Arc<dyn BookingStore>, Arc<dyn ReminderRepository>) = if config.uses_database() {
        let pool = shared_database::connect(&config).await?;
        shared_database::run_migrations(&pool).await?;
        let store = PgStore::new(pool);
        (Arc::new(store.clone()), Arc::new(store))
    } else {
        info!("Using the in-memory store; data is lost on restart");
        let store = MemoryStore::new();
        (Arc::new(store.clone()), Arc::new(store))
    };

    if config.scheduler_enabled {
        ReminderScheduler::new(reminders, Arc::new(TracingSender), &config).spawn();
    }

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = BookingState::new(store, &config);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
