//! LaunchHerald notification API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_common::db::create_pool;
use herald_common::redis_pool::create_redis_pool;
use herald_notifier::queue::EmailQueue;

use herald_api::routes::create_router;
use herald_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("herald_api=debug,herald_notifier=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting LaunchHerald notification API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Outbound queue: only connect to Redis when sending is enabled,
    // otherwise tasks are logged (dry run).
    let queue = if config.send_email {
        let redis = create_redis_pool(&config.redis_url).await?;
        EmailQueue::new(redis, config.outbound_email_queue.clone())
    } else {
        tracing::info!("SEND_EMAIL disabled; outbound email tasks will be logged only");
        EmailQueue::dry_run()
    };

    // Build application state
    let state = AppState::new(pool, queue, config);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
