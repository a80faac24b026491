use std::net::SocketAddr;
use std::sync::Arc;

use storefront_api::config::ServerConfig;
use storefront_api::router::build_app_router;
use storefront_api::state::AppState;
use storefront_db::DbPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "storefront_api=debug,storefront_db=debug,storefront_cloud=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let pool = connect_database(&config).await;

    let storage = storefront_cloud::build_storage(&config.storage)
        .await
        .expect("Failed to initialise object storage");
    tracing::info!(
        backend = ?config.storage.backend,
        workers = config.storage.workers,
        "Object storage ready"
    );

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        storage,
    };
    serve(build_app_router(state, &config), &config).await;

    pool.close().await;
    tracing::info!("Database pool closed, shutdown complete");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, verify with `SELECT 1`, then apply pending migrations.
async fn connect_database(config: &ServerConfig) -> DbPool {
    let pool = storefront_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    storefront_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    storefront_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!(max_connections = config.db_max_connections, "Database ready");
    pool
}

/// Serve until SIGINT or SIGTERM, letting in-flight requests finish.
async fn serve(app: axum::Router, config: &ServerConfig) {
    let ip = config.host.parse().expect("Invalid HOST address");
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("SIGINT received, draining"),
        () = terminate => tracing::info!("SIGTERM received, draining"),
    }
}
