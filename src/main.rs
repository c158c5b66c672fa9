use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kanban_views::api::{create_router, AppState};
use kanban_views::config::Config;
use kanban_views::infrastructure::{db, SettingsCache};
use kanban_views::services::SettingsService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,kanban_views=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kanban Views v{}...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env, using defaults: {}", e);
        Config::default()
    });

    let db_pool = match db::init_db(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database initialized successfully");
            Some(pool)
        }
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            None
        }
    };

    let (sse_tx, _rx) = broadcast::channel::<String>(100);
    let http_client = reqwest::Client::new();
    let settings_cache = SettingsCache::new();

    let sync_service = db_pool
        .clone()
        .map(|pool| SettingsService::new(pool, settings_cache.clone()));

    if let Some(service) = sync_service.clone() {
        let interval = config.settings_sync_interval();
        tokio::spawn(async move {
            tracing::info!(?interval, "User settings sync started");
            service.run_sync_loop(interval).await;
        });
    } else {
        tracing::warn!("User settings sync not started: database unavailable");
    }

    let config = Arc::new(config);
    let state = AppState::new(
        db_pool,
        sse_tx,
        http_client,
        Arc::clone(&config),
        settings_cache,
    );

    let app = create_router(state, &config);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Kanban Views listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(service) = sync_service {
        match service.sync_all().await {
            Ok(count) => tracing::info!(count, "Flushed user settings before exit"),
            Err(e) => tracing::warn!("Final user settings sync failed: {}", e),
        }
    }

    tracing::info!("Kanban Views shut down gracefully");
    Ok(())
}

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
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
