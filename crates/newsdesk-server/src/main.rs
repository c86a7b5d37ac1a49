mod api;
mod middleware;
mod scheduler;
mod shutdown;

use std::sync::Arc;

use newsdesk_scraper::{Collector, CollectorSettings, SourceClient};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::ShutdownAuth,
    shutdown::ShutdownHandle,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = newsdesk_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if config.env == newsdesk_core::Environment::Production && config.shutdown_token.is_none() {
        tracing::warn!("NEWSDESK_SHUTDOWN_TOKEN not set; POST /shutdown will always be refused");
    }

    let pool_config = newsdesk_db::PoolConfig::from_app_config(&config);
    let pool = newsdesk_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = newsdesk_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations complete");

    let client = SourceClient::from_app_config(&config)?;
    let collector = Arc::new(Collector::new(
        client,
        pool.clone(),
        CollectorSettings::from_app_config(&config),
    ));

    let first_run = Arc::clone(&collector);
    tokio::spawn(async move {
        scheduler::run_scheduled_collection(&first_run).await;
    });

    let mut scheduler =
        scheduler::build_scheduler(Arc::clone(&collector), config.run_interval_minutes).await?;

    let shutdown = ShutdownHandle::new();
    let auth = ShutdownAuth::new(config.shutdown_token.clone());
    let app = build_app(
        AppState {
            pool,
            shutdown: shutdown.clone(),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "newsdesk-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    scheduler.shutdown().await?;
    tracing::info!(
        via_http = shutdown.is_triggered(),
        "scheduler stopped; exiting"
    );
    Ok(())
}

async fn shutdown_signal(handle: ShutdownHandle) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
        () = handle.requested() => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
