//! Entry point: load config, wire dependencies, run the chat stream and the API.

use kick_points::config::Config;
use kick_points::db;
use kick_points::stream::{install_crypto_provider, run_supervised, shutdown_channel, StreamRunner};
use kick_points::{create_app, AppState, PgPointsLedger, PointsLedger};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    install_crypto_provider();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;
    let ledger: Arc<dyn PointsLedger> = Arc::new(PgPointsLedger::new(db_pool));

    let (stop_stream, stream_signal) = shutdown_channel();
    let runner = StreamRunner::new(config.stream.clone(), ledger.clone());
    let stream_task = tokio::spawn(run_supervised(runner, stream_signal));

    let app = create_app(AppState::new(config.api_key.clone(), ledger));

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_requested())
        .await?;

    tracing::info!("http server stopped, closing chat stream");
    stop_stream.raise();
    match stream_task.await {
        Ok(exit) => tracing::info!(reason = %exit, "chat stream finished"),
        Err(e) => tracing::warn!(error = %e, "chat stream task failed"),
    }
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_requested() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down gracefully");
}
