use anyhow::Context;
use showyourself::{AppState, app, config::Config, db};
use tokio::{net::TcpListener, signal::ctrl_c};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    if config.admin_password.is_none() {
        warn!("ADMIN_PASSWORD is not set, the admin panel cannot be used");
    }

    let db_pool = db::connect(&config).await?;
    let state = AppState::new(db_pool, config);
    state
        .photos
        .ensure_dir()
        .await
        .with_context(|| format!("creating {}", state.photos.dir().display()))?;

    let address = state.config.bind_addr.clone();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding to {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
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
}
