//! HTTP server lifecycle: bind, serve, shut down.

use std::future::Future;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::{self, AppState};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Open storage, bind the configured address and serve until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if storage cannot be opened, the address cannot be bound,
/// or the server fails while running.
pub async fn run(config: Config) -> Result<()> {
    let storage = Storage::open(config.database_path())?;

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(address = %listener.local_addr()?, "Listening for HTTP requests");

    serve(listener, AppState::new(storage, config), shutdown_signal()).await
}

/// Serve the application on an already-bound listener until `shutdown` resolves.
///
/// In-flight requests are allowed to finish once shutdown starts.
///
/// # Errors
///
/// Returns an error if accepting connections fails.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
