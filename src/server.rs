use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::AppState;
use crate::api::routes::{create_json_rpc_router, create_router};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::probe::{PROBE_TIMEOUT, PortState, probe_port};
use crate::servicer::Servicer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// The server was bound and has since stopped.
    Served,
    /// The address was not free; nothing was bound.
    Skipped(PortState),
}

/// Starts every configured service and waits for all of them to stop.
pub async fn run(config: Config) -> Result<()> {
    let servicer = Arc::new(Servicer::from_config(&config)?);
    let state = AppState::new(servicer, config.max_workers);
    tracing::info!(
        max_workers = config.max_workers,
        max_lifetime = ?config.max_lifetime,
        user_agent = %state.servicer.config().user_agent,
        "servicer ready"
    );

    let caterpillar = bootstrap(
        "caterpillar",
        config.caterpillar_addr,
        create_router(state.clone()),
        config.max_lifetime,
    );

    match config.newspaper_addr {
        Some(addr) => {
            let newspaper = bootstrap(
                "newspaper",
                addr,
                create_json_rpc_router(state),
                config.max_lifetime,
            );
            let (caterpillar, newspaper) = tokio::join!(caterpillar, newspaper);
            caterpillar?;
            newspaper?;
        }
        None => {
            caterpillar.await?;
        }
    }
    Ok(())
}

/// Probes `addr` and serves `router` on it only when nothing is listening there.
pub async fn bootstrap(
    name: &'static str,
    addr: SocketAddr,
    router: Router,
    max_lifetime: Duration,
) -> Result<Bootstrap> {
    let state = probe_port(addr, PROBE_TIMEOUT).await;
    if !state.is_free() {
        let err = AppError::BindConflict(addr);
        tracing::warn!(service = name, ?state, error = %err, "service not started");
        return Ok(Bootstrap::Skipped(state));
    }

    let listener = TcpListener::bind(addr).await?;
    serve(name, listener, router, shutdown_signal(max_lifetime)).await?;
    Ok(Bootstrap::Served)
}

/// Serves until `shutdown` resolves, then lets in-flight calls finish.
pub async fn serve<F>(name: &'static str, listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(service = name, %addr, "server starting");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!(service = name, %addr, "server stopping");
    Ok(())
}

/// Resolves on Ctrl-C, SIGTERM, or once `max_lifetime` has passed.
pub async fn shutdown_signal(max_lifetime: Duration) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("interrupt received"),
        _ = terminate => tracing::info!("terminate received"),
        _ = tokio::time::sleep(max_lifetime) => tracing::info!(?max_lifetime, "maximum lifetime reached"),
    }
}
