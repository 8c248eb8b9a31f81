mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use sladash_prober::{Checker, RandomFallback};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, TriggerLimit},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(sladash_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = sladash_db::connect(&config).await?;
    let applied = sladash_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let checker = Arc::new(Checker::from_app_config(&config, Arc::new(RandomFallback))?);

    let _scheduler =
        scheduler::build_scheduler(Arc::clone(&checker), pool.clone(), Arc::clone(&config))
            .await?;

    let auth = AuthState::from_config(&config)?;
    let auth_enabled = auth.enabled();
    let app = build_app(
        AppState { pool, checker },
        auth,
        TriggerLimit::from_config(&config),
    );

    tracing::info!(
        addr = %config.bind_addr,
        auth = auth_enabled,
        "sladash-server listening"
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
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
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
