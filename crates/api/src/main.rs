use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use runlet_core::scripting::python::PythonExecutor;
use runlet_core::scripting::runner::ScriptRunner;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use runlet_api::auth::bootstrap::ensure_admin;
use runlet_api::config::ServerConfig;
use runlet_api::engine::dispatcher::Dispatcher;
use runlet_api::router::build_app_router;
use runlet_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "runlet_api=debug,runlet_core=info,runlet_db=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        workers = config.worker_pool.workers,
        queue_capacity = config.worker_pool.queue_capacity,
        script_timeout_secs = config.script_timeout_secs,
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = runlet_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    runlet_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    runlet_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    ensure_admin(&pool, &config.admin_username, &config.admin_password)
        .await
        .context("Failed to seed admin account")?;

    // --- Execution engine ---
    Dispatcher::fail_abandoned(&pool)
        .await
        .context("Failed to close out abandoned executions")?;

    let runner = ScriptRunner::new(PythonExecutor::new(config.python_interpreter.clone()));
    let dispatcher = Arc::new(
        Dispatcher::start(
            pool.clone(),
            config.worker_pool,
            runner,
            config.script_timeout(),
        )
        .context("Failed to start worker pool")?,
    );

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        dispatcher: Arc::clone(&dispatcher),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, static_dir = %config.static_dir.display(), "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining worker pool");
    dispatcher.shutdown(config.shutdown_grace()).await;

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
