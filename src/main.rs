use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eukexpress::{
    app, config,
    config::Settings,
    db,
    middleware::rate_limit,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing or malformed settings abort here, before anything is served
    let settings = Settings::load()?;

    // Keep the guards alive so the non-blocking writers flush on exit
    let _log_guards = init_tracing(&settings);
    info!(env = %settings.app_env, debug = settings.app_debug, "Configuration loaded");

    config::ensure_sqlite_parent_dir(&settings.database_url)?;
    let pool = db::connect_lazy(&settings).context("invalid DATABASE_URL")?;
    let state = AppState::new(pool, settings);

    app::ensure_upload_dirs(&state.settings).context("failed to prepare upload directories")?;
    app::startup(&state).await;

    tokio::spawn(rate_limit::cleanup_task(state.rate_limiter.clone(), Duration::from_secs(300)));

    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind((app::LISTEN_HOST, app::LISTEN_PORT)).await?;
    info!("{} listening on http://{}", app::APP_TITLE, listener.local_addr()?);

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app::shutdown();
    Ok(())
}

/// Logs to stdout and to `LOG_FILE`. `RUST_LOG` overrides `LOG_LEVEL`.
fn init_tracing(settings: &Settings) -> (WorkerGuard, WorkerGuard) {
    let log_dir = settings
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = settings.log_file.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "app.log".into());

    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| settings.log_directive().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stdout_nb))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .init();
    (stdout_guard, file_guard)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received. Stopping server...");
}
