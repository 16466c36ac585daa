use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use widgetry_api::background::session_cleanup;
use widgetry_api::config::ServerConfig;
use widgetry_api::router::build_app_router;
use widgetry_api::state::AppState;
use widgetry_events::{EmailConfig, EmailDelivery, SheetWriter, TaskQueue, TaskRunner};
use widgetry_google::SheetsClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "widgetry_api=debug,widgetry_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        google = config.google.is_some(),
        recaptcha = config.recaptcha_secret.is_some(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = widgetry_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    widgetry_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    widgetry_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .expect("Failed to create MEDIA_ROOT directory");

    // --- App state ---
    let http = reqwest::Client::new();
    let (tasks, task_receiver) = TaskQueue::new(config.task_queue_capacity);
    let state = AppState::new(pool.clone(), config.clone(), tasks, http.clone());

    // --- Task runner ---
    let email = EmailConfig::from_env().and_then(|email_config| {
        EmailDelivery::new(email_config)
            .inspect_err(|e| tracing::error!(error = %e, "SMTP transport setup failed, emails disabled"))
            .ok()
    });
    if email.is_none() {
        tracing::warn!("SMTP not configured, outgoing emails will be logged and dropped");
    }
    let sheets = SheetWriter::new(pool.clone(), state.credentials.clone(), SheetsClient::new(http));

    let runner_cancel = CancellationToken::new();
    let runner_handle = tokio::spawn(
        TaskRunner::new(task_receiver, email, sheets).run(runner_cancel.clone()),
    );

    // --- Session cleanup ---
    let cleanup_cancel = CancellationToken::new();
    let cleanup_handle = tokio::spawn(session_cleanup::run(pool, cleanup_cancel.clone()));

    tracing::info!("Background services started (task runner, session cleanup)");

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cleanup_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;
    tracing::info!("Session cleanup stopped");

    // The router owned the last queue handle, so the runner drains what
    // is left and exits on its own.
    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain_timeout, runner_handle).await.is_err() {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Task queue did not drain in time, dropping remaining tasks"
        );
        runner_cancel.cancel();
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
