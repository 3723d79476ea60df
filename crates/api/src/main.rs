use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questy_api::config::{DatabaseConfig, ServerConfig};
use questy_api::router::build_app_router;
use questy_api::state::AppState;
use questy_events::{EmailConfig, EmailDelivery, EventBus, EventLog, InvitationQueue, InviteTemplate};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

/// Install the global subscriber. `LOG_FORMAT=json` selects JSON output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "questy_api=debug,questy_db=debug,questy_events=debug,tower_http=debug".into()
    });
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run() -> Result<(), BoxError> {
    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = questy_db::create_pool(&db_config.url, db_config.max_connections).await?;
    tracing::info!("Database connection pool created");

    questy_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    questy_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let event_log_handle = tokio::spawn(EventLog::run(event_bus.subscribe()));

    // --- Invitation queue ---
    let cancel = CancellationToken::new();
    let (invitations, invitation_handle) = start_invitations(&config, cancel.clone())?;

    // --- App state & router ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        invitations,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    cancel.cancel();
    if let Some(handle) = invitation_handle {
        if tokio::time::timeout(drain_timeout, handle).await.is_err() {
            tracing::warn!("Invitation queue did not drain before the shutdown timeout");
        }
    }

    // Dropping the last sender closes the broadcast channel.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), event_log_handle).await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Start the invitation worker when mailing is enabled and SMTP is configured.
fn start_invitations(
    config: &ServerConfig,
    cancel: CancellationToken,
) -> Result<(Option<InvitationQueue>, Option<tokio::task::JoinHandle<()>>), BoxError> {
    if !config.mailing_enabled {
        tracing::info!("Mailing disabled, invitations will not be emailed");
        return Ok((None, None));
    }
    let Some(email_config) = EmailConfig::from_env() else {
        tracing::warn!("MAILING_ENABLED is set but SMTP_HOST is not, invitations will not be emailed");
        return Ok((None, None));
    };

    let sender = Arc::new(EmailDelivery::new(email_config)?);
    let template = InviteTemplate::new(
        config.public_url.clone(),
        config.invitation_image_url.clone(),
    )?;
    let (queue, handle) =
        InvitationQueue::start(sender, template, config.invitation_queue.clone(), cancel);
    Ok((Some(queue), Some(handle)))
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
