use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{build_router, AppState};
use clearwater_core::config;
use clearwater_core::{NotificationDispatcher, NotificationQueue, ResendMailer, ReferralStore};

/// Main entry point for the Clearwater referral backend
///
/// Loads configuration from the environment, opens the SQLite store, starts
/// the background notification worker and serves the REST API.
///
/// # Environment Variables
/// - `CLEARWATER_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `CLEARWATER_DB_PATH`: Path to the SQLite database file
/// - `RESEND_API_KEY`: API key for the outbound email provider
/// - `EMAIL_FROM`: Sender address for outgoing notifications
/// - `EMAIL_TO_TEST`: Optional internal recipient copied on no-show notices
/// - `RESEND_API_BASE`: Optional override of the email provider base URL
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration or startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clearwater_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load_from_env()?;
    let rest_addr =
        std::env::var("CLEARWATER_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());

    let store = Arc::new(ReferralStore::open(cfg.database_path())?);
    let mailer = Arc::new(ResendMailer::new(&cfg));
    let queue = NotificationQueue::start(mailer);
    let dispatcher = Arc::new(NotificationDispatcher::new(
        store.clone(),
        queue,
        cfg.internal_recipient().map(str::to_string),
    ));

    let app = build_router(AppState { store, dispatcher });

    tracing::info!("++ Starting Clearwater REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
