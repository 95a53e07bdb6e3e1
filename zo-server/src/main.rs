//! zo-server: Les Ateliers Zo storefront and back-office service
//!
//! Long-running service that:
//! - Serves the storefront API (catalog, flash prices, cart quotes, checkout)
//! - Serves the back-office API (JWT authenticated)
//! - Pushes new-order announcements to connected admin consoles
//!
//! `zo-server hash-password <password>` prints an argon2 hash for
//! `ADMIN_PASSWORD_HASH` and exits.

mod api;
mod auth;
mod config;
mod db;
mod error;
mod live;
mod notifier;
mod state;
mod util;

use std::net::SocketAddr;
use std::time::Duration;

use config::Config;
use notifier::{ConsoleNotifier, OrderNotifier};
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Rate limiter entries older than this are dropped
const RATE_LIMIT_RETENTION: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("hash-password") {
        let password = args.next().ok_or("usage: zo-server hash-password <password>")?;
        println!("{}", util::hash_password(&password)?);
        return Ok(());
    }

    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zo_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting zo-server (env: {})", config.environment);
    if !util::is_password_hash(&config.admin_password_hash) {
        tracing::warn!(
            "ADMIN_PASSWORD_HASH is not an argon2 hash, admin login will fail. \
             Generate one with `zo-server hash-password <password>`."
        );
    }

    if !config.is_development() && config.cors_allowed_origin.is_none() {
        tracing::warn!("CORS_ALLOWED_ORIGIN is unset, any origin is accepted");
    }

    // Initialize application state (connects + migrates)
    let state = AppState::new(&config).await?;

    // Order notifier: polls only while an admin console is connected
    let order_notifier = OrderNotifier::new(
        state.pool.clone(),
        ConsoleNotifier::new(state.console.clone()),
    );
    let notifier_handle = tokio::spawn(
        order_notifier.run(state.console.watch_sessions(), state.order_poll_interval),
    );

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    let cleanup_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup(RATE_LIMIT_RETENTION).await;
        }
    });

    let app = api::create_router(state, config.cors_allowed_origin.as_deref());

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("zo-server HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    notifier_handle.abort();
    cleanup_handle.abort();
    tracing::info!("zo-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
