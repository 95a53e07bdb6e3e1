//! Application state

use sqlx::PgPool;
use std::time::Duration;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::live::ConsoleHub;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for admin sessions
    pub jwt_secret: String,
    /// Argon2 hash of the back-office password
    pub admin_password_hash: String,
    /// Rate limiter for the login route
    pub rate_limiter: RateLimiter,
    /// Admin console fan-out + session tracking
    pub console: ConsoleHub,
    /// Order watcher poll period (echoed to consoles)
    pub order_poll_interval: Duration,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::with_pool(pool, config))
    }

    pub fn with_pool(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            admin_password_hash: config.admin_password_hash.clone(),
            rate_limiter: RateLimiter::new(),
            console: ConsoleHub::new(),
            order_poll_interval: config.order_poll_interval,
        }
    }
}
