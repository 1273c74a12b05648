//! Storage bootstrap for the `sso_setting` table.
//!
//! The binary calls [`init_pool`], then [`migrate`], then [`health_check`]
//! before it resolves any provider settings.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

/// Attempts made by [`init_pool`] before giving up.
const CONNECT_ATTEMPTS: u32 = 5;

/// Failures while opening the settings database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: sea_orm::DbErr,
    },
    #[error("Database connection timeout after {timeout_ms}ms")]
    ConnectionTimeout { timeout_ms: u64 },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Opens the pool backing [`SsoSettingsRepository`](crate::repositories::SsoSettingsRepository).
///
/// `SSO_SETTINGS_DATABASE_URL` selects Postgres or SQLite. The pool size and
/// acquire timeout come from `DB_MAX_CONNECTIONS` and `DB_ACQUIRE_TIMEOUT_MS`.
/// Only this startup connect is retried, doubling the pause between
/// attempts; store calls made while resolving settings fail straight away.
///
/// ```no_run
/// use ssosettings::{config::AppConfig, db};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::default();
///     let conn = db::init_pool(&config).await?;
///     db::migrate(&conn).await?;
///     db::health_check(&conn).await?;
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }

    let mut opt = ConnectOptions::new(&cfg.database_url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let mut retry_delay = Duration::from_millis(100);

    for attempt in 1..=CONNECT_ATTEMPTS {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                log::info!("Connected to settings database (attempt {})", attempt);
                return Ok(conn);
            }
            Err(e) => {
                if attempt == CONNECT_ATTEMPTS {
                    log::error!(
                        "Giving up on settings database after {} attempts: {}",
                        CONNECT_ATTEMPTS,
                        e
                    );
                    return Err(DatabaseError::ConnectionFailed { source: e }.into());
                }

                log::warn!(
                    "Settings database connect attempt {} failed: {}, retrying in {:?}",
                    attempt,
                    e,
                    retry_delay
                );

                sleep(retry_delay).await;
                retry_delay *= 2;
            }
        }
    }

    Err(DatabaseError::ConnectionTimeout {
        timeout_ms: cfg.db_acquire_timeout_ms,
    }
    .into())
}

/// Creates or upgrades the `sso_setting` table and its provider index.
pub async fn migrate(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .context("Failed to apply database migrations")?;
    log::debug!("Database schema is up to date");
    Ok(())
}

/// Round-trips `SELECT 1` so a broken pool is reported before the first lookup.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    use sea_orm::Statement;

    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}
