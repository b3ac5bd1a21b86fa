//! Connection pool, embedded migrations, and first-run database bootstrap.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/buildify-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Name reported in `pg_stat_activity` for buildify connections.
const APPLICATION_NAME: &str = "buildify";

/// Connections held by the API server. A project save holds one for the
/// whole of its logo transaction.
const MAX_CONNECTIONS: u32 = 10;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

fn connect_options(config: &DbConfig) -> Result<PgConnectOptions> {
    let options = PgConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid database URL {}", config.redacted_url()))?;
    Ok(options.application_name(APPLICATION_NAME))
}

/// Open the server's connection pool.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let options = connect_options(config)?;
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.redacted_url()))
}

/// Apply any embedded migrations the database has not seen yet.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!(known = MIGRATOR.iter().count(), "database schema is current");
    Ok(())
}

/// Quote a PostgreSQL identifier for statements that take no bind
/// parameters, such as `CREATE DATABASE`.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create the configured database when it does not exist yet. Returns
/// `true` if it was created.
///
/// The check and the `CREATE DATABASE` run over a single connection to the
/// server's `postgres` maintenance database.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let target = connect_options(config)?;
    let db_name = target
        .get_database()
        .filter(|name| !name.is_empty())
        .context("database URL does not name a database")?
        .to_owned();

    let mut conn = target
        .database("postgres")
        .connect()
        .await
        .with_context(|| {
            format!(
                "failed to connect to the postgres maintenance database via {}",
                config.redacted_url()
            )
        })?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await
            .context("failed to query pg_database")?;

    if !exists {
        conn.execute(format!("CREATE DATABASE {}", quote_ident(&db_name)).as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(db = %db_name, "database created");
    }

    conn.close().await.context("failed to close maintenance connection")?;
    Ok(!exists)
}

/// Row counts of the buildify tables, printed by `buildify db-init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inventory {
    pub users: i64,
    pub projects: i64,
    pub image_blobs: i64,
}

/// Count the rows of every buildify table in one round trip.
pub async fn inventory(pool: &PgPool) -> Result<Inventory> {
    let (users, projects, image_blobs): (i64, i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM users), \
                (SELECT COUNT(*) FROM projects), \
                (SELECT COUNT(*) FROM image_blobs)",
    )
    .fetch_one(pool)
    .await
    .context("failed to count rows")?;

    Ok(Inventory {
        users,
        projects,
        image_blobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_wraps_and_escapes() {
        assert_eq!(quote_ident("buildify"), "\"buildify\"");
        assert_eq!(quote_ident("build-ify"), "\"build-ify\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn connect_options_keep_database_name() {
        let cfg = DbConfig::new("postgresql://app:pw@db:5432/buildify?sslmode=disable");
        let options = connect_options(&cfg).unwrap();
        assert_eq!(options.get_database(), Some("buildify"));
    }

    #[test]
    fn connect_options_reject_garbage() {
        let err = connect_options(&DbConfig::new("not a url")).unwrap_err();
        assert!(err.to_string().contains("invalid database URL"));
    }
}
