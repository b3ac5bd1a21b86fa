//! Shared PostgreSQL fixture for buildify database and HTTP tests.
//!
//! One server is shared by every test in a binary; each test gets its own
//! throwaway database with migrations applied.
//!
//! - With **`BUILDIFY_TEST_PG_URL`** set, that server is used as is (CI
//!   starts one container up front).
//! - Otherwise a `postgres:18` container is started through testcontainers
//!   on first use and kept alive for the rest of the process.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use buildify_db::models::User;
use buildify_db::pool;
use buildify_db::queries::users;

/// Environment variable naming an already-running server root URL.
pub const TEST_PG_URL_ENV: &str = "BUILDIFY_TEST_PG_URL";

struct SharedServer {
    root_url: String,
    /// Keeps the container running. `None` for an external server.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED: OnceCell<SharedServer> = OnceCell::const_new();

async fn start_shared_server() -> SharedServer {
    if let Ok(url) = std::env::var(TEST_PG_URL_ENV) {
        return SharedServer {
            root_url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("18")
        .start()
        .await
        .expect("failed to start PostgreSQL container");
    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedServer {
        root_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Root URL of the shared server (no database name appended).
pub async fn pg_url() -> &'static str {
    &SHARED.get_or_init(start_shared_server).await.root_url
}

async fn maintenance_pool() -> PgPool {
    let url = format!("{}/postgres", pg_url().await);
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .expect("failed to connect to maintenance database")
}

/// Create a uniquely named, fully migrated database.
///
/// Returns `(pool, db_name)`; hand `db_name` to [`drop_test_db`] when done.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("buildify_test_{}", Uuid::new_v4().simple());

    let maint = maintenance_pool().await;
    maint
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create test database {db_name}: {e}"));
    maint.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&format!("{}/{db_name}", pg_url().await))
        .await
        .unwrap_or_else(|e| panic!("failed to connect to test database {db_name}: {e}"));

    pool::run_migrations(&pool)
        .await
        .expect("migrations should succeed");

    (pool, db_name)
}

/// Drop a database created by [`create_test_db`], terminating any
/// connections still open against it. Errors are ignored.
pub async fn drop_test_db(db_name: &str) {
    let maint = maintenance_pool().await;
    let terminate = format!(
        "SELECT pg_terminate_backend(pid) \
         FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = maint.execute(terminate.as_str()).await;
    let _ = maint
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    maint.close().await;
}

/// Insert a user named `username` with email `<username>@example.com` and a
/// placeholder hash. For tests that need an owner row but never log in.
pub async fn seed_user(pool: &PgPool, username: &str) -> User {
    users::insert_user(
        pool,
        username,
        &format!("{username}@example.com"),
        "$argon2id$v=19$m=19456,t=2,p=1$placeholder$placeholder",
    )
    .await
    .expect("seed_user insert should succeed")
}
