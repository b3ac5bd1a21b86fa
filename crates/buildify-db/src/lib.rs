//! Persistence layer for buildify: connection config, pool, migrations,
//! row models, and query functions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Return `true` if the error chain contains a unique-constraint violation.
///
/// Query functions wrap `sqlx::Error` in `anyhow` context, so callers that
/// need to turn a duplicate insert into a domain error use this instead of
/// matching on the message.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION)
    })
}
