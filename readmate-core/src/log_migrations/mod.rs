//! Log database migrations - embedded SQL files
//!
//! Kept apart from the main migrations because `logs.duckdb` is a separate
//! database file that can be exported or wiped on its own.

/// All log migrations in application order.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
