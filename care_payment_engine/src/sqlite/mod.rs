pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;

/// The engine's schema, embedded at compile time. Run against a pool with `MIGRATOR.run(pool)`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
