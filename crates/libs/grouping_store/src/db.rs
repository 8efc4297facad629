use crate::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Opens a connection pool and runs pending migrations.
pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
    acquire_timeout_secs: u64,
) -> Result<PgPool, StoreError> {
    info!(
        host = database_url.split('/').next_back().unwrap_or("unknown"),
        "connecting to database"
    );
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .connect(database_url)
        .await?;

    let migrations_dir = find_migrations_dir()?;
    sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .map_err(|err| StoreError::Sqlx(sqlx::Error::Migrate(Box::new(err))))?
        .run(&pool)
        .await
        .map_err(|err| StoreError::Sqlx(sqlx::Error::Migrate(Box::new(err))))?;

    info!("database migrations completed successfully");
    Ok(pool)
}

/// Walks upward from the running binary's location looking for a
/// `migrations/` directory, falling back to the crate manifest directory
/// for `cargo test`/`cargo run` invocations. Lets the same binary find its
/// migrations whether it's run from a checkout or an installed location.
fn find_migrations_dir() -> Result<PathBuf, StoreError> {
    let candidates = [
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf)),
        Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
    ];

    for base in candidates.into_iter().flatten() {
        let mut dir = base.as_path();
        loop {
            let candidate = dir.join("migrations");
            if candidate.is_dir() {
                return Ok(candidate);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    Err(StoreError::Sqlx(sqlx::Error::Configuration(
        "could not locate a migrations directory".into(),
    )))
}
