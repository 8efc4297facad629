use thiserror::Error;

/// Failures surfaced by the persistence layer: one variant per underlying
/// failure mode, with a blanket conversion from `sqlx::Error`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("unique constraint violated")]
    UniqueViolation(sqlx::Error),

    #[error("JSON serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::UniqueViolation(err)
            }
            _ => Self::Sqlx(err),
        }
    }
}
