use thiserror::Error;

pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlx migrate error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("access to this resource is forbidden")]
    Forbidden,
    #[error("field `{field}` failed validation: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("a live session for this user and exam already exists")]
    DuplicateSession,
    #[error("question attempt does not belong to this session")]
    AttemptNotFound,
    #[error("session is already completed")]
    SessionCompleted,
}

impl DatabaseError {
    pub fn validation<R: Into<String>>(field: &'static str, reason: R) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True for the unique-violation sqlx error raised by the partial index
    /// guarding one live session per (user, exam).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::SqlxError(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}
