use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("table \"{0}\" does not exist")]
    TableNotFound(String),
    #[error("table \"{0}\" already exists")]
    TableExists(String),
    #[error("column \"{0}\" does not exist")]
    ColumnNotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unsupported type \"{0}\"")]
    UnsupportedType(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("storage format error: {0}")]
    StorageFormat(#[from] serde_json::Error),
}
