use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Crate-wide error type.
///
/// Validation variants (`InvalidInput` through `Validation`) abort the
/// operation with no partial state change and carry a message meant for
/// the user. Storage variants are propagated to the caller after being
/// logged; there is no automatic retry. Absence of a record or asset is
/// never an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid file input")]
    InvalidInput,

    #[error("file size exceeds {limit} byte limit (got {size} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("unsupported file type: {given}. supported types: {allowed}")]
    UnsupportedType { given: String, allowed: String },

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("post not found: {0}")]
    PostNotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to store posts data: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    StorageBackend(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
