//! Synchronization Service Error Hierarchy
//!
//! Defines error types for the udbsync record store and notification
//! service, categorized by protocol layer and operational concerns.

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (network, storage, serialization)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Field schema violations on write
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    // Network layer
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    // Storage layer
    #[error("Storage operation failed")]
    Storage(#[from] StorageError),

    //Serialization
    #[error("Serialization error")]
    Serialization(#[from] SerializationError),
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Listener socket setup failures
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket-level I/O failures
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed service addresses
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures during file replacement
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Atomic rename failures (temp file persisted into place)
    #[error("Failed to persist {path}: {source}")]
    PersistError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Change log ordering violations
    #[error("Change log revision regression (last: {last}, recorded: {recorded})")]
    RevisionRegression { last: u64, recorded: u64 },
}

// Serialization is classified separately (wire layer and storage layer both
// encode with bincode)
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Bincode serialization failed: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Schema enforcement failures, local to the record store. Always surfaced
/// to the writer, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{field}' expects {expected} but received {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Field '{field}' is not declared in the schema")]
    UndeclaredField { field: String },

    #[error("Write contains no field updates")]
    EmptyUpdate,
}

// ============== Conversion Implementations ============== //
impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Error::System(SystemError::Network(e))
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::System(SystemError::Storage(e))
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Error::System(SystemError::Serialization(e))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        SerializationError::Bincode(err).into()
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        NetworkError::TaskFailed(err).into()
    }
}
