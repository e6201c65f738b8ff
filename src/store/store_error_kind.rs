use std::path::PathBuf;

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreErrorKind>;

/// Errors from the fingerprint store, its shard files, and the metatable.
#[derive(Error, Debug)]
pub enum StoreErrorKind {
    #[error("Error accessing shard file {path}: {src}")]
    ShardIo { src: std::io::Error, path: PathBuf },

    #[error("Failed to serialize records into shard file {path}: {src}")]
    Serialization { src: String, path: PathBuf },

    #[error("Failed to deserialize records from shard file {path}: {src}")]
    Deserialization { src: String, path: PathBuf },

    #[error("Error accessing metatable file {path}: {src}")]
    MetaTableIo { src: std::io::Error, path: PathBuf },

    /// A fingerprint was submitted after the store had shut down and
    /// drained. Submitting to a drained store is an invalid-state error, not
    /// a recoverable condition.
    #[error("store is closed: the writer thread has already drained")]
    StoreClosed,

    #[error("the store writer thread panicked")]
    WriterPanic,
}
