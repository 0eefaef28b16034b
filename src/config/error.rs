
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while saving or loading a snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Writing the snapshot failed. The previous snapshot has been restored.
    #[error("Error while saving configuration. Backup has been restored: {0}")]
    WriteFailed(String),
    /// Copying the existing snapshot aside failed; nothing was written.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),
    /// Writing failed and the backup could not be put back either.
    #[error("Failed to restore backup {}: {message}", backup.display())]
    RestoreFailed { backup: PathBuf, message: String },
    /// Snapshot could not be encoded.
    #[error("Failed to serialise snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Snapshot on disk exists but cannot be decoded.
    #[error("Snapshot {} is unreadable: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
