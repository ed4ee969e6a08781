//! Errors - エラー型と分類
//!
//! Read-path absence is never an error: `get`/`delete` translate
//! `StorageError::NotFound` into `None` / no-op before it reaches callers.

use std::path::PathBuf;

use thiserror::Error;

use super::ids::FileId;

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failure reported by an event sink. The manager logs it and moves on.
#[derive(Debug, Error)]
#[error("event sink failed: {0}")]
pub struct SinkError(pub String);

/// Failure reported by a scheduler when deferring a reclamation.
#[derive(Debug, Error)]
#[error("scheduler failed: {0}")]
pub struct SchedulerError(pub String);

/// TempFileError はライフサイクルエンジンのドメインエラー
#[derive(Debug, Error)]
pub enum TempFileError {
    #[error("manifest not found for file {id}")]
    MissingManifest { id: FileId },

    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("failed to write file {id}: {source}")]
    StorageWrite {
        id: FileId,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid file id: {0:?}")]
    InvalidId(String),

    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("could not allocate a unique id after {attempts} attempts")]
    IdCollision { attempts: u32 },

    #[error(transparent)]
    Schedule(#[from] SchedulerError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TempFileError>;
