//! Temporary file record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use super::errors::TempFileError;
use super::ids::FileId;

/// Name of the descriptor written next to every stored blob.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Caller-supplied metadata, round-tripped verbatim through the manifest.
pub type FileData = Map<String, Value>;

/// One temporary file and its metadata.
///
/// Design:
/// - The directory `<root>/<id>` is the single source of truth; this struct is
///   a hydrated snapshot of its manifest.
/// - `locked` changes only through `lock()` / `unlock()`.
/// - `expires_at` has whole-second precision (the manifest stores unix seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct TemporaryFile {
    pub id: FileId,
    pub filename: String,
    pub expires_at: DateTime<Utc>,
    pub data: FileData,
    pub locked: bool,
    pub owner_id: Option<String>,
}

impl TemporaryFile {
    pub fn new(id: FileId, filename: impl Into<String>, expires_at: DateTime<Utc>, data: FileData) -> Self {
        Self {
            id,
            filename: filename.into(),
            expires_at: truncate_to_seconds(expires_at),
            data,
            locked: false,
            owner_id: None,
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Inclusive boundary: a file expiring exactly at `now` has expired.
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Expired and not vetoed by a lock.
    pub fn is_reclaimable(&self, now: DateTime<Utc>) -> bool {
        !self.locked && self.has_expired(now)
    }

    /// Whole minutes left before expiry (0 once expired).
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_minutes().max(0)
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(self.id.as_str())
    }

    pub fn blob_path(&self, root: &Path) -> PathBuf {
        self.directory(root).join(&self.filename)
    }

    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        self.directory(root).join(MANIFEST_FILENAME)
    }
}

/// `expires_at = now + retention`, truncated to whole seconds.
///
/// A retention that pushes past the largest representable timestamp is a
/// configuration error.
pub fn expiry_from(now: DateTime<Utc>, retention: Duration) -> Result<DateTime<Utc>, TempFileError> {
    now.checked_add_signed(retention)
        .map(truncate_to_seconds)
        .ok_or_else(|| {
            TempFileError::Config(format!(
                "retention of {} minutes overflows the expiry timestamp",
                retention.num_minutes()
            ))
        })
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

/// Check that a filename can be used as the blob's leaf name.
///
/// The blob shares its directory with the manifest, so the manifest's own
/// name is reserved.
pub fn validate_filename(filename: &str) -> Result<(), TempFileError> {
    let valid = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && filename != MANIFEST_FILENAME
        && !filename.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(TempFileError::InvalidFilename(filename.to_string()))
    }
}
