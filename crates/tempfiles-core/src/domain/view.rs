//! Caller-facing representation of a temporary file.
//!
//! This is what an upload endpoint hands back to the client: the id is the
//! important part, the client keeps it and submits it with the rest of its
//! form so the file can be claimed later.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::file::{FileData, TemporaryFile};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileView {
    pub id: String,
    pub filename: String,
    pub data: FileData,
    /// Unix seconds.
    pub expires_at: i64,
    /// Whole minutes until expiry.
    pub expires_in: i64,
}

impl FileView {
    pub fn new(file: &TemporaryFile, now: DateTime<Utc>) -> Self {
        Self {
            id: file.id.to_string(),
            filename: file.filename.clone(),
            data: file.data.clone(),
            expires_at: file.expires_at.timestamp(),
            expires_in: file.expires_in(now),
        }
    }
}
