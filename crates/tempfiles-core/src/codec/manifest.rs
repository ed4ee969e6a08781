//! ManifestCodec - manifest.json の読み書き
//!
//! # フォーマット
//! ```json
//! { "id": "...", "filename": "...", "expires_at": 1700000000, "data": {},
//!   "locked": true, "user_id": "..." }
//! ```
//! - `expires_at` は unix 秒
//! - `locked` は true のときだけ書く（無い / false はどちらも false）
//! - `user_id` は owner がいるときだけ書く

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{FileData, FileId, TempFileError, TemporaryFile};

#[derive(Serialize)]
struct ManifestOut<'a> {
    id: &'a str,
    filename: &'a str,
    expires_at: i64,
    data: &'a FileData,
    #[serde(skip_serializing_if = "is_false")]
    locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Deserialize)]
struct ManifestIn {
    id: String,
    filename: String,
    expires_at: i64,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    locked: Option<bool>,
    #[serde(default)]
    user_id: Option<Value>,
}

/// Encoder/decoder for the descriptor sidecar.
pub struct ManifestCodec;

impl ManifestCodec {
    pub fn encode(file: &TemporaryFile) -> Result<Vec<u8>, TempFileError> {
        let manifest = ManifestOut {
            id: file.id.as_str(),
            filename: &file.filename,
            expires_at: file.expires_at.timestamp(),
            data: &file.data,
            locked: file.locked,
            user_id: file.owner_id.as_deref(),
        };
        serde_json::to_vec(&manifest).map_err(|e| TempFileError::MalformedDescriptor(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<TemporaryFile, TempFileError> {
        let manifest: ManifestIn = serde_json::from_slice(bytes)
            .map_err(|e| TempFileError::MalformedDescriptor(e.to_string()))?;

        let id = FileId::parse(manifest.id)
            .map_err(|e| TempFileError::MalformedDescriptor(e.to_string()))?;
        let expires_at = DateTime::from_timestamp(manifest.expires_at, 0).ok_or_else(|| {
            TempFileError::MalformedDescriptor(format!(
                "expires_at out of range: {}",
                manifest.expires_at
            ))
        })?;
        let data = decode_data(manifest.data)?;

        let mut file = TemporaryFile::new(id, manifest.filename, expires_at, data);
        if manifest.locked.unwrap_or(false) {
            file.lock();
        }
        file.owner_id = decode_owner(manifest.user_id)?;
        Ok(file)
    }
}

/// `data` may be absent, `null`, an object, or an empty array (which is how
/// some writers serialize an empty map).
fn decode_data(value: Option<Value>) -> Result<FileData, TempFileError> {
    match value {
        None | Some(Value::Null) => Ok(FileData::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Array(items)) if items.is_empty() => Ok(FileData::new()),
        Some(other) => Err(TempFileError::MalformedDescriptor(format!(
            "data must be an object, got {other}"
        ))),
    }
}

/// Owner ids are opaque; numeric ids are kept as their decimal string.
fn decode_owner(value: Option<Value>) -> Result<Option<String>, TempFileError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(TempFileError::MalformedDescriptor(format!(
            "user_id must be a string or number, got {other}"
        ))),
    }
}
