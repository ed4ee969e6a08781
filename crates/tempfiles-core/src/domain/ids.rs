//! Domain identifiers.
//!
//! # FileId
//! 一時ファイルの ID はそのままディレクトリ名として使われるため、
//! パス区切り文字などを含まない文字列であることを型で保証します。
//!
//! - 生成は `IdGenerator` が担当（差し替え可能）
//! - 外部から受け取った ID は `FileId::parse` で検証してから使う

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

use super::errors::TempFileError;

/// Identifier of a temporary file (and the name of its storage directory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Validate a raw id.
    ///
    /// Rejected: empty strings, `/` and `\`, NUL, and anything starting with
    /// `.` (which also covers `.` and `..`).
    pub fn parse(raw: impl Into<String>) -> Result<Self, TempFileError> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && !raw.starts_with('.')
            && !raw.contains(['/', '\\', '\0']);
        if !valid {
            return Err(TempFileError::InvalidId(raw));
        }
        Ok(Self(raw))
    }

    /// ULID から FileId を作成（小文字の base32、常に有効）
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid.to_string().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FileId {
    type Error = TempFileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
