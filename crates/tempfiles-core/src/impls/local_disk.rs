//! LocalDiskStorage - ローカルディスク上のリファレンス実装
//!
//! # 学習ポイント
//! - tokio::fs による非同期ファイル操作
//! - NotFound を「冪等な削除」として吸収する
//! - temp ファイル + rename で manifest の書き込みを原子的にする
//! - レコードのディレクトリは `create_dir` で作り、既存なら衝突として返す
//!
//! # 注意
//! - write と rename の間でプロセスが落ちると、レコードのディレクトリに
//!   `.<name>.<ulid>.tmp` が残る。blob + manifest だけという構成は崩れるが、
//!   読み出しは名前で引くので影響せず、ディレクトリごと回収されるときに消える

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;
use ulid::Ulid;

use crate::domain::StorageError;
use crate::ports::Storage;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDiskStorage;

impl LocalDiskStorage {
    pub fn new() -> Self {
        Self
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", Ulid::new()))
}

#[async_trait]
impl Storage for LocalDiskStorage {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        fs::try_exists(path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn make_directory(&self, path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn create_directory(&self, path: &Path) -> Result<bool, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }
        match fs::create_dir(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let tmp = temp_sibling(path);
        if let Err(e) = fs::write(&tmp, bytes).await {
            return Err(StorageError::io(path, e));
        }
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::io(path, e));
        }
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).await.map_err(|e| StorageError::io(path, e))
    }

    async fn delete_directory(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_dir_all(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn list_directories(&self, root: &Path) -> Result<Vec<String>, StorageError> {
        let mut entries = match fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(root, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(root, e))?
        {
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                // Removed between read_dir and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::io(entry.path(), e)),
            };
            if !file_type.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!(name = ?raw, "Skipping non UTF-8 directory name"),
            }
        }
        Ok(names)
    }
}
