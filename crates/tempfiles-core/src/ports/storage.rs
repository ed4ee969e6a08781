//! Storage port - ディレクトリ階層の抽象化
//!
//! # 実装
//! - **LocalDiskStorage**: tokio::fs ベース（リファレンス実装）
//! - **InMemoryStorage**: テスト・組み込み用

use std::path::Path;

use async_trait::async_trait;

use crate::domain::StorageError;

/// Storage はエンジンが必要とする最小限のファイル操作
///
/// # 契約
/// - `read_file` は存在しないパスで `StorageError::NotFound`
/// - `delete_directory` は存在しないパスでも Ok（冪等）。実際に消したときだけ `true`
/// - `make_directory` は既存ディレクトリでも Ok（root 用）
/// - `create_directory` は新規作成のときだけ `true`。既存なら `false` を返し、
///   中身には触らない（レコードのディレクトリを予約する用途）
/// - `list_directories` は子ディレクトリの名前だけを返す（順序は保証しない）。
///   root が無ければ空
#[async_trait]
pub trait Storage: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    async fn make_directory(&self, path: &Path) -> Result<(), StorageError>;

    async fn create_directory(&self, path: &Path) -> Result<bool, StorageError>;

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError>;

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    async fn delete_directory(&self, path: &Path) -> Result<bool, StorageError>;

    async fn list_directories(&self, root: &Path) -> Result<Vec<String>, StorageError>;
}
