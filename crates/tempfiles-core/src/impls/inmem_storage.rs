//! InMemoryStorage - テスト・組み込み用のストレージ
//!
//! # 学習ポイント
//! - パスをキーにした BTreeMap でディレクトリ階層を表現
//! - LocalDiskStorage と同じ契約（NotFound、冪等削除）を満たす
//! - 書き込み失敗を注入できる（部分書き込みのクリーンアップを検証するため）

use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::StorageError;
use crate::ports::Storage;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// InMemoryStorage はプロセス内のディレクトリツリー
///
/// # 使用例
/// ```ignore
/// let storage = InMemoryStorage::new();
/// storage.fail_writes_to("manifest.json").await;
/// ```
#[derive(Default)]
pub struct InMemoryStorage {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
    /// Leaf names whose writes fail with PermissionDenied.
    failing_writes: RwLock<HashSet<String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to a file with this leaf name fail.
    pub async fn fail_writes_to(&self, leaf: &str) {
        self.failing_writes.write().await.insert(leaf.to_string());
    }

    /// Number of nodes (files and directories) currently stored.
    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }
}

fn io_error(path: &Path, kind: ErrorKind, msg: &str) -> StorageError {
    StorageError::io(path, std::io::Error::new(kind, msg.to_string()))
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(self.nodes.read().await.contains_key(path))
    }

    async fn make_directory(&self, path: &Path) -> Result<(), StorageError> {
        let mut nodes = self.nodes.write().await;
        for ancestor in path.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            match nodes.get(ancestor) {
                Some(Node::File(_)) => {
                    return Err(io_error(ancestor, ErrorKind::AlreadyExists, "is a file"));
                }
                Some(Node::Dir) => {}
                None => {
                    nodes.insert(ancestor.to_path_buf(), Node::Dir);
                }
            }
        }
        Ok(())
    }

    async fn create_directory(&self, path: &Path) -> Result<bool, StorageError> {
        if self.nodes.read().await.contains_key(path) {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            self.make_directory(parent).await?;
        }
        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(path) {
            return Ok(false);
        }
        nodes.insert(path.to_path_buf(), Node::Dir);
        Ok(true)
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let leaf = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing_writes.read().await.contains(&leaf) {
            return Err(io_error(path, ErrorKind::PermissionDenied, "injected write failure"));
        }

        let mut nodes = self.nodes.write().await;
        let parent_is_dir = path
            .parent()
            .is_some_and(|parent| matches!(nodes.get(parent), Some(Node::Dir)));
        if !parent_is_dir {
            return Err(io_error(path, ErrorKind::NotFound, "parent directory missing"));
        }
        if matches!(nodes.get(path), Some(Node::Dir)) {
            return Err(io_error(path, ErrorKind::AlreadyExists, "is a directory"));
        }
        nodes.insert(path.to_path_buf(), Node::File(bytes.to_vec()));
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match self.nodes.read().await.get(path) {
            Some(Node::File(bytes)) => Ok(bytes.clone()),
            Some(Node::Dir) => Err(io_error(path, ErrorKind::Other, "is a directory")),
            None => Err(StorageError::NotFound(path.to_path_buf())),
        }
    }

    async fn delete_directory(&self, path: &Path) -> Result<bool, StorageError> {
        let mut nodes = self.nodes.write().await;
        let before = nodes.len();
        nodes.retain(|key, _| !key.starts_with(path));
        Ok(nodes.len() != before)
    }

    async fn list_directories(&self, root: &Path) -> Result<Vec<String>, StorageError> {
        let nodes = self.nodes.read().await;
        let names = nodes
            .iter()
            .filter(|(key, node)| matches!(node, Node::Dir) && key.parent() == Some(root))
            .filter_map(|(key, _)| key.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        Ok(names)
    }
}
