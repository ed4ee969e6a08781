//! RecordStore - ディレクトリ一覧 + manifest から TemporaryFile を読み出す
//!
//! 別のインデックスは持たない。`<root>` の子ディレクトリがそのまま一覧。
//!
//! # エラー方針
//! - ディレクトリが無い: `None`（すでに使われて消えただけかもしれない）
//! - ディレクトリはあるが manifest が読めない: `MissingManifest`
//! - 一覧系はエントリごとに `Result` を返し、どう扱うかは呼び出し側が決める

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::codec::ManifestCodec;
use crate::domain::{FileId, MANIFEST_FILENAME, Result, StorageError, TempFileError, TemporaryFile};
use crate::ports::{Clock, Storage};

/// One hydrated listing entry. Corrupt entries carry their directory name.
pub type Entry = std::result::Result<TemporaryFile, (String, TempFileError)>;

pub struct RecordStore {
    storage: Arc<dyn Storage>,
    root: PathBuf,
    ignore: Vec<String>,
    clock: Arc<dyn Clock>,
}

impl RecordStore {
    pub fn new(
        storage: Arc<dyn Storage>,
        root: impl Into<PathBuf>,
        ignore: Vec<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            root: root.into(),
            ignore,
            clock,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn directory_of(&self, id: &FileId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Every record directory under root, hydrated one by one.
    ///
    /// Ignored names and hidden (dot-prefixed) directories are skipped
    /// quietly; ids never start with a dot. Only a failure to list root itself
    /// fails the whole call.
    pub async fn list_all(&self) -> Result<Vec<Entry>> {
        let names = self.storage.list_directories(&self.root).await?;
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            if name.starts_with('.') || self.ignore.iter().any(|ignored| *ignored == name) {
                continue;
            }
            let entry = match FileId::parse(name.as_str()) {
                Ok(id) => match self.load(&id).await {
                    Ok(Some(file)) => Ok(file),
                    // Removed between listing and reading.
                    Ok(None) => continue,
                    Err(e) => Err((name, e)),
                },
                Err(e) => Err((name, e)),
            };
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Records whose `expires_at` is at or before now. Corrupt entries pass through.
    pub async fn list_expired(&self) -> Result<Vec<Entry>> {
        let now = self.clock.now();
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|entry| entry.as_ref().map_or(true, |file| file.has_expired(now)))
            .collect())
    }

    /// Expired and unlocked records. Corrupt entries pass through.
    pub async fn list_reclaimable(&self) -> Result<Vec<Entry>> {
        Ok(self
            .list_expired()
            .await?
            .into_iter()
            .filter(|entry| entry.as_ref().map_or(true, |file| !file.locked))
            .collect())
    }

    /// Look up a record by its raw id.
    pub async fn get(&self, id: &str) -> Result<Option<TemporaryFile>> {
        let id = FileId::parse(id)?;
        self.load(&id).await
    }

    /// Read a record's blob; `None` when the record (or its blob) is gone.
    pub async fn get_contents(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let Some(file) = self.get(id).await? else {
            return Ok(None);
        };
        match self.storage.read_file(&file.blob_path(&self.root)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StorageError::NotFound(_)) => {
                debug!(id = %file.id, "Blob vanished after manifest read");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite a record's manifest in place.
    pub async fn save(&self, file: &TemporaryFile) -> Result<()> {
        let bytes = ManifestCodec::encode(file)?;
        self.storage
            .write_file(&file.manifest_path(&self.root), &bytes)
            .await
            .map_err(|source| TempFileError::StorageWrite {
                id: file.id.clone(),
                source,
            })
    }

    pub(crate) async fn load(&self, id: &FileId) -> Result<Option<TemporaryFile>> {
        let dir = self.directory_of(id);
        if !self.storage.exists(&dir).await? {
            return Ok(None);
        }

        let bytes = match self.storage.read_file(&dir.join(MANIFEST_FILENAME)).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => {
                return Err(TempFileError::MissingManifest { id: id.clone() });
            }
            Err(e) => return Err(e.into()),
        };
        let file = ManifestCodec::decode(&bytes)?;
        if file.id != *id {
            return Err(TempFileError::MalformedDescriptor(format!(
                "manifest in {id} claims id {}",
                file.id
            )));
        }
        debug!(id = %id, "Loaded temporary file");
        Ok(Some(file))
    }
}
