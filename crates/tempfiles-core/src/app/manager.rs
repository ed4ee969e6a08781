//! LifecycleManager - 一時ファイルのライフサイクル管理
//!
//! # フロー
//! - create: ID 生成 → ディレクトリ作成 → blob 書き込み → manifest 書き込み
//!   → (queued) 削除予約 → Created 通知
//! - delete: 読み出し → ロックなら何もしない → ディレクトリ削除 → Deleted 通知
//! - sweep: 回収可能な一覧 → 1 件ずつ delete（失敗はログしてスキップ）
//!
//! # 設計原則
//! - 読み取り側の「無い」はエラーにしない（回収と通常利用は競合しうる）
//! - 書き込み失敗は必ず呼び出し元に返し、途中まで作ったディレクトリは消す
//! - イベント通知はストレージ操作が成功した後。通知の失敗で操作は巻き戻さない

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::ManifestCodec;
use crate::config::{Config, ReclamationMode};
use crate::domain::file::{expiry_from, validate_filename};
use crate::domain::{
    EventKind, FileData, FileId, FileView, Result, StorageError, TempFileError, TemporaryFile,
};
use crate::ports::{Clock, EventSink, IdGenerator, Scheduler, Storage};
use crate::store::RecordStore;

/// Fresh ids tried before `create` gives up with `IdCollision`.
pub const MAX_ID_ATTEMPTS: u32 = 5;

/// Which branch `delete` took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    Deleted,
    /// The file is locked; nothing was removed.
    Locked,
    /// Nothing to delete (never existed or already reclaimed).
    Missing,
}

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub deleted: usize,
    /// Corrupt records, failures, and records that changed under the sweep.
    pub skipped: usize,
}

pub struct LifecycleManager {
    config: Config,
    store: RecordStore,
    storage: Arc<dyn Storage>,
    id_generator: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl LifecycleManager {
    /// Wire a manager from explicit parts. Prefer `ManagerBuilder`, which
    /// validates the combination.
    pub(crate) fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        id_generator: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
        scheduler: Option<Arc<dyn Scheduler>>,
    ) -> Self {
        let store = RecordStore::new(
            Arc::clone(&storage),
            config.root.clone(),
            config.ignore.clone(),
            Arc::clone(&clock),
        );
        Self {
            config,
            store,
            storage,
            id_generator,
            clock,
            sink,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Caller-facing view of a file at the current time.
    pub fn view(&self, file: &TemporaryFile) -> FileView {
        FileView::new(file, self.now())
    }

    /// Store a blob and its manifest, returning the new record.
    pub async fn create(
        &self,
        blob: &[u8],
        filename: &str,
        data: FileData,
        owner_id: Option<&str>,
    ) -> Result<TemporaryFile> {
        validate_filename(filename)?;

        let expires_at = expiry_from(self.clock.now(), self.config.retention())?;
        let id = self.reserve_id(filename).await?;
        let mut file = TemporaryFile::new(id, filename, expires_at, data);
        if self.config.include_owner
            && let Some(owner_id) = owner_id
        {
            file.owner_id = Some(owner_id.to_string());
        }

        if let Err(e) = self.write_contents(&file, blob).await {
            self.discard(&file).await;
            return Err(e);
        }

        if self.config.mode == ReclamationMode::Queued
            && let Some(scheduler) = &self.scheduler
            && let Err(e) = scheduler.schedule_at(file.expires_at, file.id.clone()).await
        {
            self.discard(&file).await;
            return Err(e.into());
        }

        info!(
            id = %file.id,
            filename = %file.filename,
            size = blob.len(),
            expires_at = %file.expires_at,
            "Created temporary file"
        );
        self.emit(EventKind::Created, &file).await;
        Ok(file)
    }

    /// Create a record from a file already on the local filesystem, such as a
    /// spooled upload.
    ///
    /// `filename` defaults to the source's basename. With `delete_original`,
    /// the source is removed once the record exists.
    pub async fn create_from_path(
        &self,
        source: &Path,
        filename: Option<&str>,
        data: FileData,
        owner_id: Option<&str>,
        delete_original: bool,
    ) -> Result<TemporaryFile> {
        let filename = match filename {
            Some(name) => name.to_string(),
            None => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| TempFileError::InvalidFilename(source.display().to_string()))?,
        };
        let blob = tokio::fs::read(source)
            .await
            .map_err(|e| StorageError::io(source, e))?;

        let file = self.create(&blob, &filename, data, owner_id).await?;

        if delete_original && let Err(e) = tokio::fs::remove_file(source).await {
            warn!(source = %source.display(), error = %e, "Failed to remove original upload");
        }
        Ok(file)
    }

    pub async fn get(&self, id: &str) -> Result<Option<TemporaryFile>> {
        self.store.get(id).await
    }

    pub async fn get_contents(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.store.get_contents(id).await
    }

    /// Delete a file unless it is locked. Deleting a missing file succeeds.
    ///
    /// Concurrent deletes of one id converge: only the call that actually
    /// removed the directory reports `Deleted` and emits the event.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        let Some(file) = self.store.get(id).await? else {
            debug!(id, "Nothing to delete");
            return Ok(DeleteOutcome::Missing);
        };
        if file.locked {
            debug!(id = %file.id, "File is locked, not deleting");
            return Ok(DeleteOutcome::Locked);
        }
        if self.remove(&file).await? {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Missing)
        }
    }

    /// Veto reclamation until `unlock`.
    pub async fn lock(&self, id: &str) -> Result<Option<TemporaryFile>> {
        self.set_locked(id, true).await
    }

    pub async fn unlock(&self, id: &str) -> Result<Option<TemporaryFile>> {
        self.set_locked(id, false).await
    }

    /// Report that a collaborator has consumed the file. Storage is untouched.
    pub async fn mark_used(&self, id: &str) -> Result<Option<TemporaryFile>> {
        let file = self.store.get(id).await?;
        if let Some(file) = &file {
            self.emit(EventKind::Used, file).await;
        }
        Ok(file)
    }

    /// Reclaim every expired, unlocked file.
    ///
    /// One bad record never stops the pass: corrupt manifests and per-file
    /// failures are logged and counted as skipped.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for entry in self.store.list_reclaimable().await? {
            let file = match entry {
                Ok(file) => file,
                Err((name, e)) => {
                    warn!(directory = %name, error = %e, "Skipping unreadable temporary file");
                    report.skipped += 1;
                    continue;
                }
            };

            match self.delete(file.id.as_str()).await {
                Ok(DeleteOutcome::Deleted) => report.deleted += 1,
                Ok(outcome) => {
                    debug!(id = %file.id, ?outcome, "File changed during sweep");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(id = %file.id, error = %e, "Failed to reclaim temporary file");
                    report.skipped += 1;
                }
            }
        }

        info!(deleted = report.deleted, skipped = report.skipped, "Sweep finished");
        Ok(report)
    }

    /// Delete every record regardless of expiry or lock.
    ///
    /// Only readable records are touched; directories with a missing or
    /// malformed manifest are logged and left alone. Returns the number of
    /// records removed.
    pub async fn clear_all(&self) -> Result<usize> {
        self.clear(false).await
    }

    /// `clear_all`, plus removal of record directories whose manifest is
    /// missing or malformed. Names outside the id namespace are never touched.
    pub async fn clear_all_including_corrupt(&self) -> Result<usize> {
        self.clear(true).await
    }

    async fn clear(&self, remove_corrupt: bool) -> Result<usize> {
        let mut cleared = 0;

        for entry in self.store.list_all().await? {
            match entry {
                Ok(file) => match self.remove(&file).await {
                    Ok(true) => cleared += 1,
                    Ok(false) => {}
                    Err(e) => warn!(id = %file.id, error = %e, "Failed to clear temporary file"),
                },
                Err((name, TempFileError::InvalidId(_))) => {
                    debug!(directory = %name, "Not a temporary file, leaving it");
                }
                Err((name, e)) if remove_corrupt => {
                    warn!(directory = %name, error = %e, "Clearing unreadable temporary file");
                    match self.storage.delete_directory(&self.config.root.join(&name)).await {
                        Ok(true) => cleared += 1,
                        Ok(false) => {}
                        Err(e) => warn!(directory = %name, error = %e, "Failed to clear directory"),
                    }
                }
                Err((name, e)) => {
                    warn!(directory = %name, error = %e, "Skipping unreadable temporary file");
                }
            }
        }

        info!(cleared, "Cleared temporary files");
        Ok(cleared)
    }

    /// Generate an id and claim its directory in one step.
    ///
    /// `create_directory` fails over to `false` on an existing directory, so
    /// two creates racing on one id never share a directory.
    async fn reserve_id(&self, filename: &str) -> Result<FileId> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = self.id_generator.generate(filename);
            let created = self
                .storage
                .create_directory(&self.store.directory_of(&id))
                .await
                .map_err(|source| TempFileError::StorageWrite {
                    id: id.clone(),
                    source,
                })?;
            if created {
                return Ok(id);
            }
            warn!(id = %id, attempt, "Generated id already in use, retrying");
        }
        Err(TempFileError::IdCollision {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    async fn write_contents(&self, file: &TemporaryFile, blob: &[u8]) -> Result<()> {
        let root = &self.config.root;
        let write_error = |source| TempFileError::StorageWrite {
            id: file.id.clone(),
            source,
        };

        self.storage
            .write_file(&file.blob_path(root), blob)
            .await
            .map_err(write_error)?;
        let manifest = ManifestCodec::encode(file)?;
        self.storage
            .write_file(&file.manifest_path(root), &manifest)
            .await
            .map_err(write_error)?;
        Ok(())
    }

    /// Best-effort removal of a partially created record.
    async fn discard(&self, file: &TemporaryFile) {
        if let Err(e) = self
            .storage
            .delete_directory(&file.directory(&self.config.root))
            .await
        {
            warn!(id = %file.id, error = %e, "Failed to remove partial temporary file");
        }
    }

    /// `false` when another caller removed the directory first.
    async fn remove(&self, file: &TemporaryFile) -> Result<bool> {
        let removed = self
            .storage
            .delete_directory(&file.directory(&self.config.root))
            .await?;
        if removed {
            info!(id = %file.id, "Deleted temporary file");
            self.emit(EventKind::Deleted, file).await;
        } else {
            debug!(id = %file.id, "Already deleted");
        }
        Ok(removed)
    }

    async fn set_locked(&self, id: &str, locked: bool) -> Result<Option<TemporaryFile>> {
        let Some(mut file) = self.store.get(id).await? else {
            return Ok(None);
        };
        if file.locked != locked {
            if locked {
                file.lock();
            } else {
                file.unlock();
            }
            self.store.save(&file).await?;
            info!(id = %file.id, locked, "Updated lock");
        }
        Ok(Some(file))
    }

    async fn emit(&self, kind: EventKind, file: &TemporaryFile) {
        if let Err(e) = self.sink.notify(kind, file).await {
            warn!(event = %kind, id = %file.id, error = %e, "Event sink failed");
        }
    }
}
