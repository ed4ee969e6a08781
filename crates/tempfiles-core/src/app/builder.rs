//! ManagerBuilder - LifecycleManager の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 指定されなかった port はデフォルト実装で埋める

use std::sync::Arc;

use tracing::debug;
use ulid::Ulid;

use crate::app::LifecycleManager;
use crate::config::{Config, ReclamationMode};
use crate::domain::{StorageError, TempFileError};
use crate::impls::{LocalDiskStorage, TracingEventSink};
use crate::ports::{Clock, EventSink, IdGenerator, Scheduler, Storage, SystemClock, UlidGenerator};

/// ManagerBuilder は LifecycleManager を構築
///
/// # 使用例
/// ```ignore
/// let manager = ManagerBuilder::new(Config::from_env()?)
///     .event_sink(Arc::new(TracingEventSink))
///     .build()?;
/// ```
///
/// # デフォルト
/// - storage: `LocalDiskStorage`
/// - clock: `SystemClock`
/// - id_generator: `UlidGenerator`（同じ clock を使う）
/// - event_sink: `TracingEventSink`
/// - scheduler: なし（queued モードでは必須）
pub struct ManagerBuilder {
    config: Config,
    storage: Option<Arc<dyn Storage>>,
    clock: Option<Arc<dyn Clock>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    event_sink: Option<Arc<dyn EventSink>>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

/// BuildError は構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[source] TempFileError),

    #[error("Reclamation mode `queued` requires a scheduler. Call `.scheduler(..)` or pick another mode.")]
    MissingScheduler,

    #[error("Storage root {root} is not usable: {source}")]
    RootNotWritable {
        root: String,
        #[source]
        source: StorageError,
    },
}

impl ManagerBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            storage: None,
            clock: None,
            id_generator: None,
            event_sink: None,
            scheduler: None,
        }
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(id_generator);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Validate and wire the manager.
    ///
    /// # 検証
    /// - Config::validate() が通ること
    /// - queued モードなら scheduler が設定されていること
    pub fn build(self) -> Result<LifecycleManager, BuildError> {
        self.config.validate().map_err(BuildError::InvalidConfig)?;
        if self.config.mode == ReclamationMode::Queued && self.scheduler.is_none() {
            return Err(BuildError::MissingScheduler);
        }

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let id_generator = self
            .id_generator
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(LocalDiskStorage::new()));
        let event_sink = self
            .event_sink
            .unwrap_or_else(|| Arc::new(TracingEventSink));

        Ok(LifecycleManager::new(
            self.config,
            storage,
            id_generator,
            clock,
            event_sink,
            self.scheduler,
        ))
    }

    /// `build`, then prove the storage root can be written.
    ///
    /// Creates root if it is missing and round-trips a scratch directory through
    /// the configured storage, so a bad mount fails at startup instead of on
    /// the first upload.
    pub async fn build_verified(self) -> Result<LifecycleManager, BuildError> {
        let manager = self.build()?;
        let root = manager.config().root.clone();
        let storage = manager.store().storage();
        let failed = |source| BuildError::RootNotWritable {
            root: root.display().to_string(),
            source,
        };

        storage.make_directory(&root).await.map_err(failed)?;
        let scratch = root.join(format!(".write-check-{}", Ulid::new()));
        storage.make_directory(&scratch).await.map_err(failed)?;
        storage
            .write_file(&scratch.join("check"), b"ok")
            .await
            .map_err(failed)?;
        storage.delete_directory(&scratch).await.map_err(failed)?;

        debug!(root = %root.display(), "Storage root is writable");
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{ChannelScheduler, InMemoryStorage};
    use std::path::{Path, PathBuf};

    fn config(mode: ReclamationMode) -> Config {
        Config {
            mode,
            root: PathBuf::from("/data/temp-files"),
            ..Config::default()
        }
    }

    #[test]
    fn test_build_with_defaults() {
        let manager = ManagerBuilder::new(config(ReclamationMode::Periodic)).build();
        assert!(manager.is_ok());
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let manager = ManagerBuilder::new(Config {
            retention_minutes: 0,
            ..config(ReclamationMode::Manual)
        })
        .build();
        assert!(matches!(
            manager,
            Err(BuildError::InvalidConfig(TempFileError::Config(_)))
        ));
    }

    #[test]
    fn test_build_queued_requires_scheduler() {
        let manager = ManagerBuilder::new(config(ReclamationMode::Queued)).build();
        assert!(matches!(manager, Err(BuildError::MissingScheduler)));
    }

    #[test]
    fn test_build_queued_with_scheduler() {
        let (scheduler, _rx) = ChannelScheduler::channel();
        let manager = ManagerBuilder::new(config(ReclamationMode::Queued))
            .scheduler(Arc::new(scheduler))
            .build();
        assert!(manager.is_ok());
    }

    #[tokio::test]
    async fn test_build_verified_creates_root_and_leaves_no_scratch_directory() {
        let storage = Arc::new(InMemoryStorage::new());
        let manager = ManagerBuilder::new(config(ReclamationMode::Manual))
            .storage(storage.clone())
            .build_verified()
            .await;

        assert!(manager.is_ok());
        let root = Path::new("/data/temp-files");
        assert!(storage.exists(root).await.unwrap());
        assert!(storage.list_directories(root).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_verified_reports_unwritable_root() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.fail_writes_to("check").await;

        let manager = ManagerBuilder::new(config(ReclamationMode::Manual))
            .storage(storage)
            .build_verified()
            .await;

        assert!(matches!(manager, Err(BuildError::RootNotWritable { .. })));
    }
}
