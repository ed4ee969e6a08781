//! Scheduler port - 遅延削除のスケジューリング
//!
//! queued モードでは `create` のたびに「expires_at に delete(id) を実行する」
//! 予約をここに渡します。コアは予約を出すだけで、実行の仕組み
//! （遅延キュー、タイマーサービスなど）はホスト側が提供します。
//!
//! # 実装
//! - **ChannelScheduler** + `app::ReclaimLoop`: プロセス内（非永続）

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{FileId, SchedulerError};

#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn schedule_at(&self, at: DateTime<Utc>, id: FileId) -> Result<(), SchedulerError>;
}
