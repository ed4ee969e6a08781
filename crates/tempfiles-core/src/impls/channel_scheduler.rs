//! ChannelScheduler - プロセス内の遅延削除スケジューラ
//!
//! `schedule_at` は予約を mpsc チャネルに流すだけ。
//! 受信側の `app::ReclaimLoop` が期限まで待ってから `delete(id)` を呼びます。
//!
//! # 注意
//! - 予約はメモリ上にしかないため、プロセス再起動で失われる
//! - 永続化が必要なら遅延キューを使う Scheduler 実装に差し替える
//!   （失われた分は periodic sweep で回収できる）

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::domain::{FileId, SchedulerError};
use crate::ports::Scheduler;

/// A deferred reclamation request.
///
/// Ordering is reversed so a `BinaryHeap` pops the earliest `at` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReclaim {
    pub at: DateTime<Utc>,
    pub id: FileId,
}

impl PartialOrd for ScheduledReclaim {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledReclaim {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

pub struct ChannelScheduler {
    tx: mpsc::UnboundedSender<ScheduledReclaim>,
}

impl ChannelScheduler {
    /// Create a scheduler and the receiver to hand to `ReclaimLoop::spawn`.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ScheduledReclaim>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Scheduler for ChannelScheduler {
    async fn schedule_at(&self, at: DateTime<Utc>, id: FileId) -> Result<(), SchedulerError> {
        self.tx
            .send(ScheduledReclaim { at, id })
            .map_err(|e| SchedulerError(format!("reclaim loop is not running (id={})", e.0.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::BinaryHeap;

    fn id(raw: &str) -> FileId {
        FileId::parse(raw).unwrap()
    }

    #[test]
    fn heap_pops_earliest_first() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut heap = BinaryHeap::new();
        heap.push(ScheduledReclaim { at: t0 + Duration::minutes(5), id: id("late") });
        heap.push(ScheduledReclaim { at: t0, id: id("early") });
        heap.push(ScheduledReclaim { at: t0 + Duration::minutes(1), id: id("middle") });

        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|r| r.id.to_string()).collect();
        assert_eq!(order, vec!["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn schedule_sends_to_receiver() {
        let (scheduler, mut rx) = ChannelScheduler::channel();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        scheduler.schedule_at(at, id("f1")).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, ScheduledReclaim { at, id: id("f1") });
    }

    #[tokio::test]
    async fn schedule_fails_once_receiver_is_gone() {
        let (scheduler, rx) = ChannelScheduler::channel();
        drop(rx);
        let err = scheduler.schedule_at(Utc::now(), id("f1")).await.unwrap_err();
        assert!(err.to_string().contains("f1"));
    }
}
