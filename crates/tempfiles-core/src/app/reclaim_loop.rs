//! ReclaimLoop - queued モードの遅延削除
//!
//! `ChannelScheduler` が送ってきた予約を min-heap に積み、
//! 先頭の `at` まで眠ってから `LifecycleManager::delete` を呼ぶ。
//!
//! # 注意
//! - 削除時にロックされていたら何もしない（再予約もしない）。
//!   ロック解除後の回収は sweep に任せる
//! - 予約はメモリ上のみ。プロセスが落ちたら失われる

use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{DeleteOutcome, LifecycleManager};
use crate::impls::ScheduledReclaim;

pub struct ReclaimLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReclaimLoop {
    /// Start draining `rx`, the receiver returned by `ChannelScheduler::channel`.
    pub fn spawn(
        manager: Arc<LifecycleManager>,
        rx: mpsc::UnboundedReceiver<ScheduledReclaim>,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            reclaim_loop(manager, rx, &mut shutdown_rx).await;
        });
        Self { shutdown_tx, join }
    }

    /// Stop waiting; reclaims not yet due are dropped.
    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn reclaim_loop(
    manager: Arc<LifecycleManager>,
    mut rx: mpsc::UnboundedReceiver<ScheduledReclaim>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    let mut pending = BinaryHeap::new();
    let mut open = true;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        if !open && pending.is_empty() {
            break;
        }

        let wait = pending.peek().map(|next: &ScheduledReclaim| {
            (next.at - manager.now()).to_std().unwrap_or(Duration::ZERO)
        });

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            received = rx.recv(), if open => {
                match received {
                    Some(reclaim) => {
                        debug!(id = %reclaim.id, at = %reclaim.at, "Reclaim scheduled");
                        pending.push(reclaim);
                    }
                    None => open = false,
                }
                continue;
            }
            _ = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => {}
        }

        let now = manager.now();
        while pending.peek().is_some_and(|next| next.at <= now) {
            let Some(due) = pending.pop() else { break };
            match manager.delete(due.id.as_str()).await {
                Ok(DeleteOutcome::Deleted) => {}
                Ok(DeleteOutcome::Locked) => {
                    info!(id = %due.id, "File locked at expiry, leaving it for sweep");
                }
                Ok(DeleteOutcome::Missing) => debug!(id = %due.id, "Already gone"),
                Err(e) => warn!(id = %due.id, error = %e, "Scheduled reclaim failed"),
            }
        }
    }
    debug!(dropped = pending.len(), "Reclaim loop stopped");
}
