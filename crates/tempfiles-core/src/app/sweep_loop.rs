//! SweepLoop - periodic モードの定期回収
//!
//! # フロー
//! 1. 起動直後に 1 回 sweep（停止中に溜まった分を回収）
//! 2. 以降 `interval` ごとに sweep
//! 3. shutdown が来たら、実行中の sweep が終わってから抜ける

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::app::LifecycleManager;

/// Handle to a background sweeper.
/// - `request_shutdown()` で次の tick を待たずに止まる
/// - `shutdown_and_join()` で終了まで待てる
pub struct SweepLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SweepLoop {
    pub fn spawn(manager: Arc<LifecycleManager>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            sweep_loop(manager, interval, &mut shutdown_rx).await;
        });
        Self { shutdown_tx, join }
    }

    /// Stop after the sweep in progress, if any.
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn sweep_loop(
    manager: Arc<LifecycleManager>,
    interval: Duration,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        if let Err(e) = manager.sweep().await {
            // root 自体が読めないなど。次の tick で再試行する
            error!(error = %e, "Sweep failed");
        }
    }
    debug!("Sweep loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ManagerBuilder;
    use crate::config::{Config, ReclamationMode};
    use crate::domain::FileData;
    use crate::impls::InMemoryStorage;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn manager(clock: Arc<FixedClock>) -> Arc<LifecycleManager> {
        let config = Config {
            mode: ReclamationMode::Periodic,
            retention_minutes: 1,
            root: PathBuf::from("/data/temp-files"),
            ..Config::default()
        };
        Arc::new(
            ManagerBuilder::new(config)
                .storage(Arc::new(InMemoryStorage::new()))
                .clock(clock)
                .build()
                .unwrap(),
        )
    }

    async fn wait_until_gone(manager: &LifecycleManager, id: &str) -> bool {
        for _ in 0..100 {
            if manager.get(id).await.unwrap().is_none() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn sweeps_on_each_tick() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let manager = manager(clock.clone());
        let sweeper = SweepLoop::spawn(Arc::clone(&manager), Duration::from_millis(10));

        let file = manager.create(b"x", "a.txt", FileData::new(), None).await.unwrap();
        clock.advance(chrono::Duration::minutes(2));

        assert!(wait_until_gone(&manager, file.id.as_str()).await);
        sweeper.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn shutdown_does_not_wait_for_next_tick() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let sweeper = SweepLoop::spawn(manager(clock), Duration::from_secs(3600));

        let joined =
            tokio::time::timeout(Duration::from_secs(1), sweeper.shutdown_and_join()).await;
        assert!(joined.is_ok());
    }
}
