//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **LocalDiskStorage**: リファレンスのストレージ（tokio::fs）
//! - **InMemoryStorage**: テスト・組み込み用のストレージ
//! - **ChannelScheduler**: queued モード用のプロセス内スケジューラ
//! - **sinks**: Noop / Tracing / Fanout / Recording の EventSink

pub mod channel_scheduler;
pub mod inmem_storage;
pub mod local_disk;
pub mod sinks;

pub use self::channel_scheduler::{ChannelScheduler, ScheduledReclaim};
pub use self::inmem_storage::InMemoryStorage;
pub use self::local_disk::LocalDiskStorage;
pub use self::sinks::{FanoutEventSink, NoopEventSink, RecordingEventSink, TracingEventSink};
