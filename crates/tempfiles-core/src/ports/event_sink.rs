//! EventSink port - ライフサイクルイベント通知の抽象化
//!
//! # 実装
//! - `impls::sinks` に NoopEventSink / TracingEventSink / FanoutEventSink /
//!   RecordingEventSink

use async_trait::async_trait;

use crate::domain::{EventKind, SinkError, TemporaryFile};

/// EventSink はライフサイクルイベントを受け取る
///
/// # 設計原則
/// - manager はストレージ操作が成功した「後」にだけ呼ぶ
/// - fire-and-forget: エラーは manager がログに出すだけで、操作は巻き戻さない
/// - リトライするかどうかは実装側の責任
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn notify(&self, kind: EventKind, file: &TemporaryFile) -> Result<(), SinkError>;
}
