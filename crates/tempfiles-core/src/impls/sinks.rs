//! EventSink implementations.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{EventKind, FileId, SinkError, TemporaryFile};
use crate::ports::EventSink;

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn notify(&self, _kind: EventKind, _file: &TemporaryFile) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Logs every event at info level. Default sink of `ManagerBuilder`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn notify(&self, kind: EventKind, file: &TemporaryFile) -> Result<(), SinkError> {
        info!(
            event = %kind,
            id = %file.id,
            filename = %file.filename,
            expires_at = %file.expires_at,
            "Temporary file event"
        );
        Ok(())
    }
}

/// Forwards each event to every inner sink.
///
/// All sinks are notified even if an earlier one fails; the first error is
/// returned.
#[derive(Default, Clone)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl EventSink for FanoutEventSink {
    async fn notify(&self, kind: EventKind, file: &TemporaryFile) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.notify(kind, file).await
                && first_error.is_none()
            {
                first_error = Some(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Keeps every event in memory, in order.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(EventKind, FileId)>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<(EventKind, FileId)> {
        self.events.lock().await.clone()
    }

    pub async fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn notify(&self, kind: EventKind, file: &TemporaryFile) -> Result<(), SinkError> {
        self.events.lock().await.push((kind, file.id.clone()));
        Ok(())
    }
}
