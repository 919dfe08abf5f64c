use crate::traits::LogSink;
use crate::types::{LogEntry, LogKind};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Number of entries the operator view shows.
pub const DISPLAY_WINDOW: usize = 50;

/// Writes pipeline events to the injected sink and mirrors them to tracing.
#[derive(Clone)]
pub struct ActivityLog {
    sink: Arc<dyn LogSink>,
}

impl ActivityLog {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> Arc<dyn LogSink> {
        self.sink.clone()
    }

    pub async fn record(&self, kind: LogKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            LogKind::Info | LogKind::Success => info!(kind = kind.as_str(), "{}", message),
            LogKind::Warning => warn!("{}", message),
            LogKind::Error => error!("{}", message),
        }

        // Sink failures are reported here and never propagated.
        if let Err(e) = self.sink.append(LogEntry::new(kind, message)).await {
            error!("Log sink rejected entry: {}", e);
        }
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.record(LogKind::Info, message).await
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.record(LogKind::Success, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.record(LogKind::Warning, message).await
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.record(LogKind::Error, message).await
    }
}
