use crate::activity::{ActivityLog, DISPLAY_WINDOW};
use crate::publisher::Publisher;
use crate::rss_utils::html;
use crate::types::LogEntry;
use serde::Serialize;
use std::sync::Arc;

/// Answer to an operator action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_html: Option<String>,
}

impl OperatorResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            logs_html: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            logs_html: None,
        }
    }
}

/// Manual actions behind the operator screen and the CLI.
pub struct Operator {
    publisher: Arc<Publisher>,
    log: ActivityLog,
}

impl Operator {
    pub fn new(publisher: Arc<Publisher>) -> Self {
        let log = publisher.activity().clone();
        Self { publisher, log }
    }

    pub async fn trigger_fetch(&self) -> OperatorResponse {
        match self.publisher.run().await {
            Ok(summary) => OperatorResponse::ok(summary.message()),
            Err(e) => OperatorResponse::failed(format!("Fetch failed: {}", e)),
        }
    }

    pub async fn clear_logs(&self) -> OperatorResponse {
        if let Err(e) = self.log.sink().clear().await {
            return OperatorResponse::failed(format!("Could not clear logs: {}", e));
        }
        self.log
            .info("All fetcher activity logs cleared by user.")
            .await;
        OperatorResponse::ok("Activity logs cleared.")
    }

    pub async fn get_logs(&self) -> OperatorResponse {
        match self.log.sink().recent(DISPLAY_WINDOW).await {
            Ok(entries) => OperatorResponse {
                success: true,
                message: format!("{} log entries.", entries.len()),
                logs_html: Some(render_rows(&entries)),
            },
            Err(e) => OperatorResponse::failed(format!("Could not read logs: {}", e)),
        }
    }
}

/// Table rows, newest first. Messages are trusted markup; time and kind are
/// escaped.
pub fn render_rows(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "<tr><td colspan=\"3\">No activity yet.</td></tr>".to_string();
    }

    entries
        .iter()
        .map(|entry| {
            format!(
                "<tr class=\"log-{kind}\"><td>{time}</td><td>{kind}</td><td>{message}</td></tr>",
                kind = html::escape(entry.kind.as_str()),
                time = html::escape(&entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
                message = entry.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
