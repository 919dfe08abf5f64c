mod common;

use chrono::{TimeZone, Utc};
use common::{
    big_launch, config, init_tracing, item, CannedImageDownloader, Harness, ScriptedAiService,
    StaticFeedSource,
};
use rss_publisher::operator::render_rows;
use rss_publisher::traits::LogSink;
use rss_publisher::types::*;
use rss_publisher::Operator;

#[tokio::test]
async fn test_trigger_fetch_reports_summary() -> Result<()> {
    init_tracing();
    let harness = Harness::new(config(), vec![big_launch()]);
    let operator = Operator::new(harness.publisher.clone());

    let response = operator.trigger_fetch().await;

    assert!(response.success);
    assert!(response.message.contains("1 new posts created"));
    assert_eq!(response.logs_html, None);
    Ok(())
}

#[tokio::test]
async fn test_trigger_fetch_with_bad_settings_fails() -> Result<()> {
    init_tracing();
    let mut cfg = config();
    cfg.feed_url = String::new();
    let harness = Harness::new(cfg, vec![big_launch()]);
    let operator = Operator::new(harness.publisher.clone());

    let response = operator.trigger_fetch().await;

    assert!(!response.success);
    assert!(response.message.contains("RSS Feed URL is missing"));
    Ok(())
}

#[tokio::test]
async fn test_clear_logs_leaves_one_entry() -> Result<()> {
    init_tracing();
    let harness = Harness::new(config(), vec![big_launch()]);
    let operator = Operator::new(harness.publisher.clone());
    operator.trigger_fetch().await;
    assert!(harness.logs.entries().await.len() > 1);

    let response = operator.clear_logs().await;

    assert!(response.success);
    let entries = harness.logs.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LogKind::Info);
    assert_eq!(entries[0].message, "All fetcher activity logs cleared by user.");
    Ok(())
}

#[tokio::test]
async fn test_get_logs_shows_newest_fifty() -> Result<()> {
    init_tracing();
    let harness = Harness::new(config(), Vec::new());
    for i in 0..60 {
        harness
            .logs
            .append(LogEntry::new(LogKind::Info, format!("entry {}", i)))
            .await?;
    }
    let operator = Operator::new(harness.publisher.clone());

    let response = operator.get_logs().await;
    let html = response.logs_html.expect("rows rendered");

    assert!(response.success);
    assert_eq!(html.matches("<tr").count(), 50);
    assert!(html.starts_with("<tr class=\"log-info\">"));
    assert!(html.lines().next().unwrap().contains("entry 59"));
    assert!(!html.contains("entry 9<"));
    Ok(())
}

#[tokio::test]
async fn test_feed_image_urls_are_escaped_in_log_rows() -> Result<()> {
    init_tracing();
    let mut broken = big_launch();
    broken.image_url = "https://cdn.ex.com/<img src=x onerror=alert(1)>.jpg".to_string();
    let mut not_http = item("g2", "[News] Second", "Second story<br>More", "https://ex.com/2");
    not_http.image_url = "<script>alert(1)</script>".to_string();
    let harness = Harness::build(
        config(),
        StaticFeedSource::new(vec![broken, not_http]),
        ScriptedAiService::default(),
        CannedImageDownloader::failing(),
    );
    let operator = Operator::new(harness.publisher.clone());
    operator.trigger_fetch().await;

    let html = operator.get_logs().await.logs_html.expect("rows rendered");

    assert!(html.contains("Failed to download image from"));
    assert!(html.contains("Skipping featured image"));
    assert!(!html.contains("<img"));
    assert!(!html.contains("<script"));
    assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(html.contains("&lt;script&gt;"));
    Ok(())
}

#[test]
fn test_rows_keep_message_markup() {
    init_tracing();
    let entry = LogEntry {
        timestamp: Utc.with_ymd_and_hms(2025, 10, 6, 10, 0, 0).unwrap(),
        kind: LogKind::Success,
        message: "Created post ID 1: <a href=\"https://ex.com/1\">Big Launch</a>".to_string(),
    };

    let html = render_rows(&[entry]);

    assert_eq!(
        html,
        "<tr class=\"log-success\"><td>2025-10-06 10:00:00</td><td>success</td><td>Created post ID 1: <a href=\"https://ex.com/1\">Big Launch</a></td></tr>"
    );
    assert!(render_rows(&[]).contains("No activity yet."));
}
