use crate::activity::ActivityLog;
use crate::assembler::{ItemOutcome, PostAssembler};
use crate::config::PublisherConfig;
use crate::llm_adapter::AiSuggestionClient;
use crate::rss_utils::html;
use crate::sideloader::ImageSideloader;
use crate::traits::{AiTextService, FeedSource, ImageDownloader, LogSink, MediaStore, PostStore};
use crate::types::{PostId, Result};
use std::sync::Arc;
use tracing::info;

/// The capabilities a run is wired with.
#[derive(Clone)]
pub struct Capabilities {
    pub feed: Arc<dyn FeedSource>,
    pub posts: Arc<dyn PostStore>,
    pub media: Arc<dyn MediaStore>,
    pub ai: Arc<dyn AiTextService>,
    pub images: Arc<dyn ImageDownloader>,
    pub logs: Arc<dyn LogSink>,
}

/// Counts for one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub created: Vec<PostId>,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn message(&self) -> String {
        if self.created.is_empty() {
            format!(
                "Fetched posts successfully, but no new posts were created (they might already exist or had issues). {} skipped as duplicates, {} failed.",
                self.skipped, self.failed
            )
        } else {
            format!(
                "Fetched posts successfully. {} new posts created, {} skipped as duplicates, {} failed.",
                self.created.len(),
                self.skipped,
                self.failed
            )
        }
    }
}

/// One poll of the configured feed, items processed strictly in order.
pub struct Publisher {
    config: Arc<PublisherConfig>,
    feed: Arc<dyn FeedSource>,
    assembler: PostAssembler,
    log: ActivityLog,
}

impl Publisher {
    pub fn new(config: PublisherConfig, caps: Capabilities) -> Self {
        let config = Arc::new(config);
        let log = ActivityLog::new(caps.logs.clone());
        let ai = AiSuggestionClient::new(caps.ai.clone(), &config);
        let sideloader = ImageSideloader::new(caps.images.clone(), caps.media.clone(), log.clone());
        let assembler = PostAssembler::new(config.clone(), ai, caps.posts.clone(), sideloader, log.clone());

        Self {
            config,
            feed: caps.feed,
            assembler,
            log,
        }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.log
    }

    /// Appends exactly one summary entry, whether the run completes or not.
    pub async fn run(&self) -> Result<RunSummary> {
        if let Err(e) = self.config.validate() {
            self.log
                .error(format!(
                    "RSS Feed URL is missing or invalid in settings. Please configure. ({})",
                    html::escape(&e.to_string())
                ))
                .await;
            return Err(e);
        }

        if self.config.ai_credential.is_none() {
            info!("No AI credential configured, using non-AI fallbacks for titles, excerpts and slugs");
        }

        let feed_url = self.config.feed_url.trim();
        let items = match self.feed.fetch(feed_url, self.config.item_limit).await {
            Ok(items) => items,
            Err(e) => {
                self.log
                    .error(format!(
                        "Error fetching RSS feed {}: {}",
                        html::escape(feed_url),
                        html::escape(&e.to_string())
                    ))
                    .await;
                return Err(e);
            }
        };

        if items.is_empty() {
            let summary = RunSummary::default();
            self.log
                .info(format!("No items found in RSS feed {}.", html::escape(feed_url)))
                .await;
            return Ok(summary);
        }

        self.log
            .info(format!(
                "Successfully fetched {} items from RSS feed {}.",
                items.len(),
                html::escape(feed_url)
            ))
            .await;

        let mut summary = RunSummary {
            fetched: items.len(),
            ..RunSummary::default()
        };

        for item in items.iter().take(self.config.item_limit) {
            match self.assembler.process(item).await {
                ItemOutcome::Created(id, _) => summary.created.push(id),
                ItemOutcome::SkippedDuplicate(_) => summary.skipped += 1,
                ItemOutcome::Failed(_) => summary.failed += 1,
            }
        }

        if summary.created.is_empty() {
            self.log.info(summary.message()).await;
        } else {
            self.log.success(summary.message()).await;
        }
        Ok(summary)
    }
}
