use crate::traits::FeedSource;
use crate::types::{FetchConfig, RawFeedItem, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use tracing::info;

/// Feed source backed by an HTTP download and feed-rs parsing.
pub struct RssFeedSource {
    fetcher: Fetcher,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(fetch_config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(fetch_config)?,
            parser: FeedParser::new(),
        })
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch(&self, feed_url: &str, limit: usize) -> Result<Vec<RawFeedItem>> {
        info!("Pulling RSS feed: {}", feed_url);

        let fetch_result = self.fetcher.fetch_feed(feed_url).await?;
        let items = self.parser.parse_items(&fetch_result.content, limit)?;

        info!("Pulled {} items from RSS feed {}", items.len(), feed_url);
        Ok(items)
    }
}
