#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rss_publisher::memory::{InMemoryLogSink, InMemoryMediaStore, InMemoryPostStore};
use rss_publisher::traits::{AiTextService, FeedSource, ImageDownloader, PostStore};
use rss_publisher::types::*;
use rss_publisher::{Capabilities, Publisher, PublisherConfig};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FEED_URL: &str = "https://feeds.example.com/rss";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn item(guid: &str, title: &str, content_html: &str, link: &str) -> RawFeedItem {
    RawFeedItem {
        guid: guid.to_string(),
        title: title.to_string(),
        content_html: content_html.to_string(),
        link: link.to_string(),
        image_url: String::new(),
        published_at: Utc.with_ymd_and_hms(2025, 10, 6, 10, 0, 0).unwrap(),
    }
}

pub fn big_launch() -> RawFeedItem {
    item(
        "g1",
        "[News] Big Launch",
        "Big Launch<br>Details here.",
        "https://ex.com/1",
    )
}

/// Replays canned answers in order and records the model of every call.
#[derive(Default)]
pub struct ScriptedAiService {
    responses: Mutex<VecDeque<std::result::Result<String, AiCallError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedAiService {
    pub fn new(responses: Vec<std::result::Result<String, AiCallError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl AiTextService for ScriptedAiService {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        _credential: &str,
        _timeout: Duration,
    ) -> std::result::Result<String, AiCallError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiCallError::Transport("no scripted response".to_string())))
    }
}

/// Serves a fixed item list, or a fixed error.
pub struct StaticFeedSource {
    items: Vec<RawFeedItem>,
    fail: bool,
    fetches: Mutex<usize>,
}

impl StaticFeedSource {
    pub fn new(items: Vec<RawFeedItem>) -> Self {
        Self {
            items,
            fail: false,
            fetches: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            items: Vec::new(),
            fail: true,
            fetches: Mutex::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    async fn fetch(&self, _feed_url: &str, limit: usize) -> Result<Vec<RawFeedItem>> {
        *self.fetches.lock().unwrap() += 1;
        if self.fail {
            return Err(PublisherError::General("connection refused".to_string()));
        }
        Ok(self.items.iter().take(limit).cloned().collect())
    }
}

pub struct CannedImageDownloader {
    bytes: Option<Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl CannedImageDownloader {
    pub fn ok() -> Self {
        Self {
            bytes: Some(vec![0x89, b'P', b'N', b'G']),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            bytes: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageDownloader for CannedImageDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.requested.lock().unwrap().push(url.to_string());
        self.bytes
            .clone()
            .ok_or_else(|| PublisherError::General("image download returned HTTP 404".to_string()))
    }
}

/// In-memory post store that refuses to create one guid.
pub struct RefusingPostStore {
    inner: InMemoryPostStore,
    refused_guid: String,
}

impl RefusingPostStore {
    pub fn new(refused_guid: &str) -> Self {
        Self {
            inner: InMemoryPostStore::new(),
            refused_guid: refused_guid.to_string(),
        }
    }
}

#[async_trait]
impl PostStore for RefusingPostStore {
    async fn find_by_guid(&self, guid: &str) -> Result<Option<PostId>> {
        self.inner.find_by_guid(guid).await
    }

    async fn create(&self, record: &PostRecord) -> Result<PostId> {
        if record.source_guid == self.refused_guid {
            return Err(PublisherError::Persistence("disk full".to_string()));
        }
        self.inner.create(record).await
    }

    async fn update_slug(&self, id: PostId, slug: &str) -> Result<()> {
        self.inner.update_slug(id, slug).await
    }

    async fn set_tags(&self, id: PostId, tags: &[String]) -> Result<()> {
        self.inner.set_tags(id, tags).await
    }

    async fn set_metadata(&self, id: PostId, key: &str, value: &str) -> Result<()> {
        self.inner.set_metadata(id, key, value).await
    }

    async fn slug_exists(&self, slug: &str, except: PostId) -> Result<bool> {
        self.inner.slug_exists(slug, except).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

pub fn config() -> PublisherConfig {
    PublisherConfig::new(FEED_URL, 5)
}

/// A publisher wired to in-memory stores, with handles kept for assertions.
pub struct Harness {
    pub publisher: Arc<Publisher>,
    pub feed: Arc<StaticFeedSource>,
    pub posts: Arc<InMemoryPostStore>,
    pub media: Arc<InMemoryMediaStore>,
    pub logs: Arc<InMemoryLogSink>,
    pub ai: Arc<ScriptedAiService>,
    pub images: Arc<CannedImageDownloader>,
}

impl Harness {
    pub fn new(config: PublisherConfig, items: Vec<RawFeedItem>) -> Self {
        Self::build(
            config,
            StaticFeedSource::new(items),
            ScriptedAiService::default(),
            CannedImageDownloader::ok(),
        )
    }

    pub fn build(
        config: PublisherConfig,
        feed: StaticFeedSource,
        ai: ScriptedAiService,
        images: CannedImageDownloader,
    ) -> Self {
        let feed = Arc::new(feed);
        let posts = Arc::new(InMemoryPostStore::new());
        let media = Arc::new(InMemoryMediaStore::new());
        let logs = Arc::new(InMemoryLogSink::new());
        let ai = Arc::new(ai);
        let images = Arc::new(images);

        let caps = Capabilities {
            feed: feed.clone(),
            posts: posts.clone(),
            media: media.clone(),
            ai: ai.clone(),
            images: images.clone(),
            logs: logs.clone(),
        };

        Self {
            publisher: Arc::new(Publisher::new(config, caps)),
            feed,
            posts,
            media,
            logs,
            ai,
            images,
        }
    }

    pub async fn log_messages(&self) -> Vec<String> {
        self.logs
            .entries()
            .await
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    pub async fn summary_count(&self) -> usize {
        self.log_messages()
            .await
            .iter()
            .filter(|m| {
                m.starts_with("Fetched posts successfully")
                    || m.starts_with("RSS Feed URL is missing or invalid")
                    || m.starts_with("Error fetching RSS feed")
                    || m.starts_with("No items found")
            })
            .count()
    }
}
