use crate::types::{AiCallError, AssetId, LogEntry, PostId, PostRecord, RawFeedItem, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Source of raw items for one feed URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns at most `limit` items, in feed order.
    async fn fetch(&self, feed_url: &str, limit: usize) -> Result<Vec<RawFeedItem>>;
}

/// Post persistence. The pipeline never touches storage any other way.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_by_guid(&self, guid: &str) -> Result<Option<PostId>>;

    /// Persists the core fields of the record. Tags and metadata are
    /// attached afterwards through `set_tags` / `set_metadata`.
    async fn create(&self, record: &PostRecord) -> Result<PostId>;

    async fn update_slug(&self, id: PostId, slug: &str) -> Result<()>;

    /// Replaces the tag set of the post.
    async fn set_tags(&self, id: PostId, tags: &[String]) -> Result<()>;

    async fn set_metadata(&self, id: PostId, key: &str, value: &str) -> Result<()>;

    /// True when a post other than `except` already uses `slug`.
    async fn slug_exists(&self, slug: &str, except: PostId) -> Result<bool>;

    async fn count(&self) -> Result<usize>;
}

/// Media persistence for sideloaded images.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the bytes under a name derived from `filename` that does not
    /// clash with existing files, and registers them as an asset of `owner`.
    async fn sideload(
        &self,
        bytes: &[u8],
        filename: &str,
        owner: PostId,
        alt_text: &str,
    ) -> Result<AssetId>;

    async fn set_featured_image(&self, post: PostId, asset: AssetId) -> Result<()>;
}

/// Generative text backend.
#[async_trait]
pub trait AiTextService: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        credential: &str,
        timeout: Duration,
    ) -> std::result::Result<String, AiCallError>;
}

/// Raw image bytes for a URL.
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Append-only activity log.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append(&self, entry: LogEntry) -> Result<()>;

    /// Most recent entries first.
    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>>;

    async fn clear(&self) -> Result<()>;
}
