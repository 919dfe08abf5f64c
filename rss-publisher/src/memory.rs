use crate::sideloader::numbered_filename;
use crate::traits::{LogSink, MediaStore, PostStore};
use crate::types::{AssetId, LogEntry, PostId, PostRecord, PublisherError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// A post as held by [`InMemoryPostStore`].
#[derive(Debug, Clone)]
pub struct StoredPost {
    pub record: PostRecord,
    pub metadata: HashMap<String, String>,
    pub featured_asset: Option<AssetId>,
}

/// Process-local post store for dry runs and tests.
#[derive(Default)]
pub struct InMemoryPostStore {
    posts: RwLock<BTreeMap<PostId, StoredPost>>,
    next_id: RwLock<i64>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: PostId) -> Option<StoredPost> {
        self.posts.read().await.get(&id).cloned()
    }

    pub async fn all(&self) -> Vec<(PostId, StoredPost)> {
        self.posts
            .read()
            .await
            .iter()
            .map(|(id, post)| (*id, post.clone()))
            .collect()
    }

    async fn with_post<F>(&self, id: PostId, update: F) -> Result<()>
    where
        F: FnOnce(&mut StoredPost) + Send,
    {
        let mut posts = self.posts.write().await;
        let post = posts
            .get_mut(&id)
            .ok_or_else(|| PublisherError::Persistence(format!("post {} not found", id)))?;
        update(post);
        Ok(())
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn find_by_guid(&self, guid: &str) -> Result<Option<PostId>> {
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .find(|(_, post)| post.record.source_guid == guid)
            .map(|(id, _)| *id))
    }

    async fn create(&self, record: &PostRecord) -> Result<PostId> {
        let mut posts = self.posts.write().await;
        if posts.values().any(|p| p.record.source_guid == record.source_guid) {
            return Err(PublisherError::Persistence(format!(
                "guid {} already stored",
                record.source_guid
            )));
        }

        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        let id = PostId(*next_id);
        posts.insert(
            id,
            StoredPost {
                record: record.clone(),
                metadata: HashMap::new(),
                featured_asset: None,
            },
        );
        Ok(id)
    }

    async fn update_slug(&self, id: PostId, slug: &str) -> Result<()> {
        let slug = slug.to_string();
        self.with_post(id, move |post| post.record.slug = slug).await
    }

    async fn set_tags(&self, id: PostId, tags: &[String]) -> Result<()> {
        let tags = tags.to_vec();
        self.with_post(id, move |post| post.record.tags = tags).await
    }

    async fn set_metadata(&self, id: PostId, key: &str, value: &str) -> Result<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.with_post(id, move |post| {
            post.metadata.insert(key, value);
        })
        .await
    }

    async fn slug_exists(&self, slug: &str, except: PostId) -> Result<bool> {
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .any(|(id, post)| *id != except && post.record.slug == slug))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.posts.read().await.len())
    }
}

/// A sideloaded image held by [`InMemoryMediaStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub file_name: String,
    pub owner: PostId,
    pub alt_text: String,
    pub size: usize,
}

#[derive(Default)]
pub struct InMemoryMediaStore {
    assets: RwLock<Vec<StoredAsset>>,
    featured: RwLock<HashMap<PostId, AssetId>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn assets(&self) -> Vec<StoredAsset> {
        self.assets.read().await.clone()
    }

    pub async fn featured_image(&self, post: PostId) -> Option<AssetId> {
        self.featured.read().await.get(&post).copied()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn sideload(
        &self,
        bytes: &[u8],
        filename: &str,
        owner: PostId,
        alt_text: &str,
    ) -> Result<AssetId> {
        let mut assets = self.assets.write().await;

        let taken = |name: &str| assets.iter().any(|a| a.file_name == name);
        let mut file_name = filename.to_string();
        let mut n = 1;
        while taken(&file_name) {
            file_name = numbered_filename(filename, n);
            n += 1;
        }

        assets.push(StoredAsset {
            file_name,
            owner,
            alt_text: alt_text.to_string(),
            size: bytes.len(),
        });
        Ok(AssetId(assets.len() as i64))
    }

    async fn set_featured_image(&self, post: PostId, asset: AssetId) -> Result<()> {
        self.featured.write().await.insert(post, asset);
        Ok(())
    }
}

/// Activity log kept in memory, oldest first.
#[derive(Default)]
pub struct InMemoryLogSink {
    entries: RwLock<Vec<LogEntry>>,
}

impl InMemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl LogSink for InMemoryLogSink {
    async fn append(&self, entry: LogEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
