use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry as it came out of the source feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeedItem {
    /// Stable feed identifier, the only deduplication key.
    pub guid: String,
    pub title: String,
    pub content_html: String,
    pub link: String,
    /// Best-effort image candidate, empty when nothing was found.
    pub image_url: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKey {
    News,
    Deals,
    Article,
    Demo,
    Mods,
    Meme,
}

impl CategoryKey {
    pub const ALL: [CategoryKey; 6] = [
        CategoryKey::News,
        CategoryKey::Deals,
        CategoryKey::Article,
        CategoryKey::Demo,
        CategoryKey::Mods,
        CategoryKey::Meme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKey::News => "news",
            CategoryKey::Deals => "deals",
            CategoryKey::Article => "article",
            CategoryKey::Demo => "demo",
            CategoryKey::Mods => "mods",
            CategoryKey::Meme => "meme",
        }
    }

    /// Categories set by an explicit title marker. The discount override
    /// never touches these.
    pub fn is_explicit(&self) -> bool {
        matches!(
            self,
            CategoryKey::News | CategoryKey::Article | CategoryKey::Demo | CategoryKey::Mods
        )
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub key: CategoryKey,
    /// Human-readable audit trail of why the key was chosen.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedContent {
    pub working_title: String,
    pub body_html: String,
    /// Fully stripped text, only fed to AI prompts.
    pub plain_text: String,
    pub source_citation_html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(pub i64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub i64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Publish => "publish",
        }
    }
}

/// The artifact handed to the post store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub title: String,
    pub content_html: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub category: CategoryKey,
    pub category_id: i64,
    pub author_id: i64,
    /// Site-local wall clock time of the feed item's publish instant.
    pub published_at_local: NaiveDateTime,
    pub published_at_gmt: NaiveDateTime,
    pub tags: Vec<String>,
    pub slug: String,
    pub source_guid: String,
    pub original_link: String,
    pub featured_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Warning,
    Error,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Success => "success",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Some(LogKind::Info),
            "success" => Some(LogKind::Success),
            "warning" => Some(LogKind::Warning),
            "error" => Some(LogKind::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
    /// May carry markup for embedded links.
    pub message: String,
}

impl LogEntry {
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        }
    }
}

// Object style note:
// The pipeline crate treats everything here as plain values. Storage,
// transport and scheduling live behind traits on the other side, so these
// types never grow behaviour that needs I/O.
