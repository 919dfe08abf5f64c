pub use interfaces::defs::{
    AiSuggestion, AssetId, CategoryAssignment, CategoryKey, LogEntry, LogKind, NormalizedContent,
    PostId, PostRecord, PostStatus, RawFeedItem,
};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub follow_redirects: bool,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "RSS-Publisher/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_feed_size_mb: 10,
            follow_redirects: true,
            max_redirects: 5,
        }
    }
}

/// Raw result of one feed download.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub http_status: Option<u16>,
    pub response_time_ms: u64,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Post store error: {0}")]
    Persistence(String),

    #[error("Rate limited by {target}")]
    RateLimited { target: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, PublisherError>;

/// Failure of a single call to the generative text service. Never leaves
/// the AI client; every variant degrades to the non-AI fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiCallError {
    #[error("rate limited")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

