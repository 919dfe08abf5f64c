use crate::types::{CategoryKey, FetchConfig, PublisherError, Result};
use chrono::FixedOffset;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const MIN_ITEM_LIMIT: usize = 1;
pub const MAX_ITEM_LIMIT: usize = 25;

/// Everything one run needs. Built once at the boundary (CLI, tests) and
/// passed down explicitly.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub feed_url: String,
    pub item_limit: usize,
    /// Generative text API key. `None` switches every AI call off.
    pub ai_credential: Option<String>,
    pub primary_model: String,
    pub fallback_model: String,
    pub ai_timeout_seconds: u64,
    /// Sent as the referrer when downloading images.
    pub site_url: String,
    pub author_id: i64,
    pub category_ids: HashMap<CategoryKey, i64>,
    pub discount_keywords: Vec<String>,
    /// Titles with fewer characters than this are sent to AI repair.
    pub min_title_chars: usize,
    pub utc_offset_minutes: i32,
    pub fetch: FetchConfig,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        let category_ids = CategoryKey::ALL
            .iter()
            .enumerate()
            .map(|(i, key)| (*key, i as i64 + 1))
            .collect();

        Self {
            feed_url: String::new(),
            item_limit: 5,
            ai_credential: None,
            primary_model: "gemini-2.5-flash".to_string(),
            fallback_model: "gemini-2.5-flash-lite".to_string(),
            ai_timeout_seconds: 60,
            site_url: "http://localhost".to_string(),
            author_id: 1,
            category_ids,
            discount_keywords: vec![
                "ลดราคา".to_string(),
                "discount".to_string(),
                "% off".to_string(),
            ],
            min_title_chars: 8,
            utc_offset_minutes: 0,
            fetch: FetchConfig::default(),
        }
    }
}

impl PublisherConfig {
    pub fn new(feed_url: impl Into<String>, item_limit: usize) -> Self {
        Self {
            feed_url: feed_url.into(),
            item_limit,
            ..Self::default()
        }
    }

    pub fn with_ai_credential(mut self, credential: impl Into<String>) -> Self {
        let credential = credential.into();
        self.ai_credential = if credential.trim().is_empty() {
            None
        } else {
            Some(credential)
        };
        self
    }

    /// Checks the operator-settable values. Runs before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.feed_url.trim().is_empty() {
            return Err(PublisherError::Validation(
                "RSS Feed URL is missing".to_string(),
            ));
        }

        let parsed = Url::parse(self.feed_url.trim())
            .map_err(|e| PublisherError::Validation(format!("RSS Feed URL is invalid: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host().is_none() {
            return Err(PublisherError::Validation(format!(
                "RSS Feed URL must be an http(s) address: {}",
                self.feed_url
            )));
        }

        if !(MIN_ITEM_LIMIT..=MAX_ITEM_LIMIT).contains(&self.item_limit) {
            return Err(PublisherError::Validation(format!(
                "Item limit must be between {} and {}, got {}",
                MIN_ITEM_LIMIT, MAX_ITEM_LIMIT, self.item_limit
            )));
        }

        if self.primary_model.trim().is_empty() || self.fallback_model.trim().is_empty() {
            return Err(PublisherError::Validation(
                "Both AI model identifiers must be set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn category_id(&self, key: CategoryKey) -> i64 {
        self.category_ids.get(&key).copied().unwrap_or(1)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_seconds)
    }

    pub fn site_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}
