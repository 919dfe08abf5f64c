use crate::rss_utils::url as url_utils;
use crate::types::{PublisherError, RawFeedItem, Result};
use chrono::Utc;
use feed_rs::model::{Entry, MediaObject};
use feed_rs::parser;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info};

static RE_IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("img pattern")
});

pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses an RSS or Atom document into at most `limit` raw items, in
    /// document order. Entries repeating a guid already seen are dropped.
    pub fn parse_items(&self, content: &str, limit: usize) -> Result<Vec<RawFeedItem>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| PublisherError::Parse(format!("Failed to parse feed: {}", e)))?;

        let mut seen_guids = HashSet::new();
        let mut items = Vec::new();

        for entry in feed.entries {
            if items.len() >= limit {
                break;
            }
            let Some(item) = self.parse_entry(entry) else {
                continue;
            };
            if !seen_guids.insert(item.guid.clone()) {
                debug!("Skipping repeated entry with GUID: {}", item.guid);
                continue;
            }
            items.push(item);
        }

        info!("Parsed feed with {} entries", items.len());
        Ok(items)
    }

    fn parse_entry(&self, entry: Entry) -> Option<RawFeedItem> {
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();

        let guid = if entry.id.trim().is_empty() {
            link.clone()
        } else {
            entry.id.trim().to_string()
        };
        if guid.is_empty() {
            debug!("Skipping entry without id or link");
            return None;
        }

        let title = entry.title.map(|t| t.content).unwrap_or_default();

        // content:encoded wins over the description.
        let content_html = entry
            .content
            .and_then(|c| c.body)
            .filter(|body| !body.trim().is_empty())
            .or_else(|| entry.summary.map(|s| s.content))
            .unwrap_or_default();

        let published_at = entry.published.or(entry.updated).unwrap_or_else(Utc::now);

        let image_url = discover_image(&entry.media, &content_html).unwrap_or_default();

        Some(RawFeedItem {
            guid,
            title,
            content_html,
            link,
            image_url,
            published_at,
        })
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Image candidate for an entry: media content typed or named as an image,
/// then an enclosure with an image extension, then a media thumbnail, then
/// the first `<img>` in the content.
pub fn discover_image(media: &[MediaObject], content_html: &str) -> Option<String> {
    let contents = media.iter().flat_map(|m| m.content.iter());

    let typed = contents.clone().find_map(|c| {
        let url = c.url.as_ref()?.to_string();
        let is_image_type = c
            .content_type
            .as_ref()
            .map(|t| t.essence_str().starts_with("image/"))
            .unwrap_or(false);
        is_image_type.then_some(url)
    });
    if typed.is_some() {
        return typed;
    }

    // Enclosures arrive as untyped or generically typed media content.
    let by_extension = contents.clone().find_map(|c| {
        let url = c.url.as_ref()?.to_string();
        url_utils::has_image_extension(&url).then_some(url)
    });
    if by_extension.is_some() {
        return by_extension;
    }

    let thumbnail = media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.trim().to_string())
        .find(|uri| !uri.is_empty());
    if thumbnail.is_some() {
        return thumbnail;
    }

    first_img_src(content_html)
}

pub fn first_img_src(content_html: &str) -> Option<String> {
    RE_IMG_SRC
        .captures(content_html)
        .map(|caps| html_escape::decode_html_entities(caps[1].trim()).into_owned())
        .filter(|src| !src.is_empty())
}
