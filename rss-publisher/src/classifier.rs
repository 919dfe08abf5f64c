use crate::rss_utils::{html, url};
use crate::types::{CategoryAssignment, CategoryKey, RawFeedItem};
use tracing::debug;

/// Title markers, checked in this order after the URL rule.
const MARKERS: [(&str, CategoryKey); 4] = [
    ("[news]", CategoryKey::News),
    ("[article]", CategoryKey::Article),
    ("[demo]", CategoryKey::Demo),
    ("[mods]", CategoryKey::Mods),
];

/// Outcome of classifying one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub working_title: String,
    /// Title text as it appears in the content, markers included. Empty
    /// when the title was discarded.
    pub source_title: String,
    pub category: CategoryAssignment,
}

/// Derives the working title and category from lexical markers.
pub struct TitleClassifier {
    discount_keywords: Vec<String>,
}

impl TitleClassifier {
    pub fn new(discount_keywords: &[String]) -> Self {
        Self {
            discount_keywords: discount_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn classify(&self, item: &RawFeedItem) -> Classification {
        let content = html::br_to_newline(&item.content_html);
        let first_line = content.split('\n').next().unwrap_or("");
        let candidate = html::to_plain(first_line).trim().to_string();

        let mut working_title = if candidate.is_empty() {
            html::to_plain(&item.title).trim().to_string()
        } else {
            candidate
        };

        let mut source_title = working_title.clone();
        let body_text = html::to_plain(&content);
        let feed_title = item.title.to_ascii_lowercase();

        let (key, mut reason) = if url::starts_with_http(&working_title)
            || url::starts_with_http(&body_text)
        {
            if url::is_bare_url(&working_title) {
                working_title.clear();
                source_title.clear();
                (CategoryKey::Deals, "title is a link; title discarded".to_string())
            } else {
                (CategoryKey::Deals, "title or body starts with a link".to_string())
            }
        } else {
            let lowered = working_title.to_ascii_lowercase();
            let hit = MARKERS
                .iter()
                .find(|(marker, _)| lowered.contains(marker) || feed_title.contains(marker));
            match hit {
                Some((marker, key)) => {
                    working_title = remove_marker(&working_title, marker);
                    (*key, format!("marker {} in title", marker))
                }
                None => (CategoryKey::Meme, "no marker matched".to_string()),
            }
        };

        let mut key = key;
        if !key.is_explicit() {
            let haystack = format!("{}\n{}\n{}", working_title, item.title, body_text).to_lowercase();
            if let Some(keyword) = self.discount_keywords.iter().find(|k| haystack.contains(k.as_str())) {
                if key != CategoryKey::Deals {
                    reason = format!("discount keyword \"{}\" overrides {}", keyword, reason);
                } else {
                    reason = format!("{}; discount keyword \"{}\"", reason, keyword);
                }
                key = CategoryKey::Deals;
            }
        }

        debug!(category = key.as_str(), %reason, "classified feed item {}", item.guid);

        Classification {
            working_title,
            source_title,
            category: CategoryAssignment { key, reason },
        }
    }
}

/// Case-insensitive removal of every occurrence of `marker` (given lowercase).
fn remove_marker(title: &str, marker: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with `title`.
    let lowered = title.to_ascii_lowercase();
    let mut out = String::with_capacity(title.len());
    let mut cursor = 0;
    while let Some(pos) = lowered[cursor..].find(marker) {
        out.push_str(&title[cursor..cursor + pos]);
        cursor += pos + marker.len();
    }
    out.push_str(&title[cursor..]);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
