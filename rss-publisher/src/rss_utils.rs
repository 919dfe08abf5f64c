//! Text, markup and URL helpers shared by the pipeline stages.

/// Markup helpers
pub mod html {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]*>").expect("tag pattern"));
    static RE_BR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)<br\s*/?\s*>").expect("br pattern"));

    /// Removes every tag, keeping the text between them.
    pub fn strip_tags(html: &str) -> String {
        RE_TAGS.replace_all(html, "").into_owned()
    }

    pub fn decode_entities(html: &str) -> String {
        html_escape::decode_html_entities(html).into_owned()
    }

    /// Tag-stripped and entity-decoded.
    pub fn to_plain(html: &str) -> String {
        decode_entities(&strip_tags(html))
    }

    pub fn br_to_newline(html: &str) -> String {
        RE_BR.replace_all(html, "\n").into_owned()
    }

    pub fn escape(text: &str) -> String {
        html_escape::encode_text(text).into_owned()
    }

    pub fn escape_attr(text: &str) -> String {
        html_escape::encode_double_quoted_attribute(text).into_owned()
    }
}

/// Plain-text helpers
pub mod text {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
    static RE_WORD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b[a-zA-Z]+\b").expect("word pattern"));

    /// Keeps the first `max_words` whitespace-separated words; appends
    /// `more` when anything was cut.
    pub fn trim_words(text: &str, max_words: usize, more: &str) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= max_words {
            return words.join(" ");
        }
        format!("{}{}", words[..max_words].join(" "), more)
    }

    /// First `max_words` words without any marker, for prompts.
    pub fn first_words(text: &str, max_words: usize) -> String {
        trim_words(text, max_words, "")
    }

    /// Single-line plain text: tags removed, whitespace collapsed.
    pub fn sanitize_text_field(text: &str) -> String {
        let stripped = super::html::strip_tags(text);
        RE_WS.replace_all(&stripped, " ").trim().to_string()
    }

    /// Removes one layer of wrapping quotes of any common style.
    pub fn strip_wrapping_quotes(text: &str) -> String {
        let trimmed = text.trim();
        let pairs = [('"', '"'), ('\'', '\''), ('\u{201C}', '\u{201D}'), ('\u{2018}', '\u{2019}'), ('`', '`')];
        for (open, close) in pairs {
            if trimmed.chars().count() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
                let inner = &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
                return inner.trim().to_string();
            }
        }
        trimmed.to_string()
    }

    /// URL-safe lowercase hyphenated form. Non-ASCII characters are dropped.
    pub fn sanitize_title(text: &str) -> String {
        let lowered = super::html::to_plain(text).to_lowercase();
        let mut slug = String::with_capacity(lowered.len());
        let mut pending_dash = false;
        for c in lowered.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            } else if c.is_whitespace() || c == '-' || c == '_' || c.is_ascii_punctuation() {
                pending_dash = true;
            }
        }
        slug
    }

    /// Unique lowercase ASCII words of `text`, first occurrence order.
    pub fn ascii_words(text: &str) -> Vec<String> {
        let mut words: Vec<String> = Vec::new();
        for m in RE_WORD.find_iter(text) {
            let word = m.as_str().to_lowercase();
            if !words.contains(&word) {
                words.push(word);
            }
        }
        words
    }

    /// Short unique suffix for generated placeholder titles.
    pub fn unique_suffix() -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        id[..13].to_string()
    }
}

/// URL utilities
pub mod url {
    use once_cell::sync::Lazy;
    use regex::Regex;
    use url::Url;

    static RE_URL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(?:(?:https?|ftp)://|www\.)[a-z0-9\-.]+\.[a-z]{2,}(?:/\S*)?")
            .expect("url pattern")
    });

    pub fn url_pattern() -> &'static Regex {
        &RE_URL
    }

    pub fn starts_with_http(text: &str) -> bool {
        let lowered = text.trim_start().to_ascii_lowercase();
        lowered.starts_with("http://") || lowered.starts_with("https://")
    }

    pub fn contains_url(text: &str) -> bool {
        RE_URL.is_match(text)
    }

    /// The whole string is a single URL.
    pub fn is_bare_url(text: &str) -> bool {
        let trimmed = text.trim();
        starts_with_http(trimmed) && !trimmed.contains(char::is_whitespace)
    }

    /// Lowercased extension of the last path segment, query ignored.
    pub fn path_extension(url_str: &str) -> Option<String> {
        let path = match Url::parse(url_str) {
            Ok(url) => url.path().to_string(),
            Err(_) => url_str.split(['?', '#']).next().unwrap_or("").to_string(),
        };
        let file = path.rsplit('/').next()?;
        let (stem, ext) = file.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn has_image_extension(url_str: &str) -> bool {
        matches!(
            path_extension(url_str).as_deref(),
            Some("jpg" | "jpeg" | "png" | "gif" | "webp")
        )
    }
}

/// Time utilities
pub mod time {
    use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

    /// Site-local and GMT wall clock times of the same instant.
    pub fn site_times(instant: DateTime<Utc>, offset: FixedOffset) -> (NaiveDateTime, NaiveDateTime) {
        (instant.with_timezone(&offset).naive_local(), instant.naive_utc())
    }
}
