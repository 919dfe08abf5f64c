use crate::rss_utils::{html, url};
use crate::types::NormalizedContent;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// Extra characters of content inspected beyond the title length when
/// looking for a duplicated title.
const TITLE_SLACK_CHARS: usize = 20;

const ALLOWED_TAGS: [&str; 8] = ["a", "p", "h1", "h2", "h3", "h4", "h5", "h6"];

static RE_ANY_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(/?)([a-z][a-z0-9]*)?[^>]*>").expect("tag pattern")
});
static RE_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("href pattern")
});
static RE_PROTECTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>.*?</a\s*>|<[^>]*>").expect("protected pattern"));
static RE_MANY_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("newline pattern"));

/// Turns raw item HTML into the stored body and the prompt text.
pub fn normalize(raw_html: &str, working_title: &str, link: &str) -> NormalizedContent {
    normalize_with_source_title(raw_html, working_title, working_title, link)
}

/// Like [`normalize`], but the duplicated title is looked for as
/// `source_title`, the title line before category markers were removed.
pub fn normalize_with_source_title(
    raw_html: &str,
    source_title: &str,
    working_title: &str,
    link: &str,
) -> NormalizedContent {
    let content = match remove_duplicate_title(raw_html, source_title)
        .or_else(|| remove_duplicate_title(raw_html, working_title))
    {
        Some(rest) => {
            debug!("Removed duplicate title \"{}\" from content", source_title);
            rest
        }
        None => raw_html.to_string(),
    };

    let content = html::br_to_newline(&content.replace("\r\n", "\n"));

    let plain_text = collapse_newlines(&html::to_plain(&content)).trim().to_string();

    let body = collapse_newlines(&keep_allowed_tags(&content));
    let body = autolink(body.trim());

    let source_citation_html = source_citation(link);
    let body_html = match (body.is_empty(), source_citation_html.is_empty()) {
        (_, true) => body,
        (true, false) => source_citation_html.clone(),
        (false, false) => format!("{}\n\n{}", body, source_citation_html),
    };

    NormalizedContent {
        working_title: working_title.to_string(),
        body_html,
        plain_text,
        source_citation_html,
    }
}

/// When the cleaned start of `raw` repeats the cleaned title
/// (case-insensitive), returns `raw` without that many leading characters.
pub fn remove_duplicate_title(raw: &str, title: &str) -> Option<String> {
    let clean_title = html::to_plain(title);
    if clean_title.is_empty() {
        return None;
    }

    let title_len = clean_title.chars().count();
    let prefix: String = raw.chars().take(title_len + TITLE_SLACK_CHARS).collect();
    let clean_prefix = html::to_plain(&prefix);

    if clean_prefix.to_lowercase().starts_with(&clean_title.to_lowercase()) {
        Some(raw.chars().skip(title_len).collect())
    } else {
        None
    }
}

/// Three or more consecutive newlines become one blank line.
pub fn collapse_newlines(text: &str) -> String {
    RE_MANY_NEWLINES.replace_all(text, "\n\n").into_owned()
}

/// Strips every tag outside the allow-list. Kept tags lose their
/// attributes, except a safe `href` on anchors.
pub fn keep_allowed_tags(html_text: &str) -> String {
    RE_ANY_TAG
        .replace_all(html_text, |caps: &Captures| {
            let closing = !caps[1].is_empty();
            let name = caps
                .get(2)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default();

            if !ALLOWED_TAGS.contains(&name.as_str()) {
                return String::new();
            }
            if closing {
                return format!("</{}>", name);
            }
            if name != "a" {
                return format!("<{}>", name);
            }

            match anchor_href(&caps[0]) {
                Some(href) => anchor_open(&href),
                None => "<a>".to_string(),
            }
        })
        .into_owned()
}

/// Wraps bare URLs outside existing anchors and tags. Running it on its
/// own output changes nothing.
pub fn autolink(html_text: &str) -> String {
    let mut out = String::with_capacity(html_text.len());
    let mut cursor = 0;
    for protected in RE_PROTECTED.find_iter(html_text) {
        out.push_str(&link_text(&html_text[cursor..protected.start()]));
        out.push_str(protected.as_str());
        cursor = protected.end();
    }
    out.push_str(&link_text(&html_text[cursor..]));
    out
}

pub fn source_citation(link: &str) -> String {
    let link = link.trim();
    if !url::starts_with_http(link) {
        return String::new();
    }
    format!("Source: {}Source</a>", anchor_open(link))
}

fn link_text(text: &str) -> String {
    url::url_pattern()
        .replace_all(text, |caps: &Captures| {
            let matched = &caps[0];
            let shown = matched.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'', '"']);
            let trailing = &matched[shown.len()..];

            let mut target = html::decode_entities(shown);
            if target.to_ascii_lowercase().starts_with("www.") {
                target = format!("http://{}", target);
            }
            format!("{}{}</a>{}", anchor_open(&target), shown, trailing)
        })
        .into_owned()
}

fn anchor_open(href: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
        html::escape_attr(href)
    )
}

fn anchor_href(tag: &str) -> Option<String> {
    let caps = RE_HREF.captures(tag)?;
    let value = caps.get(1).or(caps.get(2)).or(caps.get(3))?.as_str();
    let href = html::decode_entities(value.trim());
    let lowered = href.to_ascii_lowercase();
    let safe = lowered.starts_with("http://")
        || lowered.starts_with("https://")
        || lowered.starts_with("ftp://")
        || lowered.starts_with("mailto:")
        || lowered.starts_with('/')
        || lowered.starts_with('#');
    if safe {
        Some(href)
    } else {
        None
    }
}
