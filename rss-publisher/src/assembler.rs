use crate::activity::ActivityLog;
use crate::classifier::TitleClassifier;
use crate::config::PublisherConfig;
use crate::llm_adapter::AiSuggestionClient;
use crate::normalizer;
use crate::rss_utils::{html, text, time, url};
use crate::sideloader::ImageSideloader;
use crate::traits::PostStore;
use crate::types::{AiSuggestion, PostId, PostRecord, PostStatus, RawFeedItem, Result};
use std::sync::Arc;
use tracing::{debug, warn};

pub const MAX_FALLBACK_TITLE_WORDS: usize = 20;
pub const EXCERPT_WORDS: usize = 55;
pub const META_GUID: &str = "_rss_guid";
pub const META_ORIGINAL_LINK: &str = "_rss_original_link";

const PLACEHOLDER_TITLES: [&str; 3] = ["untitled", "no title", "(no title)"];

/// What happened to one feed item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Created(PostId, PostRecord),
    SkippedDuplicate(PostId),
    Failed(String),
}

/// Turns one raw feed item into a stored post.
pub struct PostAssembler {
    config: Arc<PublisherConfig>,
    classifier: TitleClassifier,
    ai: AiSuggestionClient,
    posts: Arc<dyn PostStore>,
    sideloader: ImageSideloader,
    log: ActivityLog,
}

impl PostAssembler {
    pub fn new(
        config: Arc<PublisherConfig>,
        ai: AiSuggestionClient,
        posts: Arc<dyn PostStore>,
        sideloader: ImageSideloader,
        log: ActivityLog,
    ) -> Self {
        Self {
            classifier: TitleClassifier::new(&config.discount_keywords),
            config,
            ai,
            posts,
            sideloader,
            log,
        }
    }

    pub async fn process(&self, item: &RawFeedItem) -> ItemOutcome {
        match self.posts.find_by_guid(&item.guid).await {
            Ok(Some(existing)) => {
                self.log
                    .info(format!(
                        "RSS item GUID {} already exists as post ID {}. Skipping.",
                        html::escape(&item.guid),
                        existing
                    ))
                    .await;
                return ItemOutcome::SkippedDuplicate(existing);
            }
            Ok(None) => {}
            Err(e) => {
                let detail = format!("duplicate check failed for GUID {}: {}", item.guid, e);
                self.log.error(html::escape(&detail)).await;
                return ItemOutcome::Failed(detail);
            }
        }

        let classification = self.classifier.classify(item);
        let working_title = classification.working_title;
        let category = classification.category;
        let content = normalizer::normalize_with_source_title(
            &item.content_html,
            &classification.source_title,
            &working_title,
            &item.link,
        );

        let mut suggestion = AiSuggestion::default();
        if self.ai.is_enabled() && title_is_unusable(&working_title, self.config.min_title_chars) {
            let original = html::to_plain(&item.title);
            suggestion.title = self.ai.repair_title(original.trim(), &content.plain_text).await;
            if suggestion.title.is_none() {
                self.log
                    .warning(format!(
                        "AI title repair unavailable for GUID {}; using fallback title.",
                        html::escape(&item.guid)
                    ))
                    .await;
            }
        }
        let title = final_title(suggestion.title.as_deref(), &working_title);

        if self.ai.is_enabled() {
            suggestion.excerpt = self.ai.summarize(&content.plain_text).await;
            if let Some(slug_tags) = self.ai.suggest_slug_and_tags(&title, &content.plain_text).await {
                suggestion.slug = Some(slug_tags.slug);
                suggestion.tags = (!slug_tags.tags.is_empty()).then_some(slug_tags.tags);
            }
        }

        let excerpt = suggestion
            .excerpt
            .clone()
            .unwrap_or_else(|| text::trim_words(&content.plain_text, EXCERPT_WORDS, "..."));
        let tags = suggestion.tags.clone().unwrap_or_else(|| fallback_tags(&title));

        let (published_at_local, published_at_gmt) =
            time::site_times(item.published_at, self.config.site_offset());
        let image_url = item.image_url.trim();

        let mut record = PostRecord {
            title: title.clone(),
            content_html: content.body_html,
            excerpt,
            status: PostStatus::Publish,
            category: category.key,
            category_id: self.config.category_id(category.key),
            author_id: self.config.author_id,
            published_at_local,
            published_at_gmt,
            tags: Vec::new(),
            slug: String::new(),
            source_guid: item.guid.clone(),
            original_link: item.link.clone(),
            featured_image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
        };

        let post_id = match self.posts.create(&record).await {
            Ok(id) => id,
            Err(e) => {
                let detail = format!("Failed to create post for RSS item GUID {}: {}", item.guid, e);
                self.log.error(html::escape(&detail)).await;
                return ItemOutcome::Failed(detail);
            }
        };

        let base_slug = suggestion
            .slug
            .clone()
            .unwrap_or_else(|| fallback_slug(post_id, &tags, &title));
        match self.assign_slug(post_id, &base_slug).await {
            Ok(slug) => record.slug = slug,
            Err(e) => {
                self.log
                    .warning(format!(
                        "Could not set slug for post ID {}: {}",
                        post_id,
                        html::escape(&e.to_string())
                    ))
                    .await
            }
        }

        match self.posts.set_tags(post_id, &tags).await {
            Ok(()) => record.tags = tags,
            Err(e) => {
                self.log
                    .warning(format!(
                        "Could not set tags for post ID {}: {}",
                        post_id,
                        html::escape(&e.to_string())
                    ))
                    .await
            }
        }

        for (key, value) in [(META_GUID, &item.guid), (META_ORIGINAL_LINK, &item.link)] {
            if let Err(e) = self.posts.set_metadata(post_id, key, value).await {
                warn!("Could not store {} for post {}: {}", key, post_id, e);
            }
        }

        if let Some(image_url) = &record.featured_image_url {
            self.sideloader.attach(image_url, post_id, &record.title).await;
        }

        self.log
            .success(format!(
                "Created post ID {}: <a href=\"{}\">{}</a> in category {} ({}).",
                post_id,
                html::escape_attr(&item.link),
                html::escape(&record.title),
                category.key,
                html::escape(&category.reason)
            ))
            .await;

        ItemOutcome::Created(post_id, record)
    }

    async fn assign_slug(&self, post_id: PostId, base: &str) -> Result<String> {
        let slug = unique_slug(self.posts.as_ref(), base, post_id).await?;
        self.posts.update_slug(post_id, &slug).await?;
        debug!("Post {} slug set to {}", post_id, slug);
        Ok(slug)
    }
}

/// Titles that get sent to AI repair.
pub fn title_is_unusable(title: &str, min_chars: usize) -> bool {
    let trimmed = title.trim();
    if trimmed.is_empty() || url::contains_url(trimmed) {
        return true;
    }
    if trimmed.chars().count() < min_chars {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    PLACEHOLDER_TITLES.contains(&lowered.as_str()) || lowered.starts_with("rss post")
}

/// AI title when present, else the working title capped and sanitized,
/// else a generated placeholder.
pub fn final_title(ai_title: Option<&str>, working_title: &str) -> String {
    if let Some(title) = ai_title.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    let capped = text::trim_words(&text::sanitize_text_field(working_title), MAX_FALLBACK_TITLE_WORDS, "");
    if capped.is_empty() {
        format!("RSS Post {}", text::unique_suffix())
    } else {
        capped
    }
}

pub fn fallback_tags(title: &str) -> Vec<String> {
    text::ascii_words(title)
}

/// `<id>-<tags>`, or `<id>-<title>` when there are no tags.
pub fn fallback_slug(post_id: PostId, tags: &[String], title: &str) -> String {
    let tail = if tags.is_empty() {
        text::sanitize_title(title)
    } else {
        text::sanitize_title(&tags.join("-"))
    };
    if tail.is_empty() {
        post_id.to_string()
    } else {
        format!("{}-{}", post_id, tail)
    }
}

/// First of `base`, `base-2`, `base-3`, ... not used by another post.
pub async fn unique_slug(posts: &dyn PostStore, base: &str, post_id: PostId) -> Result<String> {
    if !posts.slug_exists(base, post_id).await? {
        return Ok(base.to_string());
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !posts.slug_exists(&candidate, post_id).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}
