use crate::config::PublisherConfig;
use crate::rss_utils::text;
use crate::traits::AiTextService;
use crate::types::{AiCallError, PublisherError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TITLE_PROMPT_WORDS: usize = 100;
pub const EXCERPT_PROMPT_WORDS: usize = 300;
pub const MAX_TITLE_WORDS: usize = 15;
pub const MAX_EXCERPT_WORDS: usize = 55;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const RATE_LIMIT_MARKER: &str = "RESOURCE_EXHAUSTED";

/// Google Generative Language `generateContent` backend.
pub struct GeminiTextService {
    client: Client,
    api_base: String,
}

impl GeminiTextService {
    pub fn new() -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("RSS-Publisher/1.0")
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl AiTextService for GeminiTextService {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        credential: &str,
        timeout: Duration,
    ) -> std::result::Result<String, AiCallError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature: 0.4 },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiCallError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiCallError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| AiCallError::Malformed(e.to_string()))?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AiCallError::Malformed("response carried no text".to_string()));
        }
        Ok(text)
    }
}

/// Maps a non-success HTTP answer to the call error taxonomy.
pub fn classify_failure(status: u16, body: &str) -> AiCallError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let quota_exhausted = envelope
        .as_ref()
        .map(|e| e.error.status == RATE_LIMIT_MARKER)
        .unwrap_or(false)
        || body.contains(RATE_LIMIT_MARKER);

    if status == 429 || quota_exhausted {
        return AiCallError::RateLimited;
    }

    let detail = envelope
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect());
    AiCallError::Status { status, body: detail }
}

/// Slug and tags suggested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugTags {
    pub slug: String,
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SlugTagsPayload {
    slug: String,
    tags: String,
}

/// Strips one surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Strict decoding of the slug/tags answer. Anything but an object with
/// exactly `slug` and `tags` is malformed, as is a slug that cleans to
/// nothing. Tags may come back empty.
pub fn parse_slug_tags(raw: &str) -> Result<SlugTags> {
    let payload: SlugTagsPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| PublisherError::MalformedResponse(format!("slug/tags JSON: {}", e)))?;

    let slug = text::sanitize_title(&payload.slug);
    if slug.is_empty() {
        return Err(PublisherError::MalformedResponse("empty slug".to_string()));
    }

    let mut tags: Vec<String> = Vec::new();
    for tag in payload.tags.split(',') {
        let tag = text::sanitize_text_field(tag).to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(SlugTags { slug, tags })
}

/// Best-effort AI enrichment. Every call yields `None` instead of an error.
pub struct AiSuggestionClient {
    service: Arc<dyn AiTextService>,
    credential: Option<String>,
    primary_model: String,
    fallback_model: String,
    timeout: Duration,
}

impl AiSuggestionClient {
    pub fn new(service: Arc<dyn AiTextService>, config: &PublisherConfig) -> Self {
        Self {
            service,
            credential: config.ai_credential.clone(),
            primary_model: config.primary_model.clone(),
            fallback_model: config.fallback_model.clone(),
            timeout: config.ai_timeout(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credential.is_some()
    }

    /// Primary model, then exactly one attempt on the fallback model. An
    /// answer `decode` rejects counts as a failed call.
    async fn generate_with_fallback<T, F>(&self, purpose: &str, prompt: &str, decode: F) -> Option<T>
    where
        F: Fn(&str) -> Result<T>,
    {
        let credential = self.credential.as_deref()?;

        for (attempt, model) in [&self.primary_model, &self.fallback_model].into_iter().enumerate() {
            let outcome = self
                .service
                .generate(model, prompt, credential, self.timeout)
                .await
                .map_err(|e| e.to_string())
                .and_then(|text| decode(&text).map_err(|e| e.to_string()));

            match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        info!("AI {} served by fallback model {}", purpose, model);
                    }
                    return Some(value);
                }
                Err(e) if attempt == 0 => warn!(
                    "AI {} failed on {}: {}; retrying with {}",
                    purpose, model, e, self.fallback_model
                ),
                Err(e) => warn!("AI {} failed on fallback {}: {}", purpose, model, e),
            }
        }
        None
    }

    pub async fn repair_title(&self, original_title: &str, plain_text: &str) -> Option<String> {
        let prompt = format!(
            "You write headlines for a gaming news site. The post below has no usable title. \
             Write one short headline of at most {} words in the same language as the content. \
             Reply with the headline only, without quotes.\n\nOriginal title: {}\n\nContent:\n{}",
            MAX_TITLE_WORDS,
            original_title,
            text::first_words(plain_text, TITLE_PROMPT_WORDS)
        );

        let title = self
            .generate_with_fallback("title repair", &prompt, decode_title)
            .await?;
        debug!("AI repaired title: {}", title);
        Some(title)
    }

    pub async fn summarize(&self, plain_text: &str) -> Option<String> {
        if plain_text.trim().is_empty() {
            return None;
        }
        let prompt = format!(
            "Summarize the following post in at most {} words, in the same language as the \
             content. Reply with the summary only.\n\n{}",
            MAX_EXCERPT_WORDS,
            text::first_words(plain_text, EXCERPT_PROMPT_WORDS)
        );

        self.generate_with_fallback("excerpt", &prompt, decode_excerpt)
            .await
    }

    pub async fn suggest_slug_and_tags(&self, title: &str, plain_text: &str) -> Option<SlugTags> {
        let prompt = format!(
            "Return a single JSON object with exactly two keys: \"slug\" (lowercase English words \
             joined by hyphens, URL-safe, at most 8 words) and \"tags\" (one string of 3 to 6 \
             short lowercase English tags separated by commas). Reply with the JSON only.\n\n\
             Title: {}\n\nContent:\n{}",
            title,
            text::first_words(plain_text, EXCERPT_PROMPT_WORDS)
        );

        self.generate_with_fallback("slug/tags", &prompt, parse_slug_tags)
            .await
    }
}

/// First line, quotes and markup removed, at most 15 words.
fn decode_title(raw: &str) -> Result<String> {
    let first_line = raw.trim().lines().next().unwrap_or("");
    let title = text::sanitize_text_field(&text::strip_wrapping_quotes(first_line));
    let title = text::trim_words(&text::strip_wrapping_quotes(&title), MAX_TITLE_WORDS, "");
    if title.is_empty() {
        return Err(PublisherError::MalformedResponse("empty title".to_string()));
    }
    Ok(title)
}

fn decode_excerpt(raw: &str) -> Result<String> {
    let excerpt = text::trim_words(&text::sanitize_text_field(raw), MAX_EXCERPT_WORDS, "...");
    if excerpt.is_empty() {
        return Err(PublisherError::MalformedResponse("empty excerpt".to_string()));
    }
    Ok(excerpt)
}
