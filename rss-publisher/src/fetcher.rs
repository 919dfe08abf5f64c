use crate::traits::ImageDownloader;
use crate::types::{FetchConfig, FetchResult, PublisherError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::header::REFERER;
use reqwest::{Client, Response, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Browser identity used for image downloads; some hosts refuse other agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::limited(config.max_redirects)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(redirect)
            .build()?;

        Ok(Self { client, config })
    }

    /// Downloads the feed document, retrying transport errors and
    /// non-success statuses with exponential backoff.
    pub async fn fetch_feed(&self, url: &str) -> Result<FetchResult> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 30)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let content = self.read_body(response).await?;
                        let response_time_ms = start_time.elapsed().as_millis() as u64;
                        info!(
                            "Fetched feed {} ({} bytes in {} ms)",
                            url,
                            content.len(),
                            response_time_ms
                        );
                        return Ok(FetchResult {
                            http_status: Some(status.as_u16()),
                            response_time_ms,
                            content,
                        });
                    }

                    last_error = Some(if status == StatusCode::TOO_MANY_REQUESTS {
                        PublisherError::RateLimited {
                            target: url.to_string(),
                        }
                    } else {
                        PublisherError::General(format!(
                            "HTTP {}: {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("Unknown")
                        ))
                    });
                    // Client errors will not get better on retry.
                    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
                        break;
                    }
                }
                Err(e) => last_error = Some(PublisherError::Http(e)),
            }

            if attempt < self.config.max_retries {
                match backoff.next_backoff() {
                    Some(delay) => {
                        warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                        tokio::time::sleep(delay).await;
                    }
                    None => break,
                }
            }
        }

        error!("Failed to fetch feed {} after {} attempts", url, self.config.max_retries + 1);
        Err(last_error.unwrap_or_else(|| PublisherError::General("unknown fetch failure".to_string())))
    }

    async fn read_body(&self, response: Response) -> Result<String> {
        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(PublisherError::FeedTooLarge { size_mb });
            }
        }

        let content = response.text().await?;
        let size_mb = content.len() / (1024 * 1024);
        if size_mb > self.config.max_feed_size_mb {
            return Err(PublisherError::FeedTooLarge { size_mb });
        }
        Ok(content)
    }
}

/// Image download over HTTP with a browser user agent and the site as referrer.
pub struct HttpImageDownloader {
    client: Client,
    referer: String,
}

impl HttpImageDownloader {
    pub fn new(referer: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            referer: referer.into(),
        })
    }
}

#[async_trait]
impl ImageDownloader for HttpImageDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(REFERER, &self.referer)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PublisherError::General(format!(
                "image download returned HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(PublisherError::General(format!("empty image body for {}", url)));
        }
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
