use crate::activity::ActivityLog;
use crate::rss_utils::{html, text, url};
use crate::traits::{ImageDownloader, MediaStore};
use crate::types::{AssetId, PostId};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_EXTENSION: &str = "jpg";

/// Downloads a remote image and registers it as the featured image of a post.
pub struct ImageSideloader {
    downloader: Arc<dyn ImageDownloader>,
    media: Arc<dyn MediaStore>,
    log: ActivityLog,
}

impl ImageSideloader {
    pub fn new(
        downloader: Arc<dyn ImageDownloader>,
        media: Arc<dyn MediaStore>,
        log: ActivityLog,
    ) -> Self {
        Self {
            downloader,
            media,
            log,
        }
    }

    /// Every failure is logged and reported as `None`; the post stays as is.
    pub async fn attach(&self, image_url: &str, post_id: PostId, alt_text: &str) -> Option<AssetId> {
        let image_url = image_url.trim();
        if !url::starts_with_http(image_url) {
            self.log
                .warning(format!(
                    "Skipping featured image for post ID {}: not an http(s) URL ({})",
                    post_id,
                    html::escape(image_url)
                ))
                .await;
            return None;
        }

        let bytes = match self.downloader.download(image_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.log
                    .error(format!(
                        "Failed to download image from {} for post ID {}: {}",
                        html::escape(image_url),
                        post_id,
                        html::escape(&e.to_string())
                    ))
                    .await;
                return None;
            }
        };

        let filename = image_filename(image_url);
        let alt_text = text::sanitize_text_field(alt_text);
        debug!("Sideloading {} ({} bytes) as {}", image_url, bytes.len(), filename);

        let asset = match self.media.sideload(&bytes, &filename, post_id, &alt_text).await {
            Ok(asset) => asset,
            Err(e) => {
                self.log
                    .error(format!(
                        "Failed to store image {} for post ID {}: {}",
                        html::escape(image_url),
                        post_id,
                        html::escape(&e.to_string())
                    ))
                    .await;
                return None;
            }
        };

        if let Err(e) = self.media.set_featured_image(post_id, asset).await {
            self.log
                .error(format!(
                    "Failed to set featured image {} for post ID {}: {}",
                    asset,
                    post_id,
                    html::escape(&e.to_string())
                ))
                .await;
            return None;
        }

        self.log
            .success(format!(
                "Featured image set for post ID {} from {}",
                post_id,
                html::escape(image_url)
            ))
            .await;
        Some(asset)
    }
}

/// Content-addressed file name: 32 hex chars of the URL's SHA-256 plus the
/// path extension, `jpg` when the path has none.
pub fn image_filename(image_url: &str) -> String {
    let digest = Sha256::digest(image_url.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    let extension = url::path_extension(image_url).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{}.{}", &hex[..32], extension)
}

/// `name.ext` → `name-n.ext`.
pub fn numbered_filename(filename: &str, n: usize) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", filename, n),
    }
}
