use crate::sideloader::numbered_filename;
use crate::traits::{LogSink, MediaStore, PostStore};
use crate::types::{AssetId, LogEntry, LogKind, PostId, PostRecord, PublisherError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres, Row};
use std::path::{Path, PathBuf};
use std::future::Future;
use tracing::{debug, info, warn};

/// PostgreSQL-backed post, media and activity log storage. Image bytes are
/// written under `upload_dir`.
pub struct PostManager {
    db: Pool<Postgres>,
    upload_dir: PathBuf,
}

impl PostManager {
    pub async fn new(database_url: &str, upload_dir: impl Into<PathBuf>) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self::with_pool(db, upload_dir))
    }

    pub fn with_pool(db: Pool<Postgres>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub async fn setup_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                content_html TEXT NOT NULL,
                excerpt TEXT NOT NULL,
                status VARCHAR(20) NOT NULL,
                category VARCHAR(20) NOT NULL,
                category_id BIGINT NOT NULL,
                author_id BIGINT NOT NULL,
                published_at_local TIMESTAMP NOT NULL,
                published_at_gmt TIMESTAMP NOT NULL,
                slug TEXT NOT NULL DEFAULT '',
                source_guid TEXT NOT NULL UNIQUE,
                original_link TEXT NOT NULL,
                featured_image_url TEXT,
                featured_asset_id BIGINT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
            "CREATE INDEX IF NOT EXISTS posts_slug_idx ON posts (slug)",
            r#"
            CREATE TABLE IF NOT EXISTS post_tags (
                post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                tag TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (post_id, tag)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS post_meta (
                post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                meta_key VARCHAR(255) NOT NULL,
                meta_value TEXT NOT NULL,
                PRIMARY KEY (post_id, meta_key)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS media_assets (
                id BIGSERIAL PRIMARY KEY,
                post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                file_name TEXT NOT NULL UNIQUE,
                file_path TEXT NOT NULL,
                alt_text TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS activity_logs (
                id BIGSERIAL PRIMARY KEY,
                logged_at TIMESTAMP WITH TIME ZONE NOT NULL,
                kind VARCHAR(20) NOT NULL,
                message TEXT NOT NULL
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.db).await?;
        }

        info!("Post store schema ready");
        Ok(())
    }

    async fn file_name_taken(&self, file_name: &str) -> Result<bool> {
        if tokio::fs::try_exists(self.upload_dir.join(file_name)).await? {
            return Ok(true);
        }
        let row = sqlx::query("SELECT COUNT(*) AS count FROM media_assets WHERE file_name = $1")
            .bind(file_name)
            .fetch_one(&self.db)
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }
}

/// Writes `bytes` to `path`, then runs `register`. The file is removed
/// again when registration fails.
async fn write_then_register<F, Fut>(path: &Path, bytes: &[u8], register: F) -> Result<AssetId>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<AssetId>>,
{
    tokio::fs::write(path, bytes).await?;
    match register().await {
        Ok(id) => Ok(id),
        Err(e) => {
            if let Err(remove_error) = tokio::fs::remove_file(path).await {
                warn!("Could not remove orphaned file {}: {}", path.display(), remove_error);
            }
            Err(e)
        }
    }
}

#[async_trait]
impl PostStore for PostManager {
    async fn find_by_guid(&self, guid: &str) -> Result<Option<PostId>> {
        let row = sqlx::query("SELECT id FROM posts WHERE source_guid = $1")
            .bind(guid)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|r| PostId(r.get("id"))))
    }

    async fn create(&self, record: &PostRecord) -> Result<PostId> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (
                title, content_html, excerpt, status, category, category_id, author_id,
                published_at_local, published_at_gmt, slug, source_guid, original_link,
                featured_image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(&record.title)
        .bind(&record.content_html)
        .bind(&record.excerpt)
        .bind(record.status.as_str())
        .bind(record.category.as_str())
        .bind(record.category_id)
        .bind(record.author_id)
        .bind(record.published_at_local)
        .bind(record.published_at_gmt)
        .bind(&record.slug)
        .bind(&record.source_guid)
        .bind(&record.original_link)
        .bind(&record.featured_image_url)
        .fetch_one(&self.db)
        .await
        .map_err(|e| PublisherError::Persistence(e.to_string()))?;

        let id = PostId(row.get("id"));
        debug!("Inserted post {} for guid {}", id, record.source_guid);
        Ok(id)
    }

    async fn update_slug(&self, id: PostId, slug: &str) -> Result<()> {
        let result = sqlx::query("UPDATE posts SET slug = $1 WHERE id = $2")
            .bind(slug)
            .bind(id.0)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(PublisherError::Persistence(format!("post {} not found", id)));
        }
        Ok(())
    }

    async fn set_tags(&self, id: PostId, tags: &[String]) -> Result<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        for (position, tag) in tags.iter().enumerate() {
            sqlx::query(
                "INSERT INTO post_tags (post_id, tag, position) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            )
            .bind(id.0)
            .bind(tag)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_metadata(&self, id: PostId, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO post_meta (post_id, meta_key, meta_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, meta_key)
            DO UPDATE SET meta_value = EXCLUDED.meta_value
            "#,
        )
        .bind(id.0)
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn slug_exists(&self, slug: &str, except: PostId) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE slug = $1 AND id <> $2")
            .bind(slug)
            .bind(except.0)
            .fetch_one(&self.db)
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM posts")
            .fetch_one(&self.db)
            .await?;
        Ok(row.get::<i64, _>("count") as usize)
    }
}

#[async_trait]
impl MediaStore for PostManager {
    async fn sideload(
        &self,
        bytes: &[u8],
        filename: &str,
        owner: PostId,
        alt_text: &str,
    ) -> Result<AssetId> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let mut file_name = filename.to_string();
        let mut n = 1;
        while self.file_name_taken(&file_name).await? {
            file_name = numbered_filename(filename, n);
            n += 1;
        }

        let path = self.upload_dir.join(&file_name);
        let db = &self.db;
        let stored_name = file_name.as_str();
        let stored_path = path.to_string_lossy().to_string();
        let id = write_then_register(&path, bytes, move || async move {
            let row = sqlx::query(
                r#"
                INSERT INTO media_assets (post_id, file_name, file_path, alt_text)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(owner.0)
            .bind(stored_name)
            .bind(stored_path)
            .bind(alt_text)
            .fetch_one(db)
            .await?;
            Ok::<_, PublisherError>(AssetId(row.get("id")))
        })
        .await?;

        info!("Stored image {} as asset {} for post {}", file_name, id, owner);
        Ok(id)
    }

    async fn set_featured_image(&self, post: PostId, asset: AssetId) -> Result<()> {
        sqlx::query("UPDATE posts SET featured_asset_id = $1 WHERE id = $2")
            .bind(asset.0)
            .bind(post.0)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LogSink for PostManager {
    async fn append(&self, entry: LogEntry) -> Result<()> {
        sqlx::query("INSERT INTO activity_logs (logged_at, kind, message) VALUES ($1, $2, $3)")
            .bind(entry.timestamp)
            .bind(entry.kind.as_str())
            .bind(&entry.message)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(
            "SELECT logged_at, kind, message FROM activity_logs ORDER BY logged_at DESC, id DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        let entries = rows
            .into_iter()
            .map(|r| {
                let kind: String = r.get("kind");
                LogEntry {
                    timestamp: r.get::<DateTime<Utc>, _>("logged_at"),
                    kind: LogKind::parse(&kind).unwrap_or(LogKind::Info),
                    message: r.get("message"),
                }
            })
            .collect();
        Ok(entries)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("TRUNCATE TABLE activity_logs")
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_registration_removes_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.jpg");

        let result = write_then_register(&path, b"bytes", || async {
            Err::<AssetId, _>(PublisherError::Persistence("insert refused".to_string()))
        })
        .await;

        assert!(matches!(result, Err(PublisherError::Persistence(_))));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_registered_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.jpg");

        let id = write_then_register(&path, b"bytes", || async { Ok::<_, PublisherError>(AssetId(7)) })
            .await
            .unwrap();

        assert_eq!(id, AssetId(7));
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    }
}
