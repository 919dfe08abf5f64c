mod common;

use common::init_tracing;
use rss_publisher::assembler::{fallback_slug, final_title, title_is_unusable, unique_slug};
use rss_publisher::memory::{InMemoryMediaStore, InMemoryPostStore};
use rss_publisher::rss_utils::text;
use rss_publisher::sideloader::{image_filename, numbered_filename};
use rss_publisher::traits::{MediaStore, PostStore};
use rss_publisher::types::*;
use rss_publisher::PublisherConfig;

fn record(guid: &str, slug: &str) -> PostRecord {
    let now = chrono::Utc::now().naive_utc();
    PostRecord {
        title: "Title".to_string(),
        content_html: "Body".to_string(),
        excerpt: String::new(),
        status: PostStatus::Publish,
        category: CategoryKey::Meme,
        category_id: 6,
        author_id: 1,
        published_at_local: now,
        published_at_gmt: now,
        tags: Vec::new(),
        slug: slug.to_string(),
        source_guid: guid.to_string(),
        original_link: String::new(),
        featured_image_url: None,
    }
}

#[tokio::test]
async fn test_memory_post_store_round_trip() -> Result<()> {
    init_tracing();
    let store = InMemoryPostStore::new();

    let id = store.create(&record("g1", "")).await?;
    store.update_slug(id, "hello").await?;
    store.set_tags(id, &["a".to_string(), "b".to_string()]).await?;
    store.set_metadata(id, "_rss_guid", "g1").await?;

    assert_eq!(store.find_by_guid("g1").await?, Some(id));
    assert_eq!(store.find_by_guid("nope").await?, None);
    assert!(store.slug_exists("hello", PostId(id.0 + 1)).await?);
    assert!(!store.slug_exists("hello", id).await?);

    let stored = store.get(id).await.unwrap();
    assert_eq!(stored.record.slug, "hello");
    assert_eq!(stored.record.tags, vec!["a".to_string(), "b".to_string()]);
    assert!(store.create(&record("g1", "")).await.is_err());
    assert!(store.update_slug(PostId(999), "x").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_unique_slug_suffixes() -> Result<()> {
    init_tracing();
    let store = InMemoryPostStore::new();
    store.create(&record("a", "launch")).await?;
    store.create(&record("b", "launch-2")).await?;
    let id = store.create(&record("c", "")).await?;

    assert_eq!(unique_slug(&store, "launch", id).await?, "launch-3");
    assert_eq!(unique_slug(&store, "fresh", id).await?, "fresh");
    Ok(())
}

#[tokio::test]
async fn test_media_store_makes_names_unique() -> Result<()> {
    init_tracing();
    let media = InMemoryMediaStore::new();

    let first = media.sideload(b"one", "pic.jpg", PostId(1), "alt").await?;
    let second = media.sideload(b"two", "pic.jpg", PostId(2), "alt").await?;
    media.set_featured_image(PostId(2), second).await?;

    let assets = media.assets().await;
    assert_ne!(first, second);
    assert_eq!(assets[0].file_name, "pic.jpg");
    assert_eq!(assets[1].file_name, "pic-1.jpg");
    assert_eq!(media.featured_image(PostId(2)).await, Some(second));
    Ok(())
}

#[test]
fn test_image_filename() {
    init_tracing();
    let name = image_filename("https://cdn.ex.com/a/b.webp?size=large");
    assert_eq!(name.len(), 32 + ".webp".len());
    assert!(name.ends_with(".webp"));
    assert!(name[..32].chars().all(|c| c.is_ascii_hexdigit()));

    assert!(image_filename("https://cdn.ex.com/image?id=7").ends_with(".jpg"));
    assert_eq!(
        image_filename("https://cdn.ex.com/x.png"),
        image_filename("https://cdn.ex.com/x.png")
    );
    assert_eq!(numbered_filename("abc.jpg", 2), "abc-2.jpg");
    assert_eq!(numbered_filename("noext", 1), "noext-1");
}

#[test]
fn test_title_rules() {
    init_tracing();
    let min = PublisherConfig::default().min_title_chars;

    assert!(title_is_unusable("", min));
    assert!(title_is_unusable("See https://ex.com/x", min));
    assert!(title_is_unusable("Short", min));
    assert!(title_is_unusable("Untitled", min));
    assert!(title_is_unusable("RSS Post 1a2b3c", min));
    assert!(!title_is_unusable("Big Launch", min));

    assert_eq!(final_title(Some("AI Title"), "Working"), "AI Title");
    assert_eq!(final_title(None, "  <b>Working</b>   title "), "Working title");
    let long = vec!["w"; 30].join(" ");
    assert_eq!(final_title(None, &long).split_whitespace().count(), 20);
    assert!(final_title(Some("  "), "").starts_with("RSS Post "));
}

#[test]
fn test_fallback_slug() {
    init_tracing();
    let tags = vec!["big".to_string(), "launch".to_string()];
    assert_eq!(fallback_slug(PostId(7), &tags, "Big Launch"), "7-big-launch");
    assert_eq!(fallback_slug(PostId(7), &[], "Café Night!"), "7-caf-night");
    assert_eq!(fallback_slug(PostId(7), &[], "เกมใหม่"), "7");
}

#[test]
fn test_text_helpers() {
    init_tracing();
    assert_eq!(text::trim_words("a b c d", 2, "..."), "a b...");
    assert_eq!(text::trim_words("a  b", 5, "..."), "a b");
    assert_eq!(text::ascii_words("Big Launch, big DAY 2025"), vec!["big", "launch", "day"]);
    assert_eq!(text::strip_wrapping_quotes("\u{201C}Quoted\u{201D}"), "Quoted");
    assert_eq!(text::sanitize_title("  Hello, World -- 2025 "), "hello-world-2025");
    assert_eq!(text::unique_suffix().len(), 13);
}
