mod common;

use common::{init_tracing, item};
use rss_publisher::types::CategoryKey;
use rss_publisher::TitleClassifier;

fn classifier() -> TitleClassifier {
    TitleClassifier::new(&["ลดราคา".to_string(), "discount".to_string(), "% off".to_string()])
}

#[test]
fn test_news_marker_in_feed_title() {
    init_tracing();
    let result = classifier().classify(&common::big_launch());

    assert_eq!(result.category.key, CategoryKey::News);
    assert_eq!(result.working_title, "Big Launch");
    assert!(result.category.reason.contains("[news]"));
}

#[test]
fn test_marker_removed_from_content_title() {
    init_tracing();
    let result = classifier().classify(&item("g", "", "[Demo] Free trial weekend<br>Play now", ""));

    assert_eq!(result.category.key, CategoryKey::Demo);
    assert_eq!(result.working_title, "Free trial weekend");
    assert_eq!(result.source_title, "[Demo] Free trial weekend");
}

#[test]
fn test_markers_are_case_insensitive() {
    init_tracing();
    let result = classifier().classify(&item("g", "", "[NEWS] Patch notes 1.2<br>Fixes", ""));

    assert_eq!(result.category.key, CategoryKey::News);
    assert_eq!(result.working_title, "Patch notes 1.2");
}

#[test]
fn test_falls_back_to_feed_title_when_content_is_empty() {
    init_tracing();
    let result = classifier().classify(&item("g", "[Mods] Texture pack", "", ""));

    assert_eq!(result.category.key, CategoryKey::Mods);
    assert_eq!(result.working_title, "Texture pack");
}

#[test]
fn test_article_marker() {
    init_tracing();
    let result = classifier().classify(&item("g", "[Article] Ten years of RPGs", "Ten years of RPGs<br>Long read", ""));

    assert_eq!(result.category.key, CategoryKey::Article);
    assert_eq!(result.working_title, "Ten years of RPGs");
}

#[test]
fn test_no_marker_is_meme() {
    init_tracing();
    let result = classifier().classify(&item("g", "Funny cat", "Funny cat picture<br>lol", ""));

    assert_eq!(result.category.key, CategoryKey::Meme);
    assert_eq!(result.working_title, "Funny cat picture");
}

#[test]
fn test_discount_keyword_turns_meme_into_deals() {
    init_tracing();
    let result = classifier().classify(&item(
        "g",
        "",
        "Summer sale on racing games<br>Big discount this week",
        "",
    ));

    assert_eq!(result.category.key, CategoryKey::Deals);
    assert!(result.category.reason.contains("discount"));
}

#[test]
fn test_thai_discount_keyword() {
    init_tracing();
    let result = classifier().classify(&item("g", "", "เกมใหม่ ลดราคา 50%<br>รายละเอียด", ""));

    assert_eq!(result.category.key, CategoryKey::Deals);
    assert_eq!(result.working_title, "เกมใหม่ ลดราคา 50%");
}

#[test]
fn test_news_marker_beats_discount_override() {
    init_tracing();
    let result = classifier().classify(&item(
        "g",
        "[News] Store event",
        "[News] Store event with 50% off<br>Get a discount today",
        "",
    ));

    assert_eq!(result.category.key, CategoryKey::News);
    assert_eq!(result.working_title, "Store event with 50% off");
}

#[test]
fn test_link_title_is_discarded_and_deals() {
    init_tracing();
    let result = classifier().classify(&item(
        "g",
        "",
        "https://store.example.com/deal/123<br>Great price on headsets",
        "",
    ));

    assert_eq!(result.category.key, CategoryKey::Deals);
    assert_eq!(result.working_title, "");
    assert_eq!(result.source_title, "");
}

#[test]
fn test_title_starting_with_link_keeps_text() {
    init_tracing();
    let result = classifier().classify(&item(
        "g",
        "",
        "https://store.example.com/deal grab it<br>Details",
        "",
    ));

    assert_eq!(result.category.key, CategoryKey::Deals);
    assert_eq!(result.working_title, "https://store.example.com/deal grab it");
}
