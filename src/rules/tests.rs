use super::*;
use crate::models::{Heading, ImageInfo, OpenGraph, Resource, ResourceKind};
use crate::recommendations::templates;

const PAGE_URL: &str = "https://example.com/blog/blue-widgets";

fn heading(level: u8, text: &str) -> Heading {
    Heading {
        level,
        text: text.to_string(),
    }
}

fn image(src: &str, alt: &str, size: Option<u64>) -> ImageInfo {
    ImageInfo {
        src: src.to_string(),
        alt: alt.to_string(),
        size,
    }
}

fn outcome(content: &ScrapedContent, keyphrase: &str, kind: CheckKind) -> CheckOutcome {
    outcome_at(content, keyphrase, PAGE_URL, false, kind)
}

fn outcome_at(
    content: &ScrapedContent,
    keyphrase: &str,
    url: &str,
    is_home_page: bool,
    kind: CheckKind,
) -> CheckOutcome {
    run_checks(content, keyphrase, url, is_home_page)
        .into_iter()
        .find(|o| o.kind == kind)
        .unwrap()
}

fn words(n: usize) -> String {
    vec!["lorem"; n].join(" ")
}

#[test]
fn checks_run_in_table_order() {
    let outcomes = run_checks(&ScrapedContent::default(), "widgets", PAGE_URL, false);
    let titles: Vec<&str> = outcomes.iter().map(|o| o.kind.title()).collect();
    assert_eq!(titles.len(), 18);
    assert_eq!(titles[0], "Keyphrase in Title");
    assert_eq!(titles[17], "Image File Size");
}

#[test]
fn title_contains_keyphrase() {
    let content = ScrapedContent {
        title: "Best Widgets Online".into(),
        ..Default::default()
    };
    assert!(outcome(&content, "widgets", CheckKind::KeyphraseInTitle).passed);
    assert!(!outcome(&content, "gadgets", CheckKind::KeyphraseInTitle).passed);
}

#[test]
fn meta_description_contains_keyphrase() {
    let content = ScrapedContent {
        meta_description: "Shop WIDGETS today".into(),
        ..Default::default()
    };
    assert!(outcome(&content, "widgets", CheckKind::KeyphraseInMetaDescription).passed);

    let empty = ScrapedContent::default();
    let result = outcome(&empty, "widgets", CheckKind::KeyphraseInMetaDescription);
    assert!(!result.passed);
    assert!(result.description.contains("no meta description"));
}

#[test]
fn url_check_passes_on_home_page() {
    let content = ScrapedContent::default();
    let home = outcome_at(&content, "widgets", "https://example.com/", true, CheckKind::KeyphraseInUrl);
    assert!(home.passed);

    let other = outcome_at(&content, "widgets", "https://example.com/about", false, CheckKind::KeyphraseInUrl);
    assert!(!other.passed);
}

#[test]
fn url_check_accepts_slug_forms() {
    let content = ScrapedContent::default();
    assert!(outcome(&content, "Blue Widgets", CheckKind::KeyphraseInUrl).passed);
    assert!(outcome(&content, "widgets", CheckKind::KeyphraseInUrl).passed);
}

#[test]
fn content_length_threshold() {
    let short = ScrapedContent {
        content: words(299),
        ..Default::default()
    };
    assert!(!outcome(&short, "widgets", CheckKind::ContentLength).passed);

    let long = ScrapedContent {
        content: words(300),
        ..Default::default()
    };
    assert!(outcome(&long, "widgets", CheckKind::ContentLength).passed);
}

#[test]
fn density_must_be_in_range() {
    // 1 occurrence in 100 words = 1%
    let good = ScrapedContent {
        content: format!("widgets {}", words(99)),
        ..Default::default()
    };
    assert!(outcome(&good, "widgets", CheckKind::KeyphraseDensity).passed);

    // 1 in 300 = 0.33%
    let sparse = ScrapedContent {
        content: format!("widgets {}", words(299)),
        ..Default::default()
    };
    let result = outcome(&sparse, "widgets", CheckKind::KeyphraseDensity);
    assert!(!result.passed);
    assert!(result.description.contains("below"));

    // 5 in 100 = 5%
    let stuffed = ScrapedContent {
        content: format!("{} {}", vec!["widgets"; 5].join(" "), words(95)),
        ..Default::default()
    };
    let result = outcome(&stuffed, "widgets", CheckKind::KeyphraseDensity);
    assert!(!result.passed);
    assert!(result.description.contains("above"));
}

#[test]
fn introduction_uses_first_paragraph() {
    let content = ScrapedContent {
        paragraphs: vec!["Our Widgets are great.".into(), "Other text".into()],
        ..Default::default()
    };
    assert!(outcome(&content, "widgets", CheckKind::KeyphraseInIntroduction).passed);

    let later = ScrapedContent {
        paragraphs: vec!["Welcome!".into(), "widgets".into()],
        ..Default::default()
    };
    assert!(!outcome(&later, "widgets", CheckKind::KeyphraseInIntroduction).passed);

    let none = ScrapedContent::default();
    assert!(!outcome(&none, "widgets", CheckKind::KeyphraseInIntroduction).passed);
}

#[test]
fn image_alt_needs_one_match() {
    let content = ScrapedContent {
        images: vec![
            image("https://example.com/a.jpg", "", None),
            image("https://example.com/b.jpg", "Blue widgets on a shelf", None),
        ],
        ..Default::default()
    };
    assert!(outcome(&content, "blue widgets", CheckKind::ImageAltAttributes).passed);
    assert!(!outcome(&content, "gadgets", CheckKind::ImageAltAttributes).passed);
}

#[test]
fn link_counts() {
    let content = ScrapedContent {
        internal_links: vec!["https://example.com/about".into()],
        ..Default::default()
    };
    assert!(outcome(&content, "widgets", CheckKind::InternalLinks).passed);
    assert!(!outcome(&content, "widgets", CheckKind::OutboundLinks).passed);
}

#[test]
fn next_gen_formats_fail_without_images() {
    let content = ScrapedContent::default();
    assert!(!outcome(&content, "widgets", CheckKind::NextGenImageFormats).passed);
}

#[test]
fn next_gen_formats_require_every_image() {
    let modern = ScrapedContent {
        images: vec![
            image("https://example.com/a.webp", "", None),
            image("https://example.com/b.AVIF?w=200", "", None),
            image("https://example.com/logo.svg", "", None),
        ],
        ..Default::default()
    };
    assert!(outcome(&modern, "widgets", CheckKind::NextGenImageFormats).passed);

    let mixed = ScrapedContent {
        images: vec![
            image("https://example.com/a.webp", "", None),
            image("https://example.com/b.png", "", None),
        ],
        ..Default::default()
    };
    let result = outcome(&mixed, "widgets", CheckKind::NextGenImageFormats);
    assert!(!result.passed);
    assert!(result.context.contains("b.png"));
}

#[test]
fn og_image_passes_on_presence() {
    let small = ScrapedContent {
        open_graph: OpenGraph {
            image: Some("https://example.com/og.png".into()),
            image_width: Some(600),
            image_height: Some(315),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = outcome(&small, "widgets", CheckKind::OgImage);
    assert!(result.passed);
    assert!(result.description.contains("smaller"));

    let large = ScrapedContent {
        open_graph: OpenGraph {
            image: Some("https://example.com/og.png".into()),
            image_width: Some(1200),
            image_height: Some(630),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = outcome(&large, "widgets", CheckKind::OgImage);
    assert!(result.passed);
    assert!(result.description.contains("meeting"));

    assert!(!outcome(&ScrapedContent::default(), "widgets", CheckKind::OgImage).passed);
}

#[test]
fn og_title_and_description_lengths() {
    let og = |title: &str, description: &str| ScrapedContent {
        open_graph: OpenGraph {
            title: Some(title.into()),
            description: Some(description.into()),
            ..Default::default()
        },
        ..Default::default()
    };

    let good = og("Blue widgets for sale", &"d".repeat(150));
    assert!(outcome(&good, "widgets", CheckKind::OgTitleAndDescription).passed);

    let short_title = og("Widgets", &"d".repeat(150));
    assert!(!outcome(&short_title, "widgets", CheckKind::OgTitleAndDescription).passed);

    let long_description = og("Blue widgets for sale", &"d".repeat(201));
    assert!(!outcome(&long_description, "widgets", CheckKind::OgTitleAndDescription).passed);

    let missing = ScrapedContent::default();
    let result = outcome(&missing, "widgets", CheckKind::OgTitleAndDescription);
    assert!(!result.passed);
    assert!(result.description.contains("missing"));
}

#[test]
fn missing_h1_fails_regardless_of_keyphrase() {
    let content = ScrapedContent {
        title: "widgets".into(),
        headings: vec![heading(2, "widgets")],
        ..Default::default()
    };
    for keyphrase in ["widgets", "anything else"] {
        let result = outcome(&content, keyphrase, CheckKind::KeyphraseInH1);
        assert!(!result.passed);
        assert_eq!(result.description, "No H1 heading found on the page.");
    }
}

#[test]
fn h1_matching_rules() {
    let single = |text: &str| ScrapedContent {
        headings: vec![heading(1, text)],
        ..Default::default()
    };
    assert!(outcome(&single("Buy Blue Widgets"), "blue widgets", CheckKind::KeyphraseInH1).passed);
    assert!(outcome(&single("Widgets that are blue"), "blue widgets", CheckKind::KeyphraseInH1).passed);
    assert!(!outcome(&single("Red widgets"), "blue widgets", CheckKind::KeyphraseInH1).passed);

    let two = ScrapedContent {
        headings: vec![heading(1, "widgets"), heading(1, "widgets again")],
        ..Default::default()
    };
    let result = outcome(&two, "widgets", CheckKind::KeyphraseInH1);
    assert!(!result.passed);
    assert!(result.description.contains("2 H1"));
}

#[test]
fn h2_matching_rules() {
    let with_h2s = |texts: &[&str]| ScrapedContent {
        headings: texts.iter().map(|t| heading(2, t)).collect(),
        ..Default::default()
    };
    assert!(outcome(&with_h2s(&["Why blue widgets"]), "blue widgets", CheckKind::KeyphraseInH2).passed);
    assert!(outcome(&with_h2s(&["Widgets in blue"]), "blue widgets", CheckKind::KeyphraseInH2).passed);
    assert!(outcome(&with_h2s(&["Blue things", "All about widgets"]), "blue widgets", CheckKind::KeyphraseInH2).passed);
    assert!(!outcome(&with_h2s(&["Red things"]), "blue widgets", CheckKind::KeyphraseInH2).passed);
    assert!(!outcome(&ScrapedContent::default(), "blue widgets", CheckKind::KeyphraseInH2).passed);
}

#[test]
fn heading_hierarchy_rules() {
    let with = |levels: &[u8]| ScrapedContent {
        headings: levels.iter().map(|l| heading(*l, "x")).collect(),
        ..Default::default()
    };
    assert!(outcome(&with(&[1, 2, 3, 2, 3, 4]), "x", CheckKind::HeadingHierarchy).passed);
    assert!(!outcome(&with(&[1, 2, 4, 2]), "x", CheckKind::HeadingHierarchy).passed);
    assert!(!outcome(&with(&[1, 3, 2]), "x", CheckKind::HeadingHierarchy).passed);
    assert!(!outcome(&with(&[1, 1, 2]), "x", CheckKind::HeadingHierarchy).passed);
    assert!(!outcome(&with(&[1]), "x", CheckKind::HeadingHierarchy).passed);
}

#[test]
fn minification_ratio() {
    let resource = |minified: bool| Resource {
        kind: ResourceKind::Js,
        url: None,
        content: Some("x".into()),
        minified,
    };

    assert!(outcome(&ScrapedContent::default(), "x", CheckKind::CodeMinification).passed);

    let mut content = ScrapedContent::default();
    content.resources.js = vec![resource(true), resource(false)];
    content.resources.css = vec![resource(false), resource(false), resource(true)];
    // 2 of 5 = 40%
    assert!(outcome(&content, "x", CheckKind::CodeMinification).passed);

    content.resources.css.push(resource(false));
    // 2 of 6 = 33%
    assert!(!outcome(&content, "x", CheckKind::CodeMinification).passed);
}

#[test]
fn schema_failure_carries_custom_recommendation() {
    let result = outcome(&ScrapedContent::default(), "widgets", CheckKind::SchemaMarkup);
    assert!(!result.passed);
    assert!(result.custom_recommendation.is_some());

    let mut content = ScrapedContent::default();
    content.schema.detected = true;
    content.schema.types.insert("Product".into());
    let result = outcome(&content, "widgets", CheckKind::SchemaMarkup);
    assert!(result.passed);
    assert!(result.description.contains("Product"));
}

#[test]
fn image_size_ignores_unknown_sizes() {
    let content = ScrapedContent {
        images: vec![
            image("https://example.com/a.jpg", "", None),
            image("https://example.com/b.jpg", "", Some(300 * 1024)),
        ],
        ..Default::default()
    };
    assert!(outcome(&content, "x", CheckKind::ImageFileSize).passed);

    let heavy = ScrapedContent {
        images: vec![image("https://example.com/huge.jpg", "", Some(300 * 1024 + 1))],
        ..Default::default()
    };
    let result = outcome(&heavy, "x", CheckKind::ImageFileSize);
    assert!(!result.passed);
    assert!(result.custom_recommendation.unwrap().contains("huge.jpg"));
}

#[test]
fn priorities_come_from_the_table() {
    assert_eq!(priority_for("Keyphrase in Title"), Priority::High);
    assert_eq!(priority_for("Internal Links"), Priority::Medium);
    assert_eq!(priority_for("Image File Size"), Priority::Low);
    assert_eq!(priority_for("Something Unmapped"), Priority::Medium);
}

#[test]
fn titles_round_trip() {
    for kind in CheckKind::ALL {
        assert_eq!(CheckKind::from_title(kind.title()), Some(kind));
    }
    assert_eq!(CheckKind::from_title("nope"), None);
}

#[tokio::test]
async fn passing_checks_have_empty_recommendations() {
    let engine = SeoRuleEngine::new(Arc::new(RecommendationProvider::deterministic()));
    let content = ScrapedContent {
        title: "Best Widgets Online".into(),
        ..Default::default()
    };
    let checks = engine.evaluate(&content, "widgets", PAGE_URL, false).await;
    assert_eq!(checks.len(), 18);

    let title = &checks[0];
    assert_eq!(title.title, "Keyphrase in Title");
    assert!(title.passed);
    assert_eq!(title.recommendation, "");
    assert_eq!(title.priority, Priority::High);

    for check in &checks {
        assert_eq!(check.passed, check.recommendation.is_empty(), "{}", check.title);
    }
}

#[tokio::test]
async fn failed_checks_use_templates_without_a_backend() {
    let engine = SeoRuleEngine::new(Arc::new(RecommendationProvider::deterministic()));
    let content = ScrapedContent {
        title: "Home".into(),
        ..Default::default()
    };
    let checks = engine.evaluate(&content, "widgets", PAGE_URL, false).await;
    let title = checks.iter().find(|c| c.title == "Keyphrase in Title").unwrap();
    assert!(!title.passed);
    assert_eq!(
        title.recommendation,
        templates::fallback("Keyphrase in Title", "widgets", "Current title: \"Home\"")
    );
}
