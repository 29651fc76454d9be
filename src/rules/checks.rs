use super::text::{
    contains_all_words, contains_phrase, keyphrase_density, normalize, significant_words,
    word_count,
};
use super::{CheckKind, CheckOutcome};
use crate::models::{ImageInfo, ScrapedContent};
use crate::recommendations::templates;

pub const MIN_WORD_COUNT: usize = 300;
pub const MIN_DENSITY: f64 = 0.5;
pub const MAX_DENSITY: f64 = 2.5;
pub const MIN_MINIFIED_RATIO: f64 = 40.0;
pub const MAX_IMAGE_BYTES: u64 = 300 * 1024;
const NEXT_GEN_EXTENSIONS: [&str; 3] = [".webp", ".avif", ".svg"];
const OG_TITLE_CHARS: (usize, usize) = (10, 70);
const OG_DESCRIPTION_CHARS: (usize, usize) = (100, 200);
const OG_IMAGE_MIN: (u32, u32) = (1200, 630);

/// Inputs shared by every check.
pub struct PageContext<'a> {
    pub content: &'a ScrapedContent,
    pub keyphrase: &'a str,
    pub url: &'a str,
    pub is_home_page: bool,
}

impl CheckOutcome {
    fn pass(kind: CheckKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            passed: true,
            description: description.into(),
            context: String::new(),
            custom_recommendation: None,
        }
    }

    fn fail(kind: CheckKind, description: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kind,
            passed: false,
            description: description.into(),
            context: context.into(),
            custom_recommendation: None,
        }
    }

    fn with_recommendation(mut self, recommendation: String) -> Self {
        self.custom_recommendation = Some(recommendation);
        self
    }
}

pub fn run(kind: CheckKind, page: &PageContext<'_>) -> CheckOutcome {
    match kind {
        CheckKind::KeyphraseInTitle => keyphrase_in_title(page),
        CheckKind::KeyphraseInMetaDescription => keyphrase_in_meta_description(page),
        CheckKind::KeyphraseInUrl => keyphrase_in_url(page),
        CheckKind::ContentLength => content_length(page),
        CheckKind::KeyphraseDensity => density(page),
        CheckKind::KeyphraseInIntroduction => keyphrase_in_introduction(page),
        CheckKind::ImageAltAttributes => image_alt_attributes(page),
        CheckKind::InternalLinks => internal_links(page),
        CheckKind::OutboundLinks => outbound_links(page),
        CheckKind::NextGenImageFormats => next_gen_formats(page),
        CheckKind::OgImage => og_image(page),
        CheckKind::OgTitleAndDescription => og_title_and_description(page),
        CheckKind::KeyphraseInH1 => keyphrase_in_h1(page),
        CheckKind::KeyphraseInH2 => keyphrase_in_h2(page),
        CheckKind::HeadingHierarchy => heading_hierarchy(page),
        CheckKind::CodeMinification => code_minification(page),
        CheckKind::SchemaMarkup => schema_markup(page),
        CheckKind::ImageFileSize => image_file_size(page),
    }
}

fn keyphrase_in_title(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::KeyphraseInTitle;
    let title = &page.content.title;
    if contains_phrase(title, page.keyphrase) {
        return CheckOutcome::pass(kind, format!("The page title contains the keyphrase \"{}\".", page.keyphrase));
    }
    if title.is_empty() {
        return CheckOutcome::fail(kind, "The page has no title.", "The page has no <title> element.");
    }
    CheckOutcome::fail(
        kind,
        format!("The page title does not contain the keyphrase \"{}\".", page.keyphrase),
        format!("Current title: \"{}\"", title),
    )
}

fn keyphrase_in_meta_description(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::KeyphraseInMetaDescription;
    let description = &page.content.meta_description;
    if contains_phrase(description, page.keyphrase) {
        return CheckOutcome::pass(kind, "The meta description contains the keyphrase.");
    }
    if description.is_empty() {
        return CheckOutcome::fail(
            kind,
            "The page has no meta description.",
            format!("No meta description. Page title: \"{}\"", page.content.title),
        );
    }
    CheckOutcome::fail(
        kind,
        format!("The meta description does not contain the keyphrase \"{}\".", page.keyphrase),
        format!("Current meta description: \"{}\"", description),
    )
}

fn keyphrase_in_url(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::KeyphraseInUrl;
    if page.is_home_page {
        return CheckOutcome::pass(kind, "This is the homepage, so the URL does not need the keyphrase.");
    }

    let url = normalize(page.url);
    let keyphrase = normalize(page.keyphrase);
    let found = !keyphrase.is_empty()
        && [keyphrase.clone(), keyphrase.replace(' ', "-"), keyphrase.replace(' ', "_")]
            .iter()
            .any(|form| url.contains(form.as_str()));

    if found {
        CheckOutcome::pass(kind, "The URL contains the keyphrase.")
    } else {
        CheckOutcome::fail(
            kind,
            format!("The URL does not contain the keyphrase \"{}\".", page.keyphrase),
            format!("Current URL: {}", page.url),
        )
    }
}

fn content_length(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::ContentLength;
    let words = word_count(&page.content.content);
    if words >= MIN_WORD_COUNT {
        CheckOutcome::pass(kind, format!("The page contains {} words.", words))
    } else {
        CheckOutcome::fail(
            kind,
            format!("The page contains {} words, fewer than the recommended {}.", words, MIN_WORD_COUNT),
            format!("Word count: {}", words),
        )
    }
}

fn density(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::KeyphraseDensity;
    let density = keyphrase_density(&page.content.content, page.keyphrase);
    let context = format!("Keyphrase density: {:.2}% across {} words", density, word_count(&page.content.content));

    if (MIN_DENSITY..=MAX_DENSITY).contains(&density) {
        CheckOutcome::pass(kind, format!("Keyphrase density is {:.2}%, within the {}-{}% range.", density, MIN_DENSITY, MAX_DENSITY))
    } else if density < MIN_DENSITY {
        CheckOutcome::fail(
            kind,
            format!("Keyphrase density is {:.2}%, below the recommended {}%.", density, MIN_DENSITY),
            context,
        )
    } else {
        CheckOutcome::fail(
            kind,
            format!("Keyphrase density is {:.2}%, above the recommended {}%.", density, MAX_DENSITY),
            context,
        )
    }
}

fn keyphrase_in_introduction(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::KeyphraseInIntroduction;
    match page.content.paragraphs.first() {
        None => CheckOutcome::fail(kind, "No introductory paragraph was found.", "The page has no paragraphs."),
        Some(first) if contains_phrase(first, page.keyphrase) => {
            CheckOutcome::pass(kind, "The first paragraph contains the keyphrase.")
        }
        Some(first) => CheckOutcome::fail(
            kind,
            format!("The first paragraph does not contain the keyphrase \"{}\".", page.keyphrase),
            format!("First paragraph: \"{}\"", first),
        ),
    }
}

fn image_alt_attributes(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::ImageAltAttributes;
    let images = &page.content.images;
    if images.iter().any(|image| contains_phrase(&image.alt, page.keyphrase)) {
        return CheckOutcome::pass(kind, "At least one image alt attribute contains the keyphrase.");
    }
    if images.is_empty() {
        return CheckOutcome::fail(kind, "The page has no images.", "The page has no images.");
    }

    let alts: Vec<&str> = images
        .iter()
        .map(|image| if image.alt.is_empty() { "(missing)" } else { image.alt.as_str() })
        .collect();
    CheckOutcome::fail(
        kind,
        format!("None of the {} image alt attributes contain the keyphrase.", images.len()),
        format!("Image alt texts: {}", alts.join(" | ")),
    )
}

fn internal_links(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::InternalLinks;
    let count = page.content.internal_links.len();
    if count > 0 {
        CheckOutcome::pass(kind, format!("The page has {} internal links.", count))
    } else {
        CheckOutcome::fail(kind, "The page has no internal links.", "Internal links found: 0")
    }
}

fn outbound_links(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::OutboundLinks;
    let count = page.content.outbound_links.len();
    if count > 0 {
        CheckOutcome::pass(kind, format!("The page has {} outbound links.", count))
    } else {
        CheckOutcome::fail(kind, "The page has no outbound links.", "Outbound links found: 0")
    }
}

fn is_next_gen(image: &ImageInfo) -> bool {
    let path = image.src.split(['?', '#']).next().unwrap_or_default().to_lowercase();
    NEXT_GEN_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn next_gen_formats(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::NextGenImageFormats;
    let images = &page.content.images;
    // A page without images does not pass this check.
    if images.is_empty() {
        return CheckOutcome::fail(kind, "The page has no images to evaluate.", "The page has no images.");
    }

    let legacy: Vec<&str> = images
        .iter()
        .filter(|image| !is_next_gen(image))
        .map(|image| image.src.as_str())
        .collect();
    if legacy.is_empty() {
        CheckOutcome::pass(kind, "All images use next-gen formats (WebP, AVIF or SVG).")
    } else {
        CheckOutcome::fail(
            kind,
            format!("{} of {} images are not in a next-gen format.", legacy.len(), images.len()),
            format!("Images in legacy formats: {}", legacy.join(", ")),
        )
    }
}

fn og_image(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::OgImage;
    let og = &page.content.open_graph;
    let Some(image) = &og.image else {
        return CheckOutcome::fail(kind, "The page has no og:image.", "No og:image meta tag.");
    };

    match (og.image_width, og.image_height) {
        (Some(w), Some(h)) if w >= OG_IMAGE_MIN.0 && h >= OG_IMAGE_MIN.1 => CheckOutcome::pass(
            kind,
            format!("An og:image is set at {}x{}, meeting the recommended {}x{}.", w, h, OG_IMAGE_MIN.0, OG_IMAGE_MIN.1),
        ),
        (Some(w), Some(h)) => CheckOutcome::pass(
            kind,
            format!("An og:image is set ({}), but {}x{} is smaller than the recommended {}x{}.", image, w, h, OG_IMAGE_MIN.0, OG_IMAGE_MIN.1),
        ),
        _ => CheckOutcome::pass(kind, format!("An og:image is set ({}).", image)),
    }
}

fn og_title_and_description(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::OgTitleAndDescription;
    let og = &page.content.open_graph;
    let context = format!(
        "OG title: {:?}; OG description: {:?}",
        og.title.as_deref().unwrap_or(""),
        og.description.as_deref().unwrap_or("")
    );

    let (Some(title), Some(description)) = (&og.title, &og.description) else {
        let missing = match (&og.title, &og.description) {
            (None, None) => "og:title and og:description are",
            (None, Some(_)) => "og:title is",
            _ => "og:description is",
        };
        return CheckOutcome::fail(kind, format!("The {} missing.", missing), context);
    };

    let title_len = title.chars().count();
    let description_len = description.chars().count();
    let mut problems = Vec::new();
    if !(OG_TITLE_CHARS.0..=OG_TITLE_CHARS.1).contains(&title_len) {
        problems.push(format!(
            "og:title is {} characters (recommended {}-{})",
            title_len, OG_TITLE_CHARS.0, OG_TITLE_CHARS.1
        ));
    }
    if !(OG_DESCRIPTION_CHARS.0..=OG_DESCRIPTION_CHARS.1).contains(&description_len) {
        problems.push(format!(
            "og:description is {} characters (recommended {}-{})",
            description_len, OG_DESCRIPTION_CHARS.0, OG_DESCRIPTION_CHARS.1
        ));
    }

    if problems.is_empty() {
        CheckOutcome::pass(kind, "og:title and og:description are present with good lengths.")
    } else {
        CheckOutcome::fail(kind, format!("{}.", problems.join("; ")), context)
    }
}

fn keyphrase_in_h1(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::KeyphraseInH1;
    let h1s: Vec<&str> = page.content.headings_at(1).map(|h| h.text.as_str()).collect();

    match h1s.as_slice() {
        [] => CheckOutcome::fail(kind, "No H1 heading found on the page.", "The page has no H1 heading."),
        [h1] => {
            if contains_phrase(h1, page.keyphrase) {
                CheckOutcome::pass(kind, "The H1 heading contains the keyphrase.")
            } else if contains_all_words(h1, &significant_words(page.keyphrase)) {
                CheckOutcome::pass(kind, "The H1 heading contains all words of the keyphrase.")
            } else {
                CheckOutcome::fail(
                    kind,
                    format!("The H1 heading does not contain the keyphrase \"{}\".", page.keyphrase),
                    format!("Current H1: \"{}\"", h1),
                )
            }
        }
        many => CheckOutcome::fail(
            kind,
            format!("The page has {} H1 headings; it should have exactly one.", many.len()),
            format!("Current H1 headings: {}", many.join(" | ")),
        ),
    }
}

fn keyphrase_in_h2(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::KeyphraseInH2;
    let h2s: Vec<&str> = page.content.headings_at(2).map(|h| h.text.as_str()).collect();
    if h2s.is_empty() {
        return CheckOutcome::fail(kind, "No H2 headings found on the page.", "The page has no H2 headings.");
    }

    let words = significant_words(page.keyphrase);
    if h2s.iter().any(|h2| contains_phrase(h2, page.keyphrase)) {
        return CheckOutcome::pass(kind, "An H2 heading contains the keyphrase.");
    }
    if h2s.iter().any(|h2| contains_all_words(h2, &words)) {
        return CheckOutcome::pass(kind, "An H2 heading contains all words of the keyphrase.");
    }
    if contains_all_words(&h2s.join(" "), &words) {
        return CheckOutcome::pass(kind, "The keyphrase words are covered across the H2 headings.");
    }

    CheckOutcome::fail(
        kind,
        format!("None of the {} H2 headings contain the keyphrase \"{}\".", h2s.len(), page.keyphrase),
        format!("Current H2 headings: {}", h2s.join(" | ")),
    )
}

fn heading_hierarchy(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::HeadingHierarchy;
    let headings = &page.content.headings;
    let outline = headings
        .iter()
        .map(|h| format!("H{} \"{}\"", h.level, h.text))
        .collect::<Vec<_>>()
        .join(" > ");
    let context = format!("Heading outline: {}", if outline.is_empty() { "(none)" } else { outline.as_str() });

    let h1_count = page.content.headings_at(1).count();
    let h2_count = page.content.headings_at(2).count();
    let mut problems = Vec::new();
    if h1_count != 1 {
        problems.push(format!("found {} H1 headings instead of exactly one", h1_count));
    }
    if h2_count == 0 {
        problems.push("no H2 headings".to_string());
    }
    for pair in headings.windows(2) {
        if pair[1].level > pair[0].level + 1 {
            problems.push(format!("H{} is followed by H{}", pair[0].level, pair[1].level));
            break;
        }
    }

    if problems.is_empty() {
        CheckOutcome::pass(kind, "Headings follow a proper hierarchy.")
    } else {
        CheckOutcome::fail(kind, format!("Heading structure issues: {}.", problems.join("; ")), context)
    }
}

fn code_minification(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::CodeMinification;
    let resources = &page.content.resources;
    let total = resources.total();
    let minified = resources.iter().filter(|r| r.minified).count();
    let ratio = if total == 0 { 100.0 } else { minified as f64 / total as f64 * 100.0 };

    if ratio >= MIN_MINIFIED_RATIO {
        return CheckOutcome::pass(kind, format!("{} of {} JS/CSS resources are minified ({:.0}%).", minified, total, ratio));
    }

    let unminified: Vec<String> = resources
        .iter()
        .filter(|r| !r.minified)
        .map(|r| r.url.clone().unwrap_or_else(|| format!("inline {:?}", r.kind).to_lowercase()))
        .collect();
    CheckOutcome::fail(
        kind,
        format!("Only {} of {} JS/CSS resources are minified ({:.0}%).", minified, total, ratio),
        format!("Unminified resources: {}", unminified.join(", ")),
    )
}

fn schema_markup(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::SchemaMarkup;
    let schema = &page.content.schema;
    if schema.detected {
        let types: Vec<&str> = schema
            .types
            .iter()
            .chain(schema.microdata_types.iter())
            .map(String::as_str)
            .collect();
        let description = if types.is_empty() {
            "Structured data was found on the page.".to_string()
        } else {
            format!("Structured data was found: {}.", types.join(", "))
        };
        return CheckOutcome::pass(kind, description);
    }

    CheckOutcome::fail(kind, "No schema.org structured data was found.", "No JSON-LD or microdata.")
        .with_recommendation(templates::schema_markup(page.keyphrase, page.is_home_page))
}

fn image_file_size(page: &PageContext<'_>) -> CheckOutcome {
    let kind = CheckKind::ImageFileSize;
    let oversized: Vec<&ImageInfo> = page
        .content
        .images
        .iter()
        .filter(|image| image.size.is_some_and(|size| size > MAX_IMAGE_BYTES))
        .collect();
    let measured = page.content.images.iter().filter(|image| image.size.is_some()).count();

    if oversized.is_empty() {
        return CheckOutcome::pass(
            kind,
            format!("All {} images with a known size are under {}KB.", measured, MAX_IMAGE_BYTES / 1024),
        );
    }

    CheckOutcome::fail(
        kind,
        format!("{} images are larger than {}KB.", oversized.len(), MAX_IMAGE_BYTES / 1024),
        format!("Oversized images: {}", oversized.len()),
    )
    .with_recommendation(templates::image_file_size(&oversized, MAX_IMAGE_BYTES))
}
