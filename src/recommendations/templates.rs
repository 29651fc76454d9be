//! Deterministic remediation text, used whenever the completion backend is not.

use crate::models::ImageInfo;
use crate::rules::CheckKind;

/// Template output for `check_title`, or a generic sentence for unknown titles.
pub fn fallback(check_title: &str, keyphrase: &str, context: &str) -> String {
    match CheckKind::from_title(check_title) {
        Some(kind) => for_check(kind, keyphrase, context),
        None => generic(check_title, keyphrase),
    }
}

pub fn generic(check_title: &str, keyphrase: &str) -> String {
    format!(
        "Review the \"{}\" check and update the page so it better supports the keyphrase \"{}\".",
        check_title, keyphrase
    )
}

fn for_check(kind: CheckKind, keyphrase: &str, context: &str) -> String {
    match kind {
        CheckKind::KeyphraseInTitle => format!(
            "Add the keyphrase \"{}\" to the page title, ideally near the beginning, and keep the title under 60 characters.",
            keyphrase
        ),
        CheckKind::KeyphraseInMetaDescription => format!(
            "Write a meta description of 120-155 characters that includes \"{}\" and tells searchers what they will find on the page.",
            keyphrase
        ),
        CheckKind::KeyphraseInUrl => format!(
            "Use a short, descriptive slug containing the keyphrase, for example \"/{}\", and redirect the old URL.",
            slugify(keyphrase)
        ),
        CheckKind::ContentLength => format!(
            "Expand the page to at least 300 words ({}). Cover \"{}\" in more depth with examples, answers to common questions and supporting details.",
            context, keyphrase
        ),
        CheckKind::KeyphraseDensity => format!(
            "Adjust how often \"{}\" appears so the density lands between 0.5% and 2.5% ({}). Use synonyms instead of repeating the exact phrase.",
            keyphrase, context
        ),
        CheckKind::KeyphraseInIntroduction => format!(
            "Mention \"{}\" in the first paragraph so readers and search engines immediately see what the page is about.",
            keyphrase
        ),
        CheckKind::ImageAltAttributes => format!(
            "Give at least one relevant image descriptive alt text that includes \"{}\".",
            keyphrase
        ),
        CheckKind::InternalLinks => format!(
            "Link to related pages on your own site using descriptive anchor text related to \"{}\".",
            keyphrase
        ),
        CheckKind::OutboundLinks => format!(
            "Link to one or two authoritative external sources that support your content about \"{}\".",
            keyphrase
        ),
        CheckKind::NextGenImageFormats => format!(
            "Convert images to WebP or AVIF (or SVG for icons and logos) to reduce page weight. {}.",
            context
        ),
        CheckKind::OgImage => {
            "Add an og:image meta tag pointing to an image of at least 1200x630 pixels so shared links get a rich preview.".to_string()
        }
        CheckKind::OgTitleAndDescription => format!(
            "Add og:title (10-70 characters) and og:description (100-200 characters) meta tags that mention \"{}\".",
            keyphrase
        ),
        CheckKind::KeyphraseInH1 => format!(
            "Use exactly one H1 heading and include the keyphrase \"{}\" in it.",
            keyphrase
        ),
        CheckKind::KeyphraseInH2 => format!(
            "Include \"{}\" or its main words in at least one H2 subheading.",
            keyphrase
        ),
        CheckKind::HeadingHierarchy => format!(
            "Use a single H1, add H2 subheadings, and avoid skipping levels (for example H1 followed directly by H3). {}.",
            context
        ),
        CheckKind::CodeMinification => format!(
            "Minify JavaScript and CSS as part of your build so that at least 40% of resources are minified. {}.",
            context
        ),
        CheckKind::SchemaMarkup => format!(
            "Add JSON-LD structured data describing the page content related to \"{}\".",
            keyphrase
        ),
        CheckKind::ImageFileSize => {
            "Compress or resize images larger than 300KB.".to_string()
        }
    }
}

/// Suggests schema types to add for a page with no structured data.
pub fn schema_markup(keyphrase: &str, is_home_page: bool) -> String {
    let suggested = if is_home_page {
        "Organization and WebSite"
    } else {
        "Article (or Product/Service, whichever matches the page) plus BreadcrumbList"
    };
    format!(
        "Add JSON-LD structured data using schema.org {} types, with \"{}\" reflected in the name or headline. \
Validate the markup with the Rich Results Test.",
        suggested, keyphrase
    )
}

/// Lists every oversized image by file name and size.
pub fn image_file_size(oversized: &[&ImageInfo], limit_bytes: u64) -> String {
    let listed: Vec<String> = oversized
        .iter()
        .map(|image| {
            let size_kb = image.size.unwrap_or_default() as f64 / 1024.0;
            format!("{} ({:.1}KB)", file_name(&image.src), size_kb)
        })
        .collect();
    format!(
        "Compress or resize these images to under {}KB: {}. Serving them as WebP or AVIF usually helps.",
        limit_bytes / 1024,
        listed.join(", ")
    )
}

fn file_name(src: &str) -> &str {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(path)
}

fn slugify(keyphrase: &str) -> String {
    keyphrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
