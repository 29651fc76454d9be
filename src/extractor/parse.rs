use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use url::Url;

use super::minify::is_minified;
use crate::models::{Heading, OpenGraph, Resource, ResourceKind, Resources, SchemaSummary};

// Create static selectors to avoid recompiling them each time
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to parse title selector"));
static META_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name], meta[property]").expect("Failed to parse meta selector")
});
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to parse body selector"));
static CONTENT_PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "article p, main p, section p, [role=main] p, .content p, .post-content p, \
         .entry-content p, .article-body p, #content p",
    )
    .expect("Failed to parse content paragraph selector")
});
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("Failed to parse paragraph selector"));
static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("Failed to parse heading selector")
});
static IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("Failed to parse image selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Failed to parse link selector"));
static EXTERNAL_SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script[src]").expect("Failed to parse script selector"));
static INLINE_SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script:not([src])").expect("Failed to parse inline script selector")
});
static STYLESHEET_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("link[rel~=stylesheet][href]").expect("Failed to parse stylesheet selector")
});
static STYLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("style").expect("Failed to parse style selector"));
static JSONLD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#)
        .expect("Failed to parse JSON-LD selector")
});
static MICRODATA_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[itemscope], [itemtype]").expect("Failed to parse microdata selector")
});

static SCHEMA_ORG_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"schema\.org/([^/?#\s]+)/?$").expect("Failed to compile schema.org pattern"));

const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Everything read out of the markup; image sizes are filled in afterwards.
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub title: String,
    pub meta_description: String,
    pub open_graph: OpenGraph,
    pub content: String,
    pub paragraphs: Vec<String>,
    pub headings: Vec<Heading>,
    /// (absolute src, alt)
    pub images: Vec<(String, String)>,
    pub internal_links: Vec<String>,
    pub outbound_links: Vec<String>,
    pub resources: Resources,
    pub schema: SchemaSummary,
}

pub fn parse_page(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .unwrap_or_default();

    let (meta_description, open_graph) = extract_meta(&document);
    let (internal_links, outbound_links) = extract_links(&document, page_url);

    ParsedPage {
        title,
        meta_description,
        open_graph,
        content: extract_visible_text(&document),
        paragraphs: extract_paragraphs(&document),
        headings: extract_headings(&document),
        images: extract_images(&document, page_url),
        internal_links,
        outbound_links,
        resources: extract_resources(&document, page_url),
        schema: extract_schema(&document),
    }
}

fn extract_meta(document: &Html) -> (String, OpenGraph) {
    let mut description = String::new();
    let mut og = OpenGraph::default();

    for element in document.select(&META_SELECTOR) {
        let key = element
            .value()
            .attr("name")
            .or_else(|| element.value().attr("property"))
            .map(str::to_ascii_lowercase);
        let Some(content) = element.value().attr("content").map(str::trim) else {
            continue;
        };
        let Some(key) = key else {
            continue;
        };

        match key.as_str() {
            "description" if description.is_empty() => description = content.to_string(),
            "og:title" if og.title.is_none() => og.title = non_empty(content),
            "og:description" if og.description.is_none() => og.description = non_empty(content),
            "og:image" if og.image.is_none() => og.image = non_empty(content),
            "og:image:width" => og.image_width = content.parse().ok(),
            "og:image:height" => og.image_height = content.parse().ok(),
            _ => {}
        }
    }

    (description, og)
}

fn extract_visible_text(document: &Html) -> String {
    let mut text = String::new();
    match document.select(&BODY_SELECTOR).next() {
        Some(body) => collect_text(body, &mut text),
        None => collect_text(document.root_element(), &mut text),
    }
    collapse_whitespace(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&text.text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !HIDDEN_ELEMENTS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}

fn extract_paragraphs(document: &Html) -> Vec<String> {
    let collect = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .collect()
    };

    let paragraphs = collect(&CONTENT_PARAGRAPH_SELECTOR);
    if paragraphs.is_empty() {
        collect(&PARAGRAPH_SELECTOR)
    } else {
        paragraphs
    }
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    document
        .select(&HEADING_SELECTOR)
        .filter_map(|element| {
            let level = element.value().name()[1..].parse::<u8>().ok()?;
            Some(Heading {
                level,
                text: collapse_whitespace(&element.text().collect::<String>()),
            })
        })
        .collect()
}

fn extract_images(document: &Html, page_url: &Url) -> Vec<(String, String)> {
    document
        .select(&IMAGE_SELECTOR)
        .filter_map(|element| {
            let src = element.value().attr("src")?.trim();
            if src.is_empty() {
                return None;
            }
            let resolved = page_url
                .join(src)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| src.to_string());
            let alt = element.value().attr("alt").unwrap_or_default().trim().to_string();
            Some((resolved, alt))
        })
        .collect()
}

fn extract_links(document: &Html, page_url: &Url) -> (Vec<String>, Vec<String>) {
    let page_host = page_url.host_str().map(str::to_ascii_lowercase);
    let mut internal = Vec::new();
    let mut outbound = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = page_url.join(href.trim()) else {
            debug!("Skipping unparsable href {:?}", href);
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        if resolved.host_str().map(str::to_ascii_lowercase) == page_host {
            internal.push(resolved.to_string());
        } else {
            outbound.push(resolved.to_string());
        }
    }

    (internal, outbound)
}

fn extract_resources(document: &Html, page_url: &Url) -> Resources {
    let mut resources = Resources::default();

    for element in document.select(&EXTERNAL_SCRIPT_SELECTOR) {
        if let Some(url) = element.value().attr("src").and_then(|src| page_url.join(src.trim()).ok()) {
            resources.js.push(external_resource(ResourceKind::Js, url));
        }
    }
    for element in document.select(&STYLESHEET_SELECTOR) {
        if let Some(url) = element.value().attr("href").and_then(|href| page_url.join(href.trim()).ok()) {
            resources.css.push(external_resource(ResourceKind::Css, url));
        }
    }

    for element in document.select(&INLINE_SCRIPT_SELECTOR) {
        if !is_javascript_type(element.value().attr("type")) {
            continue;
        }
        if let Some(resource) = inline_resource(ResourceKind::Js, element) {
            resources.js.push(resource);
        }
    }
    for element in document.select(&STYLE_SELECTOR) {
        if let Some(resource) = inline_resource(ResourceKind::Css, element) {
            resources.css.push(resource);
        }
    }

    resources
}

fn external_resource(kind: ResourceKind, url: Url) -> Resource {
    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_ascii_lowercase();
    Resource {
        kind,
        minified: file_name.contains(".min."),
        url: Some(url.to_string()),
        content: None,
    }
}

fn inline_resource(kind: ResourceKind, element: ElementRef<'_>) -> Option<Resource> {
    let code: String = element.text().collect();
    if code.trim().is_empty() {
        return None;
    }
    Some(Resource {
        kind,
        url: None,
        minified: is_minified(&code),
        content: Some(code),
    })
}

fn is_javascript_type(script_type: Option<&str>) -> bool {
    match script_type.map(|t| t.trim().to_ascii_lowercase()) {
        None => true,
        Some(t) => t.is_empty() || t == "module" || t.contains("javascript") || t.contains("ecmascript"),
    }
}

fn extract_schema(document: &Html) -> SchemaSummary {
    let mut summary = SchemaSummary::default();

    for element in document.select(&JSONLD_SELECTOR) {
        let raw: String = element.text().collect();
        match serde_json::from_str::<serde_json::Value>(raw.trim()) {
            Ok(json) => {
                collect_json_ld_types(&json, &mut summary.types);
                summary.json_ld.push(json);
            }
            Err(e) => warn!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    for element in document.select(&MICRODATA_SELECTOR) {
        let Some(item_type) = element.value().attr("itemtype") else {
            continue;
        };
        for token in item_type.split_whitespace() {
            let name = SCHEMA_ORG_TYPE
                .captures(token)
                .and_then(|caps| caps.get(1))
                .map_or(token, |m| m.as_str());
            summary.microdata_types.insert(name.to_string());
        }
    }

    summary.detected = !summary.json_ld.is_empty() || !summary.microdata_types.is_empty();
    summary
}

/// Collects `@type` values from a JSON-LD value, including nested and `@graph` nodes.
fn collect_json_ld_types(json: &serde_json::Value, types: &mut BTreeSet<String>) {
    match json {
        serde_json::Value::Object(map) => {
            match map.get("@type") {
                Some(serde_json::Value::String(s)) => {
                    types.insert(s.clone());
                }
                Some(serde_json::Value::Array(items)) => {
                    types.extend(items.iter().filter_map(|t| t.as_str()).map(str::to_string));
                }
                _ => {}
            }
            for (key, value) in map {
                if key != "@context" {
                    collect_json_ld_types(value, types);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_json_ld_types(item, types);
            }
        }
        _ => {}
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
