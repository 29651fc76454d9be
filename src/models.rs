use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// Everything the rule engine needs to know about one fetched page.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedContent {
    pub title: String,
    pub meta_description: String,
    pub open_graph: OpenGraph,
    /// Whitespace-collapsed visible text of the page.
    pub content: String,
    pub paragraphs: Vec<String>,
    pub headings: Vec<Heading>,
    pub images: Vec<ImageInfo>,
    pub internal_links: Vec<String>,
    pub outbound_links: Vec<String>,
    pub resources: Resources,
    pub schema: SchemaSummary,
}

impl ScrapedContent {
    pub fn headings_at(&self, level: u8) -> impl Iterator<Item = &Heading> {
        self.headings.iter().filter(move |h| h.level == level)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
    /// Bytes reported by `Content-Length`, when the HEAD request succeeded.
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Js,
    Css,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub kind: ResourceKind,
    /// Absolute URL for external resources, `None` for inline blocks.
    pub url: Option<String>,
    pub content: Option<String>,
    pub minified: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Resources {
    pub js: Vec<Resource>,
    pub css: Vec<Resource>,
}

impl Resources {
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.js.iter().chain(self.css.iter())
    }

    pub fn total(&self) -> usize {
        self.js.len() + self.css.len()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub detected: bool,
    /// `@type` values found in JSON-LD blocks.
    pub types: BTreeSet<String>,
    pub json_ld: Vec<serde_json::Value>,
    pub microdata_types: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoCheck {
    pub title: String,
    pub description: String,
    pub passed: bool,
    pub recommendation: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub url: String,
    pub keyphrase: String,
    pub checks: Vec<SeoCheck>,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub score: u8,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(url: String, keyphrase: String, checks: Vec<SeoCheck>) -> Self {
        let passed_checks = checks.iter().filter(|c| c.passed).count();
        let failed_checks = checks.len() - passed_checks;
        Self {
            url,
            keyphrase,
            score: score(passed_checks, failed_checks),
            checks,
            passed_checks,
            failed_checks,
            analyzed_at: Utc::now(),
        }
    }
}

/// Percentage of passed checks, rounded half away from zero.
pub fn score(passed: usize, failed: usize) -> u8 {
    let total = passed + failed;
    if total == 0 {
        return 0;
    }
    (passed as f64 / total as f64 * 100.0).round() as u8
}
