//! On-page SEO checks.
//!
//! Every check is a pure function of the extracted page; failed checks are then
//! handed to the [`RecommendationProvider`] for remediation text.

pub mod checks;
pub mod text;

use std::sync::Arc;
use tracing::debug;

use crate::models::{Priority, ScrapedContent, SeoCheck};
use crate::recommendations::RecommendationProvider;
use checks::PageContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    KeyphraseInTitle,
    KeyphraseInMetaDescription,
    KeyphraseInUrl,
    ContentLength,
    KeyphraseDensity,
    KeyphraseInIntroduction,
    ImageAltAttributes,
    InternalLinks,
    OutboundLinks,
    NextGenImageFormats,
    OgImage,
    OgTitleAndDescription,
    KeyphraseInH1,
    KeyphraseInH2,
    HeadingHierarchy,
    CodeMinification,
    SchemaMarkup,
    ImageFileSize,
}

impl CheckKind {
    /// All checks in evaluation order.
    pub const ALL: [CheckKind; 18] = [
        CheckKind::KeyphraseInTitle,
        CheckKind::KeyphraseInMetaDescription,
        CheckKind::KeyphraseInUrl,
        CheckKind::ContentLength,
        CheckKind::KeyphraseDensity,
        CheckKind::KeyphraseInIntroduction,
        CheckKind::ImageAltAttributes,
        CheckKind::InternalLinks,
        CheckKind::OutboundLinks,
        CheckKind::NextGenImageFormats,
        CheckKind::OgImage,
        CheckKind::OgTitleAndDescription,
        CheckKind::KeyphraseInH1,
        CheckKind::KeyphraseInH2,
        CheckKind::HeadingHierarchy,
        CheckKind::CodeMinification,
        CheckKind::SchemaMarkup,
        CheckKind::ImageFileSize,
    ];

    pub fn title(self) -> &'static str {
        match self {
            CheckKind::KeyphraseInTitle => "Keyphrase in Title",
            CheckKind::KeyphraseInMetaDescription => "Keyphrase in Meta Description",
            CheckKind::KeyphraseInUrl => "Keyphrase in URL",
            CheckKind::ContentLength => "Content Length",
            CheckKind::KeyphraseDensity => "Keyphrase Density",
            CheckKind::KeyphraseInIntroduction => "Keyphrase in Introduction",
            CheckKind::ImageAltAttributes => "Image Alt Attributes",
            CheckKind::InternalLinks => "Internal Links",
            CheckKind::OutboundLinks => "Outbound Links",
            CheckKind::NextGenImageFormats => "Next-Gen Image Formats",
            CheckKind::OgImage => "OG Image",
            CheckKind::OgTitleAndDescription => "OG Title and Description",
            CheckKind::KeyphraseInH1 => "Keyphrase in H1 Heading",
            CheckKind::KeyphraseInH2 => "Keyphrase in H2 Headings",
            CheckKind::HeadingHierarchy => "Heading Hierarchy",
            CheckKind::CodeMinification => "Code Minification",
            CheckKind::SchemaMarkup => "Schema Markup",
            CheckKind::ImageFileSize => "Image File Size",
        }
    }

    pub fn from_title(title: &str) -> Option<CheckKind> {
        CheckKind::ALL.into_iter().find(|kind| kind.title() == title)
    }

    /// Checks whose remediation text never comes from the completion backend.
    pub fn always_deterministic(self) -> bool {
        matches!(
            self,
            CheckKind::SchemaMarkup
                | CheckKind::ImageFileSize
                | CheckKind::NextGenImageFormats
                | CheckKind::ContentLength
                | CheckKind::KeyphraseDensity
                | CheckKind::HeadingHierarchy
                | CheckKind::CodeMinification
        )
    }
}

/// Static priority per check title; unknown titles are medium.
pub fn priority_for(title: &str) -> Priority {
    match title {
        "Keyphrase in Title"
        | "Keyphrase in Meta Description"
        | "Keyphrase in Introduction"
        | "Keyphrase in H1 Heading"
        | "Content Length" => Priority::High,
        "Outbound Links"
        | "Next-Gen Image Formats"
        | "OG Image"
        | "Code Minification"
        | "Image File Size" => Priority::Low,
        _ => Priority::Medium,
    }
}

/// Result of a single check before remediation text is attached.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    pub passed: bool,
    pub description: String,
    /// What was measured, fed to the recommendation layer.
    pub context: String,
    /// Remediation built from structured data, bypassing the provider.
    pub custom_recommendation: Option<String>,
}

/// Runs every check in evaluation order.
pub fn run_checks(
    content: &ScrapedContent,
    keyphrase: &str,
    url: &str,
    is_home_page: bool,
) -> Vec<CheckOutcome> {
    let page = PageContext {
        content,
        keyphrase,
        url,
        is_home_page,
    };
    CheckKind::ALL
        .into_iter()
        .map(|kind| checks::run(kind, &page))
        .collect()
}

pub struct SeoRuleEngine {
    recommender: Arc<RecommendationProvider>,
}

impl SeoRuleEngine {
    pub fn new(recommender: Arc<RecommendationProvider>) -> Self {
        Self { recommender }
    }

    pub async fn evaluate(
        &self,
        content: &ScrapedContent,
        keyphrase: &str,
        url: &str,
        is_home_page: bool,
    ) -> Vec<SeoCheck> {
        let outcomes = run_checks(content, keyphrase, url, is_home_page);
        let mut results = Vec::with_capacity(outcomes.len());

        for outcome in outcomes {
            let title = outcome.kind.title();
            let recommendation = if outcome.passed {
                String::new()
            } else if let Some(custom) = outcome.custom_recommendation {
                custom
            } else {
                self.recommender
                    .recommend(title, keyphrase, &outcome.context)
                    .await
            };
            debug!("{}: {}", title, if outcome.passed { "passed" } else { "failed" });

            results.push(SeoCheck {
                title: title.to_string(),
                description: outcome.description,
                passed: outcome.passed,
                recommendation,
                priority: priority_for(title),
            });
        }

        results
    }
}

#[cfg(test)]
mod tests;
