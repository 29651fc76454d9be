use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::extractor::ContentExtractor;
use crate::models::AnalysisReport;
use crate::recommendations::RecommendationProvider;
use crate::rules::SeoRuleEngine;
use crate::security::{DomainAllowlist, UrlSecurityGate};

/// Runs one analysis: gate, extraction, rules, then report assembly.
pub struct Analyzer {
    gate: Arc<UrlSecurityGate>,
    extractor: ContentExtractor,
    engine: SeoRuleEngine,
}

impl Analyzer {
    pub fn new(gate: Arc<UrlSecurityGate>, extractor: ContentExtractor, engine: SeoRuleEngine) -> Self {
        Self {
            gate,
            extractor,
            engine,
        }
    }

    pub fn from_config(config: &Config, allowlist: Arc<DomainAllowlist>) -> Result<Self> {
        let gate = Arc::new(UrlSecurityGate::new(allowlist, config.enforce_domain_allowlist));
        let extractor = ContentExtractor::new(config.fetch_timeout_secs, gate.clone())?;
        let recommender = Arc::new(RecommendationProvider::from_config(config)?);
        Ok(Self::new(gate, extractor, SeoRuleEngine::new(recommender)))
    }

    pub async fn analyze(&self, url: &str, keyphrase: &str) -> Result<AnalysisReport> {
        let url = url.trim();
        let keyphrase = keyphrase.trim();
        if url.is_empty() || keyphrase.is_empty() {
            return Err(AppError::ValidationError("URL and keyphrase are required".to_string()));
        }

        let start = Instant::now();
        let validated = self.gate.validate(url).map_err(|rejection| {
            warn!(target: "security", url, %rejection, "URL rejected");
            AppError::from(rejection)
        })?;
        let addrs = self
            .gate
            .resolve_and_check_ip(&validated)
            .await
            .map_err(AppError::from)?;

        info!("Analyzing {} for keyphrase {:?}", validated, keyphrase);
        let content = self.extractor.extract(&validated, &addrs).await?;

        let checks = self
            .engine
            .evaluate(&content, keyphrase, validated.as_str(), is_home_page(&validated))
            .await;
        let report = AnalysisReport::new(validated.to_string(), keyphrase.to_string(), checks);

        info!(
            "Analysis of {} finished in {:?}: {}/{} checks passed, score {}",
            report.url,
            start.elapsed(),
            report.passed_checks,
            report.checks.len(),
            report.score
        );
        Ok(report)
    }
}

/// Root path, ignoring any query string.
pub fn is_home_page(url: &Url) -> bool {
    matches!(url.path(), "" | "/")
}
