pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod recommendations;
pub mod rules;
pub mod security;

use std::sync::Arc;
use analyzer::Analyzer;
use config::Config;
use security::DomainAllowlist;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Arc<Analyzer>,
    pub allowlist: Arc<DomainAllowlist>,
}

impl AppState {
    /// Builds the shared services, seeding the allowlist from configuration.
    pub fn from_config(config: Config) -> error::Result<Self> {
        let allowlist = Arc::new(DomainAllowlist::with_domains(&config.allowed_domains));
        let analyzer = Analyzer::from_config(&config, allowlist.clone())?;
        Ok(Self::new(config, analyzer, allowlist))
    }

    pub fn new(config: Config, analyzer: Analyzer, allowlist: Arc<DomainAllowlist>) -> Self {
        Self {
            config: Arc::new(config),
            analyzer: Arc::new(analyzer),
            allowlist,
        }
    }
}
