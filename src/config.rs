use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::rules::CheckKind;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const API_KEY_PREFIX: &str = "sk-";

/// Checks routed to the completion backend when `ENABLED_GPT_CHECKS` is unset.
pub const DEFAULT_GPT_CHECKS: [CheckKind; 5] = [
    CheckKind::KeyphraseInTitle,
    CheckKind::KeyphraseInMetaDescription,
    CheckKind::KeyphraseInUrl,
    CheckKind::KeyphraseInIntroduction,
    CheckKind::KeyphraseInH1,
];

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub enforce_domain_allowlist: bool,
    pub allowed_domains: Vec<String>,
    pub use_gpt_recommendations: bool,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub enabled_gpt_checks: Vec<String>,
    pub fetch_timeout_secs: u64,
    pub analyze_timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port
            .parse::<u16>()
            .map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let openai_api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let enabled_gpt_checks = match lookup("ENABLED_GPT_CHECKS") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_GPT_CHECKS
                .iter()
                .map(|check| check.title().to_string())
                .collect(),
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            enforce_domain_allowlist: parse_flag(&lookup, "ENFORCE_DOMAIN_ALLOWLIST", true),
            allowed_domains: lookup("ALLOWED_DOMAINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            use_gpt_recommendations: parse_flag(&lookup, "USE_GPT_RECOMMENDATIONS", true),
            openai_api_key,
            openai_model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: lookup("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            enabled_gpt_checks,
            fetch_timeout_secs: parse_secs(&lookup, "FETCH_TIMEOUT_SECS", 10)?,
            analyze_timeout_secs: parse_secs(&lookup, "ANALYZE_TIMEOUT_SECS", 90)?,
        })
    }

    pub fn has_valid_api_key(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|key| key.starts_with(API_KEY_PREFIX) && key.len() > API_KEY_PREFIX.len())
    }

    /// The completion backend is used only when switched on and a usable key exists.
    pub fn gpt_enabled(&self) -> bool {
        self.use_gpt_recommendations && self.has_valid_api_key()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        other => {
            warn!("Ignoring unrecognized value {:?} for {}, using {}", other, key, default);
            default
        }
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}
