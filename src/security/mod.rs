//! URL security gate.
//!
//! Every URL is normalized to https, checked against the domain allowlist and
//! for path traversal, and finally resolved so that hosts pointing at private,
//! loopback or link-local addresses never reach the extractor.

pub mod allowlist;
pub mod ip;

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};
use url::{Host, Url};

pub use allowlist::{is_valid_domain, DomainAllowlist};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateRejection {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Only HTTPS URLs are allowed (got {0})")]
    InsecureProtocol(String),

    #[error("Domain {0} is not in the allowlist")]
    DomainNotAllowed(String),

    #[error("Path traversal sequences are not allowed")]
    PathTraversal,

    #[error("Host {host} resolves to a restricted address ({range})")]
    RestrictedAddress { host: String, range: String },

    #[error("DNS lookup failed for {host}: {reason}")]
    DnsFailure { host: String, reason: String },
}

/// Hostname resolution used by the gate.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// Resolves through the operating system resolver.
pub struct SystemResolver;

#[async_trait]
impl DnsResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 443)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

pub struct UrlSecurityGate {
    allowlist: Arc<DomainAllowlist>,
    enforce_allowlist: bool,
    resolver: Arc<dyn DnsResolver>,
}

impl UrlSecurityGate {
    pub fn new(allowlist: Arc<DomainAllowlist>, enforce_allowlist: bool) -> Self {
        Self::with_resolver(allowlist, enforce_allowlist, Arc::new(SystemResolver))
    }

    pub fn with_resolver(
        allowlist: Arc<DomainAllowlist>,
        enforce_allowlist: bool,
        resolver: Arc<dyn DnsResolver>,
    ) -> Self {
        Self {
            allowlist,
            enforce_allowlist,
            resolver,
        }
    }

    /// Normalizes `raw_url` and runs the protocol, domain and path checks.
    pub fn validate(&self, raw_url: &str) -> Result<Url, GateRejection> {
        let normalized = normalize_url(raw_url);

        let url = Url::parse(&normalized)
            .map_err(|e| GateRejection::InvalidUrl(format!("{}: {}", raw_url.trim(), e)))?;

        if url.scheme() != "https" {
            return Err(GateRejection::InsecureProtocol(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| GateRejection::InvalidUrl(format!("{} has no host", raw_url.trim())))?;

        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        if self.enforce_allowlist && !self.allowlist.is_allowed(bare_host) {
            return Err(GateRejection::DomainNotAllowed(host.to_string()));
        }

        // The parser collapses dot segments, so traversal is judged on the raw text.
        if has_traversal(&normalized) {
            return Err(GateRejection::PathTraversal);
        }

        debug!("URL passed validation: {}", url);
        Ok(url)
    }

    /// Rejects hosts that are, or resolve to, restricted addresses.
    pub async fn resolve_and_check_ip(&self, url: &Url) -> Result<Vec<IpAddr>, GateRejection> {
        let host_label = url.host_str().unwrap_or_default().to_string();
        let addresses = match url.host() {
            Some(Host::Ipv4(v4)) => vec![IpAddr::V4(v4)],
            Some(Host::Ipv6(v6)) => vec![IpAddr::V6(v6)],
            Some(Host::Domain(domain)) => {
                if let Some(range) = ip::blocked_literal(domain) {
                    return Err(GateRejection::RestrictedAddress {
                        host: host_label,
                        range: range.to_string(),
                    });
                }
                self.resolver
                    .resolve(domain)
                    .await
                    .map_err(|e| GateRejection::DnsFailure {
                        host: host_label.clone(),
                        reason: e.to_string(),
                    })?
            }
            None => return Err(GateRejection::InvalidUrl(format!("{} has no host", url))),
        };

        if addresses.is_empty() {
            return Err(GateRejection::DnsFailure {
                host: host_label,
                reason: "no addresses returned".to_string(),
            });
        }

        for address in &addresses {
            if let Some(range) = ip::blocked_range(*address) {
                warn!(target: "security", host = %host_label, ip = %address, range, "blocked restricted address");
                return Err(GateRejection::RestrictedAddress {
                    host: host_label,
                    range: range.to_string(),
                });
            }
        }

        debug!("{} resolved to {:?}", host_label, addresses);
        Ok(addresses)
    }
}

/// Admission check for every outbound request made on behalf of an analysis.
///
/// Returns the addresses the request must be pinned to, so a later lookup
/// cannot hand back a different answer.
#[async_trait]
pub trait TargetGuard: Send + Sync {
    async fn admit(&self, url: &Url) -> Result<Vec<IpAddr>, GateRejection>;
}

#[async_trait]
impl TargetGuard for UrlSecurityGate {
    async fn admit(&self, url: &Url) -> Result<Vec<IpAddr>, GateRejection> {
        // Follow-up targets are never upgraded, only refused.
        if url.scheme() != "https" {
            warn!(target: "security", url = %url, "refusing non-https target");
            return Err(GateRejection::InsecureProtocol(url.scheme().to_string()));
        }
        let checked = self.validate(url.as_str()).inspect_err(|rejection| {
            warn!(target: "security", url = %url, %rejection, "target rejected");
        })?;
        self.resolve_and_check_ip(&checked).await
    }
}

/// Prepends `https://` to scheme-less input and upgrades `http://`.
pub fn normalize_url(raw_url: &str) -> String {
    let trimmed = raw_url.trim();
    match trimmed.find("://") {
        Some(idx) if is_scheme(&trimmed[..idx]) => {
            if trimmed[..idx].eq_ignore_ascii_case("http") {
                format!("https://{}", &trimmed[idx + 3..])
            } else {
                trimmed.to_string()
            }
        }
        _ => format!("https://{}", trimmed),
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn has_traversal(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let lowered = rest.to_ascii_lowercase();
    lowered.contains("../") || lowered.contains("/..") || lowered.contains("%2e%2e")
}
