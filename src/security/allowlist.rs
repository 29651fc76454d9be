use std::sync::{PoisonError, RwLock};
use tracing::info;
use url::{Host, Url};

/// Process-wide set of domains that may be analyzed.
///
/// Entries are either exact hostnames or `*.base` wildcards. The list only
/// grows: registration appends, nothing is ever removed.
#[derive(Debug, Default)]
pub struct DomainAllowlist {
    entries: RwLock<Vec<String>>,
}

impl DomainAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowlist = Self::new();
        for domain in domains {
            allowlist.add_domain(domain.as_ref());
        }
        allowlist
    }

    /// Registers `domain` together with its `*.domain` wildcard.
    ///
    /// Returns true if at least one entry was newly added.
    pub fn add_domain(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return false;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains(&domain) {
            return false;
        }

        entries.push(domain.clone());
        if !domain.starts_with("*.") {
            let wildcard = format!("*.{}", domain);
            if !entries.contains(&wildcard) {
                entries.push(wildcard);
            }
        }

        info!("Allowlisted domain {} ({} entries)", domain, entries.len());
        true
    }

    pub fn is_allowed(&self, hostname: &str) -> bool {
        let hostname = hostname.to_lowercase();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().any(|entry| entry_matches(entry, &hostname))
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn entry_matches(entry: &str, hostname: &str) -> bool {
    match entry.strip_prefix("*.") {
        Some(base) => hostname.len() > base.len() && hostname.ends_with(&format!(".{}", base)),
        None => entry == hostname,
    }
}

/// True when `domain` is a bare hostname (optionally `*.`-prefixed) that a URL could carry.
pub fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.trim();
    let bare = domain.strip_prefix("*.").unwrap_or(domain);
    if bare.is_empty() || bare.contains(['/', ':', '@', '?', '#', ' ']) {
        return false;
    }

    match Url::parse(&format!("https://{}/", bare)) {
        Ok(url) => matches!(url.host(), Some(Host::Domain(host)) if host == bare.to_lowercase()),
        Err(_) => false,
    }
}
