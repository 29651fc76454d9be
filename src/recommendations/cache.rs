use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::rules::text::truncate_chars;

/// Characters of context that participate in the cache key.
pub const CONTEXT_KEY_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    check_title: String,
    keyphrase: String,
    context_prefix: String,
}

impl CacheKey {
    pub fn new(check_title: &str, keyphrase: &str, context: &str) -> Self {
        Self {
            check_title: check_title.to_string(),
            keyphrase: keyphrase.to_string(),
            context_prefix: truncate_chars(context, CONTEXT_KEY_CHARS).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedRecommendation {
    text: String,
    timestamp: DateTime<Utc>,
}

/// Generated recommendations, considered stale after the TTL.
///
/// Staleness is checked on read; nothing sweeps old entries.
#[derive(Debug)]
pub struct RecommendationCache {
    entries: Mutex<HashMap<CacheKey, CachedRecommendation>>,
    ttl: Duration,
}

impl Default for RecommendationCache {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

impl RecommendationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let cache = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let cached = cache.get(key)?;
        let cache_age = Utc::now() - cached.timestamp;
        if cache_age < self.ttl {
            Some(cached.text.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: CacheKey, text: String) {
        self.insert_at(key, text, Utc::now());
    }

    pub fn insert_at(&self, key: CacheKey, text: String, timestamp: DateTime<Utc>) {
        let mut cache = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(key, CachedRecommendation { text, timestamp });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
