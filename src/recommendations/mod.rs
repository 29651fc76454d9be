pub mod cache;
pub mod templates;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result as AppResult;
use crate::llm::{CompletionError, CompletionProvider, CompletionRequest, OpenAiProvider};
use crate::rules::text::truncate_chars;
use crate::rules::CheckKind;
use cache::{CacheKey, RecommendationCache, CONTEXT_KEY_CHARS};

pub const INVALID_CREDENTIAL_MESSAGE: &str =
    "AI recommendation unavailable: the configured API key was rejected. Check the key and try again.";
pub const RETRY_MESSAGE: &str =
    "AI recommendation unavailable right now. Please try again in a few minutes.";

const MAX_OUTPUT_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.3;
const SYSTEM_PROMPT: &str = "You are an SEO expert. Give one concise, actionable recommendation \
in plain text (at most three sentences) for fixing the failed on-page SEO check. Do not use markdown.";

/// Produces remediation text for failed checks.
pub struct RecommendationProvider {
    backend: Option<Arc<dyn CompletionProvider>>,
    enabled_checks: HashSet<String>,
    cache: RecommendationCache,
}

impl RecommendationProvider {
    /// Templates only.
    pub fn deterministic() -> Self {
        Self {
            backend: None,
            enabled_checks: HashSet::new(),
            cache: RecommendationCache::default(),
        }
    }

    pub fn with_backend<I, S>(backend: Arc<dyn CompletionProvider>, enabled_checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            backend: Some(backend),
            enabled_checks: enabled_checks.into_iter().map(Into::into).collect(),
            cache: RecommendationCache::default(),
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        if !config.gpt_enabled() {
            if config.use_gpt_recommendations {
                info!("No valid API key configured, using template recommendations");
            }
            return Ok(Self::deterministic());
        }

        let api_key = config.openai_api_key.clone().unwrap_or_default();
        let backend = OpenAiProvider::new(api_key, &config.openai_model, &config.openai_base_url)?;
        info!(
            "AI recommendations enabled for {} checks using {}",
            config.enabled_gpt_checks.len(),
            config.openai_model
        );
        Ok(Self::with_backend(Arc::new(backend), config.enabled_gpt_checks.iter().cloned()))
    }

    pub fn cache(&self) -> &RecommendationCache {
        &self.cache
    }

    fn is_ai_eligible(&self, check_title: &str) -> bool {
        let deterministic = CheckKind::from_title(check_title).is_some_and(CheckKind::always_deterministic);
        !deterministic && self.enabled_checks.contains(check_title)
    }

    /// Never fails; backend problems turn into fixed messages.
    pub async fn recommend(&self, check_title: &str, keyphrase: &str, context: &str) -> String {
        let Some(backend) = self.backend.as_ref().filter(|_| self.is_ai_eligible(check_title)) else {
            return templates::fallback(check_title, keyphrase, context);
        };

        let key = CacheKey::new(check_title, keyphrase, context);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for {} recommendation", check_title);
            return cached;
        }

        let request = build_prompt(check_title, keyphrase, context);
        match backend.complete(&request).await {
            Ok(text) if !text.is_empty() => {
                self.cache.insert(key, text.clone());
                text
            }
            Ok(_) => {
                warn!("Empty completion for {}", check_title);
                RETRY_MESSAGE.to_string()
            }
            Err(CompletionError::InvalidCredential(e)) => {
                warn!("Completion backend rejected credentials: {}", e);
                INVALID_CREDENTIAL_MESSAGE.to_string()
            }
            Err(e) => {
                warn!("Completion failed for {}: {}", check_title, e);
                RETRY_MESSAGE.to_string()
            }
        }
    }
}

pub fn build_prompt(check_title: &str, keyphrase: &str, context: &str) -> CompletionRequest {
    let user = format!(
        "Failed check: {}\nTarget keyphrase: {}\nPage context: {}\n\nHow should this page be changed to pass the check?",
        check_title,
        keyphrase,
        truncate_chars(context, CONTEXT_KEY_CHARS)
    );
    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        user,
        max_output_tokens: MAX_OUTPUT_TOKENS,
        temperature: TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockBackend {
        calls: AtomicUsize,
        result: Result<String, CompletionError>,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl MockBackend {
        fn replying(result: Result<String, CompletionError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result,
                last_request: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for MockBackend {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.result.clone().map(|text| format!("{} #{}", text, n + 1))
        }
    }

    fn provider(backend: Arc<MockBackend>) -> RecommendationProvider {
        RecommendationProvider::with_backend(
            backend,
            ["Keyphrase in Title", "Content Length", "Internal Links"],
        )
    }

    #[tokio::test]
    async fn eligible_checks_use_the_backend() {
        let backend = MockBackend::replying(Ok("Put widgets first".into()));
        let provider = provider(backend.clone());

        let text = provider.recommend("Keyphrase in Title", "widgets", "Current title: Home").await;
        assert_eq!(text, "Put widgets first #1");
        assert_eq!(backend.calls(), 1);

        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert!(request.user.contains("Keyphrase in Title"));
        assert!(request.user.contains("widgets"));
        assert_eq!(request.max_output_tokens, MAX_OUTPUT_TOKENS);
        assert!(request.temperature < 0.5);
    }

    #[tokio::test]
    async fn repeated_requests_hit_the_cache() {
        let backend = MockBackend::replying(Ok("Link more".into()));
        let provider = provider(backend.clone());

        let first = provider.recommend("Internal Links", "widgets", "Internal links found: 0").await;
        let second = provider.recommend("Internal Links", "widgets", "Internal links found: 0").await;
        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn stale_cache_entries_trigger_a_fresh_call() {
        let backend = MockBackend::replying(Ok("Fresh".into()));
        let provider = provider(backend.clone());
        let key = CacheKey::new("Internal Links", "widgets", "ctx");
        provider
            .cache()
            .insert_at(key, "Old".into(), Utc::now() - Duration::hours(24) - Duration::minutes(1));

        let text = provider.recommend("Internal Links", "widgets", "ctx").await;
        assert_eq!(text, "Fresh #1");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn deterministic_checks_never_reach_the_backend() {
        let backend = MockBackend::replying(Ok("nope".into()));
        let provider = provider(backend.clone());

        let text = provider.recommend("Content Length", "widgets", "Word count: 12").await;
        assert_eq!(text, templates::fallback("Content Length", "widgets", "Word count: 12"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn checks_outside_the_enabled_set_use_templates() {
        let backend = MockBackend::replying(Ok("nope".into()));
        let provider = provider(backend.clone());

        let text = provider.recommend("Outbound Links", "widgets", "Outbound links found: 0").await;
        assert_eq!(text, templates::fallback("Outbound Links", "widgets", "Outbound links found: 0"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn credential_failures_map_to_fixed_message() {
        let backend = MockBackend::replying(Err(CompletionError::InvalidCredential("401".into())));
        let provider = provider(backend.clone());

        let text = provider.recommend("Keyphrase in Title", "widgets", "ctx").await;
        assert_eq!(text, INVALID_CREDENTIAL_MESSAGE);
        assert!(provider.cache().is_empty());
    }

    #[tokio::test]
    async fn other_failures_map_to_retry_message() {
        let backend = MockBackend::replying(Err(CompletionError::Request("timeout".into())));
        let provider = provider(backend.clone());

        let text = provider.recommend("Keyphrase in Title", "widgets", "ctx").await;
        assert_eq!(text, RETRY_MESSAGE);

        // failures are not cached
        provider.recommend("Keyphrase in Title", "widgets", "ctx").await;
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn without_a_backend_templates_are_returned() {
        let provider = RecommendationProvider::deterministic();
        let text = provider.recommend("Keyphrase in Title", "widgets", "Current title: Home").await;
        assert_eq!(text, templates::fallback("Keyphrase in Title", "widgets", "Current title: Home"));
    }

    #[test]
    fn config_selects_backend_only_with_a_usable_key() {
        let with_key = Config::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-abc123".to_string()),
            _ => None,
        })
        .unwrap();
        let provider = RecommendationProvider::from_config(&with_key).unwrap();
        assert!(provider.backend.is_some());
        assert!(provider.is_ai_eligible("Keyphrase in Title"));

        let without_key = Config::from_lookup(|_| None).unwrap();
        let provider = RecommendationProvider::from_config(&without_key).unwrap();
        assert!(provider.backend.is_none());
    }

    #[test]
    fn prompt_truncates_context() {
        let context = "a".repeat(1000);
        let request = build_prompt("OG Image", "widgets", &context);
        assert!(request.user.contains(&"a".repeat(CONTEXT_KEY_CHARS)));
        assert!(!request.user.contains(&"a".repeat(CONTEXT_KEY_CHARS + 1)));
    }
}
