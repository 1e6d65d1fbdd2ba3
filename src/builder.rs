//! Builder for configuring generator instances

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::cache::{CacheConfig, MemoryStore, ResultCache, SessionStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, Secrets};
use crate::generator::RecipeGenerator;
use crate::providers::{OpenRouterClient, ProxyClient, RecipeService};
use crate::{Result, SproutError};

/// Main entry point for creating generator instances.
pub struct Sprout;

impl Sprout {
    /// Create a new builder for configuring the generator.
    pub fn builder() -> SproutBuilder {
        SproutBuilder::new()
    }
}

/// Builder for configuring generator instances.
///
/// ```rust,no_run
/// # use sprout::{CacheConfig, Sprout};
/// # use std::time::Duration;
/// let generator = Sprout::builder()
///     .proxy("https://xyz.supabase.co", "anon-key")
///     .openrouter("sk-or-...")
///     .cache(CacheConfig::new().ttl(Duration::from_secs(600)))
///     .build()?;
/// # Ok::<(), sprout::SproutError>(())
/// ```
pub struct SproutBuilder {
    primary: Option<Arc<dyn RecipeService>>,
    fallback: Option<Arc<dyn RecipeService>>,
    cache: CacheConfig,
    store: Option<Arc<dyn SessionStore>>,
    clock: Option<Arc<dyn Clock>>,
    tier_timeout: Option<Duration>,
}

impl SproutBuilder {
    pub fn new() -> Self {
        Self {
            primary: None,
            fallback: None,
            cache: CacheConfig::default(),
            store: None,
            clock: None,
            tier_timeout: None,
        }
    }

    /// Use `service` as the primary tier.
    pub fn primary(mut self, service: Arc<dyn RecipeService>) -> Self {
        self.primary = Some(service);
        self
    }

    /// Use `service` as the fallback tier.
    pub fn fallback(mut self, service: Arc<dyn RecipeService>) -> Self {
        self.fallback = Some(service);
        self
    }

    /// Configure the hosted proxy function as the primary tier.
    pub fn proxy(self, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.primary(Arc::new(ProxyClient::new(base_url, api_key)))
    }

    /// Configure OpenRouter as the fallback tier.
    pub fn openrouter(self, api_key: impl Into<String>) -> Self {
        self.fallback(Arc::new(OpenRouterClient::new(api_key)))
    }

    /// Set the cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Back the cache with a custom store instead of a [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom clock for cache timestamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fail a tier call that takes longer than `timeout`, moving on to the
    /// fallback tier. Off by default.
    pub fn tier_timeout(mut self, timeout: Duration) -> Self {
        self.tier_timeout = Some(timeout);
        self
    }

    /// Apply a loaded [`Config`] with keys from [`Secrets`].
    ///
    /// A tier whose key is missing is skipped with a warning.
    pub fn from_config(mut self, config: &Config, secrets: &Secrets) -> Self {
        if let Some(primary) = &config.primary {
            match &secrets.proxy_key {
                Some(key) => {
                    let client = ProxyClient::with_timeout(
                        &primary.base_url,
                        key,
                        Duration::from_secs(primary.timeout_secs),
                    )
                    .function(&primary.function);
                    self = self.primary(Arc::new(client));
                }
                None => warn!("primary tier configured without a proxy key, skipping"),
            }
        }

        if let Some(key) = &secrets.openrouter_key {
            let fallback = &config.fallback;
            let client = OpenRouterClient::with_base_url(key, &fallback.base_url)
                .model(&fallback.model)
                .image_model(&fallback.image_model)
                .timeout(Duration::from_secs(fallback.timeout_secs));
            self = self.fallback(Arc::new(client));
        }

        self.cache = config.cache_config();
        self.tier_timeout = config.tier_timeout();
        self
    }

    /// Build the generator.
    ///
    /// At least one tier must be configured. A lone fallback tier is
    /// promoted to primary.
    pub fn build(self) -> Result<RecipeGenerator> {
        let (primary, fallback) = match (self.primary, self.fallback) {
            (Some(primary), fallback) => (primary, fallback),
            (None, Some(only)) => (only, None),
            (None, None) => return Err(SproutError::NoProvider),
        };

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::with_max_entries(self.cache.max_entries)));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache = ResultCache::with_parts(&self.cache, store, clock);

        Ok(RecipeGenerator::new(
            primary,
            fallback,
            cache,
            self.tier_timeout,
        ))
    }
}

impl Default for SproutBuilder {
    fn default() -> Self {
        Self::new()
    }
}
