//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.sprout/config.toml` (user)
//! 3. `/etc/sprout/config.toml` (system)
//!
//! If none of these exist the built-in defaults are used. API keys are never
//! read from the config file; see [`Secrets`].

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::cache::result::DEFAULT_TTL;
use crate::cache::store::DEFAULT_MAX_ENTRIES;
use crate::providers::{DEFAULT_HTTP_TIMEOUT, openrouter, proxy};
use crate::{Result, SproutError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSection,
    /// Hosted proxy tier. Absent means no primary tier.
    #[serde(default)]
    pub primary: Option<PrimaryConfig>,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub notebook: NotebookConfig,
}

/// Result cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Entry lifetime in seconds (default: 3600).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum number of cached recipes (default: 256).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

fn default_max_entries() -> u64 {
    DEFAULT_MAX_ENTRIES
}

/// Hosted proxy function (primary tier).
#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Function name (default: `openrouter-proxy`).
    #[serde(default = "default_function")]
    pub function: String,
    /// HTTP timeout in seconds (default: 60).
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_function() -> String {
    proxy::DEFAULT_FUNCTION.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT.as_secs()
}

/// Direct chat-completions API (fallback tier).
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    /// API base URL (default: `https://openrouter.ai/api/v1`).
    #[serde(default = "default_fallback_url")]
    pub base_url: String,
    /// Text model (default: `deepseek/deepseek-v3.2`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Image model (default: `google/gemini-3-pro-image-preview`).
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// HTTP timeout in seconds (default: 60).
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            base_url: default_fallback_url(),
            model: default_model(),
            image_model: default_image_model(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_fallback_url() -> String {
    openrouter::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    openrouter::DEFAULT_MODEL.to_string()
}

fn default_image_model() -> String {
    openrouter::DEFAULT_IMAGE_MODEL.to_string()
}

/// Orchestration settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratorConfig {
    /// Per-tier deadline in seconds. Unset means tiers are only bounded by
    /// their HTTP timeout.
    #[serde(default)]
    pub tier_timeout_secs: Option<u64>,
}

/// Saved-recipe notebook settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookConfig {
    /// Notebook file (default: `<data dir>/sprout/notebook.json`).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first of
    /// `~/.sprout/config.toml` and `/etc/sprout/config.toml` that exists is
    /// used, falling back to defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SproutError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SproutError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            SproutError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(SproutError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".sprout").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/sprout/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Cache settings as a [`CacheConfig`].
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .ttl(Duration::from_secs(self.cache.ttl_secs))
            .max_entries(self.cache.max_entries)
    }

    /// Per-tier deadline, if configured.
    pub fn tier_timeout(&self) -> Option<Duration> {
        self.generator.tier_timeout_secs.map(Duration::from_secs)
    }

    /// Resolved notebook file path.
    pub fn notebook_path(&self) -> PathBuf {
        if let Some(path) = &self.notebook.path {
            return path.clone();
        }
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sprout")
            .join("notebook.json")
    }
}

/// Environment variables holding the proxy key, in lookup order.
const PROXY_KEY_ENV_VARS: &[&str] = &["SPROUT_PROXY_KEY", "SUPABASE_ANON_KEY"];
/// Environment variable holding the OpenRouter key.
const OPENROUTER_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

/// API keys for the remote tiers.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub proxy_key: Option<String>,
    pub openrouter_key: Option<String>,
}

impl Secrets {
    /// Read keys from the environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            proxy_key: PROXY_KEY_ENV_VARS.iter().find_map(|name| non_empty(name)),
            openrouter_key: non_empty(OPENROUTER_KEY_ENV_VAR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.cache.max_entries, 256);
        assert!(config.primary.is_none());
        assert_eq!(config.fallback.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.fallback.model, "deepseek/deepseek-v3.2");
        assert_eq!(config.tier_timeout(), None);
    }

    #[test]
    fn parse_minimal_config() {
        let config = Config::parse(
            r#"
            [primary]
            base_url = "https://abc.supabase.co"
        "#,
        )
        .unwrap();
        let primary = config.primary.unwrap();
        assert_eq!(primary.base_url, "https://abc.supabase.co");
        assert_eq!(primary.function, "openrouter-proxy");
        assert_eq!(primary.timeout_secs, 60);
        // Defaults preserved
        assert_eq!(config.cache.ttl_secs, 3600);
    }

    #[test]
    fn parse_full_config() {
        let config = Config::parse(
            r#"
            [cache]
            ttl_secs = 600
            max_entries = 32

            [primary]
            base_url = "https://abc.supabase.co"
            function = "recipe-proxy"
            timeout_secs = 20

            [fallback]
            base_url = "http://localhost:8080/v1"
            model = "meta/llama"
            image_model = "img/model"
            timeout_secs = 15

            [generator]
            tier_timeout_secs = 25

            [notebook]
            path = "/tmp/notes.json"
        "#,
        )
        .unwrap();
        assert_eq!(config.cache_config().ttl, Duration::from_secs(600));
        assert_eq!(config.cache_config().max_entries, 32);
        assert_eq!(config.primary.as_ref().unwrap().function, "recipe-proxy");
        assert_eq!(config.fallback.model, "meta/llama");
        assert_eq!(config.fallback.timeout_secs, 15);
        assert_eq!(config.tier_timeout(), Some(Duration::from_secs(25)));
        assert_eq!(config.notebook_path(), PathBuf::from("/tmp/notes.json"));
    }

    #[test]
    fn primary_requires_base_url() {
        let err = Config::parse("[primary]\nfunction = \"x\"").unwrap_err();
        assert!(matches!(err, SproutError::Configuration(_)));
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn secrets_prefer_first_proxy_var_and_skip_blank() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SPROUT_PROXY_KEY", "  "),
            ("SUPABASE_ANON_KEY", "anon"),
            ("OPENROUTER_API_KEY", "sk-or"),
        ]);
        let secrets = Secrets::from_lookup(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(secrets.proxy_key.as_deref(), Some("anon"));
        assert_eq!(secrets.openrouter_key.as_deref(), Some("sk-or"));

        let none = Secrets::from_lookup(|_| None);
        assert!(none.proxy_key.is_none() && none.openrouter_key.is_none());
    }
}
