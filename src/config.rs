//! Runtime configuration for the feedback engine.
//!
//! Defaults target the hosted Messages API. Every value can be overridden
//! from the environment; unparseable overrides are ignored with a warning.

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "casefeedback";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOKENS: u32 = 2500;
pub const DEFAULT_RATE_LIMIT_RETRY_DELAY_MS: u64 = 1000;

/// Upper bound for the rate-limit back-off, whatever the server asks for.
pub const MAX_RATE_LIMIT_RETRY_DELAY_MS: u64 = 5000;

pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_MODEL: &str = "CASEFEEDBACK_MODEL";
pub const ENV_API_URL: &str = "CASEFEEDBACK_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "CASEFEEDBACK_TIMEOUT_SECS";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "casefeedback=info,warn"
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackConfig {
    pub api_base_url: String,
    pub model: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub rate_limit_retry_delay_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            rate_limit_retry_delay_ms: DEFAULT_RATE_LIMIT_RETRY_DELAY_MS,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl FeedbackConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns per variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        config.api_key = get(ENV_API_KEY);
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(url) = get(ENV_API_URL) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => tracing::warn!(
                    variable = ENV_TIMEOUT_SECS,
                    value = %raw,
                    "Ignoring invalid timeout override"
                ),
            }
        }
        config
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Back-off before the single rate-limit retry, capped.
    pub fn rate_limit_delay_ms(&self, retry_after_secs: Option<u64>) -> u64 {
        retry_after_secs
            .map(|s| s.saturating_mul(1000))
            .unwrap_or(self.rate_limit_retry_delay_ms)
            .min(MAX_RATE_LIMIT_RETRY_DELAY_MS)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_name_is_casefeedback() {
        assert_eq!(APP_NAME, "casefeedback");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn log_filter_targets_crate() {
        assert!(default_log_filter().starts_with("casefeedback="));
    }

    #[test]
    fn defaults_without_environment() {
        let config = FeedbackConfig::from_lookup(|_| None);
        assert_eq!(config, FeedbackConfig::default());
        assert!(!config.has_api_key());
        assert_eq!(config.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.max_tokens, 2500);
    }

    #[test]
    fn environment_overrides_apply() {
        let config = FeedbackConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_MODEL, "custom-model"),
            (ENV_API_URL, "http://localhost:8080/"),
            (ENV_TIMEOUT_SECS, "12"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "custom-model");
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn invalid_or_blank_overrides_ignored() {
        let config = FeedbackConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "   "),
            (ENV_TIMEOUT_SECS, "soon"),
        ]));
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let zero = FeedbackConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_SECS, "0")]));
        assert_eq!(zero.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn serialized_config_omits_api_key() {
        let config = FeedbackConfig {
            api_key: Some("sk-secret".into()),
            ..FeedbackConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!json.contains("api_key"));
        assert!(json.contains("timeout_secs"));
    }

    #[test]
    fn rate_limit_delay_is_capped() {
        let config = FeedbackConfig::default();
        assert_eq!(config.rate_limit_delay_ms(None), DEFAULT_RATE_LIMIT_RETRY_DELAY_MS);
        assert_eq!(config.rate_limit_delay_ms(Some(2)), 2000);
        assert_eq!(config.rate_limit_delay_ms(Some(120)), MAX_RATE_LIMIT_RETRY_DELAY_MS);
    }
}
