use crate::gateway::runtime_config::env_non_empty;

pub(crate) const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub(crate) const ENV_UPSTREAM_BASE_URL: &str = "ONEONONE_UPSTREAM_BASE_URL";
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Attempts per (model, version) pair.
pub const MAX_ATTEMPTS: u32 = 3;

/// Immutable per-server settings of the dispatcher, read once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub api_key: Option<String>,
    pub upstream_base_url: String,
}

impl ProxyConfig {
    pub fn new(api_key: Option<String>, upstream_base_url: &str) -> Self {
        Self {
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            upstream_base_url: normalize_upstream_base_url(upstream_base_url),
        }
    }

    pub fn from_env() -> Self {
        let base = env_non_empty(ENV_UPSTREAM_BASE_URL)
            .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string());
        Self::new(env_non_empty(ENV_API_KEY), &base)
    }
}

pub(crate) fn normalize_upstream_base_url(base: &str) -> String {
    let normalized = base.trim().trim_end_matches('/');
    if normalized.is_empty() {
        return DEFAULT_UPSTREAM_BASE_URL.to_string();
    }
    normalized.to_string()
}
