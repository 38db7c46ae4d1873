use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

static RUNTIME_CONFIG_LOADED: OnceLock<()> = OnceLock::new();
static PROXY_MAX_BODY_BYTES: AtomicUsize = AtomicUsize::new(DEFAULT_PROXY_MAX_BODY_BYTES);
static UPSTREAM_CONNECT_TIMEOUT_SECS: AtomicU64 =
    AtomicU64::new(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS);

const DEFAULT_PROXY_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 15;

const ENV_PROXY_MAX_BODY_BYTES: &str = "ONEONONE_PROXY_MAX_BODY_BYTES";
const ENV_UPSTREAM_CONNECT_TIMEOUT_SECS: &str = "ONEONONE_UPSTREAM_CONNECT_TIMEOUT_SECS";

pub(crate) fn build_upstream_client() -> reqwest::Client {
    reqwest::Client::builder()
        // 中文注释：不设总超时；整次请求的时长上限交给部署环境，这里只限制建连阶段。
        .connect_timeout(upstream_connect_timeout())
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .build()
        .unwrap_or_else(|err| {
            log::warn!("event=upstream_client_build_failed err={} action=default_client", err);
            reqwest::Client::new()
        })
}

pub(crate) fn upstream_connect_timeout() -> Duration {
    ensure_runtime_config_loaded();
    Duration::from_secs(UPSTREAM_CONNECT_TIMEOUT_SECS.load(Ordering::Relaxed))
}

pub(crate) fn proxy_max_body_bytes() -> usize {
    ensure_runtime_config_loaded();
    PROXY_MAX_BODY_BYTES.load(Ordering::Relaxed)
}

pub(crate) fn reload_from_env() {
    PROXY_MAX_BODY_BYTES.store(
        env_usize_or(ENV_PROXY_MAX_BODY_BYTES, DEFAULT_PROXY_MAX_BODY_BYTES),
        Ordering::Relaxed,
    );
    UPSTREAM_CONNECT_TIMEOUT_SECS.store(
        env_u64_or(
            ENV_UPSTREAM_CONNECT_TIMEOUT_SECS,
            DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS,
        ),
        Ordering::Relaxed,
    );
}

fn ensure_runtime_config_loaded() {
    let _ = RUNTIME_CONFIG_LOADED.get_or_init(reload_from_env);
}

pub(crate) fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u64_or(name: &str, default: u64) -> u64 {
    env_non_empty(name)
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize_or(name: &str, default: usize) -> usize {
    env_non_empty(name)
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}
