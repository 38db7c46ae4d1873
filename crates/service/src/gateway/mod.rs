pub(crate) mod error;
#[path = "core/runtime_config.rs"]
pub(crate) mod runtime_config;
pub(crate) mod trace_log;
pub(crate) mod upstream;

pub use error::DispatchError;
pub use upstream::backoff::{Sleeper, TokioSleeper};
pub use upstream::config::{ProxyConfig, DEFAULT_UPSTREAM_BASE_URL, MAX_ATTEMPTS};
pub use upstream::proxy::GenerationDispatcher;
pub use upstream::transport::{
    GenerateTransport, ReqwestTransport, TransportError, UpstreamReply, UpstreamTarget,
};

/// Dispatcher wired to the real upstream client and tokio timers.
pub type LiveDispatcher = GenerationDispatcher<ReqwestTransport, TokioSleeper>;

pub fn live_dispatcher(upstream_base_url: &str) -> LiveDispatcher {
    GenerationDispatcher::new(
        ReqwestTransport::new(runtime_config::build_upstream_client()),
        TokioSleeper,
        upstream_base_url,
    )
}

pub(crate) fn reload_runtime_config_from_env() {
    runtime_config::reload_from_env();
}
