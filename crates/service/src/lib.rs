use std::sync::atomic::{AtomicBool, Ordering};

pub mod client;
mod gateway;
mod http;
mod process_env;
#[cfg(test)]
mod test_support;

pub use client::{
    call_generation_proxy, default_proxy_endpoint, generate_mindmap, summarize_transcript,
    ClientError, GenerationResponse, ProxyCallOptions,
};
pub use gateway::{
    live_dispatcher, DispatchError, GenerateTransport, GenerationDispatcher, LiveDispatcher,
    ProxyConfig, ReqwestTransport, Sleeper, TokioSleeper, TransportError, UpstreamReply,
    UpstreamTarget, DEFAULT_UPSTREAM_BASE_URL, MAX_ATTEMPTS,
};
pub use http::server::{ServerHandle, LEGACY_PROXY_PATH, PROXY_PATH};

pub const DEFAULT_ADDR: &str = "localhost:48770";
pub const ENV_SERVICE_ADDR: &str = "ONEONONE_SERVICE_ADDR";

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

fn bootstrap_current_process() -> ProxyConfig {
    // 中文注释：可选 env 文件放在可执行文件同目录，解压即用；进程环境变量优先。
    process_env::load_env_from_exe_dir();
    gateway::reload_runtime_config_from_env();
    ProxyConfig::from_env()
}

/// Runs the proxy on `addr` until [`request_shutdown`] is called.
pub fn start_server(addr: &str) -> std::io::Result<()> {
    let config = bootstrap_current_process();
    http::server::start_http(addr, config)
}

/// Binds `addr` (use port 0 for an ephemeral port) and serves from a background thread.
pub fn start_background_server(addr: &str) -> std::io::Result<ServerHandle> {
    let config = bootstrap_current_process();
    http::server::start_background_http(addr, config)
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

pub fn clear_shutdown_flag() {
    SHUTDOWN_REQUESTED.store(false, Ordering::SeqCst);
}
