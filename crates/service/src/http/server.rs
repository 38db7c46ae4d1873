use std::io;
use std::net::TcpListener as StdTcpListener;
use std::thread;

use axum::routing::any;
use axum::Router;

use crate::gateway::{
    self, GenerateTransport, ProxyConfig, ReqwestTransport, Sleeper, TokioSleeper,
};
use crate::http::handler::{generation_proxy_handler, not_found_handler, ProxyState};
use crate::http::proxy_bridge::{run_server, serve_on_listener};

pub const PROXY_PATH: &str = "/gemini-proxy";
/// Path the web client used when the proxy ran as a serverless function.
pub const LEGACY_PROXY_PATH: &str = "/.netlify/functions/gemini-proxy";

pub fn build_router<T, S>(state: ProxyState<T, S>) -> Router
where
    T: GenerateTransport,
    S: Sleeper,
{
    Router::new()
        .route(PROXY_PATH, any(generation_proxy_handler::<T, S>))
        .route(LEGACY_PROXY_PATH, any(generation_proxy_handler::<T, S>))
        .fallback(not_found_handler)
        .with_state(state)
}

fn live_state(config: &ProxyConfig) -> ProxyState<ReqwestTransport, TokioSleeper> {
    ProxyState::from_dispatcher(
        gateway::live_dispatcher(&config.upstream_base_url),
        config.api_key.clone(),
    )
}

fn build_runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

pub(crate) fn start_http(addr: &str, config: ProxyConfig) -> io::Result<()> {
    if config.api_key.is_none() {
        // 中文注释：缺少凭据时仍然启动，请求会拿到 500，便于部署侧发现配置问题。
        log::warn!("event=config_missing_credential env=GEMINI_API_KEY");
    }
    let runtime = build_runtime()?;
    runtime.block_on(async move {
        let app = build_router(live_state(&config));
        run_server(addr, app).await
    })
}

pub struct ServerHandle {
    pub addr: String,
    join: thread::JoinHandle<()>,
}

impl ServerHandle {
    pub fn join(self) {
        let _ = self.join.join();
    }
}

/// Binds `addr` right away and serves from a background thread.
pub(crate) fn start_background_http(addr: &str, config: ProxyConfig) -> io::Result<ServerHandle> {
    let listener = StdTcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    let local_addr = listener.local_addr()?.to_string();
    let runtime = build_runtime()?;
    let join = thread::spawn(move || {
        let result = runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener)?;
            serve_on_listener(listener, build_router(live_state(&config))).await
        });
        if let Err(err) = result {
            log::warn!("event=server_stopped err={}", err);
        }
    });
    Ok(ServerHandle {
        addr: local_addr,
        join,
    })
}
