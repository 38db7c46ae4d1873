use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    init_logging();
    let addr = std::env::var(oneonone_service::ENV_SERVICE_ADDR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| oneonone_service::DEFAULT_ADDR.to_string());

    if let Err(err) = ctrlc::set_handler(oneonone_service::request_shutdown) {
        log::warn!("event=signal_handler_unavailable err={}", err);
    }

    println!("oneonone-service listening on {addr}");
    if let Err(err) = oneonone_service::start_server(&addr) {
        eprintln!("service stopped: {err}");
        std::process::exit(1);
    }
}
