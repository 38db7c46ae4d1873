pub(crate) mod handler;
pub(crate) mod proxy_bridge;
pub(crate) mod response;
pub(crate) mod server;
