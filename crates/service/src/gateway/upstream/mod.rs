pub(crate) mod backoff;
pub(crate) mod config;
pub(crate) mod outcome;
pub(crate) mod proxy;
pub(crate) mod transport;
