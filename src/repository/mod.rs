pub mod proxy;

pub use proxy::ProxyStore;
