// Upstream video sources, in fallback order

pub mod proxy;
pub mod api;
pub mod cdn;

pub use api::AuthenticatedApiSource;
pub use cdn::DirectCdnSource;
pub use proxy::ProxySource;
