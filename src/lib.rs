//! Proxypool - Proxy Pool Store
//!
//! Persistence layer for the upstream proxies of a proxy-rotation service.
//!
//! ## Features
//!
//! - Durable SQLite table of proxy records keyed by URL
//! - Availability, retry and consuming-time bookkeeping
//! - Random selection partitioned by bypass capability, and least-time selection
//! - Store-wide serialization so relative counters never lose updates

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repository;
pub mod rotation;

pub use config::Config;
pub use database::Database;
pub use error::{PoolError, Result};
pub use models::{PoolSummary, ProxyRecord, RegionFlag};
pub use repository::ProxyStore;
pub use rotation::RotationStrategy;
