//! 弹性模块：主机健康状态管理与选择策略。
//!
//! # Resilience Module
//!
//! Host health tracking shared by every in-flight request of a client.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`RetryStrategy`] | Owns the host catalog; eligibility, expiration and health updates |
//!
//! ## Example
//!
//! ```rust
//! use multihost_transport::catalog::{HostCatalog, HostConfig};
//! use multihost_transport::host::CallType;
//! use multihost_transport::resilience::RetryStrategy;
//! use multihost_transport::transport::Outcome;
//! use std::time::Duration;
//!
//! let catalog = HostCatalog::new(vec![
//!     HostConfig::new("https://write-1.example.net").with_scope(CallType::Write),
//!     HostConfig::new("https://any-1.example.net"),
//! ]).unwrap();
//! let strategy = RetryStrategy::new(&catalog, Duration::from_secs(300));
//!
//! let host = strategy.select_host(CallType::Write).unwrap();
//! strategy.notify(&host, &Outcome::HardFailure("connection refused".into()));
//!
//! let next = strategy.select_host(CallType::Write).unwrap();
//! assert_eq!(next.url.as_str(), "https://any-1.example.net/");
//! ```

pub mod retry_strategy;

pub use retry_strategy::{RetryStrategy, DEFAULT_HOST_EXPIRATION};
