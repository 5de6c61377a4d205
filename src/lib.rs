//! # multihost-transport
//!
//! 多主机 HTTP 传输层：在一组等价主机之间轮换请求，并跟踪每台主机的健康状态。
//!
//! Multi-host HTTP transport. A logical call is sent to the first healthy host that
//! accepts its call type; timeouts and connectivity failures rotate it to the next
//! one, while per-host health is tracked and shared by every concurrent caller.
//!
//! ## Overview
//!
//! - **Health model**: each host is `Up(retry_count)` or `Down`. Success resets it,
//!   a timeout bumps the retry count, a connectivity failure marks it down.
//! - **Timeout escalation**: a host that timed out `n` times gets `base * (n + 1)`.
//! - **Expiration**: after [`resilience::DEFAULT_HOST_EXPIRATION`] without news a host
//!   is reset to a fresh up state, so down hosts are retried eventually.
//! - **Application errors**: a 4xx answer is returned to the caller untouched and
//!   never rotates or changes host health.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use multihost_transport::{HostCatalog, HostClient, HostConfig, RequestDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> multihost_transport::Result<()> {
//!     let catalog = HostCatalog::new(vec![
//!         HostConfig::new("https://search-1.example.com"),
//!         HostConfig::new("https://search-2.example.com"),
//!     ])?;
//!     let client = HostClient::new(catalog)?;
//!
//!     let resp = client.execute(RequestDescriptor::read("/1/indexes")).await?;
//!     println!("{}", resp.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`host`] | Call types and the per-host health state machine |
//! | [`catalog`] | Host catalogs from code, YAML/JSON or the environment |
//! | [`resilience`] | Shared retry strategy: selection and health updates |
//! | [`transport`] | Requester boundary and outcome classification |
//! | [`client`] | The rotating client, request descriptors and credentials |
//! | [`config`] | Timeouts, expiration and retry knobs |
//! | [`error`] | Error type returned by every fallible operation |

pub mod catalog;
pub mod client;
pub mod config;
pub mod host;
pub mod resilience;
pub mod transport;

// Re-export main types for convenience
pub use catalog::{HostCatalog, HostConfig};
pub use client::{
    CallStats, CancelHandle, Credentials, HostClient, HostClientBuilder, NoCredentials,
    RequestDescriptor, StaticCredentials,
};
pub use config::{ClientConfig, TransportConfig};
pub use host::{CallType, Host, HostSnapshot};
pub use resilience::RetryStrategy;
pub use transport::{HttpRequest, HttpResponse, Outcome, Requester, TransportError};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
