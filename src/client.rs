//! Host-rotating client.
//!
//! The public surface stays small: build a [`HostClient`], describe a call with a
//! [`RequestDescriptor`], execute it. Host selection, per-host deadlines and health
//! bookkeeping happen inside the client.

pub mod builder;
pub mod core;
pub mod credentials;
mod policy;
pub mod request;
pub mod types;

pub use builder::HostClientBuilder;
pub use core::{HostClient, CLIENT_REQUEST_ID_HEADER};
pub use credentials::{Credentials, NoCredentials, StaticCredentials};
pub use request::RequestDescriptor;
pub use types::{CallStats, CancelHandle};
