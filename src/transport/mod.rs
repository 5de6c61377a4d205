//! Network boundary: request/response types, the [`Requester`] trait, outcome
//! classification and the default reqwest-backed requester.

pub mod http;
pub mod outcome;
pub mod requester;

pub use http::ReqwestRequester;
pub use outcome::{classify, Outcome, StatusPolicy};
pub use requester::{HttpRequest, HttpResponse, Requester, TransportError};
