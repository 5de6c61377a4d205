use crate::host::CallType;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use std::time::Duration;

/// One logical operation, independent of the host that will serve it.
///
/// Built by the command layer and consumed once by [`HostClient`](super::HostClient).
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Absolute path, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
    /// Merged last; wins over default and credential headers.
    pub headers: HeaderMap,
    /// Replaces the call type's base timeout. Per-host escalation still applies.
    pub timeout: Option<Duration>,
    pub call_type: CallType,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>, call_type: CallType) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            timeout: None,
            call_type,
        }
    }

    /// `GET` on read hosts.
    pub fn read(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, CallType::Read)
    }

    /// `POST` on write hosts.
    pub fn write(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path, CallType::Write)
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn call_type(mut self, call_type: CallType) -> Self {
        self.call_type = call_type;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `content-type`.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value)?;
        self.body = Some(Bytes::from(bytes));
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            Error::validation_with_context(
                format!("invalid header name '{}'", name),
                ErrorContext::new()
                    .with_field_path("request.headers")
                    .with_details(e.to_string())
                    .with_source("request_builder"),
            )
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            Error::validation_with_context(
                format!("invalid value for header '{}'", name),
                ErrorContext::new()
                    .with_field_path("request.headers")
                    .with_details(e.to_string())
                    .with_source("request_builder"),
            )
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(Error::validation_with_context(
                format!("request path '{}' must start with '/'", self.path),
                ErrorContext::new()
                    .with_field_path("request.path")
                    .with_source("request_builder"),
            ));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::validation_with_context(
                "request timeout override must be greater than zero",
                ErrorContext::new()
                    .with_field_path("request.timeout")
                    .with_source("request_builder"),
            ));
        }
        Ok(())
    }
}
