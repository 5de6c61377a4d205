//! Credential headers attached to every outbound request, whatever the host.

use crate::{Error, ErrorContext, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::env;

pub const APPLICATION_ID_HEADER: &str = "x-application-id";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Supplies authentication headers.
pub trait Credentials: Send + Sync {
    fn headers(&self) -> HeaderMap;
}

/// No credentials at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl Credentials for NoCredentials {
    fn headers(&self) -> HeaderMap {
        HeaderMap::new()
    }
}

/// Application id + API key, validated once at construction.
#[derive(Clone)]
pub struct StaticCredentials {
    headers: HeaderMap,
}

impl StaticCredentials {
    pub fn new(application_id: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(APPLICATION_ID_HEADER),
            header_value(application_id, "credentials.application_id")?,
        );
        let mut key = header_value(api_key, "credentials.api_key")?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        Ok(Self { headers })
    }

    /// Read `<PREFIX>_APPLICATION_ID` and `<PREFIX>_API_KEY`.
    pub fn from_env(prefix: &str) -> Result<Self> {
        let prefix = prefix.to_uppercase();
        let app_var = format!("{}_APPLICATION_ID", prefix);
        let key_var = format!("{}_API_KEY", prefix);
        let application_id = env::var(&app_var).map_err(|_| missing(&app_var))?;
        let api_key = env::var(&key_var).map_err(|_| missing(&key_var))?;
        Self::new(&application_id, &api_key)
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("application_id", &self.headers.get(APPLICATION_ID_HEADER))
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials for StaticCredentials {
    fn headers(&self) -> HeaderMap {
        self.headers.clone()
    }
}

fn header_value(value: &str, field: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value.trim()).map_err(|e| {
        Error::configuration_with_context(
            "credential contains characters not allowed in a header",
            ErrorContext::new()
                .with_field_path(field)
                .with_details(e.to_string())
                .with_source("credentials"),
        )
    })
}

fn missing(var: &str) -> Error {
    Error::configuration_with_context(
        format!("{} is not set", var),
        ErrorContext::new().with_source("credentials"),
    )
}
