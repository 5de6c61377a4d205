//! Host catalog: the ordered list of candidate hosts a client starts with.
//!
//! Catalogs come from code, YAML/JSON documents, or the `MULTIHOST_HOSTS`
//! environment variable. Order is priority: the first eligible healthy host wins.

use crate::host::{CallType, Host};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Environment variable read by [`HostCatalog::from_env`].
pub const HOSTS_ENV: &str = "MULTIHOST_HOSTS";

/// Declarative description of one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Base URL. A bare hostname is treated as `https://<hostname>`.
    pub url: String,
    /// Restrict the host to one call type; absent means both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<CallType>,
}

impl HostConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: CallType) -> Self {
        self.scope = Some(scope);
        self
    }

    fn parse_url(&self, field_path: String) -> Result<Url> {
        let raw = self.url.trim();
        let candidate = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        };
        let url = Url::parse(&candidate).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid host url '{}'", self.url),
                ErrorContext::new()
                    .with_field_path(field_path.clone())
                    .with_details(e.to_string())
                    .with_source("catalog_loader"),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::configuration_with_context(
                format!("host url '{}' must be an http(s) url with a host", self.url),
                ErrorContext::new()
                    .with_field_path(field_path)
                    .with_source("catalog_loader"),
            ));
        }
        // Request paths are appended to the host path; a query or fragment would swallow them.
        if url.query().is_some() || url.fragment().is_some() {
            return Err(Error::configuration_with_context(
                format!("host url '{}' must not carry a query or fragment", self.url),
                ErrorContext::new()
                    .with_field_path(field_path)
                    .with_source("catalog_loader"),
            ));
        }
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    hosts: Vec<HostConfig>,
}

/// Validated, ordered host list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCatalog {
    entries: Vec<(Url, Option<CallType>)>,
}

impl HostCatalog {
    /// Validate and freeze a host list. Empty catalogs and invalid URLs are rejected.
    pub fn new(hosts: Vec<HostConfig>) -> Result<Self> {
        if hosts.is_empty() {
            return Err(Error::configuration_with_context(
                "host catalog is empty",
                ErrorContext::new()
                    .with_field_path("hosts")
                    .with_source("catalog_loader"),
            ));
        }
        let entries = hosts
            .iter()
            .enumerate()
            .map(|(i, h)| Ok((h.parse_url(format!("hosts[{}].url", i))?, h.scope)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Parse a YAML document of the form `hosts: [{ url: ..., scope: read|write }]`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let doc: CatalogDocument = serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                "failed to parse host catalog YAML",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("catalog_loader"),
            )
        })?;
        Self::new(doc.hosts)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Self::new(doc.hosts)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Comma-separated list; each item may carry a `read:` or `write:` prefix.
    ///
    /// `write:https://w1.example.net,https://any.example.net`
    pub fn from_list_str(list: &str) -> Result<Self> {
        let hosts = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|item| {
                if let Some(rest) = item.strip_prefix("read:") {
                    HostConfig::new(rest).with_scope(CallType::Read)
                } else if let Some(rest) = item.strip_prefix("write:") {
                    HostConfig::new(rest).with_scope(CallType::Write)
                } else {
                    HostConfig::new(item)
                }
            })
            .collect();
        Self::new(hosts)
    }

    pub fn from_env() -> Result<Self> {
        let list = std::env::var(HOSTS_ENV).map_err(|_| {
            Error::configuration_with_context(
                format!("{} is not set", HOSTS_ENV),
                ErrorContext::new().with_source("catalog_loader"),
            )
        })?;
        Self::from_list_str(&list)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Url, Option<CallType>)> {
        self.entries.iter().map(|(url, scope)| (url, *scope))
    }

    /// Fresh `Up(0)` hosts in catalog order.
    pub(crate) fn to_hosts(&self) -> Vec<Host> {
        self.entries
            .iter()
            .map(|(url, scope)| Host::new(url.clone(), *scope))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty() {
        let err = HostCatalog::new(vec![]).unwrap_err();
        assert!(err.to_string().contains("host catalog is empty"));
    }

    #[test]
    fn test_bare_hostname_gets_https() {
        let catalog = HostCatalog::new(vec![HostConfig::new("app-dsn.example.net")]).unwrap();
        let (url, scope) = catalog.iter().next().unwrap();
        assert_eq!(url.as_str(), "https://app-dsn.example.net/");
        assert_eq!(scope, None);
    }

    #[test]
    fn test_invalid_url_reports_field_path() {
        let err = HostCatalog::new(vec![
            HostConfig::new("https://ok.example.net"),
            HostConfig::new("ftp://files.example.net"),
        ])
        .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("hosts[1].url")
        );
    }

    #[test]
    fn test_query_or_fragment_rejected() {
        for bad in ["https://h1.example.net/?tenant=a", "https://h1.example.net/base#top"] {
            let err = HostCatalog::new(vec![
                HostConfig::new("https://ok.example.net"),
                HostConfig::new(bad),
            ])
            .unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }), "{}", bad);
            assert_eq!(
                err.context().and_then(|c| c.field_path.as_deref()),
                Some("hosts[1].url")
            );
        }
        assert!(HostCatalog::new(vec![HostConfig::new("https://h1.example.net/base/")]).is_ok());
    }

    #[test]
    fn test_yaml_preserves_order_and_scope() {
        let yaml = r#"
hosts:
  - url: https://w1.example.net
    scope: write
  - url: https://r1.example.net
    scope: read
  - url: https://any.example.net
"#;
        let catalog = HostCatalog::from_yaml_str(yaml).unwrap();
        let scopes: Vec<_> = catalog.iter().map(|(_, s)| s).collect();
        assert_eq!(scopes, vec![Some(CallType::Write), Some(CallType::Read), None]);
    }

    #[test]
    fn test_json_document() {
        let json = r#"{"hosts":[{"url":"http://127.0.0.1:7700","scope":"read"}]}"#;
        let catalog = HostCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_bad_yaml_is_configuration_error() {
        let err = HostCatalog::from_yaml_str("hosts: {nope").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_list_string() {
        let catalog =
            HostCatalog::from_list_str("write:w1.example.net, read:r1.example.net,any.example.net")
                .unwrap();
        let got: Vec<_> = catalog
            .iter()
            .map(|(u, s)| (u.host_str().unwrap().to_string(), s))
            .collect();
        assert_eq!(
            got,
            vec![
                ("w1.example.net".to_string(), Some(CallType::Write)),
                ("r1.example.net".to_string(), Some(CallType::Read)),
                ("any.example.net".to_string(), None),
            ]
        );
    }
}
