//! Scripted requester shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use multihost_transport::catalog::{HostCatalog, HostConfig};
use multihost_transport::transport::{HttpRequest, HttpResponse, Requester, TransportError};
use multihost_transport::{HostClient, TransportConfig};
use reqwest::header::HeaderMap;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a host does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, &'static str),
    Timeout,
    Refused,
    /// Never answers; only cancellation ends the attempt.
    Hang,
}

/// One recorded attempt.
#[derive(Debug, Clone)]
pub struct Call {
    pub host: String,
    pub timeout: Duration,
}

/// Replies per host name. Queued replies are used first, then the host's default.
#[derive(Default)]
pub struct ScriptedRequester {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    defaults: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRequester {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn always(&self, host: &str, reply: Reply) {
        self.defaults.lock().unwrap().insert(host.to_string(), reply);
    }

    pub fn then(&self, host: &str, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn hosts_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.host).collect()
    }

    fn next_reply(&self, host: &str) -> Reply {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(host)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.defaults
            .lock()
            .unwrap()
            .get(host)
            .cloned()
            .unwrap_or(Reply::Status(200, "{}"))
    }
}

#[async_trait]
impl Requester for ScriptedRequester {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let host = request.url.host_str().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(Call {
            host: host.clone(),
            timeout: request.timeout,
        });
        match self.next_reply(&host) {
            Reply::Status(status, body) => Ok(HttpResponse::new(
                status,
                HeaderMap::new(),
                bytes::Bytes::from_static(body.as_bytes()),
            )),
            Reply::Timeout => Err(TransportError::Timeout(request.timeout)),
            Reply::Refused => Err(TransportError::Connect("connection refused".into())),
            Reply::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// `[h1(write), h2(write), h3(any)]`, the catalog used by most scenarios.
pub fn write_catalog() -> HostCatalog {
    HostCatalog::new(vec![
        HostConfig::new("https://h1.example.net").with_scope(multihost_transport::CallType::Write),
        HostConfig::new("https://h2.example.net").with_scope(multihost_transport::CallType::Write),
        HostConfig::new("https://h3.example.net"),
    ])
    .unwrap()
}

pub fn client_with(
    catalog: HostCatalog,
    config: TransportConfig,
    requester: Arc<ScriptedRequester>,
) -> HostClient {
    HostClient::builder()
        .hosts(catalog)
        .config(config)
        .requester(requester)
        .build()
        .unwrap()
}
