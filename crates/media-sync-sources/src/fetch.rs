//! Fetch gateway: one HTTP request in, status-checked body bytes out.

use crate::error::SourceError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Proxy, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("watchsync/", env!("CARGO_PKG_VERSION"));

/// Everything needed to issue one request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub use_proxy: bool,
    /// Statuses treated as success. Anything else is `UnexpectedStatus`.
    pub accepted_statuses: Vec<u16>,
}

impl FetchRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            use_proxy: false,
            accepted_statuses: vec![200],
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, SourceError> {
        let value = serde_json::to_value(body).map_err(|e| SourceError::InvalidRequest {
            url: self.url.clone(),
            reason: format!("body does not serialize: {}", e),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn via_proxy(mut self, use_proxy: bool) -> Self {
        self.use_proxy = use_proxy;
        self
    }

    pub fn accept(mut self, statuses: &[u16]) -> Self {
        self.accepted_statuses = statuses.to_vec();
        self
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.accepted_statuses.contains(&status)
    }

    /// Base url with the query parameters appended
    pub fn url_with_params(&self) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.url).map_err(|e| SourceError::InvalidRequest {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn text(&self) -> Result<&str, SourceError> {
        std::str::from_utf8(&self.body).map_err(|e| SourceError::Body {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, SourceError> {
        serde_json::from_slice(&self.body).map_err(|e| SourceError::decode(&self.url, e))
    }
}

/// Seam between the service clients and the network
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, SourceError>;
}

/// SOCKS5 proxy endpoint. A bare `host:port` is dialed as `socks5h://`.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxySettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_auth(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self.password = password;
        self
    }

    fn proxy_uri(&self) -> String {
        if self.url.contains("://") {
            self.url.clone()
        } else {
            format!("socks5h://{}", self.url)
        }
    }

    fn to_proxy(&self) -> Result<Proxy, SourceError> {
        let proxy = Proxy::all(self.proxy_uri()).map_err(|e| SourceError::Proxy(e.to_string()))?;
        Ok(match &self.username {
            Some(user) => proxy.basic_auth(user, self.password.as_deref().unwrap_or_default()),
            None => proxy,
        })
    }
}

/// reqwest-backed gateway. Proxied requests use a separate client with
/// connection reuse disabled, so every request opens a fresh proxied connection.
pub struct HttpFetcher {
    direct: Client,
    proxied: Option<Client>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, proxy: Option<ProxySettings>) -> Result<Self> {
        let direct = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let proxied = match proxy {
            Some(settings) => {
                let client = Client::builder()
                    .user_agent(USER_AGENT)
                    .timeout(timeout)
                    .proxy(settings.to_proxy()?)
                    .pool_max_idle_per_host(0)
                    .build()
                    .context("Failed to build proxied HTTP client")?;
                debug!(proxy = %settings.url, "SOCKS5 proxy configured");
                Some(client)
            }
            None => None,
        };

        Ok(Self { direct, proxied })
    }

    fn client_for(&self, request: &FetchRequest) -> &Client {
        match (&self.proxied, request.use_proxy) {
            (Some(client), true) => client,
            (None, true) => {
                debug!(url = %request.url, "No proxy configured, sending request directly");
                &self.direct
            }
            _ => &self.direct,
        }
    }
}

#[async_trait]
impl FetchClient for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, SourceError> {
        let url = request.url_with_params()?;
        debug!(method = %request.method, url = %request.url, proxied = request.use_proxy, "Sending request");

        let mut builder = self.client_for(&request).request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| SourceError::Transport {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if !request.accepts(status) {
            warn!(url = %request.url, status, expected = ?request.accepted_statuses, "Unexpected status code");
            return Err(SourceError::UnexpectedStatus {
                url: request.url,
                status,
                expected: request.accepted_statuses,
            });
        }

        let body = response.bytes().await.map_err(|e| SourceError::Body {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        Ok(FetchResponse {
            url: request.url,
            status,
            body: body.to_vec(),
        })
    }
}
