//! HTTP client bound to one running app.

use anyhow::{Context, Result};
use reqwest::{Response, Url};
use serde::Serialize;
use std::net::SocketAddr;

/// A `reqwest::Client` plus the base URL of the app it talks to.
///
/// No headers or credentials are added; tests set whatever they need on the
/// request builders.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base: Url,
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base =
            Url::parse(base_url).with_context(|| format!("Invalid base URL '{}'", base_url))?;
        let inner = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpClient { base, inner })
    }

    /// Client for `http://<addr>`.
    pub fn for_addr(addr: SocketAddr) -> Result<Self> {
        Self::new(&format!("http://{}", addr))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Invalid request path '{}'", path))
    }

    /// The underlying client, for requests the helpers don't cover.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path)?;
        self.inner
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let url = self.url(path)?;
        self.inner
            .post(url.clone())
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        let url = self.url(path)?;
        self.inner
            .delete(url.clone())
            .send()
            .await
            .with_context(|| format!("DELETE {} failed", url))
    }
}
