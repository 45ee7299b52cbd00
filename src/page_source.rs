use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;

use crate::http_client::http_client;

/// Anything that can turn a URL into an HTML document.
pub trait PageSource: Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct HttpPageSource {
    client: &'static Client,
}

impl HttpPageSource {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
        })
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().context("request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("http {status} for {url}"));
        }
        resp.text().context("failed reading body")
    }
}

/// Fixed URL -> body table. Unknown URLs fail like an unreachable host.
#[derive(Debug, Clone, Default)]
pub struct StaticPageSource {
    pages: HashMap<String, String>,
}

impl StaticPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.insert(url.into(), body.into());
    }
}

impl PageSource for StaticPageSource {
    fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no page for {url}"))
    }
}
