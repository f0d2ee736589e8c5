//! Raw page retrieval.
//!
//! A [`Fetcher`] turns one URL into [`RawContent`] or a [`SourceFailure`];
//! it never parses. [`PageFetcher`] is the production implementation and
//! dispatches on [`FetchMode`]:
//!
//! | Mode | Backend | Timeout |
//! |------|---------|---------|
//! | [`FetchMode::Plain`] | [`AcceleratedClient`] | per request |
//! | [`FetchMode::Rendered`] | [`render::RenderFetcher`] | navigation + settle + selector wait |
//!
//! A failure is terminal for that attempt; nothing here retries.

pub mod render;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::RankingsConfig;
use crate::error::{FetchError, SourceFailure};
use crate::fingerprint::{random_profile, BrowserProfile};
use crate::http_client::AcceleratedClient;

pub use render::{RenderFetcher, RenderSettings};

/// How a URL should be retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Single HTTP GET with a fixed timeout.
    Plain { timeout: Duration },
    /// Headless-browser navigation with a bounded wait for dynamic content.
    Rendered,
}

impl FetchMode {
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, FetchMode::Rendered)
    }
}

/// Content retrieved for one URL.
#[derive(Debug, Clone)]
pub struct RawContent {
    pub url: String,
    pub rendered: bool,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawContent {
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rendered: false,
            content_type: Some("text/html".to_string()),
            body: body.into(),
        }
    }
}

/// Retrieves raw content for a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<RawContent, SourceFailure>;

    /// Release heavy resources (browser processes). Called when a source has
    /// finished with the fetcher; dropping the fetcher has the same effect.
    fn release(&self) {}
}

/// Plain HTTP plus headless rendering.
pub struct PageFetcher {
    http: AcceleratedClient,
    render: RenderFetcher,
}

impl PageFetcher {
    pub fn new(config: &RankingsConfig) -> Result<Self, FetchError> {
        let profile = config
            .user_agent
            .as_deref()
            .map_or_else(random_profile, BrowserProfile::with_user_agent);

        let render = RenderFetcher::new(RenderSettings {
            navigation_timeout: config.fetch.render_timeout(),
            settle: config.fetch.render_settle(),
            wait_selector: config.fetch.wait_selector.clone(),
            selector_wait: config.fetch.selector_wait(),
            user_agent: Some(profile.user_agent.clone()),
        });

        Ok(Self {
            http: AcceleratedClient::with_profile(&profile)?,
            render,
        })
    }
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> Result<RawContent, SourceFailure> {
        match mode {
            FetchMode::Plain { timeout } => {
                let response = self
                    .http
                    .fetch_text(url, timeout)
                    .await
                    .map_err(|e| SourceFailure::new(url, e))?;
                Ok(RawContent {
                    url: url.to_string(),
                    rendered: false,
                    content_type: response.content_type,
                    body: response.body,
                })
            }
            FetchMode::Rendered => self
                .render
                .fetch(url)
                .await
                .map_err(|e| SourceFailure::new(url, e)),
        }
    }

    fn release(&self) {
        self.render.release();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted fetcher for adapter and orchestrator tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    pub struct ScriptedFetcher {
        pages: HashMap<String, Result<String, FetchError>>,
        pub calls: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self {
                pages: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub fn failing(mut self, url: &str, error: FetchError) -> Self {
            self.pages.insert(url.to_string(), Err(error));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str, mode: FetchMode) -> Result<RawContent, SourceFailure> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), mode.is_rendered()));
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(RawContent {
                    rendered: mode.is_rendered(),
                    ..RawContent::html(url, body.clone())
                }),
                Some(Err(e)) => Err(SourceFailure::new(url, e.clone())),
                None => Err(SourceFailure::new(url, FetchError::Status(404))),
            }
        }
    }
}
