//! Headless-browser fetches for JavaScript-rendered ranking pages.
//!
//! The browser is launched lazily on the first rendered fetch and shared by
//! later fetches of the same source. Each fetch opens its own tab, which is
//! closed on every exit path by [`TabGuard`]. The browser process goes away
//! on [`RenderFetcher::release`] or when the fetcher is dropped.
//!
//! `headless_chrome` is synchronous, so each navigation runs on the blocking
//! pool under an outer timeout.

#[cfg(feature = "render")]
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;
#[cfg(feature = "render")]
use tracing::{info, warn};

use super::RawContent;
use crate::error::FetchError;

#[cfg(feature = "render")]
use headless_chrome::{Browser, LaunchOptions, Tab};

/// Timing and wait conditions for rendered fetches.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub navigation_timeout: Duration,
    /// Fixed delay after navigation for client-side rendering.
    pub settle: Duration,
    /// Selector that marks ranking content; waiting for it is best effort.
    pub wait_selector: String,
    pub selector_wait: Duration,
    pub user_agent: Option<String>,
}

impl RenderSettings {
    /// Upper bound for one rendered fetch, including browser start-up.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.navigation_timeout + self.settle + self.selector_wait + Duration::from_secs(10)
    }
}

#[cfg(feature = "render")]
type BrowserSlot = Arc<Mutex<Option<Arc<Browser>>>>;

/// Renders pages in a shared headless Chrome.
pub struct RenderFetcher {
    settings: RenderSettings,
    #[cfg(feature = "render")]
    browser: BrowserSlot,
}

impl RenderFetcher {
    #[must_use]
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            #[cfg(feature = "render")]
            browser: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Navigate to `url` and return the rendered document.
    #[cfg(feature = "render")]
    pub async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
        let slot = Arc::clone(&self.browser);
        let settings = self.settings.clone();
        let target = url.to_string();
        let budget = self.settings.budget();

        debug!(url, "Rendering");
        let task = tokio::task::spawn_blocking(move || render_page(&slot, &settings, &target));

        let body = match tokio::time::timeout(budget, task).await {
            Err(_) => return Err(FetchError::Timeout(budget)),
            Ok(Err(join)) => return Err(FetchError::Navigation(join.to_string())),
            Ok(Ok(result)) => result?,
        };

        info!(url, bytes = body.len(), "Rendered page received");
        Ok(RawContent {
            url: url.to_string(),
            rendered: true,
            content_type: Some("text/html".to_string()),
            body,
        })
    }

    #[cfg(not(feature = "render"))]
    #[allow(clippy::unused_async)]
    pub async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
        debug!(url, "Rendered fetch requested without browser support");
        Err(FetchError::RenderUnavailable(
            "built without the `render` feature".to_string(),
        ))
    }

    /// Shut down the browser, if one was started.
    pub fn release(&self) {
        #[cfg(feature = "render")]
        {
            let taken = match self.browser.lock() {
                Ok(mut slot) => slot.take(),
                Err(poisoned) => poisoned.into_inner().take(),
            };
            if taken.is_some() {
                info!("Closing headless browser");
            }
        }
    }
}

impl Drop for RenderFetcher {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(feature = "render")]
fn acquire_browser(slot: &Mutex<Option<Arc<Browser>>>, settings: &RenderSettings) -> Result<Arc<Browser>, FetchError> {
    let mut guard = slot
        .lock()
        .map_err(|_| FetchError::RenderUnavailable("browser slot poisoned".to_string()))?;

    if let Some(browser) = guard.as_ref() {
        return Ok(Arc::clone(browser));
    }

    info!("Launching headless browser");
    let options = LaunchOptions::default_builder()
        .headless(true)
        .idle_browser_timeout(settings.budget() * 3)
        .build()
        .map_err(|e| FetchError::RenderUnavailable(e.to_string()))?;
    let browser = Arc::new(
        Browser::new(options).map_err(|e| FetchError::RenderUnavailable(e.to_string()))?,
    );
    *guard = Some(Arc::clone(&browser));
    Ok(browser)
}

/// Closes its tab when dropped.
#[cfg(feature = "render")]
struct TabGuard(Arc<Tab>);

#[cfg(feature = "render")]
impl Drop for TabGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close(true) {
            debug!("Tab close failed: {e}");
        }
    }
}

#[cfg(feature = "render")]
fn render_page(
    slot: &Mutex<Option<Arc<Browser>>>,
    settings: &RenderSettings,
    url: &str,
) -> Result<String, FetchError> {
    let navigation = |e: anyhow::Error| FetchError::Navigation(e.to_string());

    let browser = acquire_browser(slot, settings)?;
    let tab = TabGuard(browser.new_tab().map_err(navigation)?);
    tab.0.set_default_timeout(settings.navigation_timeout);

    if let Some(ua) = settings.user_agent.as_deref() {
        if let Err(e) = tab.0.set_user_agent(ua, None, None) {
            debug!("Could not set user agent: {e}");
        }
    }

    tab.0.navigate_to(url).map_err(navigation)?;
    tab.0.wait_until_navigated().map_err(navigation)?;

    std::thread::sleep(settings.settle);

    if let Err(e) = tab
        .0
        .wait_for_element_with_custom_timeout(&settings.wait_selector, settings.selector_wait)
    {
        warn!(
            url,
            selector = %settings.wait_selector,
            "Ranking selector did not appear, using page as rendered: {e}"
        );
    }

    tab.0.get_content().map_err(navigation)
}
