//! Rankings configuration loaded from `~/.config/matrank/rankings.toml`.
//!
//! Every field has a built-in default, so the file is optional. Whatever is
//! loaded goes through [`RankingsConfig::validate`] before the pipeline makes
//! a single request.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// NCAA Division I weight classes.
pub const WEIGHT_CLASSES: [&str; 10] = [
    "125", "133", "141", "149", "157", "165", "174", "184", "197", "285",
];

pub const DEFAULT_EDITION: &str = "current";

const FLO_FEED_URL: &str =
    "https://api.flowrestling.org/api/experiences/web/legacy-core/ranking-containers/14300895?site_id=2";
const NCAA_LISTING_URL: &str = "https://www.ncaa.com/rankings/wrestling/d1";
const FLO_BASE_URL: &str =
    "https://www.flowrestling.org/rankings/14300895-2025-26-ncaa-di-wrestling-rankings";
const FLO_CURRENT_PAGES: [(&str, &str); 10] = [
    ("125", "54619-125-vincent-robinson"),
    ("133", "54620-133-lucas-byrd"),
    ("141", "54621-141-real-woods"),
    ("149", "54622-149-caleb-rathjen"),
    ("157", "54623-157-jacori-teemer"),
    ("165", "54624-165-dean-hamiti"),
    ("174", "54625-174-carter-starocci"),
    ("184", "54626-184-aaron-brooks"),
    ("197", "54627-197-stephen-buchanan"),
    ("285", "54628-285-wyatt-hendrickson"),
];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingsConfig {
    /// Ordered category list; every source is asked for these.
    pub categories: Vec<String>,
    /// Edition used by the per-category sources unless overridden.
    pub default_edition: String,
    /// Fixed User-Agent; a browser-like profile is generated when unset.
    pub user_agent: Option<String>,
    pub fetch: FetchSettings,
    pub feed: EndpointConfig,
    pub listing: EndpointConfig,
    pub editions: BTreeMap<String, EditionConfig>,
}

/// Network pacing and timeouts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub render_timeout_secs: u64,
    pub render_settle_ms: u64,
    pub wait_selector: String,
    pub selector_wait_secs: u64,
    pub request_delay_ms: u64,
    pub workers: usize,
    pub deadline_secs: u64,
}

/// A single-URL source (feed API or listing page).
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// One published edition of the per-category ranking pages.
#[derive(Debug, Clone, Deserialize)]
pub struct EditionConfig {
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Category → page URL.
    pub categories: BTreeMap<String, String>,
}

fn enabled() -> bool {
    true
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            render_timeout_secs: 30,
            render_settle_ms: 3_000,
            wait_selector: r#"div[data-test="ranking-content"]"#.to_string(),
            selector_wait_secs: 5,
            request_delay_ms: 500,
            workers: 3,
            deadline_secs: 300,
        }
    }
}

impl FetchSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    #[must_use]
    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    #[must_use]
    pub fn selector_wait(&self) -> Duration {
        Duration::from_secs(self.selector_wait_secs)
    }

    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl EndpointConfig {
    /// Per-endpoint timeout, falling back to the global fetch timeout.
    #[must_use]
    pub fn timeout(&self, fetch: &FetchSettings) -> Duration {
        self.timeout_secs
            .map_or_else(|| fetch.timeout(), Duration::from_secs)
    }
}

impl Default for RankingsConfig {
    fn default() -> Self {
        let current = EditionConfig {
            name: "2025-26 NCAA DI Wrestling Rankings (Current)".to_string(),
            base_url: Some(FLO_BASE_URL.to_string()),
            categories: FLO_CURRENT_PAGES
                .iter()
                .map(|(weight, slug)| ((*weight).to_string(), format!("{FLO_BASE_URL}/{slug}")))
                .collect(),
        };

        Self {
            categories: WEIGHT_CLASSES.iter().map(|w| (*w).to_string()).collect(),
            default_edition: DEFAULT_EDITION.to_string(),
            user_agent: None,
            fetch: FetchSettings::default(),
            feed: EndpointConfig {
                enabled: true,
                name: "flowrestling-feed".to_string(),
                url: FLO_FEED_URL.to_string(),
                timeout_secs: Some(10),
            },
            listing: EndpointConfig {
                enabled: true,
                name: "ncaa-listing".to_string(),
                url: NCAA_LISTING_URL.to_string(),
                timeout_secs: None,
            },
            editions: BTreeMap::from([(DEFAULT_EDITION.to_string(), current)]),
        }
    }
}

impl RankingsConfig {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`.
    ///
    /// A missing default file yields the built-in configuration; an explicit
    /// path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path(), false),
        };

        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "no rankings config, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&content, &path)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Look up an edition, `None` meaning the configured default.
    pub fn edition(&self, key: Option<&str>) -> Result<(&str, &EditionConfig), ConfigError> {
        let key = key.unwrap_or(&self.default_edition);
        self.editions
            .get_key_value(key)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownEdition(key.to_string()))
    }

    /// Check the configuration for mistakes that would otherwise surface as
    /// confusing fetch failures.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.as_str()) {
                return Err(ConfigError::DuplicateCategory(category.clone()));
            }
        }

        if self.fetch.workers == 0 {
            return Err(ConfigError::ZeroLimit("fetch.workers"));
        }

        if self.feed.enabled {
            check_url("feed.url", &self.feed.url)?;
        }
        if self.listing.enabled {
            check_url("listing.url", &self.listing.url)?;
        }

        if !self.editions.contains_key(&self.default_edition) {
            return Err(ConfigError::UnknownEdition(self.default_edition.clone()));
        }

        for (key, edition) in &self.editions {
            for (category, url) in &edition.categories {
                if !seen.contains(category.as_str()) {
                    return Err(ConfigError::UnknownCategory {
                        edition: key.clone(),
                        category: category.clone(),
                    });
                }
                check_url(&format!("editions.{key}.categories.{category}"), url)?;
            }
        }

        Ok(())
    }
}

fn check_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field: field.to_string(),
        url: raw.to_string(),
        reason,
    };

    let parsed = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}

/// Return the path to the rankings config file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matrank")
        .join("rankings.toml")
}
