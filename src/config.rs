//! Configuration management with serde serialization/deserialization
//!
//! [`Config`] holds tool-level settings (page concurrency, Chrome location,
//! timeouts) that are layered from defaults, an optional JSON file, the
//! environment and finally command-line flags. [`CaptureOptions`] describes a
//! single capture run.

use crate::browser::Engine;
use crate::error::InvalidCaptureOptions;
use crate::CaptureError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding [`Config::page_limit`].
pub const BROWSER_LIMIT_ENV: &str = "PLUNDER_BROWSER_LIMIT";

/// Main configuration structure
///
/// # Examples
///
/// ```rust
/// use plunder::Config;
///
/// let config = Config {
///     page_limit: 8,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of pages open at once across all browsers (default: 4)
    ///
    /// Page requests beyond this limit wait until an open page closes.
    pub page_limit: usize,

    /// Which waiting page request is served when capacity frees up (default: FIFO)
    pub queue_order: QueueOrder,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Timeout for a single page navigation (default: 30 seconds)
    pub navigation_timeout: Duration,

    /// Timeout for downloading a linked stylesheet (default: 10 seconds)
    pub stylesheet_fetch_timeout: Duration,

    /// Custom User-Agent string for pages and stylesheet requests
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_limit: 4,
            queue_order: QueueOrder::Fifo,
            chrome_path: None,
            navigation_timeout: Duration::from_secs(30),
            stylesheet_fetch_timeout: Duration::from_secs(10),
            user_agent: None,
        }
    }
}

/// Service order of page requests queued at the page limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueOrder {
    /// Oldest waiting request first
    Fifo,
    /// Most recent waiting request first
    Lifo,
}

impl Default for QueueOrder {
    fn default() -> Self {
        Self::Fifo
    }
}

impl Config {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub async fn from_file(path: &Path) -> Result<Self, CaptureError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Applies `PLUNDER_BROWSER_LIMIT` when set.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(BROWSER_LIMIT_ENV) {
            self.apply_browser_limit(&value);
        }
    }

    /// Unparsable or zero limits are ignored.
    pub fn apply_browser_limit(&mut self, value: &str) {
        match value.trim().parse::<usize>() {
            Ok(limit) if limit > 0 => self.page_limit = limit,
            _ => warn!("Ignoring {}={:?}, expected a positive integer", BROWSER_LIMIT_ENV, value),
        }
    }

    pub fn validate(&self) -> Result<(), InvalidCaptureOptions> {
        let mut errors = InvalidCaptureOptions::new();
        if self.page_limit == 0 {
            errors.insert("page_limit", "must be greater than 0");
        }
        if self.navigation_timeout.is_zero() {
            errors.insert("navigation_timeout", "must be greater than 0");
        }
        if self.stylesheet_fetch_timeout.is_zero() {
            errors.insert("stylesheet_fetch_timeout", "must be greater than 0");
        }
        errors.into_result()
    }
}

/// One capture run.
///
/// At least one capture source must be configured: `breakpoints`, a device
/// query or `modern_devices`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOptions {
    pub urls: Vec<String>,

    pub out_dir: PathBuf,

    /// Capture the on and off widths of every CSS width breakpoint
    #[serde(default)]
    pub breakpoints: bool,

    /// Device label searches; `None` disables device query matching
    #[serde(default)]
    pub device_queries: Option<Vec<String>>,

    /// Capture the modern default device set
    #[serde(default)]
    pub modern_devices: bool,

    /// Engine used for breakpoints and for devices whose engine is unavailable
    #[serde(default)]
    pub browser: Engine,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Follow same-origin anchors from every captured page
    #[serde(default)]
    pub recursive: bool,
}

fn default_headless() -> bool {
    true
}

impl CaptureOptions {
    pub fn new(urls: Vec<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            urls,
            out_dir: out_dir.into(),
            breakpoints: false,
            device_queries: None,
            modern_devices: false,
            browser: Engine::default(),
            headless: true,
            recursive: false,
        }
    }

    pub fn has_capture_source(&self) -> bool {
        self.breakpoints
            || self.modern_devices
            || self
                .device_queries
                .as_ref()
                .map(|queries| !queries.is_empty())
                .unwrap_or(false)
    }
}

static LAUNCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Chrome command-line arguments for one browser launch
///
/// Every launch gets its own user data directory so concurrent browsers do
/// not trip over Chrome's process singleton.
pub fn get_chrome_args(config: &Config) -> Vec<String> {
    let launch_id = LAUNCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    let user_data_dir = std::env::temp_dir().join(format!(
        "plunder-chromium-{}-{}",
        std::process::id(),
        launch_id
    ));

    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-features=TranslateUI".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--hide-scrollbars".to_string(),
        format!("--user-data-dir={}", user_data_dir.display()),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

pub fn create_browser_config(
    config: &Config,
    headless: bool,
) -> Result<chromiumoxide::browser::BrowserConfig, CaptureError> {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder()
        .request_timeout(config.navigation_timeout)
        .args(get_chrome_args(config));

    if !headless {
        builder = builder.with_head();
    }

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(CaptureError::BrowserLaunchFailed)
}
