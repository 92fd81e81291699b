//! # Plunder
//!
//! Captures screenshots of web pages at every width breakpoint declared in
//! their CSS and across a registry of emulated devices, writing the images
//! together with a `plunder.json` manifest that describes each one.
//!
//! ## Pipeline
//!
//! 1. Options are validated and the requested devices resolved.
//! 2. With `breakpoints` or `recursive`, every page is opened once to collect
//!    its stylesheets and same-origin links. Width media queries are resolved
//!    into breakpoints and merged per page.
//! 3. Each page gets a manifest of screenshot jobs. Jobs run concurrently,
//!    bounded by the page pool's limit.
//!
//! Browsers are launched lazily, one per engine and headless mode, and
//! relaunched when they disconnect.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plunder::{capture_screenshots, launcher_for, CaptureOptions, Config, Engine, ProgressUpdater};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let mut options = CaptureOptions::new(vec!["https://example.com".to_string()], "shots");
//!     options.breakpoints = true;
//!
//!     let launcher = launcher_for(Engine::Chromium, &config)?;
//!     let pages = capture_screenshots(&options, &config, launcher, &ProgressUpdater::silent(), None).await?;
//!     println!("Captured {} pages", pages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! plunder capture https://example.com --out-dir shots --breakpoints --modern-devices
//! plunder check-links https://example.com --output-file links.json
//! ```

/// Width breakpoint types, ordering and merging
pub mod breakpoints;

/// Engine-agnostic browser, page and element traits
pub mod browser;

/// Bounded page pool over lazily launched browsers
pub mod browser_pool;

/// Capture pipeline
pub mod capture;

/// chromiumoxide implementation of the browser traits
pub mod chromium;

/// Command-line interface implementation
pub mod cli;

/// Configuration and capture options
pub mod config;

/// Same-origin crawling
pub mod crawl;

/// Stylesheet parsing and media query resolution
pub mod css_parse;

/// Device emulation registry
pub mod devices;

/// Error types
pub mod error;

/// Anchor href checking
pub mod link_check;

/// Screenshot manifest construction
pub mod manifest;

/// Metrics facade and Prometheus exporter
pub mod metrics;

/// Single page stylesheet and anchor collection
pub mod page_parse;

/// Progress reporting
pub mod progress;

/// URL and path helpers
pub mod utils;

#[cfg(test)]
mod tests;

pub use breakpoints::{merge_breakpoints, Bound, Breakpoint, Dimension, MergedBreakpoint, Unit};
pub use browser::{Browser, BrowserLauncher, Element, Engine, Page, PageSpec, Viewport};
pub use browser_pool::{PagePool, PooledPage};
pub use capture::{capture_screenshots, validate_capture_options, CaptureHook, CapturedPage};
pub use chromium::{launcher_for, ChromiumLauncher};
pub use cli::*;
pub use config::{CaptureOptions, Config, QueueOrder};
pub use css_parse::{parse_css_for_media_queries, MediaQuery, ParsedCss, Stylesheet};
pub use devices::{DeviceDefinition, DeviceType};
pub use error::*;
pub use link_check::{check_links, LinkCheckOptions, LinkCheckReport};
pub use manifest::{build_manifest, CaptureManifest};
pub use self::metrics::install_prometheus_exporter;
pub use progress::{CaptureProgress, CaptureStep, ProgressUpdater};
