//! Screenshot capture pipeline
//!
//! [`capture_screenshots`] validates a [`CaptureOptions`], optionally crawls
//! the seed URLs to collect breakpoints and more pages, then captures every
//! page's manifest jobs concurrently and writes `plunder.json` next to the
//! images. The page pool is shut down whether the run succeeds or not.
//!
//! An optional [`CaptureHook`] runs on every page after navigation and before
//! the screenshot, e.g. to dismiss a cookie banner or wait for fonts.

use crate::breakpoints::merge_breakpoints;
use crate::browser::{BrowserLauncher, Page};
use crate::browser_pool::PagePool;
use crate::config::{CaptureOptions, Config};
use crate::crawl::crawl;
use crate::css_parse::MediaQuery;
use crate::devices::{device_label_search_matches, resolve_devices, DeviceDefinition};
use crate::error::InvalidCaptureOptions;
use crate::manifest::{build_manifest, ScreenshotJob};
use crate::page_parse::{PageParser, ParseOptions};
use crate::progress::{CaptureStep, ProgressUpdater};
use crate::utils::{make_out_dir_for_page_url, validate_url};
use crate::{metrics, CaptureError};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

/// Where one page's screenshots were written, relative to `outDir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedPage {
    pub url: String,
    pub dir: String,
}

/// Prepares a navigated page before its screenshot is taken.
#[async_trait]
pub trait CaptureHook: Send + Sync {
    async fn before_screenshot(&self, page: &dyn Page) -> Result<(), CaptureError>;
}

/// Checks options before any browser work, collecting every invalid field.
pub fn validate_capture_options(
    options: &CaptureOptions,
    launcher: &dyn BrowserLauncher,
) -> Result<(), CaptureError> {
    let mut errors = InvalidCaptureOptions::new();

    if options.urls.is_empty() {
        errors.insert("urls", "at least one url is required");
    }
    for (i, url) in options.urls.iter().enumerate() {
        if validate_url(url).is_err() {
            errors.insert(format!("urls.{i}"), format!("{url} is not an http or https url"));
        }
    }

    if options.out_dir.as_os_str().is_empty() {
        errors.insert("outDir", "must not be empty");
    }

    if !launcher.supports(options.browser) {
        errors.insert("browser", format!("{} is not supported", options.browser));
    }

    if let Some(queries) = &options.device_queries {
        for (i, query) in queries.iter().enumerate() {
            if query.trim().is_empty() {
                errors.insert(format!("deviceQueries.{i}"), "must not be empty");
            } else if device_label_search_matches(std::slice::from_ref(query)).is_empty() {
                errors.insert(format!("deviceQueries.{i}"), format!("{query} matches no device"));
            }
        }
    }

    errors.into_result()?;

    if !options.has_capture_source() {
        return Err(CaptureError::UnspecifiedCaptureSource);
    }
    Ok(())
}

/// Resolves the requested devices, moving any device whose engine the
/// launcher cannot drive onto the run's default browser.
pub fn resolve_capture_devices(
    options: &CaptureOptions,
    launcher: &dyn BrowserLauncher,
) -> Vec<DeviceDefinition> {
    let mut devices = resolve_devices(options.device_queries.as_deref(), options.modern_devices);
    for device in &mut devices {
        if !launcher.supports(device.browser) {
            warn!(
                "{} is not available for {}, capturing with {}",
                device.browser, device.label, options.browser
            );
            device.browser = options.browser;
        }
    }
    devices
}

pub async fn capture_screenshots(
    options: &CaptureOptions,
    config: &Config,
    launcher: Arc<dyn BrowserLauncher>,
    updater: &ProgressUpdater,
    hook: Option<Arc<dyn CaptureHook>>,
) -> Result<Vec<CapturedPage>, CaptureError> {
    updater.advance(CaptureStep::Starting);
    validate_capture_options(options, launcher.as_ref())?;
    let devices = resolve_capture_devices(options, launcher.as_ref());
    let pool = Arc::new(PagePool::new(launcher, config.page_limit, config.queue_order));

    let started = Instant::now();
    let result = run_capture(options, config, &pool, &devices, updater, hook.as_deref()).await;
    pool.shutdown().await;

    match &result {
        Ok(pages) => {
            updater.advance(CaptureStep::Completed);
            info!("Captured {} pages in {:?}", pages.len(), started.elapsed());
        }
        Err(e) => error!("Capture failed: {}", e),
    }
    result
}

async fn run_capture(
    options: &CaptureOptions,
    config: &Config,
    pool: &Arc<PagePool>,
    devices: &[DeviceDefinition],
    updater: &ProgressUpdater,
    hook: Option<&dyn CaptureHook>,
) -> Result<Vec<CapturedPage>, CaptureError> {
    let seeds = options
        .urls
        .iter()
        .map(|url| Url::parse(url).map_err(|e| CaptureError::NavigationFailed {
            url: url.clone(),
            reason: e.to_string(),
        }))
        .collect::<Result<Vec<_>, _>>()?;

    let pages: Vec<(Url, Option<Vec<MediaQuery>>)> = if options.breakpoints || options.recursive {
        updater.advance(CaptureStep::Parsing);
        let parser = PageParser::new(
            pool.clone(),
            config,
            options.browser,
            options.headless,
            ParseOptions {
                collect_css: options.breakpoints,
                collect_anchors: options.recursive,
            },
        )?;
        crawl(&seeds, options.recursive, updater, |url| parser.parse(url))
            .await?
            .into_iter()
            .map(|page| {
                let media_queries = options.breakpoints.then_some(page.media_queries);
                (page.url, media_queries)
            })
            .collect()
    } else {
        seeds.into_iter().map(|url| (url, None)).collect()
    };

    updater.advance(CaptureStep::Capturing);
    try_join_all(pages.iter().map(|(url, media_queries)| {
        capture_page(options, pool, url, media_queries.as_deref(), devices, updater, hook)
    }))
    .await
}

async fn capture_page(
    options: &CaptureOptions,
    pool: &PagePool,
    url: &Url,
    media_queries: Option<&[MediaQuery]>,
    devices: &[DeviceDefinition],
    updater: &ProgressUpdater,
    hook: Option<&dyn CaptureHook>,
) -> Result<CapturedPage, CaptureError> {
    let (dir, subdir) = make_out_dir_for_page_url(&options.out_dir, url).await?;
    let subdir = subdir.to_string_lossy().into_owned();

    let merged = media_queries.map(merge_breakpoints);
    let manifest = build_manifest(&subdir, url.as_str(), merged.as_deref(), devices, options.browser);
    updater.add_screenshots_total(manifest.screenshots.len());
    info!("Capturing {} screenshots of {}", manifest.screenshots.len(), url);

    try_join_all(
        manifest
            .screenshots
            .iter()
            .map(|(file, job)| capture_job(pool, url, &dir, file, job, options.headless, updater, hook)),
    )
    .await?;

    manifest.write(&dir).await?;
    Ok(CapturedPage {
        url: url.to_string(),
        dir: subdir,
    })
}

#[allow(clippy::too_many_arguments)]
async fn capture_job(
    pool: &PagePool,
    url: &Url,
    dir: &Path,
    file: &str,
    job: &ScreenshotJob,
    headless: bool,
    updater: &ProgressUpdater,
    hook: Option<&dyn CaptureHook>,
) -> Result<(), CaptureError> {
    let started = Instant::now();
    let page = pool.acquire_page(job.browser, headless, &job.page_spec).await?;

    let rendered = async {
        page.goto(url.as_str()).await?;
        if let Some(hook) = hook {
            hook.before_screenshot(&*page)
                .await
                .map_err(|e| CaptureError::CaptureHookFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        }
        page.screenshot(true).await.map_err(|e| CaptureError::CaptureFailed {
            url: url.to_string(),
            file: file.to_string(),
            reason: e.to_string(),
        })
    }
    .await;
    if let Err(e) = page.close().await {
        warn!("Failed to close page for {}: {}", file, e);
    }

    tokio::fs::write(dir.join(file), rendered?).await?;
    metrics::record_screenshot(started.elapsed());
    updater.mark_screenshot_completed();
    debug!("Wrote {} for {} in {:?}", file, url, started.elapsed());
    Ok(())
}
