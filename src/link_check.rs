//! Anchor href checking
//!
//! Collects every anchor of each page, resolves the hrefs against the page
//! and its `<base href>`, then requests each one and reports its status.

use crate::browser::{BrowserLauncher, Engine, PageSpec};
use crate::browser_pool::PagePool;
use crate::config::Config;
use crate::error::InvalidCaptureOptions;
use crate::manifest::to_pretty_json;
use crate::utils::{rewrite_href, validate_url};
use crate::CaptureError;
use futures::future::{join_all, try_join_all};
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkCheckOptions {
    pub urls: Vec<String>,
    /// Optional path the JSON report is written to.
    pub output_file: Option<PathBuf>,
}

/// HTTP status of an href, or `err` when no response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HrefStatus {
    Code(u16),
    Failed,
}

impl HrefStatus {
    pub fn is_good(&self) -> bool {
        matches!(self, HrefStatus::Code(code) if (200..300).contains(code))
    }
}

impl Serialize for HrefStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HrefStatus::Code(code) => serializer.serialize_u16(*code),
            HrefStatus::Failed => serializer.serialize_str("err"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HrefCheck {
    pub good: bool,
    pub href: String,
    pub status: HrefStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCheck {
    pub good: bool,
    pub hrefs: Vec<HrefCheck>,
    pub url: String,
}

impl PageCheck {
    pub fn new(url: String, results: Vec<(String, HrefStatus)>) -> Self {
        let hrefs: Vec<HrefCheck> = results
            .into_iter()
            .map(|(href, status)| HrefCheck {
                good: status.is_good(),
                href,
                status,
            })
            .collect();
        Self {
            good: hrefs.iter().all(|h| h.good),
            hrefs,
            url,
        }
    }

    pub fn bad_hrefs(&self) -> Vec<&HrefCheck> {
        let mut bad: Vec<&HrefCheck> = self.hrefs.iter().filter(|h| !h.good).collect();
        bad.sort_by_key(|h| h.status);
        bad
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCheckReport {
    pub good: bool,
    pub pages: Vec<PageCheck>,
}

impl LinkCheckReport {
    /// The per-page results as written to the report file.
    pub fn to_json(&self) -> Result<String, CaptureError> {
        to_pretty_json(&self.pages)
    }
}

pub fn validate_link_check_options(options: &LinkCheckOptions) -> Result<(), CaptureError> {
    let mut errors = InvalidCaptureOptions::new();
    if options.urls.is_empty() {
        errors.insert("urls", "at least one url is required");
    }
    for (i, url) in options.urls.iter().enumerate() {
        if validate_url(url).is_err() {
            errors.insert(format!("urls.{i}"), format!("{url} is not an http or https url"));
        }
    }
    if let Some(path) = &options.output_file {
        if path.as_os_str().is_empty() {
            errors.insert("outputFile", "must not be empty");
        }
    }
    Ok(errors.into_result()?)
}

pub async fn check_links(
    options: &LinkCheckOptions,
    config: &Config,
    launcher: Arc<dyn BrowserLauncher>,
) -> Result<LinkCheckReport, CaptureError> {
    validate_link_check_options(options)?;
    let pool = PagePool::new(launcher, config.page_limit, config.queue_order);
    let collected = try_join_all(options.urls.iter().map(|url| collect_hrefs(&pool, url))).await;
    pool.shutdown().await;
    let collected = collected?;

    let mut client = reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(10));
    if let Some(user_agent) = &config.user_agent {
        client = client.user_agent(user_agent.clone());
    }
    let client = client.build()?;

    let pages = join_all(
        collected
            .into_iter()
            .map(|(url, hrefs)| check_hrefs(&client, url, hrefs)),
    )
    .await;

    let report = LinkCheckReport {
        good: pages.iter().all(|p| p.good),
        pages,
    };
    if let Some(path) = &options.output_file {
        tokio::fs::write(path, report.to_json()?).await?;
        info!("Wrote link check report to {}", path.display());
    }
    Ok(report)
}

async fn collect_hrefs(pool: &PagePool, url: &str) -> Result<(String, Vec<Url>), CaptureError> {
    let page_url = Url::parse(url).map_err(|e| CaptureError::NavigationFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let page = pool.acquire_page(Engine::Chromium, true, &PageSpec::default()).await?;

    let collected = async {
        page.goto(url).await?;
        let mut base_href = None;
        for base in page.locate_all("base").await? {
            if let Some(href) = base.attribute("href").await? {
                base_href = Some(href);
                break;
            }
        }
        let mut hrefs = Vec::new();
        for anchor in page.locate_all("a").await? {
            if let Some(href) = anchor.attribute("href").await? {
                match rewrite_href(&href, &page_url, base_href.as_deref()) {
                    Some(target) if matches!(target.scheme(), "http" | "https") => hrefs.push(target),
                    _ => debug!("Not checking {:?} on {}", href, url),
                }
            }
        }
        Ok::<_, CaptureError>(hrefs)
    }
    .await;

    if let Err(e) = page.close().await {
        warn!("Failed to close page for {}: {}", url, e);
    }
    Ok((url.to_string(), collected?))
}

async fn check_hrefs(client: &reqwest::Client, url: String, hrefs: Vec<Url>) -> PageCheck {
    let referrer = url.as_str();
    let results = join_all(hrefs.into_iter().map(|href| async move {
        let status = match client
            .get(href.clone())
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await
        {
            Ok(response) => HrefStatus::Code(response.status().as_u16()),
            Err(e) => {
                warn!("GET {} referenced from {} failed: {}", href, referrer, e);
                HrefStatus::Failed
            }
        };
        (href.to_string(), status)
    }))
    .await;
    PageCheck::new(url, results)
}
