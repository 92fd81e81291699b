//! Single page parsing
//!
//! Opens a page through the pool, gathers its stylesheets and same-origin
//! anchors, then resolves the stylesheets' width media queries. Linked
//! stylesheets are downloaded with reqwest after the page is closed so the
//! download does not hold page capacity.

use crate::browser::{Engine, Page, PageSpec};
use crate::browser_pool::PagePool;
use crate::config::Config;
use crate::css_parse::{parse_css_for_media_queries, MediaQuery, Stylesheet};
use crate::utils::{crawl_key, is_same_origin, rewrite_href};
use crate::{metrics, CaptureError};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    pub url: Url,
    pub media_queries: Vec<MediaQuery>,
    /// Same-origin anchors, only collected when crawling.
    pub anchor_hrefs: Vec<Url>,
}

/// What to collect from each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub collect_css: bool,
    pub collect_anchors: bool,
}

struct PageContent {
    url: Url,
    linked: Vec<Url>,
    inline: Vec<String>,
    anchors: Vec<Url>,
}

pub struct PageParser {
    pool: Arc<PagePool>,
    http: reqwest::Client,
    engine: Engine,
    headless: bool,
    fetch_timeout: Duration,
    options: ParseOptions,
}

impl PageParser {
    pub fn new(
        pool: Arc<PagePool>,
        config: &Config,
        engine: Engine,
        headless: bool,
        options: ParseOptions,
    ) -> Result<Self, CaptureError> {
        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        Ok(Self {
            pool,
            http: builder.build()?,
            engine,
            headless,
            fetch_timeout: config.stylesheet_fetch_timeout,
            options,
        })
    }

    pub async fn parse(&self, url: Url) -> Result<ParsedPage, CaptureError> {
        debug!("Parsing {}", url);
        let page = self
            .pool
            .acquire_page(self.engine, self.headless, &PageSpec::default())
            .await?;
        let content = self.read_page(&*page, &url).await;
        if let Err(e) = page.close().await {
            warn!("Failed to close page for {}: {}", url, e);
        }
        let content = content?;

        let mut stylesheets = self.fetch_stylesheets(&content.linked).await;
        stylesheets.extend(content.inline.into_iter().map(|text| Stylesheet {
            uri: None,
            content: text,
        }));
        let media_queries = if self.options.collect_css {
            parse_css_for_media_queries(content.url.as_str(), &stylesheets).media_queries
        } else {
            Vec::new()
        };

        metrics::record_page_parsed();
        Ok(ParsedPage {
            url,
            media_queries,
            anchor_hrefs: content.anchors,
        })
    }

    async fn read_page(&self, page: &dyn Page, url: &Url) -> Result<PageContent, CaptureError> {
        page.goto(url.as_str()).await?;
        let page_url = page
            .url()
            .await
            .ok()
            .and_then(|current| Url::parse(&current).ok())
            .unwrap_or_else(|| url.clone());
        let base_href = first_attribute(page, "base", "href").await?;
        let base_href = base_href.as_deref();

        let mut content = PageContent {
            url: page_url.clone(),
            linked: Vec::new(),
            inline: Vec::new(),
            anchors: Vec::new(),
        };

        if self.options.collect_css {
            for link in page.locate_all("link").await? {
                let is_stylesheet = link
                    .attribute("rel")
                    .await?
                    .map(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")))
                    .unwrap_or(false);
                if !is_stylesheet {
                    continue;
                }
                if let Some(href) = link.attribute("href").await? {
                    match rewrite_href(&href, &page_url, base_href) {
                        Some(uri) => content.linked.push(uri),
                        None => warn!("Skipping stylesheet href {:?} on {}", href, page_url),
                    }
                }
            }
            for style in page.locate_all("style").await? {
                if let Some(text) = style.inner_text().await? {
                    content.inline.push(text);
                }
            }
        }

        if self.options.collect_anchors {
            let mut seen = std::collections::HashSet::new();
            for anchor in page.locate_all("a").await? {
                let Some(href) = anchor.attribute("href").await? else {
                    continue;
                };
                let Some(target) = rewrite_href(&href, &page_url, base_href) else {
                    continue;
                };
                if is_same_origin(&target, &page_url) && seen.insert(crawl_key(&target)) {
                    content.anchors.push(target);
                }
            }
        }

        Ok(content)
    }

    async fn fetch_stylesheets(&self, uris: &[Url]) -> Vec<Stylesheet> {
        let downloads = uris.iter().map(|uri| async move {
            match self.fetch(uri).await {
                Ok(content) => Some(Stylesheet {
                    uri: Some(uri.to_string()),
                    content,
                }),
                Err(e) => {
                    warn!("Skipping stylesheet {}: {}", uri, e);
                    None
                }
            }
        });
        join_all(downloads).await.into_iter().flatten().collect()
    }

    async fn fetch(&self, uri: &Url) -> Result<String, CaptureError> {
        let response = self
            .http
            .get(uri.clone())
            .timeout(self.fetch_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

async fn first_attribute(page: &dyn Page, selector: &str, name: &str) -> Result<Option<String>, CaptureError> {
    for element in page.locate_all(selector).await? {
        if let Some(value) = element.attribute(name).await? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}
