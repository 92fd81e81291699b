//! Recursive same-origin crawl
//!
//! Every seed URL is parsed concurrently. When crawling recursively, each
//! finished page seeds parses for the anchors it found that have not been
//! seen yet. A URL is parsed at most once; fragments are ignored when
//! comparing URLs. Page concurrency is bounded by the page pool, not here.

use crate::page_parse::ParsedPage;
use crate::progress::ProgressUpdater;
use crate::utils::crawl_key;
use crate::CaptureError;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, warn};
use url::Url;

/// Parses `seeds` and, with `recursive`, every same-origin page reachable
/// from them.
///
/// A seed that fails to parse fails the crawl. A discovered page that fails is
/// logged and left out.
pub async fn crawl<F, Fut>(
    seeds: &[Url],
    recursive: bool,
    updater: &ProgressUpdater,
    parse: F,
) -> Result<Vec<ParsedPage>, CaptureError>
where
    F: Fn(Url) -> Fut,
    Fut: Future<Output = Result<ParsedPage, CaptureError>>,
{
    let mut visited: HashSet<String> = HashSet::new();
    let mut in_flight = FuturesUnordered::new();
    let mut parsed = Vec::new();

    let mut enqueue = |url: Url, is_seed: bool, in_flight: &mut FuturesUnordered<_>| {
        if visited.insert(crawl_key(&url)) {
            updater.add_pages_total(1);
            let parsing = parse(url.clone());
            in_flight.push(async move { (url, is_seed, parsing.await) });
        }
    };

    for seed in seeds {
        enqueue(seed.clone(), true, &mut in_flight);
    }

    while let Some((url, is_seed, result)) = in_flight.next().await {
        updater.mark_page_parsed();
        let page = match result {
            Ok(page) => page,
            Err(e) if is_seed => return Err(e),
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                continue;
            }
        };

        if recursive {
            for href in &page.anchor_hrefs {
                enqueue(href.clone(), false, &mut in_flight);
            }
        }
        debug!("Parsed {} ({} media queries)", url, page.media_queries.len());
        parsed.push(page);
    }

    Ok(parsed)
}
