//! Capture metrics through the `metrics` facade
//!
//! Without an installed recorder every call is a no-op. The CLI installs the
//! Prometheus exporter when `--metrics-addr` is given.

use crate::browser::Engine;
use metrics::{
    describe_counter, describe_gauge, describe_histogram, gauge, histogram, increment_counter,
    Unit,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

pub const PAGES_PARSED: &str = "plunder_pages_parsed_total";
pub const SCREENSHOTS_CAPTURED: &str = "plunder_screenshots_captured_total";
pub const BROWSER_LAUNCHES: &str = "plunder_browser_launches_total";
pub const MEDIA_QUERIES_SKIPPED: &str = "plunder_media_queries_skipped_total";
pub const POOL_OPEN_PAGES: &str = "plunder_pool_open_pages";
pub const POOL_QUEUED_REQUESTS: &str = "plunder_pool_queued_requests";
pub const SCREENSHOT_DURATION: &str = "plunder_screenshot_duration_seconds";

pub fn describe_metrics() {
    describe_counter!(PAGES_PARSED, "Pages parsed for stylesheets and anchors");
    describe_counter!(SCREENSHOTS_CAPTURED, "Screenshots written to disk");
    describe_counter!(BROWSER_LAUNCHES, "Browser processes launched");
    describe_counter!(MEDIA_QUERIES_SKIPPED, "Media queries that could not be resolved to breakpoints");
    describe_gauge!(POOL_OPEN_PAGES, "Pages currently open in the page pool");
    describe_gauge!(POOL_QUEUED_REQUESTS, "Page requests waiting for capacity");
    describe_histogram!(SCREENSHOT_DURATION, Unit::Seconds, "Time from page request to written screenshot");
}

/// Serves Prometheus metrics on `addr` for the lifetime of the process.
pub fn install_prometheus_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    info!("Serving Prometheus metrics on {}", addr);
    Ok(())
}

pub fn record_page_parsed() {
    increment_counter!(PAGES_PARSED);
}

pub fn record_screenshot(duration: Duration) {
    increment_counter!(SCREENSHOTS_CAPTURED);
    histogram!(SCREENSHOT_DURATION, duration.as_secs_f64());
}

pub fn record_browser_launch(engine: Engine) {
    increment_counter!(BROWSER_LAUNCHES, "engine" => engine.as_str());
}

pub fn record_media_query_skipped() {
    increment_counter!(MEDIA_QUERIES_SKIPPED);
}

pub fn set_pool_gauges(open: usize, queued: usize) {
    gauge!(POOL_OPEN_PAGES, open as f64);
    gauge!(POOL_QUEUED_REQUESTS, queued as f64);
}
