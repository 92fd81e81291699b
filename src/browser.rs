//! Capability interface over the browser automation engine
//!
//! The capture pipeline only ever talks to a browser through these traits:
//! launch a browser, open a page configured for a viewport, navigate, query
//! elements, rasterize and close. `crate::chromium` provides the
//! chromiumoxide-backed implementation; tests provide in-memory fakes.

use crate::CaptureError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Browser engines a capture can be requested with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Chromium,
    Firefox,
    Webkit,
}

impl Engine {
    pub const ALL: [Engine; 3] = [Engine::Chromium, Engine::Firefox, Engine::Webkit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Chromium => "chromium",
            Engine::Firefox => "firefox",
            Engine::Webkit => "webkit",
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::Chromium
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Engine::Chromium),
            "firefox" => Ok(Engine::Firefox),
            "webkit" | "safari" => Ok(Engine::Webkit),
            other => Err(format!("unsupported browser {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Emulation settings applied to a page when it is opened.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_scale_factor: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_mobile: bool,
}

impl PageSpec {
    pub fn with_viewport(width: u32, height: u32) -> Self {
        Self {
            viewport: Some(Viewport::new(width, height)),
            ..Default::default()
        }
    }
}

/// Launches browser processes. Implementations decide which engines they can drive.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    fn supports(&self, engine: Engine) -> bool;

    async fn launch(&self, engine: Engine, headless: bool) -> Result<Arc<dyn Browser>, CaptureError>;
}

/// A running browser process.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_page(&self, spec: &PageSpec) -> Result<Box<dyn Page>, CaptureError>;

    /// `false` once the process disconnected or exited.
    fn is_connected(&self) -> bool;

    async fn close(&self) -> Result<(), CaptureError>;
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), CaptureError>;

    /// Current document URL after redirects.
    async fn url(&self) -> Result<String, CaptureError>;

    async fn locate_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, CaptureError>;

    /// PNG bytes of the rendered page.
    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, CaptureError>;

    async fn close(&self) -> Result<(), CaptureError>;
}

#[async_trait]
pub trait Element: Send + Sync {
    async fn attribute(&self, name: &str) -> Result<Option<String>, CaptureError>;

    async fn inner_text(&self) -> Result<Option<String>, CaptureError>;
}
