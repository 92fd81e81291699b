use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::browser::Engine;

#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error(transparent)]
    InvalidOptions(#[from] InvalidCaptureOptions),

    #[error("Must specify a device emulation or CSS breakpoint capture source")]
    UnspecifiedCaptureSource,

    #[error("Browser engine {0} is not supported by this launcher")]
    UnsupportedEngine(Engine),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Browser disconnected: {0}")]
    BrowserDisconnected(String),

    #[error("Page error: {0}")]
    PageError(String),

    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("Capturing {file} of {url} failed: {reason}")]
    CaptureFailed {
        url: String,
        file: String,
        reason: String,
    },

    #[error("Capture hook failed on {url}: {reason}")]
    CaptureHookFailed { url: String, reason: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Page pool is shut down")]
    PoolShutdown,

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CaptureError {
    /// Stable identifier of the error class for rendering by the CLI layer.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::InvalidOptions(_) => "invalid-options",
            CaptureError::UnspecifiedCaptureSource => "unspecified-capture-source",
            CaptureError::UnsupportedEngine(_) => "unsupported-engine",
            CaptureError::BrowserLaunchFailed(_) => "browser-launch",
            CaptureError::BrowserDisconnected(_) => "browser-disconnected",
            CaptureError::PageError(_) => "page",
            CaptureError::NavigationFailed { .. } => "navigation",
            CaptureError::CaptureFailed { .. } => "capture",
            CaptureError::CaptureHookFailed { .. } => "capture-hook",
            CaptureError::Timeout(_) => "timeout",
            CaptureError::PoolShutdown => "pool-shutdown",
            CaptureError::Network(_) => "network",
            CaptureError::Io(_) => "io",
            CaptureError::Serialization(_) => "serialization",
        }
    }

    /// Errors raised before any browser work started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CaptureError::InvalidOptions(_) | CaptureError::UnspecifiedCaptureSource
        )
    }
}

/// Validation failures keyed by the offending option path, e.g. `urls.1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidCaptureOptions {
    fields: BTreeMap<String, String>,
}

impl InvalidCaptureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Ok(())` when no field was flagged.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for InvalidCaptureOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capture options were invalid")?;
        for (field, message) in &self.fields {
            write!(f, "\n  {field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidCaptureOptions {}

/// Failure to resolve one media query. Callers skip the query and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssError {
    #[error("unsupported media feature `{0}`")]
    UnsupportedFeature(String),

    #[error("unsupported length unit in `{0}`")]
    UnsupportedUnit(String),

    #[error("unsupported comparison operator `{0}`")]
    UnsupportedOperator(String),

    #[error("`{0}` is outside the supported viewport widths")]
    OutOfRange(String),

    #[error("`{0}` matches no whole pixel width")]
    NoMatchingWidth(String),

    #[error("interval does not resolve to a lower and an upper bound")]
    MalformedInterval,

    #[error("byte {index} is not the start of @media and instead points to `{found}`")]
    ExcerptNotFound { index: usize, found: String },

    #[error("parsing {filename} failed: {reason}")]
    Parse { filename: String, reason: String },
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        CaptureError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for CaptureError {
    fn from(err: reqwest::Error) -> Self {
        CaptureError::Network(err.to_string())
    }
}
