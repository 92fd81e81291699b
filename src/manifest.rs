//! Capture manifest assembly
//!
//! A manifest is built once per captured page. It lists the devices and
//! breakpoints that were requested and the unique screenshot jobs that cover
//! them. Jobs are keyed by filename, so a width shared by two breakpoints is
//! rendered only once.

use crate::breakpoints::{Bound, MergedBreakpoint};
use crate::browser::{Engine, PageSpec};
use crate::devices::{DeviceDefinition, DeviceType};
use crate::CaptureError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const MANIFEST_FILENAME: &str = "plunder.json";

/// Height of every breakpoint screenshot viewport.
pub const BREAKPOINT_VIEWPORT_HEIGHT: u32 = 600;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotJob {
    pub browser: Engine,
    #[serde(flatten)]
    pub page_spec: PageSpec,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    pub definition: DeviceDefinition,
    pub landscape_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointEntry {
    #[serde(flatten)]
    pub breakpoint: MergedBreakpoint,
    pub on_file: String,
    pub off_file: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureManifest {
    pub dir: String,
    pub url: String,
    pub devices: Vec<DeviceEntry>,
    /// `None` when breakpoint capture was not requested.
    pub breakpoints: Option<Vec<BreakpointEntry>>,
    pub screenshots: IndexMap<String, ScreenshotJob>,
}

impl CaptureManifest {
    /// Pretty-printed JSON with four-space indentation.
    pub fn to_json(&self) -> Result<String, CaptureError> {
        to_pretty_json(self)
    }

    pub async fn write(&self, dir: &Path) -> Result<PathBuf, CaptureError> {
        let path = dir.join(MANIFEST_FILENAME);
        tokio::fs::write(&path, self.to_json()?).await?;
        Ok(path)
    }
}

/// Pretty JSON with 4-space indentation, shared by every file plunder writes.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CaptureError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| CaptureError::Serialization(e.to_string()))
}

pub fn breakpoint_filename(width: u32) -> String {
    format!("w_{width}.png")
}

/// Lowercased device label with spaces and parens turned into single hyphens.
pub fn device_filename_prefix(label: &str) -> String {
    let mut prefix = String::with_capacity(label.len());
    for c in label.chars() {
        let c = match c {
            ' ' | '(' | ')' => '-',
            other => other,
        };
        if c == '-' && prefix.ends_with('-') {
            continue;
        }
        prefix.extend(c.to_lowercase());
    }
    prefix.trim_end_matches('-').to_string()
}

/// Width the breakpoint is active at and the adjacent width it is not, or
/// `None` when either is not a usable viewport width.
fn on_off_widths(breakpoint: &MergedBreakpoint) -> Option<(u32, u32)> {
    let value = breakpoint.dimension.value;
    let off = match breakpoint.bound {
        Bound::Lower => value.checked_sub(1)?,
        Bound::Upper | Bound::Exact => value.checked_add(1)?,
    };
    let on = u32::try_from(value).ok().filter(|w| *w > 0)?;
    let off = u32::try_from(off).ok().filter(|w| *w > 0)?;
    Some((on, off))
}

/// Builds the manifest for one page.
///
/// `breakpoints` is `None` when breakpoint capture is disabled and serializes
/// as `null`. Devices are listed sorted by label; their jobs are added before
/// breakpoint jobs.
pub fn build_manifest(
    dir: &str,
    url: &str,
    breakpoints: Option<&[MergedBreakpoint]>,
    devices: &[DeviceDefinition],
    browser: Engine,
) -> CaptureManifest {
    let mut screenshots: IndexMap<String, ScreenshotJob> = IndexMap::new();

    let mut sorted_devices: Vec<&DeviceDefinition> = devices.iter().collect();
    sorted_devices.sort_by(|a, b| a.label.cmp(&b.label));

    let device_entries: Vec<DeviceEntry> = sorted_devices
        .into_iter()
        .map(|definition| {
            let prefix = device_filename_prefix(&definition.label);
            let job = |page_spec: &PageSpec| ScreenshotJob {
                browser: definition.browser,
                page_spec: page_spec.clone(),
            };
            match (&definition.device_type, &definition.portrait) {
                (DeviceType::Mobile, Some(portrait)) => {
                    let landscape_file = format!("{prefix}_landscape.png");
                    let portrait_file = format!("{prefix}_portrait.png");
                    screenshots
                        .entry(landscape_file.clone())
                        .or_insert_with(|| job(&definition.landscape));
                    screenshots
                        .entry(portrait_file.clone())
                        .or_insert_with(|| job(portrait));
                    DeviceEntry {
                        definition: definition.clone(),
                        landscape_file,
                        portrait_file: Some(portrait_file),
                    }
                }
                _ => {
                    let landscape_file = format!("{prefix}.png");
                    screenshots
                        .entry(landscape_file.clone())
                        .or_insert_with(|| job(&definition.landscape));
                    DeviceEntry {
                        definition: definition.clone(),
                        landscape_file,
                        portrait_file: None,
                    }
                }
            }
        })
        .collect();

    let breakpoint_entries: Option<Vec<BreakpointEntry>> = breakpoints.map(|merged| {
        merged
            .iter()
            .filter_map(|breakpoint| {
                let Some((on, off)) = on_off_widths(breakpoint) else {
                    warn!("No viewport widths for breakpoint {}, leaving it out", breakpoint.dimension);
                    return None;
                };
                for width in [on, off] {
                    screenshots
                        .entry(breakpoint_filename(width))
                        .or_insert_with(|| ScreenshotJob {
                            browser,
                            page_spec: PageSpec::with_viewport(width, BREAKPOINT_VIEWPORT_HEIGHT),
                        });
                }
                Some(BreakpointEntry {
                    breakpoint: breakpoint.clone(),
                    on_file: breakpoint_filename(on),
                    off_file: breakpoint_filename(off),
                })
            })
            .collect()
    });

    CaptureManifest {
        dir: dir.to_string(),
        url: url.to_string(),
        devices: device_entries,
        breakpoints: breakpoint_entries,
        screenshots,
    }
}
