//! Device emulation profiles
//!
//! A small built-in registry of phones, tablets and desktop browsers. Mobile
//! devices capture a portrait and a landscape screenshot, desktops a single
//! one. Device queries are matched case-insensitively against labels.

use crate::browser::{Engine, PageSpec, Viewport};
use serde::{Deserialize, Serialize};

/// Labels of the devices captured by `modernDevices`.
pub const MODERN_DEVICE_LABELS: &[&str] = &[
    "Galaxy S8",
    "Galaxy S9+",
    "Galaxy Tab S4",
    "iPad (gen 7)",
    "iPad Mini",
    "iPad Pro 11",
    "iPhone X",
    "iPhone 15",
    "iPhone 15 Plus",
    "iPhone 15 Pro",
    "iPhone 15 Pro Max",
    "Pixel 5",
    "Pixel 7",
];

struct Profile {
    label: &'static str,
    engine: Engine,
    width: u32,
    height: u32,
    scale: f64,
    mobile: bool,
    /// Landscape viewport when it is not the portrait one rotated.
    landscape: Option<(u32, u32)>,
}

const fn mobile(label: &'static str, engine: Engine, width: u32, height: u32, scale: f64) -> Profile {
    Profile {
        label,
        engine,
        width,
        height,
        scale,
        mobile: true,
        landscape: None,
    }
}

const fn mobile_with_landscape(
    label: &'static str,
    engine: Engine,
    portrait: (u32, u32),
    landscape: (u32, u32),
    scale: f64,
) -> Profile {
    Profile {
        label,
        engine,
        width: portrait.0,
        height: portrait.1,
        scale,
        mobile: true,
        landscape: Some(landscape),
    }
}

const fn desktop(label: &'static str, engine: Engine, scale: f64) -> Profile {
    Profile {
        label,
        engine,
        width: 1280,
        height: 720,
        scale,
        mobile: false,
        landscape: None,
    }
}

static PROFILES: &[Profile] = &[
    desktop("Desktop Chrome", Engine::Chromium, 1.0),
    desktop("Desktop Chrome HiDPI", Engine::Chromium, 2.0),
    desktop("Desktop Edge", Engine::Chromium, 1.0),
    desktop("Desktop Firefox", Engine::Firefox, 1.0),
    desktop("Desktop Safari", Engine::Webkit, 2.0),
    mobile("Galaxy S5", Engine::Chromium, 360, 640, 3.0),
    mobile("Galaxy S8", Engine::Chromium, 360, 740, 3.0),
    mobile("Galaxy S9+", Engine::Chromium, 320, 658, 4.5),
    mobile("Galaxy Tab S4", Engine::Chromium, 712, 1138, 2.25),
    mobile("iPad (gen 7)", Engine::Webkit, 810, 1080, 2.0),
    mobile("iPad Mini", Engine::Webkit, 768, 1024, 2.0),
    mobile("iPad Pro 11", Engine::Webkit, 834, 1194, 2.0),
    mobile_with_landscape("iPhone 12", Engine::Webkit, (390, 664), (750, 340), 3.0),
    mobile_with_landscape("iPhone 15", Engine::Webkit, (393, 659), (734, 343), 3.0),
    mobile_with_landscape("iPhone 15 Plus", Engine::Webkit, (430, 739), (814, 380), 3.0),
    mobile_with_landscape("iPhone 15 Pro", Engine::Webkit, (393, 659), (734, 343), 3.0),
    mobile_with_landscape("iPhone 15 Pro Max", Engine::Webkit, (430, 739), (814, 380), 3.0),
    mobile("iPhone SE", Engine::Webkit, 320, 568, 2.0),
    mobile("iPhone X", Engine::Webkit, 375, 812, 3.0),
    mobile("Pixel 4", Engine::Chromium, 353, 745, 3.0),
    mobile_with_landscape("Pixel 5", Engine::Chromium, (393, 727), (802, 293), 2.75),
    mobile_with_landscape("Pixel 7", Engine::Chromium, (412, 839), (863, 360), 2.625),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
}

/// A resolved device. Desktops only carry a landscape spec.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeviceDefinition {
    pub browser: Engine,
    pub label: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub landscape: PageSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<PageSpec>,
}

/// A registry label and whether it belongs to the modern default set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedDevice {
    pub label: String,
    pub default: bool,
}

impl Profile {
    fn spec(&self, width: u32, height: u32) -> PageSpec {
        PageSpec {
            device_scale_factor: Some(self.scale),
            viewport: Some(Viewport::new(width, height)),
            is_mobile: self.mobile,
        }
    }

    fn definition(&self) -> DeviceDefinition {
        if self.mobile {
            let (landscape_width, landscape_height) =
                self.landscape.unwrap_or((self.height, self.width));
            DeviceDefinition {
                browser: self.engine,
                label: self.label.to_string(),
                device_type: DeviceType::Mobile,
                landscape: self.spec(landscape_width, landscape_height),
                portrait: Some(self.spec(self.width, self.height)),
            }
        } else {
            DeviceDefinition {
                browser: self.engine,
                label: self.label.to_string(),
                device_type: DeviceType::Desktop,
                landscape: self.spec(self.width, self.height),
                portrait: None,
            }
        }
    }
}

fn profile(label: &str) -> Option<&'static Profile> {
    PROFILES.iter().find(|p| p.label == label)
}

pub fn default_device_labels() -> Vec<String> {
    MODERN_DEVICE_LABELS.iter().map(|l| l.to_string()).collect()
}

/// Every registry label sorted, flagged when part of the modern default set.
pub fn supported_device_labels() -> Vec<SupportedDevice> {
    let mut labels: Vec<SupportedDevice> = PROFILES
        .iter()
        .map(|p| SupportedDevice {
            label: p.label.to_string(),
            default: MODERN_DEVICE_LABELS.contains(&p.label),
        })
        .collect();
    labels.sort_by(|a, b| a.label.cmp(&b.label));
    labels
}

/// Sorted labels matching any of `queries`.
pub fn device_label_search_matches(queries: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = search_devices(queries)
        .into_iter()
        .map(|d| d.label)
        .collect();
    labels.sort();
    labels
}

/// Devices whose lowercased label contains any lowercased query.
pub fn search_devices(queries: &[String]) -> Vec<DeviceDefinition> {
    let queries: Vec<String> = queries.iter().map(|q| q.to_lowercase()).collect();
    PROFILES
        .iter()
        .filter(|p| {
            let searchable = p.label.to_lowercase();
            queries.iter().any(|q| searchable.contains(q.as_str()))
        })
        .map(Profile::definition)
        .collect()
}

pub fn modern_devices() -> Vec<DeviceDefinition> {
    MODERN_DEVICE_LABELS
        .iter()
        .filter_map(|label| profile(label))
        .map(Profile::definition)
        .collect()
}

/// Devices selected by `queries` plus, with `modern_devices`, every modern
/// default not already matched.
pub fn resolve_devices(queries: Option<&[String]>, modern_devices: bool) -> Vec<DeviceDefinition> {
    let mut devices = queries.map(search_devices).unwrap_or_default();
    if modern_devices {
        for device in self::modern_devices() {
            if !devices.iter().any(|d| d.label == device.label) {
                devices.push(device);
            }
        }
    }
    devices
}
