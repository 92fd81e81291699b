//! Capture progress aggregation
//!
//! [`ProgressUpdater`] counts parsed pages and captured screenshots and pushes
//! a full [`CaptureProgress`] snapshot to its observer on every change.

use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStep {
    Starting,
    Parsing,
    Capturing,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "lowercase")]
pub enum CaptureProgress {
    Starting,
    Parsing { pages: Tally },
    Capturing { pages: Tally, screenshots: Tally },
    Completed,
}

impl CaptureProgress {
    pub fn step(&self) -> CaptureStep {
        match self {
            CaptureProgress::Starting => CaptureStep::Starting,
            CaptureProgress::Parsing { .. } => CaptureStep::Parsing,
            CaptureProgress::Capturing { .. } => CaptureStep::Capturing,
            CaptureProgress::Completed => CaptureStep::Completed,
        }
    }
}

pub type ProgressCallback = Box<dyn Fn(CaptureProgress) + Send + Sync>;

struct State {
    step: CaptureStep,
    pages: Tally,
    screenshots: Tally,
}

impl State {
    fn snapshot(&self) -> CaptureProgress {
        match self.step {
            CaptureStep::Starting => CaptureProgress::Starting,
            CaptureStep::Parsing => CaptureProgress::Parsing { pages: self.pages },
            CaptureStep::Capturing => CaptureProgress::Capturing {
                pages: self.pages,
                screenshots: self.screenshots,
            },
            CaptureStep::Completed => CaptureProgress::Completed,
        }
    }
}

pub struct ProgressUpdater {
    state: Mutex<State>,
    observer: ProgressCallback,
}

impl ProgressUpdater {
    pub fn new(observer: impl Fn(CaptureProgress) + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new(State {
                step: CaptureStep::Starting,
                pages: Tally::default(),
                screenshots: Tally::default(),
            }),
            observer: Box::new(observer),
        }
    }

    /// An updater that discards every snapshot.
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    pub fn snapshot(&self) -> CaptureProgress {
        self.state.lock().snapshot()
    }

    // the observer runs under the lock so snapshots arrive in mutation order
    fn update(&self, mutate: impl FnOnce(&mut State)) {
        let mut state = self.state.lock();
        mutate(&mut state);
        (self.observer)(state.snapshot());
    }

    /// Moves to `step` unless the updater is already at or past it.
    pub fn advance(&self, step: CaptureStep) {
        self.update(|state| {
            if step > state.step {
                state.step = step;
            }
        });
    }

    pub fn add_pages_total(&self, n: usize) {
        self.update(|state| state.pages.total += n);
    }

    pub fn mark_page_parsed(&self) {
        self.update(|state| state.pages.completed += 1);
    }

    pub fn add_screenshots_total(&self, n: usize) {
        self.update(|state| state.screenshots.total += n);
    }

    pub fn mark_screenshot_completed(&self) {
        self.update(|state| state.screenshots.completed += 1);
    }
}
