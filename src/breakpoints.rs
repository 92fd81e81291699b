//! Breakpoint data model, merging and ordering
//!
//! Media queries resolved from one page's stylesheets frequently repeat the
//! same threshold. [`merge_breakpoints`] folds every breakpoint with the same
//! bound and dimension into one [`MergedBreakpoint`] that remembers each source
//! location it came from, in the order they were encountered.

use crate::css_parse::{MediaQuery, SourceLocation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Which side of a responsive transition a breakpoint describes.
///
/// Declaration order is the sort order: `upper` thresholds sort before
/// `lower` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    /// Active at or below the dimension.
    Upper,
    /// Active at or above the dimension.
    Lower,
    /// Active only at the dimension.
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Rem,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Px => f.write_str("px"),
            Unit::Rem => f.write_str("rem"),
        }
    }
}

/// A length from a media query condition. Ordered by `(unit, value)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Dimension {
    pub unit: Unit,
    pub value: i64,
}

impl Dimension {
    pub fn px(value: i64) -> Self {
        Self {
            unit: Unit::Px,
            value,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Breakpoint {
    pub bound: Bound,
    pub dimension: Dimension,
}

impl Breakpoint {
    pub fn lower(dimension: Dimension) -> Self {
        Self {
            bound: Bound::Lower,
            dimension,
        }
    }

    pub fn upper(dimension: Dimension) -> Self {
        Self {
            bound: Bound::Upper,
            dimension,
        }
    }

    pub fn exact(dimension: Dimension) -> Self {
        Self {
            bound: Bound::Exact,
            dimension,
        }
    }
}

/// One distinct `(bound, unit, value)` threshold and every place it was declared.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedBreakpoint {
    pub bound: Bound,
    pub dimension: Dimension,
    pub source_locations: Vec<SourceLocation>,
}

impl MergedBreakpoint {
    pub fn breakpoint(&self) -> Breakpoint {
        Breakpoint {
            bound: self.bound,
            dimension: self.dimension,
        }
    }
}

/// Upper before lower before exact, then ascending dimension.
pub fn compare_breakpoints(a: &Breakpoint, b: &Breakpoint) -> Ordering {
    a.bound
        .cmp(&b.bound)
        .then_with(|| a.dimension.cmp(&b.dimension))
}

/// Media queries without a lower breakpoint come first, the rest compare by
/// their breakpoints in sorted order.
pub fn compare_media_queries(a: &MediaQuery, b: &MediaQuery) -> Ordering {
    let a_unbounded = !a.has_bound(Bound::Lower);
    let b_unbounded = !b.has_bound(Bound::Lower);
    match (a_unbounded, b_unbounded) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => {
            let a_sorted = sorted_breakpoints(&a.breakpoints);
            let b_sorted = sorted_breakpoints(&b.breakpoints);
            let mut pairs = a_sorted.iter().zip(b_sorted.iter());
            pairs
                .find_map(|(x, y)| match compare_breakpoints(x, y) {
                    Ordering::Equal => None,
                    unequal => Some(unequal),
                })
                .unwrap_or_else(|| a_sorted.len().cmp(&b_sorted.len()))
        }
    }
}

pub fn sorted_breakpoints(breakpoints: &[Breakpoint]) -> Vec<Breakpoint> {
    let mut sorted = breakpoints.to_vec();
    sorted.sort_by(compare_breakpoints);
    sorted
}

/// Groups breakpoints by `(bound, unit, value)` and returns them ordered by
/// [`compare_breakpoints`]. Source locations keep their input order.
pub fn merge_breakpoints(media_queries: &[MediaQuery]) -> Vec<MergedBreakpoint> {
    let mut grouped: IndexMap<Breakpoint, Vec<SourceLocation>> = IndexMap::new();
    for media_query in media_queries {
        for breakpoint in &media_query.breakpoints {
            grouped
                .entry(*breakpoint)
                .or_default()
                .push(media_query.location.clone());
        }
    }

    let mut merged: Vec<MergedBreakpoint> = grouped
        .into_iter()
        .map(|(breakpoint, source_locations)| MergedBreakpoint {
            bound: breakpoint.bound,
            dimension: breakpoint.dimension,
            source_locations,
        })
        .collect();
    merged.sort_by(|a, b| compare_breakpoints(&a.breakpoint(), &b.breakpoint()));
    merged
}
