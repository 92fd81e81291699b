//! Media query breakpoint resolution
//!
//! lightningcss parses each stylesheet; [`walk_stylesheet`] lowers the parsed
//! rule tree into the small [`CssNode`] vocabulary the resolver understands:
//! the location of an `@media` rule followed by the feature and interval
//! conditions of its queries. [`resolve_feature`] and [`resolve_interval`]
//! translate those conditions into directional pixel breakpoints.
//!
//! A condition that cannot be resolved (a non-width feature, a non-pixel
//! length, an unsupported operator) only drops that one media query.

use crate::breakpoints::{compare_media_queries, Bound, Breakpoint, Dimension};
use crate::error::CssError;
use crate::metrics;
use lightningcss::media_query::{
    MediaCondition, MediaFeatureComparison, MediaFeatureId, MediaFeatureName, MediaFeatureValue,
    QueryFeature,
};
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::values::length::{Length as LengthProperty, LengthValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One stylesheet found on a page. `uri` is `None` for inline `<style>` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub uri: Option<String>,
    pub content: String,
}

/// Verbatim condition text of an `@media` rule and where it sits in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExcerpt {
    /// Zero-based line of the rule.
    pub line: u32,
    /// One-based column of the rule.
    pub column: u32,
    pub start_index: usize,
    pub end_index: usize,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceLocation {
    pub filename: String,
    pub code: CodeExcerpt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    pub location: SourceLocation,
    pub breakpoints: Vec<Breakpoint>,
}

impl MediaQuery {
    pub fn has_bound(&self, bound: Bound) -> bool {
        self.breakpoints.iter().any(|b| b.bound == bound)
    }
}

/// Media queries resolved from every stylesheet of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCss {
    pub url: String,
    pub media_queries: Vec<MediaQuery>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

impl Comparison {
    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanEqual => ">=",
            Comparison::LessThan => "<",
            Comparison::LessThanEqual => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Width,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f32),
    Rem(f32),
    /// Any other unit, a calc() or a non-length value.
    Other,
}

/// `feature <operator> value`, e.g. `min-width: 500px` or `width > 800px`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCondition {
    pub feature: Feature,
    pub operator: Comparison,
    pub value: Length,
}

/// `start <start_operator> feature <end_operator> end`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalCondition {
    pub feature: Feature,
    pub start: Length,
    pub start_operator: Comparison,
    pub end: Length,
    pub end_operator: Comparison,
}

/// Rule location in lightningcss terms: zero-based line, one-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleLocation {
    pub line: u32,
    pub column: u32,
}

/// Nodes delivered by [`walk_stylesheet`], in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum CssNode {
    Rule(RuleLocation),
    Feature(FeatureCondition),
    Interval(IntervalCondition),
}

/// Parses `source` and reports every `@media` rule followed by its conditions.
pub fn walk_stylesheet(
    filename: &str,
    source: &str,
    mut visit: impl FnMut(CssNode),
) -> Result<(), CssError> {
    let stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            error_recovery: true,
            ..Default::default()
        },
    )
    .map_err(|e| CssError::Parse {
        filename: filename.to_string(),
        reason: e.to_string(),
    })?;

    walk_rules(&stylesheet.rules, &mut visit);
    Ok(())
}

fn walk_rules(rules: &CssRuleList<'_>, visit: &mut dyn FnMut(CssNode)) {
    for rule in &rules.0 {
        match rule {
            CssRule::Media(media) => {
                visit(CssNode::Rule(RuleLocation {
                    line: media.loc.line,
                    column: media.loc.column,
                }));
                for query in &media.query.media_queries {
                    if let Some(MediaCondition::Feature(feature)) = &query.condition {
                        if let Some(node) = lower_feature(feature) {
                            visit(node);
                        }
                    }
                }
                walk_rules(&media.rules, visit);
            }
            CssRule::Supports(supports) => walk_rules(&supports.rules, visit),
            CssRule::LayerBlock(layer) => walk_rules(&layer.rules, visit),
            CssRule::Style(style) => walk_rules(&style.rules, visit),
            _ => {}
        }
    }
}

fn lower_feature(feature: &QueryFeature<'_, MediaFeatureId>) -> Option<CssNode> {
    match feature {
        QueryFeature::Plain { name, value } => Some(CssNode::Feature(FeatureCondition {
            feature: lower_name(name),
            operator: Comparison::Equal,
            value: lower_value(value),
        })),
        QueryFeature::Range {
            name,
            operator,
            value,
        } => Some(CssNode::Feature(FeatureCondition {
            feature: lower_name(name),
            operator: lower_comparison(operator),
            value: lower_value(value),
        })),
        QueryFeature::Interval {
            name,
            start,
            start_operator,
            end,
            end_operator,
        } => Some(CssNode::Interval(IntervalCondition {
            feature: lower_name(name),
            start: lower_value(start),
            start_operator: lower_comparison(start_operator),
            end: lower_value(end),
            end_operator: lower_comparison(end_operator),
        })),
        _ => None,
    }
}

fn lower_name(name: &MediaFeatureName<'_, MediaFeatureId>) -> Feature {
    match name {
        MediaFeatureName::Standard(MediaFeatureId::Width) => Feature::Width,
        other => Feature::Other(format!("{other:?}")),
    }
}

fn lower_comparison(operator: &MediaFeatureComparison) -> Comparison {
    match operator {
        MediaFeatureComparison::Equal => Comparison::Equal,
        MediaFeatureComparison::GreaterThan => Comparison::GreaterThan,
        MediaFeatureComparison::GreaterThanEqual => Comparison::GreaterThanEqual,
        MediaFeatureComparison::LessThan => Comparison::LessThan,
        MediaFeatureComparison::LessThanEqual => Comparison::LessThanEqual,
    }
}

fn lower_value(value: &MediaFeatureValue<'_>) -> Length {
    match value {
        MediaFeatureValue::Length(LengthProperty::Value(LengthValue::Px(px))) => Length::Px(*px),
        MediaFeatureValue::Length(LengthProperty::Value(LengthValue::Rem(rem))) => {
            Length::Rem(*rem)
        }
        _ => Length::Other,
    }
}

/// Widest viewport a breakpoint may resolve to.
pub const MAX_BREAKPOINT_WIDTH: i64 = 100_000;

fn pixel_value(feature: &Feature, value: &Length) -> Result<f64, CssError> {
    match feature {
        Feature::Width => {}
        Feature::Other(name) => return Err(CssError::UnsupportedFeature(name.clone())),
    }
    match value {
        Length::Px(px) if px.is_finite() => Ok(f64::from(*px)),
        Length::Px(px) => Err(CssError::OutOfRange(format!("{px}px"))),
        Length::Rem(rem) => Err(CssError::UnsupportedUnit(format!("{rem}rem"))),
        Length::Other => Err(CssError::UnsupportedUnit("width".to_string())),
    }
}

/// Breakpoints for a single comparison against the viewport width.
///
/// The returned dimension is the first whole pixel width at which the query
/// matches, so `max-width: 767.98px` resolves to upper 767 and
/// `width > 800px` to lower 801.
pub fn resolve_feature(condition: &FeatureCondition) -> Result<Vec<Breakpoint>, CssError> {
    let px = pixel_value(&condition.feature, &condition.value)?;
    Ok(vec![bound_for(condition.operator, px)?])
}

/// `width <op> px` as a breakpoint on whole pixel widths.
fn bound_for(operator: Comparison, px: f64) -> Result<Breakpoint, CssError> {
    let width = match operator {
        Comparison::Equal if px.fract() != 0.0 => {
            return Err(CssError::NoMatchingWidth(format!("width = {px}px")));
        }
        Comparison::Equal => px,
        Comparison::GreaterThan => px.floor() + 1.0,
        Comparison::GreaterThanEqual => px.ceil(),
        Comparison::LessThan => px.ceil() - 1.0,
        Comparison::LessThanEqual => px.floor(),
    };
    if !(1.0..=MAX_BREAKPOINT_WIDTH as f64).contains(&width) {
        return Err(CssError::OutOfRange(format!("{} {px}px", operator.symbol())));
    }

    let dimension = Dimension::px(width as i64);
    Ok(match operator {
        Comparison::Equal => Breakpoint::exact(dimension),
        Comparison::GreaterThan | Comparison::GreaterThanEqual => Breakpoint::lower(dimension),
        Comparison::LessThan | Comparison::LessThanEqual => Breakpoint::upper(dimension),
    })
}

fn flip(operator: Comparison) -> Comparison {
    match operator {
        Comparison::Equal => Comparison::Equal,
        Comparison::GreaterThan => Comparison::LessThan,
        Comparison::GreaterThanEqual => Comparison::LessThanEqual,
        Comparison::LessThan => Comparison::GreaterThan,
        Comparison::LessThanEqual => Comparison::GreaterThanEqual,
    }
}

/// Lower and upper breakpoint of a two-sided range, or none when the range
/// is empty.
///
/// `start <op> width` reads as `width <flipped op> start`, so both
/// `500px <= width <= 1250px` and `1250px >= width >= 500px` resolve to
/// lower 500 and upper 1250.
pub fn resolve_interval(condition: &IntervalCondition) -> Result<Vec<Breakpoint>, CssError> {
    let start = pixel_value(&condition.feature, &condition.start)?;
    let end = pixel_value(&condition.feature, &condition.end)?;
    for operator in [condition.start_operator, condition.end_operator] {
        if operator == Comparison::Equal {
            return Err(CssError::UnsupportedOperator(operator.symbol().to_string()));
        }
    }

    let from_start = bound_for(flip(condition.start_operator), start)?;
    let from_end = bound_for(condition.end_operator, end)?;
    let (lower, upper) = match (from_start.bound, from_end.bound) {
        (Bound::Lower, Bound::Upper) => (from_start, from_end),
        (Bound::Upper, Bound::Lower) => (from_end, from_start),
        _ => return Err(CssError::MalformedInterval),
    };

    if lower.dimension.value >= upper.dimension.value {
        return Ok(Vec::new());
    }
    Ok(vec![lower, upper])
}

const MEDIA: &[u8] = b"media";

/// Locates the condition text of the `@media` rule at `line`/`column`.
///
/// Minified stylesheets can report the rule a few bytes before the `@`, so up
/// to three bytes are skipped looking for it. The excerpt runs from inside the
/// first parenthesis to its matching close.
pub fn extract_media_query_excerpt(
    code: &[u8],
    line: u32,
    column: u32,
) -> Result<CodeExcerpt, CssError> {
    let mut index = 0usize;
    let mut line_breaks = line;
    while line_breaks > 0 && index < code.len() {
        if code[index] == b'\n' {
            line_breaks -= 1;
        }
        index += 1;
    }
    index += column as usize;

    if !code[index.min(code.len())..].starts_with(MEDIA) {
        let mut limit = 3;
        while limit > 0 && code.get(index) != Some(&b'@') {
            limit -= 1;
            index += 1;
        }
        index += 1;
        let rest = &code[index.min(code.len())..];
        if !rest.starts_with(MEDIA) {
            let found = String::from_utf8_lossy(&rest[..rest.len().min(MEDIA.len())]).into_owned();
            return Err(CssError::ExcerptNotFound { index, found });
        }
    }

    let mut start = None;
    let mut end = None;
    let mut depth = 0usize;
    while index < code.len() && end.is_none() {
        match code[index] {
            b'(' => {
                if start.is_none() {
                    start = Some(index + 1);
                }
                depth += 1;
            }
            b')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    end = Some(index);
                }
            }
            _ => {}
        }
        index += 1;
    }

    match (start, end) {
        (Some(start_index), Some(end_index)) => Ok(CodeExcerpt {
            line,
            column,
            start_index,
            end_index,
            excerpt: String::from_utf8_lossy(&code[start_index..end_index]).into_owned(),
        }),
        _ => Err(CssError::ExcerptNotFound {
            index,
            found: String::new(),
        }),
    }
}

/// Resolves every width media query of one stylesheet, sorted with
/// [`compare_media_queries`].
pub fn collect_media_queries(filename: &str, source: &str) -> Result<Vec<MediaQuery>, CssError> {
    let code = source.as_bytes();
    let mut rule: Option<RuleLocation> = None;
    let mut excerpt: Option<CodeExcerpt> = None;
    let mut media_queries = Vec::new();

    walk_stylesheet(filename, source, |node| {
        let resolved = match &node {
            CssNode::Rule(location) => {
                rule = Some(*location);
                excerpt = None;
                return;
            }
            CssNode::Feature(condition) => resolve_feature(condition),
            CssNode::Interval(condition) => resolve_interval(condition),
        };

        let breakpoints = match resolved {
            Ok(breakpoints) => breakpoints,
            Err(e) => {
                debug!("Skipping media query in {}: {}", filename, e);
                metrics::record_media_query_skipped();
                return;
            }
        };
        // an interval that resolved to nothing is dropped entirely
        if breakpoints.is_empty() {
            debug!("Dropping empty width interval in {}", filename);
            return;
        }

        let Some(location) = rule else {
            return;
        };
        let code_excerpt = match &excerpt {
            Some(cached) => cached.clone(),
            None => match extract_media_query_excerpt(code, location.line, location.column) {
                Ok(found) => {
                    excerpt = Some(found.clone());
                    found
                }
                Err(e) => {
                    debug!("Skipping media query in {}: {}", filename, e);
                    metrics::record_media_query_skipped();
                    return;
                }
            },
        };

        media_queries.push(MediaQuery {
            location: SourceLocation {
                filename: filename.to_string(),
                code: code_excerpt,
            },
            breakpoints,
        });
    })?;

    media_queries.sort_by(compare_media_queries);
    Ok(media_queries)
}

/// Resolves media queries across a page's stylesheets. A stylesheet that fails
/// to parse contributes nothing.
pub fn parse_css_for_media_queries(url: &str, stylesheets: &[Stylesheet]) -> ParsedCss {
    let mut inline_index = 0;
    let mut media_queries = Vec::new();
    for stylesheet in stylesheets {
        let filename = match &stylesheet.uri {
            Some(uri) => uri.clone(),
            None => {
                let name = format!("{url} [inline#{inline_index}]");
                inline_index += 1;
                name
            }
        };
        match collect_media_queries(&filename, &stylesheet.content) {
            Ok(found) => media_queries.extend(found),
            Err(e) => warn!("Ignoring stylesheet {}: {}", filename, e),
        }
    }
    ParsedCss {
        url: url.to_string(),
        media_queries,
    }
}
