//! Event type and stale-time policy selection.

use crate::extract::{GeometryKind, Metadata};
use chrono::Duration;

/// Event type emitted for freehand line drawings.
pub const FREEHAND_TYPE: &str = "u-d-f";

/// Keyword families per geometry kind. A style id or type-hint value
/// containing the keyword selects the paired event type.
const POINT_FAMILIES: &[(&str, &str)] = &[
    ("marker", "a-u-G"),
    ("pin", "b-m-p-s-m"),
    ("icon", "a-u-G"),
];

const LINE_FAMILIES: &[(&str, &str)] = &[
    ("route", "b-m-r"),
    ("track", "u-d-f"),
    ("extrude", "u-d-f"),
];

const POLYGON_FAMILIES: &[(&str, &str)] = &[("shape", "u-d-r"), ("building", "a-h-S")];

/// The policy outcome for one placemark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Output event type code
    pub event_type: String,

    /// How long the event stays fresh
    pub stale_after: Duration,

    /// Acquisition code ("how" the position was produced)
    pub how: &'static str,
}

/// Select the event type, stale window, and how-code for a placemark.
///
/// The base comes from the geometry kind alone. It is refined first by
/// keywords in the style reference, then by metadata values whose key
/// contains `type`; the first match wins and unknown keywords leave the
/// base unchanged.
pub fn classify(
    kind: GeometryKind,
    style_reference: Option<&str>,
    metadata: &Metadata,
) -> Classification {
    let (families, base_type, how, stale_after) = match kind {
        GeometryKind::Point => (POINT_FAMILIES, "a-u-G", "h-g-i-g-o", Duration::hours(1)),
        GeometryKind::Line => (LINE_FAMILIES, FREEHAND_TYPE, "h-e", Duration::hours(24)),
        GeometryKind::Polygon => (POLYGON_FAMILIES, "u-d-r", "h-e", Duration::hours(24)),
    };

    let refined = refine_from_style(families, style_reference)
        .or_else(|| refine_from_metadata(families, metadata));

    Classification {
        event_type: refined.unwrap_or(base_type).to_string(),
        stale_after,
        how,
    }
}

fn refine_from_style(
    families: &[(&str, &'static str)],
    style_reference: Option<&str>,
) -> Option<&'static str> {
    let style_id = style_reference?.strip_prefix('#')?.to_lowercase();
    families
        .iter()
        .find(|(keyword, _)| style_id.contains(keyword))
        .map(|(_, code)| *code)
}

fn refine_from_metadata(
    families: &[(&str, &'static str)],
    metadata: &Metadata,
) -> Option<&'static str> {
    for (key, value) in metadata {
        if !key.to_lowercase().contains("type") {
            continue;
        }
        let value = value.to_lowercase();
        if let Some((_, code)) = families.iter().find(|(keyword, _)| value.contains(keyword)) {
            return Some(*code);
        }
    }
    None
}
