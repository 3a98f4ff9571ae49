//! Event record synthesis.

use super::Classification;
use crate::extract::{
    argb_value, plain_remark, rgb_hex, Coord, Geometry, Metadata, ResolvedStyle, DESCRIPTION_KEY,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Error radius written when the source carries no accuracy data.
pub(crate) const ERROR_UNKNOWN: f64 = 9999999.0;

/// Fill color used when no polygon color resolves.
const DEFAULT_FILL_ARGB: i32 = -1761607681;

/// Stroke weight used when no line width resolves.
const DEFAULT_STROKE_WEIGHT: f64 = 3.0;

/// Iconset bucket that converted icons are filed under.
const ICONSET_PREFIX: &str = "f7f71666-8b28-4b57-9fbb-e38e61d33b79/Google";

/// One synthesized output event, immutable once built.
#[derive(Debug, Clone)]
pub struct CotEvent {
    /// Process-unique identifier
    pub uid: String,
    /// Classified event type code
    pub event_type: String,
    /// Event time (also used as start)
    pub time: DateTime<Utc>,
    /// Expiry time
    pub stale: DateTime<Utc>,
    /// Acquisition code
    pub how: &'static str,
    /// Primary point
    pub point: EventPoint,
    /// Geometry-specific detail block
    pub detail: Detail,
}

/// Primary point of an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventPoint {
    pub lat: f64,
    pub lon: f64,
    pub hae: f64,
}

/// Geometry-specific detail content.
#[derive(Debug, Clone)]
pub enum Detail {
    Point {
        callsign: String,
        remarks: Option<String>,
        argb: i32,
        icon_path: Option<String>,
    },
    Line {
        links: Vec<Coord>,
        stroke_argb: i32,
        stroke_weight: f64,
        color_rgb: Option<String>,
        callsign: String,
        remarks: Option<String>,
    },
    Polygon {
        links: Vec<Coord>,
        stroke_argb: i32,
        stroke_weight: f64,
        fill_argb: i32,
        color_rgb: Option<String>,
        callsign: String,
        remarks: Option<String>,
    },
}

/// Synthesize an event record using the current time.
pub fn synthesize(
    name: &str,
    geometry: &Geometry,
    style: &ResolvedStyle,
    metadata: &Metadata,
    classification: &Classification,
) -> CotEvent {
    synthesize_at(name, geometry, style, metadata, classification, Utc::now())
}

/// Synthesize an event record at a fixed clock value.
///
/// The identifier is freshly generated each call; two runs over the same
/// input never share uids.
pub fn synthesize_at(
    name: &str,
    geometry: &Geometry,
    style: &ResolvedStyle,
    metadata: &Metadata,
    classification: &Classification,
    now: DateTime<Utc>,
) -> CotEvent {
    let remarks = metadata
        .get(DESCRIPTION_KEY)
        .map(|description| plain_remark(description));

    let (point, detail) = match geometry {
        Geometry::Point(coord) => {
            let detail = Detail::Point {
                callsign: name.to_string(),
                remarks,
                argb: style
                    .label_color
                    .as_deref()
                    .map(argb_value)
                    .unwrap_or(-1),
                icon_path: style.icon_url.as_deref().map(iconset_path),
            };
            (
                EventPoint {
                    lat: coord.lat,
                    lon: coord.lon,
                    hae: coord.hae,
                },
                detail,
            )
        }
        Geometry::Line(coords) => {
            // Freehand drawings anchor at a neutral origin; routes anchor
            // at their first position.
            let point = if classification.event_type == super::FREEHAND_TYPE {
                EventPoint {
                    lat: 0.0,
                    lon: 0.0,
                    hae: ERROR_UNKNOWN,
                }
            } else {
                let first = coords[0];
                EventPoint {
                    lat: first.lat,
                    lon: first.lon,
                    hae: first.hae,
                }
            };
            let detail = Detail::Line {
                links: coords.clone(),
                stroke_argb: style.line_color.as_deref().map(argb_value).unwrap_or(-1),
                stroke_weight: style.line_width.unwrap_or(DEFAULT_STROKE_WEIGHT),
                color_rgb: style.line_color.as_deref().map(rgb_hex),
                callsign: name.to_string(),
                remarks,
            };
            (point, detail)
        }
        Geometry::Polygon(coords) => {
            let detail = Detail::Polygon {
                links: coords.clone(),
                stroke_argb: style.line_color.as_deref().map(argb_value).unwrap_or(-1),
                stroke_weight: style.line_width.unwrap_or(DEFAULT_STROKE_WEIGHT),
                fill_argb: style
                    .poly_color
                    .as_deref()
                    .map(argb_value)
                    .unwrap_or(DEFAULT_FILL_ARGB),
                color_rgb: style
                    .poly_color
                    .as_deref()
                    .or(style.line_color.as_deref())
                    .map(rgb_hex),
                callsign: name.to_string(),
                remarks,
            };
            (centroid(coords), detail)
        }
    };

    CotEvent {
        uid: Uuid::new_v4().to_string(),
        event_type: classification.event_type.clone(),
        time: now,
        stale: now + classification.stale_after,
        how: classification.how,
        point,
        detail,
    }
}

/// Arithmetic centroid over the boundary, closing duplicate included.
fn centroid(coords: &[Coord]) -> EventPoint {
    let n = coords.len() as f64;
    EventPoint {
        lat: coords.iter().map(|c| c.lat).sum::<f64>() / n,
        lon: coords.iter().map(|c| c.lon).sum::<f64>() / n,
        hae: coords.iter().map(|c| c.hae).sum::<f64>() / n,
    }
}

/// Map a source icon reference onto the converted iconset path.
fn iconset_path(icon_url: &str) -> String {
    let file_name = icon_url
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(icon_url);
    format!("{ICONSET_PREFIX}/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cot::classify;
    use crate::extract::GeometryKind;
    use chrono::Duration;

    fn classification_for(kind: GeometryKind) -> Classification {
        classify(kind, None, &Metadata::new())
    }

    fn fixed_now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_point_synthesis() {
        let geometry = Geometry::Point(Coord::new(20.0, 10.0, 0.0));
        let event = synthesize_at(
            "Base",
            &geometry,
            &ResolvedStyle::default(),
            &Metadata::new(),
            &classification_for(GeometryKind::Point),
            fixed_now(),
        );

        assert_eq!(event.point, EventPoint { lat: 20.0, lon: 10.0, hae: 0.0 });
        assert_eq!(event.stale - event.time, Duration::hours(1));
        let Detail::Point { callsign, remarks, argb, icon_path } = event.detail else {
            panic!("expected point detail");
        };
        assert_eq!(callsign, "Base");
        assert!(remarks.is_none());
        assert_eq!(argb, -1);
        assert!(icon_path.is_none());
    }

    #[test]
    fn test_point_with_style_and_description() {
        let geometry = Geometry::Point(Coord::new(1.0, 2.0, 3.0));
        let style = ResolvedStyle {
            label_color: Some("ff0000ff".to_string()),
            icon_url: Some("http://maps.example.com/icons/red-dot.png".to_string()),
            ..Default::default()
        };
        let mut metadata = Metadata::new();
        metadata.insert(
            DESCRIPTION_KEY.to_string(),
            "<b>Observation</b> post".to_string(),
        );

        let event = synthesize_at(
            "OP-1",
            &geometry,
            &style,
            &metadata,
            &classification_for(GeometryKind::Point),
            fixed_now(),
        );

        let Detail::Point { remarks, argb, icon_path, .. } = event.detail else {
            panic!("expected point detail");
        };
        assert_eq!(remarks.as_deref(), Some("Observation post"));
        assert_eq!(argb, -65536);
        assert_eq!(
            icon_path.as_deref(),
            Some("f7f71666-8b28-4b57-9fbb-e38e61d33b79/Google/red-dot.png")
        );
    }

    #[test]
    fn test_freehand_line_uses_origin_sentinel() {
        let geometry = Geometry::Line(vec![
            Coord::new(10.0, 20.0, 0.0),
            Coord::new(11.0, 21.0, 0.0),
        ]);
        let event = synthesize_at(
            "Sketch",
            &geometry,
            &ResolvedStyle::default(),
            &Metadata::new(),
            &classification_for(GeometryKind::Line),
            fixed_now(),
        );

        assert_eq!(event.point, EventPoint { lat: 0.0, lon: 0.0, hae: ERROR_UNKNOWN });
        let Detail::Line { links, stroke_argb, stroke_weight, .. } = event.detail else {
            panic!("expected line detail");
        };
        assert_eq!(links.len(), 2);
        assert_eq!(stroke_argb, -1);
        assert_eq!(stroke_weight, DEFAULT_STROKE_WEIGHT);
    }

    #[test]
    fn test_route_line_anchors_at_first_position() {
        let geometry = Geometry::Line(vec![
            Coord::new(10.0, 20.0, 5.0),
            Coord::new(11.0, 21.0, 6.0),
        ]);
        let classification = classify(GeometryKind::Line, Some("#route1"), &Metadata::new());
        let event = synthesize_at(
            "Supply",
            &geometry,
            &ResolvedStyle::default(),
            &Metadata::new(),
            &classification,
            fixed_now(),
        );

        assert_eq!(event.event_type, "b-m-r");
        assert_eq!(event.point, EventPoint { lat: 10.0, lon: 20.0, hae: 5.0 });
    }

    #[test]
    fn test_polygon_centroid_includes_closing_vertex() {
        let geometry = Geometry::Polygon(vec![
            Coord::new(0.0, 0.0, 0.0),
            Coord::new(0.0, 2.0, 0.0),
            Coord::new(2.0, 2.0, 0.0),
            Coord::new(2.0, 0.0, 0.0),
            Coord::new(0.0, 0.0, 0.0),
        ]);
        let event = synthesize_at(
            "Zone",
            &geometry,
            &ResolvedStyle::default(),
            &Metadata::new(),
            &classification_for(GeometryKind::Polygon),
            fixed_now(),
        );

        assert_eq!(event.point, EventPoint { lat: 0.8, lon: 0.8, hae: 0.0 });
        let Detail::Polygon { links, fill_argb, .. } = event.detail else {
            panic!("expected polygon detail");
        };
        assert_eq!(links.len(), 5);
        assert_eq!(fill_argb, DEFAULT_FILL_ARGB);
    }

    #[test]
    fn test_uids_are_unique_per_synthesis() {
        let geometry = Geometry::Point(Coord::new(0.0, 0.0, 0.0));
        let classification = classification_for(GeometryKind::Point);
        let a = synthesize_at(
            "A",
            &geometry,
            &ResolvedStyle::default(),
            &Metadata::new(),
            &classification,
            fixed_now(),
        );
        let b = synthesize_at(
            "A",
            &geometry,
            &ResolvedStyle::default(),
            &Metadata::new(),
            &classification,
            fixed_now(),
        );
        assert_ne!(a.uid, b.uid);
    }
}
