//! Geometry extraction and coordinate validation.

use super::query;
use roxmltree::Node;
use serde::{Deserialize, Serialize};

/// A single position, stored latitude-first.
///
/// Source coordinate tuples arrive longitude-first; the swap happens at
/// parse time and never again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// Latitude in degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, [-180, 180]
    pub lon: f64,
    /// Height above ellipsoid in meters, 0.0 when the source omits it
    pub hae: f64,
}

impl Coord {
    /// Create a coordinate.
    pub fn new(lat: f64, lon: f64, hae: f64) -> Self {
        Self { lat, lon, hae }
    }
}

/// The geometry carried by a placemark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// A single position
    Point(Coord),
    /// An ordered path, at least one position
    Line(Vec<Coord>),
    /// A closed outer boundary, at least three positions, first == last
    Polygon(Vec<Coord>),
}

impl Geometry {
    /// Which kind of geometry this is.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Line(_) => GeometryKind::Line,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// All positions in source order.
    pub fn coords(&self) -> &[Coord] {
        match self {
            Geometry::Point(c) => std::slice::from_ref(c),
            Geometry::Line(cs) | Geometry::Polygon(cs) => cs,
        }
    }
}

/// Geometry kind, used for classification and policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryKind::Point => write!(f, "point"),
            GeometryKind::Line => write!(f, "line"),
            GeometryKind::Polygon => write!(f, "polygon"),
        }
    }
}

/// Extract the geometry of a placemark.
///
/// Variant priority is Point, LineString, Polygon, MultiGeometry; a
/// MultiGeometry is unwrapped one level using the same priority on its
/// children. A variant that yields no valid coordinates is skipped and
/// the next one is tried.
pub fn extract_geometry(placemark: Node) -> Option<Geometry> {
    geometry_of(placemark).or_else(|| {
        query::child(placemark, "MultiGeometry").and_then(geometry_of)
    })
}

fn geometry_of(node: Node) -> Option<Geometry> {
    if let Some(point) = query::child(node, "Point").and_then(point_from) {
        return Some(point);
    }
    if let Some(line) = query::child(node, "LineString").and_then(line_from) {
        return Some(line);
    }
    query::child(node, "Polygon").and_then(polygon_from)
}

fn point_from(node: Node) -> Option<Geometry> {
    coordinates_of(node)
        .first()
        .copied()
        .map(Geometry::Point)
}

fn line_from(node: Node) -> Option<Geometry> {
    let coords = coordinates_of(node);
    if coords.is_empty() {
        return None;
    }
    Some(Geometry::Line(coords))
}

fn polygon_from(node: Node) -> Option<Geometry> {
    let ring = query::child(node, "outerBoundaryIs")
        .and_then(|b| query::child(b, "LinearRing"))?;
    let mut coords = coordinates_of(ring);
    if coords.len() < 3 {
        if !coords.is_empty() {
            log::warn!(
                "polygon boundary has only {} valid positions, skipping",
                coords.len()
            );
        }
        return None;
    }
    // The boundary is stored closed.
    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    Some(Geometry::Polygon(coords))
}

/// Parse the `coordinates` text of a geometry element.
///
/// Tokens are whitespace-separated `lon,lat[,alt]` tuples. Tokens that
/// fail to parse or fall outside valid ranges are dropped; whatever
/// remains forms the geometry.
fn coordinates_of(node: Node) -> Vec<Coord> {
    let Some(text) = query::descendant(node, "coordinates").and_then(|n| n.text()) else {
        log::warn!("missing <coordinates> tag, skipping element");
        return Vec::new();
    };
    let text = text.trim();
    if text.is_empty() {
        log::warn!("empty <coordinates> tag, skipping element");
        return Vec::new();
    }
    parse_coordinates(text)
}

/// Parse a whitespace-separated list of `lon,lat[,alt]` tuples.
pub(crate) fn parse_coordinates(text: &str) -> Vec<Coord> {
    let mut coords = Vec::new();
    for token in text.split_whitespace() {
        let mut parts = token.split(',');
        let (Some(lon_s), Some(lat_s)) = (parts.next(), parts.next()) else {
            continue;
        };
        let (Ok(lon), Ok(lat)) = (lon_s.trim().parse::<f64>(), lat_s.trim().parse::<f64>())
        else {
            continue;
        };
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            continue;
        }
        let hae = parts
            .next()
            .and_then(|a| a.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        coords.push(Coord::new(lat, lon, hae));
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placemark(inner: &str) -> String {
        format!("<kml><Document><Placemark>{inner}</Placemark></Document></kml>")
    }

    fn extract_from(inner: &str) -> Option<Geometry> {
        let xml = placemark(inner);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let pm = doc
            .descendants()
            .find(|n| n.tag_name().name() == "Placemark")
            .unwrap();
        extract_geometry(pm)
    }

    #[test]
    fn test_parse_coordinates_swaps_axes() {
        let coords = parse_coordinates("10.5,20.25,100.0");
        assert_eq!(coords, vec![Coord::new(20.25, 10.5, 100.0)]);
    }

    #[test]
    fn test_parse_coordinates_defaults_altitude() {
        let coords = parse_coordinates("10.0,20.0");
        assert_eq!(coords[0].hae, 0.0);
    }

    #[test]
    fn test_parse_coordinates_drops_invalid_tokens() {
        let coords = parse_coordinates("10,20 junk 999,20 30,91 15,25,abc");
        // "junk" has no comma pair, 999 exceeds longitude range, 91
        // exceeds latitude range; the bad altitude falls back to 0.0.
        assert_eq!(
            coords,
            vec![Coord::new(20.0, 10.0, 0.0), Coord::new(25.0, 15.0, 0.0)]
        );
    }

    #[test]
    fn test_parse_roundtrip_precision() {
        let coords = parse_coordinates("-122.4194,37.7749,12.5");
        let c = coords[0];
        assert_eq!(format!("{},{},{}", c.lon, c.lat, c.hae), "-122.4194,37.7749,12.5");
    }

    #[test]
    fn test_point_extraction() {
        let geom = extract_from("<Point><coordinates>10.0,20.0</coordinates></Point>").unwrap();
        assert_eq!(geom, Geometry::Point(Coord::new(20.0, 10.0, 0.0)));
    }

    #[test]
    fn test_point_outranks_polygon() {
        let geom = extract_from(
            "<Polygon><outerBoundaryIs><LinearRing>\
             <coordinates>0,0 0,1 1,1 0,0</coordinates>\
             </LinearRing></outerBoundaryIs></Polygon>\
             <Point><coordinates>10.0,20.0</coordinates></Point>",
        )
        .unwrap();
        assert_eq!(geom.kind(), GeometryKind::Point);
    }

    #[test]
    fn test_empty_point_falls_through_to_line() {
        let geom = extract_from(
            "<Point><coordinates> </coordinates></Point>\
             <LineString><coordinates>0,0 1,1</coordinates></LineString>",
        )
        .unwrap();
        assert_eq!(geom.kind(), GeometryKind::Line);
    }

    #[test]
    fn test_polygon_is_closed() {
        let geom = extract_from(
            "<Polygon><outerBoundaryIs><LinearRing>\
             <coordinates>0,0 2,0 2,2 0,2</coordinates>\
             </LinearRing></outerBoundaryIs></Polygon>",
        )
        .unwrap();
        let Geometry::Polygon(coords) = geom else {
            panic!("expected polygon");
        };
        assert_eq!(coords.len(), 5);
        assert_eq!(coords.first(), coords.last());
    }

    #[test]
    fn test_polygon_too_short_is_discarded() {
        let geom = extract_from(
            "<Polygon><outerBoundaryIs><LinearRing>\
             <coordinates>0,0 1,1</coordinates>\
             </LinearRing></outerBoundaryIs></Polygon>",
        );
        assert!(geom.is_none());
    }

    #[test]
    fn test_multi_geometry_unwraps_with_priority() {
        let geom = extract_from(
            "<MultiGeometry>\
             <LineString><coordinates>0,0 1,1</coordinates></LineString>\
             <Point><coordinates>5.0,6.0</coordinates></Point>\
             </MultiGeometry>",
        )
        .unwrap();
        assert_eq!(geom.kind(), GeometryKind::Point);
    }

    #[test]
    fn test_no_geometry() {
        assert!(extract_from("<name>just a name</name>").is_none());
    }
}
