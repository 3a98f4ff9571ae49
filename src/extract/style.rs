//! Style resolution and color conversion.

use super::query;
use roxmltree::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Visual style resolved for a placemark. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStyle {
    /// Line color, raw 8-hex-digit source encoding (aabbggrr)
    pub line_color: Option<String>,

    /// Line width in pixels
    pub line_width: Option<f64>,

    /// Fill color, raw 8-hex-digit source encoding
    pub poly_color: Option<String>,

    /// Label color, raw 8-hex-digit source encoding
    pub label_color: Option<String>,

    /// Icon image reference
    pub icon_url: Option<String>,

    /// Icon scale factor
    pub icon_scale: Option<f64>,
}

impl ResolvedStyle {
    /// True when nothing was resolved.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Document-level table of reusable styles, indexed by id.
pub struct StyleTable<'a, 'input> {
    styles: HashMap<&'a str, Node<'a, 'input>>,
}

impl<'a, 'input> StyleTable<'a, 'input> {
    /// Collect every `Style` element carrying an id, document-wide.
    pub fn build(root: Node<'a, 'input>) -> Self {
        let mut styles = HashMap::new();
        for node in query::descendants(root, "Style") {
            if let Some(id) = node.attribute("id") {
                styles.insert(id, node);
            }
        }
        Self { styles }
    }

    /// Look up a style definition by id.
    pub fn get(&self, id: &str) -> Option<Node<'a, 'input>> {
        self.styles.get(id).copied()
    }

    /// Number of indexed styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True when the document defines no reusable styles.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Resolve a placemark's style.
///
/// A `styleUrl` anchoring to an in-document style wins; otherwise an
/// inline `Style` child is used directly. Any miss along the chain
/// resolves to the empty style, never an error.
pub fn resolve_style(table: &StyleTable, placemark: Node) -> (ResolvedStyle, Option<String>) {
    let style_url = query::descendant_text(placemark, "styleUrl")
        .or_else(|| query::descendant_text(placemark, "styleURL"))
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if let Some(url) = style_url.as_deref() {
        if let Some(id) = url.strip_prefix('#') {
            if let Some(style) = table.get(id) {
                return (extract_substyles(style), style_url);
            }
            log::debug!("style reference #{id} has no matching definition");
        }
    }

    let style = query::child(placemark, "Style")
        .map(extract_substyles)
        .unwrap_or_default();
    (style, style_url)
}

/// Pull icon/line/poly/label sub-styles out of a style node.
fn extract_substyles(style: Node) -> ResolvedStyle {
    let mut resolved = ResolvedStyle::default();

    if let Some(icon_style) = query::descendant(style, "IconStyle") {
        resolved.icon_url = query::descendant(icon_style, "Icon")
            .and_then(|icon| query::descendant_text(icon, "href"))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        resolved.icon_scale = query::descendant_text(icon_style, "scale")
            .and_then(|s| s.parse().ok());
    }

    if let Some(line_style) = query::descendant(style, "LineStyle") {
        resolved.line_color = query::descendant_text(line_style, "color")
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        resolved.line_width = query::descendant_text(line_style, "width")
            .and_then(|s| s.parse().ok());
    }

    if let Some(poly_style) = query::descendant(style, "PolyStyle") {
        resolved.poly_color = query::descendant_text(poly_style, "color")
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    if let Some(label_style) = query::descendant(style, "LabelStyle") {
        resolved.label_color = query::descendant_text(label_style, "color")
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    resolved
}

/// Fallback for unparseable colors: opaque black.
pub const DEFAULT_ARGB: i32 = -16777216;

/// Fallback for the bare-RGB color path.
pub const DEFAULT_RGB: &str = "ffff00";

/// Convert a source color (aabbggrr) to a signed 32-bit argb value.
///
/// The digit groups are permuted to aarrggbb, read as an unsigned
/// 32-bit number, and reinterpreted as its signed two's-complement
/// equivalent. Invalid input falls back to opaque black.
pub fn argb_value(kml_color: &str) -> i32 {
    match hex_groups(kml_color) {
        Some([aa, bb, gg, rr]) => {
            let argb = (aa << 24) | (rr << 16) | (gg << 8) | bb;
            argb as i32
        }
        None => {
            log::warn!("invalid color value {kml_color:?}, using opaque black");
            DEFAULT_ARGB
        }
    }
}

/// Convert a source color (aabbggrr) to a bare rrggbb hex string,
/// dropping the alpha byte. Six-digit input is assumed to already be
/// rrggbb and passes through.
pub fn rgb_hex(kml_color: &str) -> String {
    if kml_color.len() == 8 && kml_color.chars().all(|c| c.is_ascii_hexdigit()) {
        return format!(
            "{}{}{}",
            &kml_color[6..8],
            &kml_color[4..6],
            &kml_color[2..4]
        );
    }
    if kml_color.len() == 6 && kml_color.chars().all(|c| c.is_ascii_hexdigit()) {
        return kml_color.to_string();
    }
    DEFAULT_RGB.to_string()
}

/// Split an 8-hex-digit color into its four byte groups.
fn hex_groups(s: &str) -> Option<[u32; 4]> {
    if s.len() != 8 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |range: std::ops::Range<usize>| u32::from_str_radix(&s[range], 16).ok();
    Some([byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?])
}
