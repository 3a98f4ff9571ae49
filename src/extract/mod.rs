//! Per-placemark extraction: geometry, style, and metadata.
//!
//! The three extractors are independent; each reads the same placemark
//! node and degrades to an empty result on its own, so one bad block
//! never poisons the others.

mod geometry;
mod metadata;
pub mod query;
mod style;

pub use geometry::{extract_geometry, Coord, Geometry, GeometryKind};
pub use metadata::{extract_metadata, plain_remark, Metadata, DESCRIPTION_KEY};
pub use style::{argb_value, resolve_style, rgb_hex, ResolvedStyle, StyleTable};
