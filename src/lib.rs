//! # kml2cot
//!
//! Tolerant KML to Cursor-on-Target (CoT) conversion for Rust.
//!
//! This library reads geospatial map documents, including malformed
//! real-world KML with missing namespaces, absent declarations, or
//! unescaped entities, and emits one CoT event record per placemark
//! for consumption by TAK clients.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kml2cot::convert_file;
//!
//! fn main() -> kml2cot::Result<()> {
//!     // Converts every placemark to a .cot file next to the input.
//!     let report = convert_file("mission.kml")?;
//!     println!("wrote {} events, skipped {}", report.written.len(), report.skipped);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Malformed-input repair**: declaration/namespace injection, entity
//!   escaping, and a recovering parse pass for broken markup
//! - **All placemark geometries**: points, lines, polygons, and
//!   multi-geometries
//! - **Style resolution**: style-reference chains, inline styles, and
//!   source-to-target color conversion
//! - **Metadata recovery**: extended attributes plus structured data
//!   scraped from description HTML
//! - **Parallel processing**: per-placemark synthesis via Rayon

pub mod convert;
pub mod cot;
pub mod detect;
pub mod error;
pub mod extract;
pub mod loader;

// Re-export commonly used types
pub use convert::{sanitize_filename, ConvertOptions, ConvertReport, Converter};
pub use cot::{
    classify, synthesize, synthesize_at, to_xml, Classification, CotEvent, Detail, EventPoint,
    COT_DECLARATION, COT_EXTENSION,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_kml, SourceFormat};
pub use error::{Error, Result};
pub use extract::{
    extract_geometry, extract_metadata, resolve_style, Coord, Geometry, GeometryKind, Metadata,
    ResolvedStyle, StyleTable,
};
pub use loader::{
    load_bytes, load_file, load_str, Diagnostics, KmlSource, LoadOptions, RepairPolicy,
};

use std::path::Path;

/// Convert a KML file with default options.
///
/// Output files land in `{prefix}_output` and are named
/// `{prefix}_{placemark}.cot`, where the prefix is the sanitized input
/// file stem.
///
/// # Example
///
/// ```no_run
/// use kml2cot::convert_file;
///
/// let report = convert_file("mission.kml").unwrap();
/// assert_eq!(report.skipped, 0);
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<ConvertReport> {
    Converter::new().convert_file(path)
}

/// Convert a KML file with custom options.
///
/// # Example
///
/// ```no_run
/// use kml2cot::{convert_file_with_options, ConvertOptions};
///
/// let options = ConvertOptions::new()
///     .with_output_dir("./events")
///     .force_repair();
/// let report = convert_file_with_options("broken.kml", options).unwrap();
/// ```
pub fn convert_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ConvertOptions,
) -> Result<ConvertReport> {
    Converter::with_options(options).convert_file(path)
}

/// Builder for loading and converting KML documents.
///
/// # Example
///
/// ```no_run
/// use kml2cot::Kml2Cot;
///
/// let report = Kml2Cot::new()
///     .force_repair()
///     .with_prefix("mission")
///     .with_output_dir("./events")
///     .convert("mission.kml")?;
/// # Ok::<(), kml2cot::Error>(())
/// ```
pub struct Kml2Cot {
    convert_options: ConvertOptions,
}

impl Kml2Cot {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            convert_options: ConvertOptions::new(),
        }
    }

    /// Repair the document before the first parse attempt.
    pub fn force_repair(mut self) -> Self {
        self.convert_options = self.convert_options.force_repair();
        self
    }

    /// Fail on malformed input instead of attempting repair.
    pub fn strict(mut self) -> Self {
        self.convert_options.load = self.convert_options.load.strict();
        self
    }

    /// Disable parallel synthesis.
    pub fn sequential(mut self) -> Self {
        self.convert_options = self.convert_options.sequential();
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.convert_options = self.convert_options.with_output_dir(dir);
        self
    }

    /// Set the output filename prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.convert_options = self.convert_options.with_prefix(prefix);
        self
    }

    /// Load a document without converting it, for inspection.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<KmlSource> {
        loader::load_file(path, &self.convert_options.load)
    }

    /// Convert a KML file.
    pub fn convert<P: AsRef<Path>>(self, path: P) -> Result<ConvertReport> {
        Converter::with_options(self.convert_options).convert_file(path)
    }
}

impl Default for Kml2Cot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chained() {
        let builder = Kml2Cot::new()
            .force_repair()
            .sequential()
            .with_prefix("ops");

        assert_eq!(builder.convert_options.load.repair, RepairPolicy::Always);
        assert!(!builder.convert_options.parallel);
        assert_eq!(builder.convert_options.prefix.as_deref(), Some("ops"));
    }

    #[test]
    fn test_builder_strict() {
        let builder = Kml2Cot::new().strict();
        assert_eq!(builder.convert_options.load.repair, RepairPolicy::Never);
    }

    #[test]
    fn test_convert_missing_file_errors() {
        let result = convert_file("definitely/not/here.kml");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
