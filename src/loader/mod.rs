//! Document loading with malformed-markup recovery.
//!
//! Loading runs up to three passes: a strict parse of the text as given,
//! a re-parse after the heuristic repair pipeline, and finally a
//! recovering pass that rebuilds a well-formed document from the event
//! stream, dropping fragments that cannot be salvaged. Diagnostics are
//! collected along the way but never block conversion.

mod diagnostics;
mod options;
mod recover;
pub mod repair;
mod source;

pub use diagnostics::Diagnostics;
pub use options::{LoadOptions, RepairPolicy};
pub use repair::RepairPipeline;
pub use source::KmlSource;

use crate::detect::{self, SourceFormat};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Load a KML file into a parseable source.
pub fn load_file<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<KmlSource> {
    let bytes = fs::read(path)?;
    load_bytes(&bytes, options)
}

/// Load a KML document from raw bytes.
///
/// KMZ packages are rejected here; extraction belongs to an external
/// collaborator.
pub fn load_bytes(data: &[u8], options: &LoadOptions) -> Result<KmlSource> {
    match detect::detect_format_from_bytes(data)? {
        SourceFormat::Kmz => Err(Error::CompressedPackage),
        SourceFormat::Kml => load_str(String::from_utf8_lossy(data).into_owned(), options),
    }
}

/// Load a KML document from text.
pub fn load_str(text: impl Into<String>, options: &LoadOptions) -> Result<KmlSource> {
    let mut text = text.into();
    let mut diagnostics = Diagnostics::observe(&text);
    let mut repairs: Vec<&'static str> = Vec::new();

    if options.repair == RepairPolicy::Always {
        let (repaired, applied) = RepairPipeline::new().process(&text);
        text = repaired;
        repairs = applied;
    }

    match try_parse(&text) {
        Ok(()) => diagnostics.strict_parse_ok = true,
        Err(err) => {
            diagnostics.strict_parse_ok = false;
            if options.repair == RepairPolicy::Never {
                return Err(Error::Parse(err.to_string()));
            }
            log::debug!("strict parse failed ({err}), entering repair pass");

            if repairs.is_empty() {
                let (repaired, applied) = RepairPipeline::new().process(&text);
                text = repaired;
                repairs = applied;
            }

            if try_parse(&text).is_err() {
                let rebuilt = recover::rebuild(&text);
                try_parse(&rebuilt).map_err(|e| Error::Parse(e.to_string()))?;
                text = rebuilt;
                diagnostics.recovered = true;
            }
        }
    }

    diagnostics.repairs_applied = repairs.iter().map(|s| s.to_string()).collect();
    Ok(KmlSource::new(text, diagnostics))
}

/// Parse without keeping the tree, so callers can keep mutating the text.
fn try_parse(text: &str) -> std::result::Result<(), roxmltree::Error> {
    roxmltree::Document::parse(text).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_well_formed() {
        let xml = "<?xml version=\"1.0\"?><kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document/></kml>";
        let source = load_str(xml, &LoadOptions::default()).unwrap();
        assert!(source.diagnostics().strict_parse_ok);
        assert!(!source.diagnostics().recovered);
        assert!(source.diagnostics().repairs_applied.is_empty());
        source.parse().unwrap();
    }

    #[test]
    fn test_load_missing_declaration_and_namespace() {
        let xml = "<kml><Document><Placemark><name>A</name></Placemark></Document></kml>";
        let source = load_str(xml, &LoadOptions::new().force_repair()).unwrap();
        let diag = source.diagnostics();
        assert!(!diag.had_declaration);
        assert!(!diag.had_namespace);
        assert!(diag
            .repairs_applied
            .iter()
            .any(|r| r == "inject_root_namespace"));
        let doc = source.parse().unwrap();
        assert_eq!(
            doc.root_element().tag_name().namespace(),
            Some(repair::KML_NAMESPACE)
        );
    }

    #[test]
    fn test_load_unclosed_tag_recovers() {
        let xml = "<kml xmlns=\"http://www.opengis.net/kml/2.2\">\
                   <Document><Placemark><name>A</name></Document></kml>";
        let source = load_str(xml, &LoadOptions::default()).unwrap();
        assert!(!source.diagnostics().strict_parse_ok);
        assert!(source.diagnostics().recovered);
        source.parse().unwrap();
    }

    #[test]
    fn test_load_strict_policy_fails_fast() {
        let xml = "<kml><unclosed</kml>";
        let result = load_str(xml, &LoadOptions::new().strict());
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_load_rejects_kmz_bytes() {
        let result = load_bytes(b"PK\x03\x04zipdata", &LoadOptions::default());
        assert!(matches!(result, Err(Error::CompressedPackage)));
    }

    #[test]
    fn test_repaired_matches_well_formed_placemark_count() {
        let broken = "<kml><Document>\
                      <Placemark><name>a</name></Placemark>\
                      <Placemark><name>b</name></Placemark>\
                      </Document></kml>";
        let clean = "<?xml version=\"1.0\"?>\
                     <kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document>\
                     <Placemark><name>a</name></Placemark>\
                     <Placemark><name>b</name></Placemark>\
                     </Document></kml>";

        let count = |src: &KmlSource| {
            let doc = src.parse().unwrap();
            doc.descendants()
                .filter(|n| n.tag_name().name() == "Placemark")
                .count()
        };

        let repaired = load_str(broken, &LoadOptions::new().force_repair()).unwrap();
        let reference = load_str(clean, &LoadOptions::default()).unwrap();
        assert_eq!(count(&repaired), count(&reference));
    }
}
