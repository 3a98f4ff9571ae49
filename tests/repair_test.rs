//! Malformed-document repair and recovery tests.

use kml2cot::loader::{load_str, LoadOptions, RepairPipeline};
use kml2cot::{ConvertOptions, Converter};
use tempfile::TempDir;

const WELL_FORMED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark><name>Alpha</name><Point><coordinates>1,1</coordinates></Point></Placemark>
    <Placemark><name>Bravo</name><Point><coordinates>2,2</coordinates></Point></Placemark>
  </Document>
</kml>"#;

// Same content, but missing the declaration and the namespace.
const MALFORMED: &str = r#"<kml>
  <Document>
    <Placemark><name>Alpha</name><Point><coordinates>1,1</coordinates></Point></Placemark>
    <Placemark><name>Bravo</name><Point><coordinates>2,2</coordinates></Point></Placemark>
  </Document>
</kml>"#;

fn convert(xml: &str) -> kml2cot::ConvertReport {
    let dir = TempDir::new().unwrap();
    let converter = Converter::with_options(ConvertOptions::new().force_repair());
    converter.convert_str(xml, dir.path(), "r").unwrap()
}

#[test]
fn test_repaired_document_converts_like_well_formed() {
    let clean = convert(WELL_FORMED);
    let repaired = convert(MALFORMED);

    assert_eq!(clean.placemark_count, repaired.placemark_count);
    assert_eq!(clean.written.len(), repaired.written.len());
    assert_eq!(clean.skipped, repaired.skipped);
}

#[test]
fn test_repair_pipeline_idempotent_end_to_end() {
    let pipeline = RepairPipeline::new();
    let (once, _) = pipeline.process(MALFORMED);
    let (twice, applied) = pipeline.process(&once);
    assert_eq!(once, twice);
    assert!(applied.is_empty());
}

#[test]
fn test_bare_document_fragment_converts() {
    let fragment = "<Document>\
        <Placemark><name>Solo</name><Point><coordinates>3,4</coordinates></Point></Placemark>\
        </Document>";
    let report = convert(fragment);
    assert_eq!(report.placemark_count, 1);
    assert_eq!(report.written.len(), 1);
}

#[test]
fn test_unescaped_ampersand_in_name() {
    let xml = "<kml><Document>\
        <Placemark><name>Smith & Sons</name><Point><coordinates>1,1</coordinates></Point></Placemark>\
        </Document></kml>";
    let report = convert(xml);
    assert_eq!(report.written.len(), 1);
    assert!(report.written[0]
        .file_name()
        .unwrap()
        .to_string_lossy()
        .contains("Smith_&_Sons"));
}

#[test]
fn test_auto_policy_repairs_on_demand() {
    // A bare ampersand is ill-formed, so Auto mode repairs without
    // being asked. A merely namespace-less document would parse as-is.
    let xml = "<kml><Document>\
        <Placemark><name>A & B</name><Point><coordinates>1,1</coordinates></Point></Placemark>\
        </Document></kml>";
    let source = load_str(xml, &LoadOptions::new()).unwrap();
    assert!(!source.diagnostics().strict_parse_ok);
    assert!(source
        .diagnostics()
        .repairs_applied
        .iter()
        .any(|r| r == "escape_bare_ampersands"));
    source.parse().unwrap();
}

#[test]
fn test_diagnostics_are_observational() {
    let source = load_str(WELL_FORMED, &LoadOptions::new()).unwrap();
    let diag = source.diagnostics();
    assert!(diag.had_declaration);
    assert!(diag.had_namespace);
    assert_eq!(diag.root_tag.as_deref(), Some("kml"));
    assert_eq!(diag.encoding.as_deref(), Some("UTF-8"));
    assert!(diag.strict_parse_ok);
    assert!(!diag.recovered);
}

#[test]
fn test_unclosed_tags_recover_to_usable_document() {
    let xml = "<kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document>\
        <Placemark><name>Open</name><Point><coordinates>1,1</coordinates></Point>\
        </Document></kml>";
    let source = load_str(xml, &LoadOptions::new()).unwrap();
    assert!(source.diagnostics().recovered);

    let dir = TempDir::new().unwrap();
    let report = Converter::new()
        .convert_source(&source, dir.path(), "u")
        .unwrap();
    assert_eq!(report.written.len(), 1);
}
