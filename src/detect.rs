//! Source format detection.
//!
//! KML arrives either as plain XML or inside a zipped KMZ package.
//! Archive extraction is out of scope for this crate, so detection exists
//! to give callers a clear answer before they hand us a file.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Recognized source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Plain XML KML document.
    Kml,
    /// Zipped KMZ map package (must be extracted externally).
    Kmz,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Kml => write!(f, "KML"),
            SourceFormat::Kmz => write!(f, "KMZ"),
        }
    }
}

/// Zip local-file-header magic, the start of every KMZ.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect the source format from a file path.
///
/// # Returns
/// * `Ok(SourceFormat)` for KML or KMZ content
/// * `Err(Error::UnknownFormat)` for anything else
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<SourceFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 256];
    let n = reader.read(&mut header)?;
    detect_format_from_bytes(&header[..n])
}

/// Detect the source format from leading bytes.
///
/// Any content whose first non-whitespace byte opens an XML construct is
/// treated as KML; malformed documents are the loader's problem, not
/// detection's.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<SourceFormat> {
    if data.starts_with(ZIP_MAGIC) {
        return Ok(SourceFormat::Kmz);
    }

    // Skip a UTF-8 BOM and leading whitespace before looking for markup.
    let data = data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(data);
    let first = data
        .iter()
        .find(|b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'));

    match first {
        Some(b'<') => Ok(SourceFormat::Kml),
        _ => Err(Error::UnknownFormat),
    }
}

/// Check if a file looks like a plain KML document.
pub fn is_kml<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_format_from_path(path), Ok(SourceFormat::Kml))
}

/// Check if bytes look like a zipped KMZ package.
pub fn is_kmz_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(SourceFormat::Kmz))
}
