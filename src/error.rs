//! Error types for the kml2cot library.

use std::io;
use thiserror::Error;

/// Result type alias for kml2cot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during KML to CoT conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file content is not recognized as a KML document.
    #[error("Unknown file format: not a KML document")]
    UnknownFormat,

    /// The input is a zipped map package (KMZ); archive extraction is
    /// handled by an external collaborator, not this crate.
    #[error("Input is a compressed map package (KMZ); extract the KML first")]
    CompressedPackage,

    /// The document could not be parsed, even after repair and recovery.
    #[error("KML parsing error: {0}")]
    Parse(String),

    /// The document has no `Document` container element.
    #[error("No Document element found in the KML file")]
    MissingDocument,

    /// A placemark yielded no usable geometry after validation.
    #[error("No usable geometry: {0}")]
    Geometry(String),

    /// Error serializing an output event record.
    #[error("Event serialization error: {0}")]
    Serialize(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Serialize(err.to_string())
    }
}
