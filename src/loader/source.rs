//! Loaded document source.

use super::Diagnostics;
use crate::error::Result;

/// A loaded (and possibly repaired) KML document.
///
/// Owns the document text; [`parse`](KmlSource::parse) borrows a
/// navigable tree from it, so the source must outlive any tree built
/// from it. The text is read-only for the rest of the conversion run.
#[derive(Debug)]
pub struct KmlSource {
    text: String,
    diagnostics: Diagnostics,
}

impl KmlSource {
    pub(crate) fn new(text: String, diagnostics: Diagnostics) -> Self {
        Self { text, diagnostics }
    }

    /// The loaded document text, after any repair.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// What the loader observed while reading this document.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Parse the text into a navigable tree.
    pub fn parse(&self) -> Result<roxmltree::Document<'_>> {
        roxmltree::Document::parse(&self.text).map_err(Into::into)
    }
}
