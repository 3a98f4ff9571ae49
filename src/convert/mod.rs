//! Conversion pipeline: one output event file per placemark.
//!
//! Placemarks are independent; a failure in any one of them is logged,
//! counted, and skipped without touching the rest of the run. Only
//! loading problems and output-directory I/O abort a conversion.

use crate::cot::{classify, synthesize, to_xml, COT_EXTENSION};
use crate::error::{Error, Result};
use crate::extract::{extract_geometry, extract_metadata, query, resolve_style, StyleTable};
use crate::loader::{self, KmlSource, LoadOptions};
use rayon::prelude::*;
use roxmltree::Node;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Output directory; defaults to `{prefix}_output` next to the
    /// working directory
    pub output_dir: Option<PathBuf>,

    /// Output filename prefix; defaults to the sanitized input stem
    pub prefix: Option<String>,

    /// Loader configuration
    pub load: LoadOptions,

    /// Whether to synthesize events in parallel
    pub parallel: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            prefix: None,
            load: LoadOptions::default(),
            parallel: true,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the output filename prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set loader options.
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    /// Run the repair pipeline before parsing.
    pub fn force_repair(mut self) -> Self {
        self.load = self.load.force_repair();
        self
    }

    /// Disable parallel synthesis.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Outcome of a conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    /// Name the document gave itself, when present
    pub document_name: Option<String>,

    /// Placemarks found in the document
    pub placemark_count: usize,

    /// Files written, in placemark order
    pub written: Vec<PathBuf>,

    /// Placemarks skipped for lack of usable geometry or a
    /// serialization failure
    pub skipped: usize,
}

impl ConvertReport {
    /// True when every placemark produced an output file.
    pub fn all_converted(&self) -> bool {
        self.skipped == 0
    }
}

/// Converts loaded documents into per-placemark event files.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    /// Create a converter with default options.
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::new(),
        }
    }

    /// Create a converter with the given options.
    pub fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// The active options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a KML file, writing one `.cot` file per placemark.
    pub fn convert_file<P: AsRef<Path>>(&self, input: P) -> Result<ConvertReport> {
        let input = input.as_ref();
        let prefix = self
            .options
            .prefix
            .clone()
            .unwrap_or_else(|| default_prefix(input));
        let output_dir = self
            .options
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{prefix}_output")));

        let source = loader::load_file(input, &self.options.load)?;
        self.convert_source(&source, &output_dir, &prefix)
    }

    /// Convert KML text, writing output files under `output_dir`.
    pub fn convert_str(
        &self,
        text: &str,
        output_dir: &Path,
        prefix: &str,
    ) -> Result<ConvertReport> {
        let source = loader::load_str(text, &self.options.load)?;
        self.convert_source(&source, output_dir, prefix)
    }

    /// Convert an already-loaded source document.
    pub fn convert_source(
        &self,
        source: &KmlSource,
        output_dir: &Path,
        prefix: &str,
    ) -> Result<ConvertReport> {
        let doc = source.parse()?;
        let root = doc.root_element();
        let document = query::descendant(root, "Document").ok_or(Error::MissingDocument)?;
        let document_name = query::descendant_text(document, "name")
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let placemarks = query::descendants(document, "Placemark");
        if placemarks.is_empty() {
            log::warn!("no placemarks found in document");
            return Ok(ConvertReport {
                document_name,
                placemark_count: 0,
                written: Vec::new(),
                skipped: 0,
            });
        }
        log::debug!("found {} placemarks", placemarks.len());

        let table = StyleTable::build(root);

        let outputs: Vec<Option<(String, String)>> = if self.options.parallel {
            placemarks
                .par_iter()
                .enumerate()
                .map(|(index, placemark)| convert_placemark(*placemark, index, &table, prefix))
                .collect()
        } else {
            placemarks
                .iter()
                .enumerate()
                .map(|(index, placemark)| convert_placemark(*placemark, index, &table, prefix))
                .collect()
        };

        fs::create_dir_all(output_dir)?;

        let mut written = Vec::new();
        let mut skipped = 0;
        for output in outputs {
            match output {
                Some((file_name, xml)) => {
                    let path = output_dir.join(file_name);
                    fs::write(&path, xml)?;
                    written.push(path);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!("{skipped} of {} placemarks skipped", placemarks.len());
        }
        Ok(ConvertReport {
            document_name,
            placemark_count: placemarks.len(),
            written,
            skipped,
        })
    }
}

/// Convert one placemark to `(file name, serialized event)`.
///
/// Returns `None` when the placemark has no usable geometry or its event
/// cannot be serialized; both are per-placemark conditions that must not
/// stop the run.
fn convert_placemark(
    placemark: Node,
    index: usize,
    table: &StyleTable,
    prefix: &str,
) -> Option<(String, String)> {
    let name = query::child_text(placemark, "name")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("placemark_{}", index + 1));

    let Some(geometry) = extract_geometry(placemark) else {
        log::warn!("could not create event for {name}: no usable geometry");
        return None;
    };

    let (style, style_url) = resolve_style(table, placemark);
    let metadata = extract_metadata(placemark);
    let classification = classify(geometry.kind(), style_url.as_deref(), &metadata);
    let event = synthesize(&name, &geometry, &style, &metadata, &classification);

    match to_xml(&event) {
        Ok(xml) => Some((
            format!("{prefix}_{}.{COT_EXTENSION}", sanitize_filename(&name)),
            xml,
        )),
        Err(err) => {
            log::warn!("could not serialize event for {name}: {err}");
            None
        }
    }
}

/// Map a feature name to a filesystem-safe token.
///
/// Strips `\ / * ? : " < > |`, replaces spaces with underscores, drops
/// non-ASCII characters, and trims stray underscores. An empty result
/// becomes `unnamed_feature`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' => {}
            ' ' => out.push('_'),
            c if !c.is_ascii() => {}
            c => out.push(c),
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "unnamed_feature".to_string()
    } else {
        trimmed.to_string()
    }
}

fn default_prefix(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_filename(&stem)
}
