//! Observational diagnostics collected while loading a document.

use super::repair;
use serde::Serialize;

/// What the loader observed about a source document.
///
/// Diagnostics never block conversion; they exist so callers can report
/// why a file needed repair.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    /// The text started with an XML declaration
    pub had_declaration: bool,

    /// The root element declared an `xmlns`
    pub had_namespace: bool,

    /// Local name of the detected root element
    pub root_tag: Option<String>,

    /// Encoding named in the XML declaration
    pub encoding: Option<String>,

    /// The first strict parse attempt succeeded
    pub strict_parse_ok: bool,

    /// The recovering parser had to rebuild the document
    pub recovered: bool,

    /// Repair transforms that changed the text
    pub repairs_applied: Vec<String>,
}

impl Diagnostics {
    /// Inspect raw document text without parsing it.
    pub fn observe(text: &str) -> Self {
        let had_declaration = text.trim_start().starts_with("<?xml");
        let had_namespace = repair::root_start_tag(text)
            .map(|(start, end)| text[start..end].contains("xmlns"))
            .unwrap_or(false);
        let root_tag = repair::root_local_name(text).map(str::to_string);

        Self {
            had_declaration,
            had_namespace,
            root_tag,
            encoding: declared_encoding(text),
            strict_parse_ok: false,
            recovered: false,
            repairs_applied: Vec::new(),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "declaration: {}", mark(self.had_declaration))?;
        writeln!(f, "namespace:   {}", mark(self.had_namespace))?;
        writeln!(f, "root tag:    {}", self.root_tag.as_deref().unwrap_or("(none)"))?;
        writeln!(f, "encoding:    {}", self.encoding.as_deref().unwrap_or("(unspecified)"))?;
        writeln!(f, "strict parse: {}", mark(self.strict_parse_ok))?;
        writeln!(f, "recovered:    {}", mark(self.recovered))?;
        if self.repairs_applied.is_empty() {
            write!(f, "repairs:      (none)")
        } else {
            write!(f, "repairs:      {}", self.repairs_applied.join(", "))
        }
    }
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Pull the encoding name out of the declaration, if any.
fn declared_encoding(text: &str) -> Option<String> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("<?xml") {
        return None;
    }
    let decl = &trimmed[..trimmed.find("?>")? + 2];
    let idx = decl.find("encoding=")?;
    let rest = &decl[idx + "encoding=".len()..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}
