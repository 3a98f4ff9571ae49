//! Heuristic text repair for malformed KML.
//!
//! Each transform is a pure string rewrite and idempotent on its own
//! output, so the pipeline can be re-run without changing the result.
//! Order matters: the declaration must exist before the namespace check,
//! and the namespace must be injected before a bare `Document` fragment
//! is wrapped.

/// The KML 2.2 namespace injected into namespace-less documents.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

type Transform = fn(&str) -> String;

/// Ordered pipeline of repair transforms.
pub struct RepairPipeline {
    transforms: Vec<(&'static str, Transform)>,
}

impl RepairPipeline {
    /// Create the pipeline with the standard transform order.
    pub fn new() -> Self {
        Self {
            transforms: vec![
                ("ensure_declaration", ensure_declaration as Transform),
                ("inject_root_namespace", inject_root_namespace),
                ("wrap_bare_document", wrap_bare_document),
                ("escape_bare_ampersands", escape_bare_ampersands),
            ],
        }
    }

    /// Apply every transform in order.
    ///
    /// Returns the repaired text together with the names of transforms
    /// that actually changed it.
    pub fn process(&self, input: &str) -> (String, Vec<&'static str>) {
        let mut text = input.to_string();
        let mut applied = Vec::new();
        for (name, transform) in &self.transforms {
            let out = transform(&text);
            if out != text {
                log::debug!("repair transform {name} modified the document");
                applied.push(*name);
                text = out;
            }
        }
        (text, applied)
    }
}

impl Default for RepairPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Prepend an XML declaration if the text does not start with one.
pub fn ensure_declaration(input: &str) -> String {
    if input.trim_start().starts_with("<?xml") {
        input.to_string()
    } else {
        let mut out = String::with_capacity(input.len() + XML_DECLARATION.len());
        out.push_str(XML_DECLARATION);
        out.push_str(input);
        out
    }
}

/// Inject the default KML namespace into a `kml` root element that
/// declares none.
///
/// The check looks inside the root element's own start tag, not merely
/// before the first `>` of the file, so re-running the transform leaves
/// an already-namespaced document untouched.
pub fn inject_root_namespace(input: &str) -> String {
    let Some((tag_start, tag_end)) = root_start_tag(input) else {
        return input.to_string();
    };
    if input[tag_start..tag_end].contains("xmlns") {
        return input.to_string();
    }

    let name_end = input[tag_start + 1..tag_end]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map(|i| tag_start + 1 + i)
        .unwrap_or(tag_end);
    let name = &input[tag_start + 1..name_end];
    let local = name.rsplit(':').next().unwrap_or(name);
    if local != "kml" {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len() + KML_NAMESPACE.len() + 16);
    out.push_str(&input[..name_end]);
    out.push_str(" xmlns=\"");
    out.push_str(KML_NAMESPACE);
    out.push('"');
    out.push_str(&input[name_end..]);
    out
}

/// Wrap a bare `Document`-rooted fragment in a synthetic `kml` root.
pub fn wrap_bare_document(input: &str) -> String {
    if root_local_name(input) == Some("kml") {
        return input.to_string();
    }
    let Some(doc_start) = input.find("<Document") else {
        return input.to_string();
    };

    let mut out = String::with_capacity(input.len() + KML_NAMESPACE.len() + 32);
    out.push_str(&input[..doc_start]);
    out.push_str("<kml xmlns=\"");
    out.push_str(KML_NAMESPACE);
    out.push_str("\">");
    out.push_str(&input[doc_start..]);
    out.push_str("</kml>");
    out
}

/// Escape `&` characters that do not begin a recognized entity.
pub fn escape_bare_ampersands(input: &str) -> String {
    const ENTITIES: [&str; 5] = ["amp;", "lt;", "gt;", "quot;", "apos;"];

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if ENTITIES.iter().any(|e| after.starts_with(e)) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Locate the root element's start tag, skipping the declaration,
/// comments, and doctype. Returns `(index_of_lt, index_of_gt)`.
pub(crate) fn root_start_tag(input: &str) -> Option<(usize, usize)> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while let Some(off) = input[i..].find('<') {
        let start = i + off;
        match bytes.get(start + 1).copied() {
            Some(b'?') => {
                i = start + input[start..].find("?>").map(|p| p + 2)?;
            }
            Some(b'!') => {
                if input[start..].starts_with("<!--") {
                    i = start + input[start..].find("-->").map(|p| p + 3)?;
                } else {
                    i = start + input[start..].find('>').map(|p| p + 1)?;
                }
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let end = start + input[start..].find('>')?;
                return Some((start, end));
            }
            _ => return None,
        }
    }
    None
}

/// Local name of the root element, if one can be found.
pub(crate) fn root_local_name(input: &str) -> Option<&str> {
    let (tag_start, tag_end) = root_start_tag(input)?;
    let name_end = input[tag_start + 1..tag_end]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map(|i| tag_start + 1 + i)
        .unwrap_or(tag_end);
    let name = &input[tag_start + 1..name_end];
    Some(name.rsplit(':').next().unwrap_or(name))
}
