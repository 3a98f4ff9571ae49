//! Structured metadata extraction.
//!
//! Merges four sources into one ordered map: generic `Data` name/value
//! pairs, schema-bound `SimpleData` pairs, the raw description text, and
//! key/value rows scraped from a two-column HTML table embedded in the
//! description. The first writer of a key wins.

use super::query;
use indexmap::IndexMap;
use regex::Regex;
use roxmltree::Node;

/// Ordered placemark metadata.
pub type Metadata = IndexMap<String, String>;

/// Key under which the raw description text is stored.
pub const DESCRIPTION_KEY: &str = "description";

/// Extract the metadata of a placemark.
pub fn extract_metadata(placemark: Node) -> Metadata {
    let mut data = Metadata::new();

    if let Some(ext) = query::descendant(placemark, "ExtendedData") {
        for entry in query::descendants(ext, "Data") {
            let name = entry.attribute("name").unwrap_or("");
            let value = query::descendant(entry, "value").and_then(|n| n.text());
            match value {
                Some(v) if !v.is_empty() => insert_first(&mut data, name, v),
                // A named Data element with no value still records the key.
                _ if !name.is_empty() => insert_first(&mut data, name, ""),
                _ => {}
            }
        }

        for entry in query::descendants(ext, "SimpleData") {
            let name = entry.attribute("name").unwrap_or("");
            if let Some(value) = entry.text() {
                if !name.is_empty() && !value.is_empty() {
                    insert_first(&mut data, name, value);
                }
            }
        }
    }

    if let Some(description) = query::descendant(placemark, "description")
        .and_then(|n| n.text())
        .filter(|t| !t.is_empty())
    {
        insert_first(&mut data, DESCRIPTION_KEY, description);
        if description.contains("<table") {
            scrape_table(description, &mut data);
        }
    }

    data
}

fn insert_first(data: &mut Metadata, key: &str, value: &str) {
    data.entry(key.to_string())
        .or_insert_with(|| value.to_string());
}

/// Scrape key/value pairs from a two-column HTML table.
///
/// Rows matching `<tr><td>key</td><td>value</td>` contribute a pair;
/// anything else in the markup is ignored, so malformed tables degrade
/// to no pairs instead of failing extraction.
pub(crate) fn scrape_table(html: &str, out: &mut Metadata) {
    let row =
        Regex::new(r"(?is)<tr[^>]*>\s*<td[^>]*>(.*?)</td>\s*<td[^>]*>(.*?)</td>").unwrap();
    for caps in row.captures_iter(html) {
        let key = clean_cell(&caps[1]);
        let value = clean_cell(&caps[2]);
        if !key.is_empty() && !value.is_empty() {
            insert_first(out, &key, &value);
        }
    }
}

fn clean_cell(cell: &str) -> String {
    let tags = Regex::new(r"<[^>]+>").unwrap();
    unescape_entities(tags.replace_all(cell, "").trim())
}

/// Sanitized free-text remark from description markup: tags removed,
/// whitespace collapsed, entities resolved.
pub fn plain_remark(content: &str) -> String {
    let tags = Regex::new(r"<[^>]+>").unwrap();
    let text = tags.replace_all(content, " ");
    let spaces = Regex::new(r"\s+").unwrap();
    let collapsed = spaces.replace_all(&text, " ");
    unescape_entities(collapsed.trim())
}

/// Resolve the named HTML entities plus numeric character references.
fn unescape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos..];
        if let Some((replacement, len)) = match_entity(after) {
            out.push_str(&replacement);
            rest = &after[len..];
        } else {
            out.push('&');
            rest = &after[1..];
        }
    }
    out.push_str(rest);
    out
}

fn match_entity(s: &str) -> Option<(String, usize)> {
    const NAMED: [(&str, &str); 6] = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&apos;", "'"),
        ("&nbsp;", " "),
    ];
    for (entity, replacement) in NAMED {
        if s.starts_with(entity) {
            return Some((replacement.to_string(), entity.len()));
        }
    }
    // Numeric references: &#65; and &#x41;
    let end = s.find(';')?;
    let body = &s[1..end];
    let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).map(|c| (c.to_string(), end + 1))
}
