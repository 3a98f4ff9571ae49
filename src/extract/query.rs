//! Namespace-tolerant tree lookups.
//!
//! Real-world KML frequently loses its namespace declaration, so every
//! lookup runs twice: first against the KML 2.2 namespace, then against
//! elements with no namespace at all. Implemented once here instead of
//! at every call site.

use crate::loader::repair::KML_NAMESPACE;
use roxmltree::Node;

fn matches(node: &Node, local: &str, namespaced: bool) -> bool {
    if !node.is_element() || node.tag_name().name() != local {
        return false;
    }
    if namespaced {
        node.tag_name().namespace() == Some(KML_NAMESPACE)
    } else {
        node.tag_name().namespace().is_none()
    }
}

/// First direct child with the given local name.
pub fn child<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| matches(n, local, true))
        .or_else(|| node.children().find(|n| matches(n, local, false)))
}

/// First descendant with the given local name.
pub fn descendant<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| matches(n, local, true))
        .or_else(|| node.descendants().find(|n| matches(n, local, false)))
}

/// All descendants with the given local name.
///
/// Namespaced matches win as a set: only when there are none does the
/// un-namespaced fallback apply, mirroring the paired lookups the
/// namespace-tolerant readers in this domain perform.
pub fn descendants<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Vec<Node<'a, 'input>> {
    let namespaced: Vec<_> = node
        .descendants()
        .filter(|n| matches(n, local, true))
        .collect();
    if !namespaced.is_empty() {
        return namespaced;
    }
    node.descendants()
        .filter(|n| matches(n, local, false))
        .collect()
}

/// Trimmed text of the first direct child with the given local name.
pub fn child_text<'a>(node: Node<'a, '_>, local: &str) -> Option<&'a str> {
    child(node, local).and_then(|n| n.text()).map(str::trim)
}

/// Trimmed text of the first descendant with the given local name.
pub fn descendant_text<'a>(node: Node<'a, '_>, local: &str) -> Option<&'a str> {
    descendant(node, local).and_then(|n| n.text()).map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMESPACED: &str = r#"<kml xmlns="http://www.opengis.net/kml/2.2">
        <Document><name>ns-doc</name><Placemark/><Placemark/></Document>
    </kml>"#;

    const BARE: &str = "<kml><Document><name>bare-doc</name><Placemark/></Document></kml>";

    #[test]
    fn test_child_with_namespace() {
        let doc = roxmltree::Document::parse(NAMESPACED).unwrap();
        let document = child(doc.root_element(), "Document").unwrap();
        assert_eq!(child_text(document, "name"), Some("ns-doc"));
    }

    #[test]
    fn test_child_without_namespace() {
        let doc = roxmltree::Document::parse(BARE).unwrap();
        let document = child(doc.root_element(), "Document").unwrap();
        assert_eq!(child_text(document, "name"), Some("bare-doc"));
    }

    #[test]
    fn test_descendants_counts() {
        let doc = roxmltree::Document::parse(NAMESPACED).unwrap();
        assert_eq!(descendants(doc.root_element(), "Placemark").len(), 2);

        let doc = roxmltree::Document::parse(BARE).unwrap();
        assert_eq!(descendants(doc.root_element(), "Placemark").len(), 1);
    }

    #[test]
    fn test_missing_lookup() {
        let doc = roxmltree::Document::parse(BARE).unwrap();
        assert!(child(doc.root_element(), "Folder").is_none());
        assert!(descendant_text(doc.root_element(), "styleUrl").is_none());
    }
}
