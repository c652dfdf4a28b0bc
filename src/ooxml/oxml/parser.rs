//! Parse markup bytes into an [`XmlTree`].
//!
//! Uses quick-xml's streaming reader. Character data is kept in its raw, escaped
//! form (entity references are stitched back into the surrounding text), each
//! attribute keeps its quoted source value, and markup outside the root element
//! is carried through untouched, so that writing the tree back produces the
//! same bytes.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::tree::{NodeId, NodeKind, XmlTree};

/// Parse a complete XML document.
pub fn parse_xml(xml: &[u8]) -> Result<XmlTree> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut tree = XmlTree::new();
    tree.set_prolog(Some(String::new()));
    let mut stack: Vec<NodeId> = Vec::with_capacity(32);
    let mut buf = Vec::with_capacity(512);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Decl(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).map_err(utf8_err)?;
                tree.set_declaration(Some(format!("<?{}?>", raw)));
            },
            Ok(Event::Start(e)) => {
                let id = open_element(&mut tree, &e)?;
                tree.set_self_closing(id, false);
                attach(&mut tree, &stack, id)?;
                stack.push(id);
            },
            Ok(Event::Empty(e)) => {
                let id = open_element(&mut tree, &e)?;
                attach(&mut tree, &stack, id)?;
            },
            Ok(Event::End(_)) => {
                stack.pop();
            },
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).map_err(utf8_err)?;
                push_text(&mut tree, &stack, raw);
            },
            Ok(Event::GeneralRef(e)) => {
                let name = std::str::from_utf8(e.as_ref()).map_err(utf8_err)?;
                push_text(&mut tree, &stack, &format!("&{};", name));
            },
            Ok(Event::CData(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).map_err(utf8_err)?;
                push_node(&mut tree, &stack, NodeKind::CData(raw.to_string()));
            },
            Ok(Event::Comment(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).map_err(utf8_err)?;
                push_node(&mut tree, &stack, NodeKind::Comment(raw.to_string()));
            },
            Ok(Event::PI(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).map_err(utf8_err)?;
                push_node(
                    &mut tree,
                    &stack,
                    NodeKind::ProcessingInstruction(raw.to_string()),
                );
            },
            Ok(Event::DocType(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).map_err(utf8_err)?;
                tree.push_misc(&format!("<!DOCTYPE {}>", raw));
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(OoxmlError::Xml(e.to_string())),
            _ => {},
        }
        buf.clear();
    }

    if tree.root().is_none() {
        return Err(OoxmlError::Xml("document has no root element".to_string()));
    }
    Ok(tree)
}

fn utf8_err(e: std::str::Utf8Error) -> OoxmlError {
    OoxmlError::Xml(format!("Invalid UTF-8 in XML: {}", e))
}

fn open_element(tree: &mut XmlTree, e: &BytesStart<'_>) -> Result<NodeId> {
    let name = e.name();
    let tag = std::str::from_utf8(name.as_ref()).map_err(utf8_err)?;
    let id = tree.create_element(tag);
    let source = e.attributes_raw();
    let mut cursor = 0;
    for attr in e.attributes() {
        let attr = attr.map_err(|err| OoxmlError::Xml(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(utf8_err)?;
        let value = attr.unescape_value()?;
        match quoted_value(source, &mut cursor, attr.value.len()) {
            Some(raw) => {
                let raw = std::str::from_utf8(raw).map_err(utf8_err)?;
                tree.set_source_attr(id, key, &value, raw.to_string());
            },
            None => tree.set_attr(id, key, &value),
        }
    }
    Ok(id)
}

/// Locate the next `="..."` or `='...'` in `source`, starting at `cursor`, whose
/// unquoted length is `len`, and advance past it.
fn quoted_value<'s>(source: &'s [u8], cursor: &mut usize, len: usize) -> Option<&'s [u8]> {
    let eq = *cursor + memchr::memchr(b'=', source.get(*cursor..)?)?;
    let skip = source[eq + 1..]
        .iter()
        .position(|b| !b.is_ascii_whitespace())?;
    let start = eq + 1 + skip;
    let quote = source[start];
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = start + len + 2;
    if source.get(end - 1) != Some(&quote) {
        return None;
    }
    *cursor = end;
    Some(&source[start..end])
}

fn attach(tree: &mut XmlTree, stack: &[NodeId], id: NodeId) -> Result<()> {
    match stack.last() {
        Some(parent) => {
            tree.append_child(*parent, id);
        },
        None if tree.root().is_none() => tree.set_root(id),
        None => {
            return Err(OoxmlError::Xml(
                "more than one root element".to_string(),
            ));
        },
    }
    Ok(())
}

/// Append a comment, CDATA section or processing instruction under the open
/// element, or keep it verbatim around the root.
fn push_node(tree: &mut XmlTree, stack: &[NodeId], kind: NodeKind) {
    match stack.last().copied() {
        Some(parent) => {
            let node = tree.create_node(kind);
            tree.append_child(parent, node);
        },
        None => {
            let raw = match kind {
                NodeKind::Comment(raw) => format!("<!--{}-->", raw),
                NodeKind::CData(raw) => format!("<![CDATA[{}]]>", raw),
                NodeKind::ProcessingInstruction(raw) => format!("<?{}?>", raw),
                NodeKind::Element(_) | NodeKind::Text(_) => return,
            };
            tree.push_misc(&raw);
        },
    }
}

/// Append raw text under the open element, merging with a preceding text node.
/// Text outside the root element goes to the prolog or epilog as is.
fn push_text(tree: &mut XmlTree, stack: &[NodeId], raw: &str) {
    let Some(parent) = stack.last().copied() else {
        tree.push_misc(raw);
        return;
    };
    if let Some(last) = tree.children(parent).last().copied() {
        if let NodeKind::Text(existing) = tree.kind(last) {
            let merged = format!("{}{}", existing, raw);
            let replacement = tree.create_raw_text(&merged);
            let index = tree.children(parent).len() - 1;
            tree.detach(last);
            tree.insert_child(parent, index, replacement);
            return;
        }
    }
    let node = tree.create_raw_text(raw);
    tree.append_child(parent, node);
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t xml:space="preserve">Tom &amp; Jerry &lt;3</w:t></w:r></w:p><!-- note --><w:sectPr/></w:body></w:document>"#;

    #[test]
    fn test_round_trip_is_byte_identical() {
        let tree = parse_xml(DOC.as_bytes()).unwrap();
        assert_eq!(tree.to_document_xml(), DOC);
    }

    #[test]
    fn test_reparse_of_serialized_subtree_is_stable() {
        let tree = parse_xml(DOC.as_bytes()).unwrap();
        let root = tree.root().unwrap();
        let body = tree.element_children(root).next().unwrap();
        let once = tree.to_xml(body);
        let again = parse_xml(once.as_bytes()).unwrap();
        assert_eq!(again.to_xml(again.root().unwrap()), once);
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let tree = parse_xml(br#"<a name="x &amp; &quot;y&quot;"/>"#).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.attr(root, "name"), Some(r#"x & "y""#));
    }

    #[test]
    fn test_character_references_in_attributes_survive() {
        let src = r#"<wp:docPr xmlns:wp="urn:wp" id="1" name="Picture 1" descr="line1&#10;line2"/>"#;
        let tree = parse_xml(src.as_bytes()).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.attr(root, "descr"), Some("line1\nline2"));
        assert_eq!(tree.to_document_xml(), src);
    }

    #[test]
    fn test_attribute_quoting_survives() {
        let src = r#"<a title='it&apos;s "x"' cmp="a > b" amp='&amp;'/>"#;
        let tree = parse_xml(src.as_bytes()).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.attr(root, "title"), Some(r#"it's "x""#));
        assert_eq!(tree.attr(root, "cmp"), Some("a > b"));
        assert_eq!(tree.to_document_xml(), src);
    }

    #[test]
    fn test_overwritten_attribute_is_escaped_afresh() {
        let mut tree = parse_xml(br#"<a title='x&apos;' keep='y'/>"#).unwrap();
        let root = tree.root().unwrap();
        tree.set_attr(root, "title", "<z>");
        assert_eq!(tree.attrs(root)[1].raw(), Some("'y'"));
        assert_eq!(tree.to_document_xml(), r#"<a title="&lt;z&gt;" keep='y'/>"#);
    }

    #[test]
    fn test_crlf_after_declaration_survives() {
        let src = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n<w:document xmlns:w=\"urn:w\"/>";
        let tree = parse_xml(src.as_bytes()).unwrap();
        assert_eq!(tree.prolog(), Some("\r\n"));
        assert_eq!(tree.to_document_xml(), src);
    }

    #[test]
    fn test_declaration_without_whitespace_survives() {
        let src = "<?xml version=\"1.0\"?><r/><!-- tail -->\n";
        let tree = parse_xml(src.as_bytes()).unwrap();
        assert_eq!(tree.to_document_xml(), src);
    }

    #[test]
    fn test_explicit_empty_element_survives() {
        let src = "<w:p xmlns:w=\"urn:w\"><w:t></w:t><w:r/></w:p>";
        let tree = parse_xml(src.as_bytes()).unwrap();
        assert_eq!(tree.to_document_xml(), src);
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(parse_xml(b""), Err(OoxmlError::Xml(_))));
    }

    #[test]
    fn test_rejects_mismatched_tags() {
        assert!(parse_xml(b"<a><b></a>").is_err());
    }
}
