//! WordprocessingML block and run wrappers: just enough of the document body to
//! host inline drawings.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::ns;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::shape::CtInline;
use crate::ooxml::oxml::tree::{NodeId, XmlTree};
use crate::ooxml::oxml::xmlchemy::{
    add_child, children_with_tag, first_child, get_or_add_child, insert_in_order,
};

node_handle!(CtDocument);
node_handle!(CtBody);
node_handle!(CtP);
node_handle!(CtR);
node_handle!(CtDrawing);

impl CtDocument {
    /// A new tree holding `<w:document><w:body/></w:document>` with the
    /// namespaces an editable body needs.
    pub fn new_tree() -> Result<(XmlTree, CtDocument)> {
        let mut tree = XmlTree::new();
        tree.set_declaration(Some(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#.to_string(),
        ));
        let decls = ns::nsdecls(&["w", "r", "wp", "a", "pic"]);
        let attrs: Vec<(&str, &str)> = decls.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        let root = tree.create_element_with_attrs("w:document", &attrs);
        tree.set_root(root);
        let document = CtDocument(root);
        document.get_or_add_body(&mut tree)?;
        Ok((tree, document))
    }

    /// The `w:document` root of `tree`.
    pub fn from_tree(tree: &XmlTree) -> Result<CtDocument> {
        let root = tree
            .root()
            .ok_or_else(|| OoxmlError::Xml("document part has no root".to_string()))?;
        if !tree.is_tag(root, "w:document") {
            return Err(OoxmlError::Xml(format!(
                "expected <w:document> root, found <{}>",
                tree.tag(root).unwrap_or("?")
            )));
        }
        Ok(CtDocument(root))
    }

    pub fn body(&self, tree: &XmlTree) -> Option<CtBody> {
        first_child(tree, self.0, "w:body").map(CtBody)
    }

    pub fn get_or_add_body(&self, tree: &mut XmlTree) -> Result<CtBody> {
        let model = ElementClass::Document.content_model();
        get_or_add_child(tree, self.0, "w:body", &model).map(CtBody)
    }
}

impl CtBody {
    /// Append a paragraph in body order, i.e. before a trailing `w:sectPr`.
    pub fn add_p(&self, tree: &mut XmlTree) -> Result<CtP> {
        add_child(tree, self.0, "w:p", &ElementClass::Body.content_model()).map(CtP)
    }

    pub fn paragraphs(&self, tree: &XmlTree) -> Vec<CtP> {
        children_with_tag(tree, self.0, "w:p")
            .into_iter()
            .map(CtP)
            .collect()
    }

    pub fn sect_pr(&self, tree: &XmlTree) -> Option<NodeId> {
        first_child(tree, self.0, "w:sectPr")
    }
}

impl CtP {
    /// Append a new empty run after the paragraph's existing content.
    pub fn add_r(&self, tree: &mut XmlTree) -> Result<CtR> {
        add_child(tree, self.0, "w:r", &ElementClass::Paragraph.content_model()).map(CtR)
    }

    pub fn runs(&self, tree: &XmlTree) -> Vec<CtR> {
        children_with_tag(tree, self.0, "w:r")
            .into_iter()
            .map(CtR)
            .collect()
    }
}

impl CtR {
    /// Add a `w:drawing` holding `inline` as its only child.
    pub fn add_drawing(&self, tree: &mut XmlTree, inline: CtInline) -> Result<CtDrawing> {
        let drawing = add_child(tree, self.0, "w:drawing", &ElementClass::Run.content_model())?;
        insert_in_order(
            tree,
            drawing,
            inline.node(),
            "wp:inline",
            &ElementClass::Drawing.content_model(),
        )?;
        Ok(CtDrawing(drawing))
    }

    /// Append a `w:t` with `text`, preserving surrounding whitespace.
    pub fn add_t(&self, tree: &mut XmlTree, text: &str) -> Result<NodeId> {
        let t = add_child(tree, self.0, "w:t", &ElementClass::Run.content_model())?;
        if text.trim() != text {
            tree.set_attr(t, "xml:space", "preserve");
        }
        let content = tree.create_text(text);
        tree.append_child(t, content);
        Ok(t)
    }

    /// The paragraph (or other container) holding this run.
    pub fn container(&self, tree: &XmlTree) -> Option<NodeId> {
        tree.parent(self.0)
    }

    /// Append a new empty run to `container`, in schema order when the
    /// container's content model places runs.
    pub fn append_to(tree: &mut XmlTree, container: NodeId) -> Result<CtR> {
        let model = ElementClass::of(tree, container).content_model();
        if model.rank_of_tag("w:r").is_some() {
            return add_child(tree, container, "w:r", &model).map(CtR);
        }
        let r = tree.create_element("w:r");
        tree.append_child(container, r);
        Ok(CtR(r))
    }
}

impl CtDrawing {
    pub fn inline(&self, tree: &XmlTree) -> Option<CtInline> {
        first_child(tree, self.0, "wp:inline").map(CtInline::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::unit::Length;
    use crate::ooxml::oxml::parser::parse_xml;

    #[test]
    fn test_paragraph_goes_before_sect_pr() {
        let xml = format!(
            r#"<w:document xmlns:w="{}"><w:body><w:p/><w:sectPr/></w:body></w:document>"#,
            ns::W
        );
        let mut tree = parse_xml(xml.as_bytes()).unwrap();
        let doc = CtDocument::from_tree(&tree).unwrap();
        let body = doc.body(&tree).unwrap();
        let p = body.add_p(&mut tree).unwrap();
        let children: Vec<NodeId> = tree.element_children(body.node()).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1], p.node());
        assert_eq!(body.sect_pr(&tree), Some(children[2]));
        assert_eq!(body.paragraphs(&tree).len(), 2);
    }

    #[test]
    fn test_new_document_tree() {
        let (tree, doc) = CtDocument::new_tree().unwrap();
        assert!(doc.body(&tree).is_some());
        assert!(tree.to_document_xml().starts_with("<?xml"));
        assert!(tree.to_document_xml().ends_with("<w:body/></w:document>"));
    }

    #[test]
    fn test_from_tree_rejects_foreign_root() {
        let tree = XmlTree::with_root("w:body");
        assert!(CtDocument::from_tree(&tree).is_err());
    }

    #[test]
    fn test_drawing_follows_run_properties() {
        let xml = format!(
            r#"<w:r xmlns:w="{}"><w:rPr><w:b/></w:rPr><w:t>a</w:t></w:r>"#,
            ns::W
        );
        let mut tree = parse_xml(xml.as_bytes()).unwrap();
        let r = CtR::new(tree.root().unwrap());
        let inline = CtInline::new_pic_inline(
            &mut tree,
            1,
            "rId1",
            "x.png",
            Length::from_emus(10),
            Length::from_emus(10),
        )
        .unwrap();
        let drawing = r.add_drawing(&mut tree, inline).unwrap();
        let tags: Vec<&str> = tree
            .element_children(r.node())
            .filter_map(|c| tree.tag(c))
            .collect();
        assert_eq!(tags, ["w:rPr", "w:t", "w:drawing"]);
        assert_eq!(drawing.inline(&tree), Some(inline));
        assert_eq!(tree.children(drawing.node()).len(), 1);
    }

    #[test]
    fn test_add_t_preserves_space() {
        let mut tree = XmlTree::with_root("w:r");
        let r = CtR::new(tree.root().unwrap());
        let t = r.add_t(&mut tree, " Tom & Jerry").unwrap();
        assert_eq!(
            tree.to_xml(t),
            r#"<w:t xml:space="preserve"> Tom &amp; Jerry</w:t>"#
        );
    }

    #[test]
    fn test_append_to_container() {
        let xml = format!(
            r#"<w:p xmlns:w="{w}"><w:pPr/><w:r/></w:p>"#,
            w = ns::W
        );
        let mut tree = parse_xml(xml.as_bytes()).unwrap();
        let p = tree.root().unwrap();
        let first = CtP::new(p).runs(&tree)[0];
        let container = first.container(&tree).unwrap();
        let r = CtR::append_to(&mut tree, container).unwrap();
        assert_eq!(CtP::new(p).runs(&tree), [first, r]);

        let mut tree = XmlTree::with_root("w:hyperlink");
        let link = tree.root().unwrap();
        let r = CtR::append_to(&mut tree, link).unwrap();
        assert_eq!(tree.children(link), [r.node()]);
    }
}
