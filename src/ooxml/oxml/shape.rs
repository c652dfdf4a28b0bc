//! DrawingML wrappers for inline pictures.
//!
//! Each wrapper is a copyable handle around a [`NodeId`]; all accessors take the
//! owning [`XmlTree`] explicitly. Children are created through the ordered
//! insertion routine, so the build order below does not have to follow the schema.

use crate::common::unit::Length;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::ns;
use crate::ooxml::oxml::registry::ElementClass;
use crate::ooxml::oxml::simpletypes::{
    PresetGeometry, StCoordinate, StDrawingElementId, StPositiveCoordinate, StRelationshipId,
    StShapeType, XsdBoolean, XsdString,
};
use crate::ooxml::oxml::tree::{NodeId, XmlTree};
use crate::ooxml::oxml::xmlchemy::{
    OptionalAttribute, RequiredAttribute, first_child, get_or_add_child,
};

node_handle!(CtInline);
node_handle!(CtPositiveSize2D);
node_handle!(CtNonVisualDrawingProps);
node_handle!(CtGraphicalObjectFrameLocks);
node_handle!(CtGraphicData);
node_handle!(CtPicture);
node_handle!(CtBlip);
node_handle!(CtPoint2D);
node_handle!(CtPresetGeometry2D);

/// Add (or fetch) `tag` under `parent`, ordered by the parent's class.
fn child(tree: &mut XmlTree, parent: NodeId, tag: &str) -> Result<NodeId> {
    let model = ElementClass::of(tree, parent).content_model();
    get_or_add_child(tree, parent, tag, &model)
}

/// Follow a chain of single-occurrence children, creating missing links.
fn child_path(tree: &mut XmlTree, parent: NodeId, path: &[&str]) -> Result<NodeId> {
    path.iter()
        .try_fold(parent, |node, tag| child(tree, node, tag))
}

fn find_path(tree: &XmlTree, parent: NodeId, path: &[&str]) -> Option<NodeId> {
    path.iter()
        .try_fold(parent, |node, tag| first_child(tree, node, tag))
}

const CX: RequiredAttribute<StPositiveCoordinate> = RequiredAttribute::new("cx");
const CY: RequiredAttribute<StPositiveCoordinate> = RequiredAttribute::new("cy");

impl CtPositiveSize2D {
    pub fn cx(&self, tree: &XmlTree) -> Result<Length> {
        CX.get(tree, self.0)
    }

    pub fn cy(&self, tree: &XmlTree) -> Result<Length> {
        CY.get(tree, self.0)
    }

    pub fn set_cx(&self, tree: &mut XmlTree, value: Length) -> Result<()> {
        CX.set(tree, self.0, &value)
    }

    pub fn set_cy(&self, tree: &mut XmlTree, value: Length) -> Result<()> {
        CY.set(tree, self.0, &value)
    }
}

const X: RequiredAttribute<StCoordinate> = RequiredAttribute::new("x");
const Y: RequiredAttribute<StCoordinate> = RequiredAttribute::new("y");

impl CtPoint2D {
    pub fn x(&self, tree: &XmlTree) -> Result<Length> {
        X.get(tree, self.0)
    }

    pub fn y(&self, tree: &XmlTree) -> Result<Length> {
        Y.get(tree, self.0)
    }

    pub fn set(&self, tree: &mut XmlTree, x: Length, y: Length) -> Result<()> {
        X.set(tree, self.0, &x)?;
        Y.set(tree, self.0, &y)
    }
}

const DRAWING_ID: RequiredAttribute<StDrawingElementId> = RequiredAttribute::new("id");
const NAME: RequiredAttribute<XsdString> = RequiredAttribute::new("name");
const DESCR: OptionalAttribute<XsdString> = OptionalAttribute::new("descr", None);

/// `wp:docPr` or `pic:cNvPr`.
impl CtNonVisualDrawingProps {
    pub fn id(&self, tree: &XmlTree) -> Result<u32> {
        DRAWING_ID.get(tree, self.0)
    }

    pub fn name(&self, tree: &XmlTree) -> Result<String> {
        NAME.get(tree, self.0)
    }

    pub fn descr(&self, tree: &XmlTree) -> Result<Option<String>> {
        DESCR.get(tree, self.0)
    }

    pub fn set_id(&self, tree: &mut XmlTree, id: u32) -> Result<()> {
        DRAWING_ID.set(tree, self.0, &id)
    }

    pub fn set_name(&self, tree: &mut XmlTree, name: &str) -> Result<()> {
        NAME.set(tree, self.0, &name.to_string())
    }

    pub fn set_descr(&self, tree: &mut XmlTree, descr: Option<&str>) -> Result<()> {
        DESCR.set(tree, self.0, descr.map(str::to_string).as_ref())
    }
}

const NO_CHANGE_ASPECT: OptionalAttribute<XsdBoolean> =
    OptionalAttribute::new("noChangeAspect", Some(false));

impl CtGraphicalObjectFrameLocks {
    pub fn no_change_aspect(&self, tree: &XmlTree) -> Result<bool> {
        Ok(NO_CHANGE_ASPECT.get(tree, self.0)?.unwrap_or(false))
    }

    pub fn set_no_change_aspect(&self, tree: &mut XmlTree, value: bool) -> Result<()> {
        NO_CHANGE_ASPECT.set(tree, self.0, Some(&value))
    }
}

const PRST: RequiredAttribute<StShapeType> = RequiredAttribute::new("prst");

impl CtPresetGeometry2D {
    pub fn prst(&self, tree: &XmlTree) -> Result<PresetGeometry> {
        PRST.get(tree, self.0)
    }

    pub fn set_prst(&self, tree: &mut XmlTree, value: PresetGeometry) -> Result<()> {
        PRST.set(tree, self.0, &value)
    }
}

const EMBED: OptionalAttribute<StRelationshipId> = OptionalAttribute::new("r:embed", None);
const LINK: OptionalAttribute<StRelationshipId> = OptionalAttribute::new("r:link", None);

impl CtBlip {
    /// Relationship id of the embedded image part.
    pub fn embed(&self, tree: &XmlTree) -> Result<Option<String>> {
        EMBED.get(tree, self.0)
    }

    /// Relationship id of an externally linked image.
    pub fn link(&self, tree: &XmlTree) -> Result<Option<String>> {
        LINK.get(tree, self.0)
    }

    pub fn set_embed(&self, tree: &mut XmlTree, r_id: Option<&str>) -> Result<()> {
        EMBED.set(tree, self.0, r_id.map(str::to_string).as_ref())
    }

    pub fn set_link(&self, tree: &mut XmlTree, r_id: Option<&str>) -> Result<()> {
        LINK.set(tree, self.0, r_id.map(str::to_string).as_ref())
    }
}

impl CtPicture {
    /// A complete `pic:pic` for an embedded image, declaring its own `pic` prefix.
    pub fn new_pic(
        tree: &mut XmlTree,
        filename: &str,
        r_id: &str,
        cx: Length,
        cy: Length,
    ) -> Result<Self> {
        let pic = tree.create_element("pic:pic");
        tree.set_attr(pic, "xmlns:pic", ns::PIC);

        let c_nv_pr =
            CtNonVisualDrawingProps::new(child_path(tree, pic, &["pic:nvPicPr", "pic:cNvPr"])?);
        c_nv_pr.set_id(tree, 0)?;
        c_nv_pr.set_name(tree, filename)?;
        child_path(tree, pic, &["pic:nvPicPr", "pic:cNvPicPr"])?;

        child_path(tree, pic, &["pic:blipFill", "a:stretch", "a:fillRect"])?;
        let blip = CtBlip::new(child_path(tree, pic, &["pic:blipFill", "a:blip"])?);
        blip.set_embed(tree, Some(r_id))?;

        let sp_pr = child(tree, pic, "pic:spPr")?;
        let geom = CtPresetGeometry2D::new(child(tree, sp_pr, "a:prstGeom")?);
        geom.set_prst(tree, PresetGeometry::Rectangle)?;
        let ext = CtPositiveSize2D::new(child_path(tree, sp_pr, &["a:xfrm", "a:ext"])?);
        ext.set_cx(tree, cx)?;
        ext.set_cy(tree, cy)?;
        let off = CtPoint2D::new(child_path(tree, sp_pr, &["a:xfrm", "a:off"])?);
        off.set(tree, Length::ZERO, Length::ZERO)?;

        Ok(Self(pic))
    }

    pub fn blip(&self, tree: &XmlTree) -> Option<CtBlip> {
        find_path(tree, self.0, &["pic:blipFill", "a:blip"]).map(CtBlip)
    }

    pub fn c_nv_pr(&self, tree: &XmlTree) -> Option<CtNonVisualDrawingProps> {
        find_path(tree, self.0, &["pic:nvPicPr", "pic:cNvPr"]).map(CtNonVisualDrawingProps)
    }

    pub fn ext(&self, tree: &XmlTree) -> Option<CtPositiveSize2D> {
        find_path(tree, self.0, &["pic:spPr", "a:xfrm", "a:ext"]).map(CtPositiveSize2D)
    }
}

impl CtGraphicData {
    /// Declared content namespace (`@uri`).
    pub fn uri<'a>(&self, tree: &'a XmlTree) -> Option<&'a str> {
        tree.attr(self.0, "uri")
    }

    pub fn pic(&self, tree: &XmlTree) -> Option<CtPicture> {
        first_child(tree, self.0, "pic:pic").map(CtPicture)
    }

    /// The first `a:blip` anywhere below, for pictures nested in unusual wrappers.
    pub fn blip(&self, tree: &XmlTree) -> Option<CtBlip> {
        tree.find_descendant(self.0, "a:blip").map(CtBlip)
    }
}

impl CtInline {
    /// A detached `wp:inline` holding a picture of the given size.
    ///
    /// `wp:docPr` carries the document-wide `shape_id` and the name
    /// `Picture {shape_id}`; the nested `pic:cNvPr` uses id 0 and the image
    /// filename.
    pub fn new_pic_inline(
        tree: &mut XmlTree,
        shape_id: u32,
        r_id: &str,
        filename: &str,
        cx: Length,
        cy: Length,
    ) -> Result<Self> {
        let decls = ns::nsdecls(&["wp", "a", "pic", "r", "w"]);
        let attrs: Vec<(&str, &str)> = decls.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        let inline = Self(tree.create_element_with_attrs("wp:inline", &attrs));

        let doc_pr = CtNonVisualDrawingProps::new(child(tree, inline.0, "wp:docPr")?);
        doc_pr.set_id(tree, shape_id)?;
        doc_pr.set_name(tree, &format!("Picture {}", shape_id))?;

        let locks = CtGraphicalObjectFrameLocks::new(child_path(
            tree,
            inline.0,
            &["wp:cNvGraphicFramePr", "a:graphicFrameLocks"],
        )?);
        locks.set_no_change_aspect(tree, true)?;

        let graphic_data = child_path(tree, inline.0, &["a:graphic", "a:graphicData"])?;
        tree.set_attr(graphic_data, "uri", ns::PIC);
        let pic = CtPicture::new_pic(tree, filename, r_id, cx, cy)?;
        // already declared on the inline
        tree.remove_attr(pic.0, "xmlns:pic");
        tree.append_child(graphic_data, pic.0);

        let extent = inline.get_or_add_extent(tree)?;
        extent.set_cx(tree, cx)?;
        extent.set_cy(tree, cy)?;

        Ok(inline)
    }

    pub fn extent(&self, tree: &XmlTree) -> Option<CtPositiveSize2D> {
        first_child(tree, self.0, "wp:extent").map(CtPositiveSize2D)
    }

    pub fn get_or_add_extent(&self, tree: &mut XmlTree) -> Result<CtPositiveSize2D> {
        child(tree, self.0, "wp:extent").map(CtPositiveSize2D)
    }

    /// The extent, or an error naming the malformed inline.
    pub fn require_extent(&self, tree: &XmlTree) -> Result<CtPositiveSize2D> {
        self.extent(tree)
            .ok_or_else(|| OoxmlError::Xml("<wp:inline> has no <wp:extent>".to_string()))
    }

    pub fn doc_pr(&self, tree: &XmlTree) -> Option<CtNonVisualDrawingProps> {
        first_child(tree, self.0, "wp:docPr").map(CtNonVisualDrawingProps)
    }

    pub fn graphic_data(&self, tree: &XmlTree) -> Option<CtGraphicData> {
        find_path(tree, self.0, &["a:graphic", "a:graphicData"]).map(CtGraphicData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::oxml::parser::parse_xml;

    fn expected_inline(shape_id: u32, r_id: &str, filename: &str, cx: i64, cy: i64) -> String {
        format!(
            concat!(
                r#"<wp:inline xmlns:wp="{wp}" xmlns:a="{a}" xmlns:pic="{pic}" xmlns:r="{r}" xmlns:w="{w}">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="{pic}">"#,
                r#"<pic:pic>"#,
                r#"<pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"/></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline>"#,
            ),
            wp = ns::WP,
            a = ns::A,
            pic = ns::PIC,
            r = ns::R,
            w = ns::W,
            cx = cx,
            cy = cy,
            id = shape_id,
            name = filename,
            rid = r_id,
        )
    }

    #[test]
    fn test_new_pic_inline_is_schema_ordered() {
        let mut tree = XmlTree::new();
        let inline = CtInline::new_pic_inline(
            &mut tree,
            42,
            "rId7",
            "monty.png",
            Length::from_emus(914_400),
            Length::from_emus(457_200),
        )
        .unwrap();
        assert_eq!(
            tree.to_xml(inline.node()),
            expected_inline(42, "rId7", "monty.png", 914_400, 457_200)
        );
    }

    #[test]
    fn test_standalone_pic_declares_its_prefix() {
        let mut tree = XmlTree::new();
        let pic = CtPicture::new_pic(
            &mut tree,
            "x.png",
            "rId1",
            Length::from_emus(1),
            Length::from_emus(1),
        )
        .unwrap();
        assert_eq!(tree.attr(pic.0, "xmlns:pic"), Some(ns::PIC));
        assert_eq!(tree.namespace_uri(pic.0), Some(ns::PIC));
    }

    #[test]
    fn test_extent_accessors() {
        let xml = format!(
            r#"<wp:inline xmlns:wp="{}"><wp:extent cx="333" cy="666"/><wp:docPr id="1" name="x"/></wp:inline>"#,
            ns::WP
        );
        let mut tree = parse_xml(xml.as_bytes()).unwrap();
        let inline = CtInline::new(tree.root().unwrap());
        let extent = inline.extent(&tree).unwrap();
        assert_eq!(extent.cx(&tree).unwrap(), Length::from_emus(333));
        assert_eq!(extent.cy(&tree).unwrap(), Length::from_emus(666));

        extent.set_cx(&mut tree, Length::from_emus(444)).unwrap();
        assert_eq!(
            tree.to_xml(extent.node()),
            r#"<wp:extent cx="444" cy="666"/>"#
        );
    }

    #[test]
    fn test_missing_extent_is_added_first() {
        let xml = format!(
            r#"<wp:inline xmlns:wp="{}"><wp:docPr id="1" name="x"/></wp:inline>"#,
            ns::WP
        );
        let mut tree = parse_xml(xml.as_bytes()).unwrap();
        let inline = CtInline::new(tree.root().unwrap());
        assert!(inline.require_extent(&tree).is_err());
        let extent = inline.get_or_add_extent(&mut tree).unwrap();
        let first = tree.element_children(inline.node()).next();
        assert_eq!(first, Some(extent.node()));
    }

    #[test]
    fn test_blip_references() {
        let xml = format!(
            r#"<a:blip xmlns:a="{}" xmlns:r="{}" r:embed="rId1"/>"#,
            ns::A,
            ns::R
        );
        let mut tree = parse_xml(xml.as_bytes()).unwrap();
        let blip = CtBlip::new(tree.root().unwrap());
        assert_eq!(blip.embed(&tree).unwrap().as_deref(), Some("rId1"));
        assert_eq!(blip.link(&tree).unwrap(), None);
        blip.set_embed(&mut tree, None).unwrap();
        assert_eq!(tree.attr(blip.node(), "r:embed"), None);
    }

    #[test]
    fn test_doc_pr_descr_is_optional() {
        let mut tree = XmlTree::with_root("wp:docPr");
        let props = CtNonVisualDrawingProps::new(tree.root().unwrap());
        assert_eq!(props.descr(&tree).unwrap(), None);
        props.set_descr(&mut tree, Some("A cat")).unwrap();
        assert_eq!(props.descr(&tree).unwrap().as_deref(), Some("A cat"));
        assert!(props.id(&tree).is_err());
    }
}
