//! Element class registry.
//!
//! Maps a qualified element name to the class that knows its content model and
//! typed wrapper. Lookup is a compile-time perfect-hash table keyed by the
//! canonical prefixed tag. Anything not in the table resolves to
//! [`ElementClass::Unrecognized`] and is carried through untouched.

use phf::phf_map;

use crate::ooxml::oxml::ns;
use crate::ooxml::oxml::shape::{
    CtBlip, CtGraphicData, CtGraphicalObjectFrameLocks, CtInline, CtNonVisualDrawingProps,
    CtPicture, CtPoint2D, CtPositiveSize2D, CtPresetGeometry2D,
};
use crate::ooxml::oxml::text::{CtBody, CtDocument, CtDrawing, CtP, CtR};
use crate::ooxml::oxml::tree::{NodeId, XmlTree};
use crate::ooxml::oxml::xmlchemy::{ContentModel, Slot};

/// Every element class this crate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
    // WordprocessingML
    Document,
    Body,
    Paragraph,
    Run,
    Text,
    Drawing,
    SectionProperties,
    // wordprocessingDrawing
    Inline,
    Anchor,
    Extent,
    EffectExtent,
    DocPr,
    CNvGraphicFramePr,
    // DrawingML
    GraphicFrameLocks,
    Graphic,
    GraphicData,
    Blip,
    Stretch,
    FillRect,
    Xfrm,
    Off,
    Ext,
    PrstGeom,
    // picture
    Picture,
    NvPicPr,
    CNvPr,
    CNvPicPr,
    BlipFill,
    SpPr,
    Unrecognized,
}

static REGISTRY: phf::Map<&'static str, ElementClass> = phf_map! {
    "w:document" => ElementClass::Document,
    "w:body" => ElementClass::Body,
    "w:p" => ElementClass::Paragraph,
    "w:r" => ElementClass::Run,
    "w:t" => ElementClass::Text,
    "w:drawing" => ElementClass::Drawing,
    "w:sectPr" => ElementClass::SectionProperties,
    "wp:inline" => ElementClass::Inline,
    "wp:anchor" => ElementClass::Anchor,
    "wp:extent" => ElementClass::Extent,
    "wp:effectExtent" => ElementClass::EffectExtent,
    "wp:docPr" => ElementClass::DocPr,
    "wp:cNvGraphicFramePr" => ElementClass::CNvGraphicFramePr,
    "a:graphicFrameLocks" => ElementClass::GraphicFrameLocks,
    "a:graphic" => ElementClass::Graphic,
    "a:graphicData" => ElementClass::GraphicData,
    "a:blip" => ElementClass::Blip,
    "a:stretch" => ElementClass::Stretch,
    "a:fillRect" => ElementClass::FillRect,
    "a:xfrm" => ElementClass::Xfrm,
    "a:off" => ElementClass::Off,
    "a:ext" => ElementClass::Ext,
    "a:prstGeom" => ElementClass::PrstGeom,
    "pic:pic" => ElementClass::Picture,
    "pic:nvPicPr" => ElementClass::NvPicPr,
    "pic:cNvPr" => ElementClass::CNvPr,
    "pic:cNvPicPr" => ElementClass::CNvPicPr,
    "pic:blipFill" => ElementClass::BlipFill,
    "pic:spPr" => ElementClass::SpPr,
};

const RUN_CONTENT: &[&str] = &[
    "w:br",
    "w:t",
    "w:contentPart",
    "w:delText",
    "w:instrText",
    "w:delInstrText",
    "w:noBreakHyphen",
    "w:softHyphen",
    "w:annotationRef",
    "w:footnoteRef",
    "w:endnoteRef",
    "w:separator",
    "w:continuationSeparator",
    "w:sym",
    "w:pgNum",
    "w:cr",
    "w:tab",
    "w:object",
    "w:pict",
    "w:fldChar",
    "w:ruby",
    "w:footnoteReference",
    "w:endnoteReference",
    "w:commentReference",
    "w:drawing",
    "w:ptab",
    "w:lastRenderedPageBreak",
];

const PARAGRAPH_CONTENT: &[&str] = &[
    "w:r",
    "w:hyperlink",
    "w:fldSimple",
    "w:sdt",
    "w:customXml",
    "w:smartTag",
    "w:ins",
    "w:del",
    "w:proofErr",
    "w:bookmarkStart",
    "w:bookmarkEnd",
    "w:commentRangeStart",
    "w:commentRangeEnd",
    "m:oMath",
    "m:oMathPara",
];

const BLOCK_CONTENT: &[&str] = &[
    "w:p",
    "w:tbl",
    "w:sdt",
    "w:customXml",
    "w:bookmarkStart",
    "w:bookmarkEnd",
    "w:altChunk",
];

const DOCUMENT: ContentModel = ContentModel::new(&[Slot::One("w:background"), Slot::One("w:body")]);
const BODY: ContentModel =
    ContentModel::new(&[Slot::Choice(BLOCK_CONTENT), Slot::One("w:sectPr")]);
const PARAGRAPH: ContentModel =
    ContentModel::new(&[Slot::One("w:pPr"), Slot::Choice(PARAGRAPH_CONTENT)]);
const RUN: ContentModel = ContentModel::new(&[Slot::One("w:rPr"), Slot::Choice(RUN_CONTENT)]);
const DRAWING: ContentModel = ContentModel::new(&[Slot::Choice(&["wp:anchor", "wp:inline"])]);

const INLINE: ContentModel = ContentModel::new(&[
    Slot::One("wp:extent"),
    Slot::One("wp:effectExtent"),
    Slot::One("wp:docPr"),
    Slot::One("wp:cNvGraphicFramePr"),
    Slot::One("a:graphic"),
]);
const DOC_PR: ContentModel = ContentModel::new(&[
    Slot::One("a:hlinkClick"),
    Slot::One("a:hlinkHover"),
    Slot::One("a:extLst"),
]);
const C_NV_GRAPHIC_FRAME_PR: ContentModel =
    ContentModel::new(&[Slot::One("a:graphicFrameLocks"), Slot::One("a:extLst")]);
const GRAPHIC: ContentModel = ContentModel::new(&[Slot::One("a:graphicData")]);
const GRAPHIC_DATA: ContentModel =
    ContentModel::new(&[Slot::Choice(&["pic:pic", "c:chart", "dgm:relIds"])]);

const PICTURE: ContentModel = ContentModel::new(&[
    Slot::One("pic:nvPicPr"),
    Slot::One("pic:blipFill"),
    Slot::One("pic:spPr"),
    Slot::One("pic:style"),
    Slot::One("pic:extLst"),
]);
const NV_PIC_PR: ContentModel =
    ContentModel::new(&[Slot::One("pic:cNvPr"), Slot::One("pic:cNvPicPr")]);
const C_NV_PIC_PR: ContentModel =
    ContentModel::new(&[Slot::One("a:picLocks"), Slot::One("a:extLst")]);
const BLIP_FILL: ContentModel = ContentModel::new(&[
    Slot::One("a:blip"),
    Slot::One("a:srcRect"),
    Slot::Choice(&["a:tile", "a:stretch"]),
]);
const BLIP: ContentModel = ContentModel::new(&[
    Slot::Choice(&[
        "a:alphaBiLevel",
        "a:alphaCeiling",
        "a:alphaFloor",
        "a:alphaInv",
        "a:alphaMod",
        "a:alphaModFix",
        "a:alphaRepl",
        "a:biLevel",
        "a:blur",
        "a:clrChange",
        "a:clrRepl",
        "a:duotone",
        "a:fillOverlay",
        "a:grayscl",
        "a:hsl",
        "a:lum",
        "a:tint",
    ]),
    Slot::One("a:extLst"),
]);
const STRETCH: ContentModel = ContentModel::new(&[Slot::One("a:fillRect")]);
const SP_PR: ContentModel = ContentModel::new(&[
    Slot::One("a:xfrm"),
    Slot::Choice(&["a:custGeom", "a:prstGeom"]),
    Slot::Choice(&[
        "a:noFill",
        "a:solidFill",
        "a:gradFill",
        "a:blipFill",
        "a:pattFill",
        "a:grpFill",
    ]),
    Slot::One("a:ln"),
    Slot::Choice(&["a:effectLst", "a:effectDag"]),
    Slot::One("a:scene3d"),
    Slot::One("a:sp3d"),
    Slot::One("a:extLst"),
]);
const XFRM: ContentModel = ContentModel::new(&[Slot::One("a:off"), Slot::One("a:ext")]);
const PRST_GEOM: ContentModel = ContentModel::new(&[Slot::One("a:avLst")]);

impl ElementClass {
    /// Class for the element named `local` in namespace `uri`.
    pub fn lookup(uri: Option<&str>, local: &str) -> ElementClass {
        let Some(prefix) = uri.and_then(ns::prefix_for) else {
            return ElementClass::Unrecognized;
        };
        let mut key = String::with_capacity(prefix.len() + 1 + local.len());
        key.push_str(prefix);
        key.push(':');
        key.push_str(local);
        REGISTRY
            .get(key.as_str())
            .copied()
            .unwrap_or(ElementClass::Unrecognized)
    }

    /// Class of an existing node. Non-element nodes are `Unrecognized`.
    pub fn of(tree: &XmlTree, node: NodeId) -> ElementClass {
        match tree.local_name(node) {
            Some(local) => ElementClass::lookup(tree.namespace_uri(node), local),
            None => ElementClass::Unrecognized,
        }
    }

    /// Canonical prefixed tag, `None` for `Unrecognized`.
    pub fn tag(&self) -> Option<&'static str> {
        REGISTRY
            .entries()
            .find(|(_, class)| *class == self)
            .map(|(tag, _)| *tag)
    }

    /// Permissible children in schema order. Leaf and unrecognized classes have an
    /// empty model.
    pub fn content_model(&self) -> ContentModel {
        match self {
            ElementClass::Document => DOCUMENT,
            ElementClass::Body => BODY,
            ElementClass::Paragraph => PARAGRAPH,
            ElementClass::Run => RUN,
            ElementClass::Drawing => DRAWING,
            ElementClass::Inline => INLINE,
            ElementClass::DocPr | ElementClass::CNvPr => DOC_PR,
            ElementClass::CNvGraphicFramePr => C_NV_GRAPHIC_FRAME_PR,
            ElementClass::Graphic => GRAPHIC,
            ElementClass::GraphicData => GRAPHIC_DATA,
            ElementClass::Picture => PICTURE,
            ElementClass::NvPicPr => NV_PIC_PR,
            ElementClass::CNvPicPr => C_NV_PIC_PR,
            ElementClass::BlipFill => BLIP_FILL,
            ElementClass::Blip => BLIP,
            ElementClass::Stretch => STRETCH,
            ElementClass::SpPr => SP_PR,
            ElementClass::Xfrm => XFRM,
            ElementClass::PrstGeom => PRST_GEOM,
            ElementClass::Text
            | ElementClass::SectionProperties
            | ElementClass::Anchor
            | ElementClass::Extent
            | ElementClass::EffectExtent
            | ElementClass::GraphicFrameLocks
            | ElementClass::FillRect
            | ElementClass::Off
            | ElementClass::Ext
            | ElementClass::Unrecognized => ContentModel::EMPTY,
        }
    }
}

/// A raw node viewed through its element class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OxmlElement {
    Document(CtDocument),
    Body(CtBody),
    Paragraph(CtP),
    Run(CtR),
    Drawing(CtDrawing),
    Inline(CtInline),
    /// `wp:extent` and `a:ext`
    Extent(CtPositiveSize2D),
    /// `wp:docPr` and `pic:cNvPr`
    NonVisualProps(CtNonVisualDrawingProps),
    FrameLocks(CtGraphicalObjectFrameLocks),
    GraphicData(CtGraphicData),
    Picture(CtPicture),
    Blip(CtBlip),
    Offset(CtPoint2D),
    PresetGeometry(CtPresetGeometry2D),
    /// Modeled for ordering only; no dedicated accessors
    Element { class: ElementClass, node: NodeId },
    Unrecognized(NodeId),
}

impl OxmlElement {
    /// Select the typed wrapper for `node`. Never fails: unknown markup comes back
    /// as `Unrecognized`.
    pub fn wrap(tree: &XmlTree, node: NodeId) -> OxmlElement {
        match ElementClass::of(tree, node) {
            ElementClass::Document => OxmlElement::Document(CtDocument::new(node)),
            ElementClass::Body => OxmlElement::Body(CtBody::new(node)),
            ElementClass::Paragraph => OxmlElement::Paragraph(CtP::new(node)),
            ElementClass::Run => OxmlElement::Run(CtR::new(node)),
            ElementClass::Drawing => OxmlElement::Drawing(CtDrawing::new(node)),
            ElementClass::Inline => OxmlElement::Inline(CtInline::new(node)),
            ElementClass::Extent | ElementClass::Ext => {
                OxmlElement::Extent(CtPositiveSize2D::new(node))
            },
            ElementClass::DocPr | ElementClass::CNvPr => {
                OxmlElement::NonVisualProps(CtNonVisualDrawingProps::new(node))
            },
            ElementClass::GraphicFrameLocks => {
                OxmlElement::FrameLocks(CtGraphicalObjectFrameLocks::new(node))
            },
            ElementClass::GraphicData => OxmlElement::GraphicData(CtGraphicData::new(node)),
            ElementClass::Picture => OxmlElement::Picture(CtPicture::new(node)),
            ElementClass::Blip => OxmlElement::Blip(CtBlip::new(node)),
            ElementClass::Off => OxmlElement::Offset(CtPoint2D::new(node)),
            ElementClass::PrstGeom => {
                OxmlElement::PresetGeometry(CtPresetGeometry2D::new(node))
            },
            ElementClass::Unrecognized => OxmlElement::Unrecognized(node),
            class => OxmlElement::Element { class, node },
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            OxmlElement::Document(e) => e.node(),
            OxmlElement::Body(e) => e.node(),
            OxmlElement::Paragraph(e) => e.node(),
            OxmlElement::Run(e) => e.node(),
            OxmlElement::Drawing(e) => e.node(),
            OxmlElement::Inline(e) => e.node(),
            OxmlElement::Extent(e) => e.node(),
            OxmlElement::NonVisualProps(e) => e.node(),
            OxmlElement::FrameLocks(e) => e.node(),
            OxmlElement::GraphicData(e) => e.node(),
            OxmlElement::Picture(e) => e.node(),
            OxmlElement::Blip(e) => e.node(),
            OxmlElement::Offset(e) => e.node(),
            OxmlElement::PresetGeometry(e) => e.node(),
            OxmlElement::Element { node, .. } | OxmlElement::Unrecognized(node) => *node,
        }
    }

    pub fn class(&self, tree: &XmlTree) -> ElementClass {
        match self {
            OxmlElement::Element { class, .. } => *class,
            OxmlElement::Unrecognized(_) => ElementClass::Unrecognized,
            other => ElementClass::of(tree, other.node()),
        }
    }
}
