/// Inline shapes: drawings that sit in the text flow of a run.
///
/// Only `wp:inline` elements directly under a `w:drawing` count; floating
/// (`wp:anchor`) drawings are not part of this collection.
use crate::common::unit::Length;
use crate::ooxml::docx::image::Image;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::oxml::ns;
use crate::ooxml::oxml::shape::{CtBlip, CtInline};
use crate::ooxml::oxml::text::{CtBody, CtR};
use crate::ooxml::oxml::tree::{NodeId, XmlTree};

/// What an inline shape holds, judged from its `a:graphicData/@uri`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineShapeType {
    /// Picture stored in the package
    Picture,
    /// Picture referenced by an external link
    LinkedPicture,
    Chart,
    SmartArt,
    /// Any other graphic content
    NotImplemented,
}

fn blip_of(tree: &XmlTree, inline: CtInline) -> Option<CtBlip> {
    let graphic_data = inline.graphic_data(tree)?;
    graphic_data
        .pic(tree)
        .and_then(|pic| pic.blip(tree))
        .or_else(|| graphic_data.blip(tree))
}

fn shape_type_of(tree: &XmlTree, inline: CtInline) -> InlineShapeType {
    let Some(uri) = inline.graphic_data(tree).and_then(|gd| gd.uri(tree)) else {
        return InlineShapeType::NotImplemented;
    };
    match uri {
        ns::PIC => match blip_of(tree, inline) {
            Some(blip) if matches!(blip.link(tree), Ok(Some(_))) => InlineShapeType::LinkedPicture,
            _ => InlineShapeType::Picture,
        },
        ns::C => InlineShapeType::Chart,
        ns::DGM => InlineShapeType::SmartArt,
        _ => InlineShapeType::NotImplemented,
    }
}

/// Read view of one inline shape.
#[derive(Debug, Clone, Copy)]
pub struct InlineShape<'a> {
    tree: &'a XmlTree,
    inline: CtInline,
}

impl<'a> InlineShape<'a> {
    pub fn new(tree: &'a XmlTree, inline: CtInline) -> Self {
        Self { tree, inline }
    }

    /// Build a picture inline and attach it to `run_container`.
    ///
    /// A new `w:r` is appended to the container, holding a new `w:drawing` whose
    /// only child is the returned inline. The extent is the image's natural size.
    pub fn new_picture(
        tree: &mut XmlTree,
        run_container: NodeId,
        image: &Image,
        r_id: &str,
        shape_id: u32,
    ) -> Result<CtInline> {
        let run = CtR::append_to(tree, run_container)?;
        let inline = CtInline::new_pic_inline(
            tree,
            shape_id,
            r_id,
            image.filename(),
            image.default_cx(),
            image.default_cy(),
        )?;
        run.add_drawing(tree, inline)?;
        Ok(inline)
    }

    #[inline]
    pub fn element(&self) -> CtInline {
        self.inline
    }

    pub fn shape_type(&self) -> InlineShapeType {
        shape_type_of(self.tree, self.inline)
    }

    pub fn width(&self) -> Result<Length> {
        self.inline.require_extent(self.tree)?.cx(self.tree)
    }

    pub fn height(&self) -> Result<Length> {
        self.inline.require_extent(self.tree)?.cy(self.tree)
    }

    /// Relationship id of the embedded image, if the shape has one.
    pub fn r_id(&self) -> Result<Option<String>> {
        match blip_of(self.tree, self.inline) {
            Some(blip) => blip.embed(self.tree),
            None => Ok(None),
        }
    }

    /// `wp:docPr/@id`.
    pub fn shape_id(&self) -> Result<u32> {
        self.inline
            .doc_pr(self.tree)
            .ok_or_else(|| OoxmlError::Xml("<wp:inline> has no <wp:docPr>".to_string()))?
            .id(self.tree)
    }
}

/// Write view of one inline shape.
#[derive(Debug)]
pub struct InlineShapeMut<'a> {
    tree: &'a mut XmlTree,
    inline: CtInline,
}

impl<'a> InlineShapeMut<'a> {
    pub fn new(tree: &'a mut XmlTree, inline: CtInline) -> Self {
        Self { tree, inline }
    }

    pub fn as_shape(&self) -> InlineShape<'_> {
        InlineShape::new(&*self.tree, self.inline)
    }

    pub fn shape_type(&self) -> InlineShapeType {
        self.as_shape().shape_type()
    }

    pub fn width(&self) -> Result<Length> {
        self.as_shape().width()
    }

    pub fn height(&self) -> Result<Length> {
        self.as_shape().height()
    }

    /// Set `wp:extent/@cx`. The picture's own `a:ext` is left alone.
    pub fn set_width(&mut self, width: Length) -> Result<()> {
        self.inline.require_extent(self.tree)?.set_cx(self.tree, width)
    }

    /// Set `wp:extent/@cy`.
    pub fn set_height(&mut self, height: Length) -> Result<()> {
        self.inline.require_extent(self.tree)?.set_cy(self.tree, height)
    }

    /// Resize both the inline extent and the picture transform.
    pub fn resize(&mut self, width: Length, height: Length) -> Result<()> {
        self.set_width(width)?;
        self.set_height(height)?;
        let ext = {
            let tree: &XmlTree = self.tree;
            self.inline
                .graphic_data(tree)
                .and_then(|gd| gd.pic(tree))
                .and_then(|pic| pic.ext(tree))
        };
        if let Some(ext) = ext {
            ext.set_cx(self.tree, width)?;
            ext.set_cy(self.tree, height)?;
        }
        Ok(())
    }
}

/// The inline shapes of a document body, in document order.
#[derive(Debug, Clone)]
pub struct InlineShapes<'a> {
    tree: &'a XmlTree,
    inlines: Vec<CtInline>,
    /// Part whose markup holds the shapes
    partname: PackURI,
}

impl<'a> InlineShapes<'a> {
    pub fn new(tree: &'a XmlTree, body: CtBody, partname: PackURI) -> Self {
        let inlines = tree
            .descendants(body.node())
            .filter(|&node| tree.is_tag(node, "wp:inline"))
            .filter(|&node| {
                tree.parent(node)
                    .is_some_and(|parent| tree.is_tag(parent, "w:drawing"))
            })
            .map(CtInline::new)
            .collect();
        Self {
            tree,
            inlines,
            partname,
        }
    }

    /// Partname of the story part the shapes belong to.
    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inlines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inlines.is_empty()
    }

    /// Shape at `index`; negative values count from the end.
    pub fn get(&self, index: isize) -> Result<InlineShape<'a>> {
        let len = self.inlines.len();
        resolve_index(index, len)
            .map(|i| InlineShape::new(self.tree, self.inlines[i]))
            .ok_or(OoxmlError::OutOfRange { index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = InlineShape<'a>> + '_ {
        self.inlines
            .iter()
            .map(move |&inline| InlineShape::new(self.tree, inline))
    }
}

/// Map an index in `[-len, len - 1]` to a position.
pub(crate) fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let len = isize::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}
