/// Document - the main API for editing Word document content.
use crate::common::unit::Length;
use crate::ooxml::docx::image::{Image, ImageDescriptor};
use crate::ooxml::docx::package::Package;
use crate::ooxml::docx::shape::{InlineShape, InlineShapeMut, InlineShapes};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use crate::ooxml::oxml::shape::CtInline;
use crate::ooxml::oxml::text::{CtBody, CtDocument, CtP, CtR};
use crate::ooxml::oxml::tree::NodeId;

/// A Word document.
///
/// Owns its package and exposes the body, its paragraphs and runs, and the
/// inline pictures placed in them.
///
/// # Examples
///
/// ```rust
/// use docx_oxml::ooxml::docx::{Document, ImageDescriptor, InlineShapeType};
///
/// # fn png() -> Vec<u8> {
/// #     let mut data = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
/// #     data.extend_from_slice(&[0, 0, 0, 64, 0, 0, 0, 32, 8, 6, 0, 0, 0]);
/// #     data.extend_from_slice(&[0, 0, 0, 0]);
/// #     data
/// # }
/// let mut doc = Document::new()?;
/// let paragraph = doc.add_paragraph()?;
/// let run = doc.add_run(paragraph, "Figure 1: ")?;
/// doc.add_picture(ImageDescriptor::bytes(png(), Some("chart.png")), run)?;
///
/// let shapes = doc.inline_shapes()?;
/// assert_eq!(shapes.len(), 1);
/// assert_eq!(shapes.get(-1)?.shape_type(), InlineShapeType::Picture);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Document {
    package: Package,
}

impl Document {
    /// An empty document.
    pub fn new() -> Result<Self> {
        Ok(Self {
            package: Package::new()?,
        })
    }

    pub fn open(phys: &dyn PhysPkgReader) -> Result<Self> {
        Ok(Self {
            package: Package::open(phys)?,
        })
    }

    pub fn save(&self, phys: &mut dyn PhysPkgWriter) -> Result<()> {
        self.package.save(phys)
    }

    #[inline]
    pub fn package(&self) -> &Package {
        &self.package
    }

    #[inline]
    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    pub fn body(&self) -> Result<CtBody> {
        self.package.document_part()?.body()
    }

    /// Append an empty paragraph to the body, ahead of the section properties.
    pub fn add_paragraph(&mut self) -> Result<CtP> {
        let mut part = self.package.document_part_mut()?;
        let tree = part.tree_mut();
        let body = CtDocument::from_tree(tree)?.get_or_add_body(tree)?;
        body.add_p(tree)
    }

    /// Append a run to `paragraph`, holding `text` unless it is empty.
    pub fn add_run(&mut self, paragraph: CtP, text: &str) -> Result<CtR> {
        let mut part = self.package.document_part_mut()?;
        let tree = part.tree_mut();
        let run = paragraph.add_r(tree)?;
        if !text.is_empty() {
            run.add_t(tree, text)?;
        }
        Ok(run)
    }

    pub fn inline_shapes(&self) -> Result<InlineShapes<'_>> {
        self.package.document_part()?.inline_shapes()
    }

    /// Writable view of the inline shape at `index` (negative counts from the end).
    pub fn inline_shape_mut(&mut self, index: isize) -> Result<InlineShapeMut<'_>> {
        let inline = self.inline_shapes()?.get(index)?.element();
        let tree = self.package.document_part_mut()?.into_tree();
        Ok(InlineShapeMut::new(tree, inline))
    }

    /// Insert a picture next to `run`.
    ///
    /// The picture goes into a new run appended to the paragraph holding `run`,
    /// at the image's natural size. One shape id and one relationship id are
    /// allocated per call.
    pub fn add_picture(
        &mut self,
        descriptor: impl Into<ImageDescriptor>,
        run: CtR,
    ) -> Result<InlineShapeMut<'_>> {
        let container = {
            let part = self.package.document_part()?;
            run.container(part.tree())
                .ok_or_else(|| OoxmlError::Xml("run is not attached to a paragraph".to_string()))?
        };
        let (inline, _) = self.insert_picture(descriptor, container)?;
        let tree = self.package.document_part_mut()?.into_tree();
        Ok(InlineShapeMut::new(tree, inline))
    }

    /// Insert a picture in a new paragraph at the end of the body.
    ///
    /// With only one of `width` and `height` given, the other follows the
    /// image's aspect ratio; with neither, the natural size is kept.
    pub fn add_inline_picture(
        &mut self,
        descriptor: impl Into<ImageDescriptor>,
        width: Option<Length>,
        height: Option<Length>,
    ) -> Result<InlineShapeMut<'_>> {
        let paragraph = self.add_paragraph()?;
        let (inline, image) = self.insert_picture(descriptor, paragraph.node())?;
        let tree = self.package.document_part_mut()?.into_tree();
        let mut shape = InlineShapeMut::new(tree, inline);
        if width.is_some() || height.is_some() {
            let (cx, cy) = image.scaled_dimensions(width, height);
            shape.resize(cx, cy)?;
        }
        Ok(shape)
    }

    fn insert_picture(
        &mut self,
        descriptor: impl Into<ImageDescriptor>,
        container: NodeId,
    ) -> Result<(CtInline, Image)> {
        let shape_id = self.package.next_shape_id()?;
        let (partname, r_id) = self.package.add_image(descriptor)?;
        let image = self.package.image_part(&partname)?.image().clone();
        let mut part = self.package.document_part_mut()?;
        let inline = InlineShape::new_picture(part.tree_mut(), container, &image, &r_id, shape_id)?;
        Ok((inline, image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::image::tests::png;
    use crate::ooxml::docx::shape::InlineShapeType;

    #[test]
    fn test_add_paragraph_and_run() {
        let mut doc = Document::new().unwrap();
        let p = doc.add_paragraph().unwrap();
        doc.add_run(p, " spaced ").unwrap();
        doc.add_run(p, "").unwrap();

        let body = doc.body().unwrap();
        let part = doc.package().document_part().unwrap();
        let tree = part.tree();
        assert_eq!(body.paragraphs(tree), vec![p]);
        let runs = p.runs(tree);
        assert_eq!(runs.len(), 2);
        assert_eq!(tree.element_children(runs[1].node()).count(), 0);
        let t = tree.element_children(runs[0].node()).next().unwrap();
        assert_eq!(tree.attr(t, "xml:space"), Some("preserve"));
    }

    #[test]
    fn test_add_picture_next_to_run() {
        let mut doc = Document::new().unwrap();
        let p = doc.add_paragraph().unwrap();
        let run = doc.add_run(p, "caption").unwrap();

        let shape = doc
            .add_picture(ImageDescriptor::bytes(png(72, 144, None), Some("tall.png")), run)
            .unwrap();
        assert_eq!(shape.shape_type(), InlineShapeType::Picture);
        assert_eq!(shape.width().unwrap(), Length::from_inches(1.0));
        assert_eq!(shape.height().unwrap(), Length::from_inches(2.0));

        let part = doc.package().document_part().unwrap();
        assert_eq!(p.runs(part.tree()).len(), 2);
        assert_eq!(doc.inline_shapes().unwrap().len(), 1);
    }

    #[test]
    fn test_add_picture_with_detached_run_fails_cleanly() {
        let mut doc = Document::new().unwrap();
        let run = {
            let mut part = doc.package_mut().document_part_mut().unwrap();
            CtR::new(part.tree_mut().create_element("w:r"))
        };
        let result = doc.add_picture(ImageDescriptor::bytes(png(1, 1, None), None), run);
        assert!(matches!(result, Err(OoxmlError::Xml(_))));
        assert_eq!(doc.package().opc().part_count(), 1);
    }

    #[test]
    fn test_add_picture_without_free_shape_id_adds_nothing() {
        use crate::ooxml::docx::package::SHAPE_ID_SCOPE;
        use crate::ooxml::opc::error::OpcError;

        let mut doc = Document::new().unwrap();
        let p = doc.add_paragraph().unwrap();
        let run = doc.add_run(p, "").unwrap();
        doc.package_mut()
            .opc_mut()
            .reserve_id(SHAPE_ID_SCOPE, u32::MAX);

        let result = doc.add_picture(ImageDescriptor::bytes(png(1, 1, None), None), run);
        assert!(matches!(
            result,
            Err(OoxmlError::Opc(OpcError::IdSpaceExhausted(_)))
        ));
        assert_eq!(doc.package().opc().part_count(), 1);
        assert_eq!(doc.inline_shapes().unwrap().len(), 0);
    }

    #[test]
    fn test_add_inline_picture_scales() {
        let mut doc = Document::new().unwrap();
        let shape = doc
            .add_inline_picture(
                ImageDescriptor::bytes(png(200, 100, None), None),
                Some(Length::from_inches(1.0)),
                None,
            )
            .unwrap();
        assert_eq!(shape.width().unwrap(), Length::from_inches(1.0));
        assert_eq!(shape.height().unwrap(), Length::from_emus(457_200));

        let mut shape = doc.inline_shape_mut(0).unwrap();
        shape.set_height(Length::from_emus(1)).unwrap();
        assert_eq!(doc.inline_shapes().unwrap().get(0).unwrap().height().unwrap(), Length::from_emus(1));
    }
}
