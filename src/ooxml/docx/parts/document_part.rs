/// DocumentPart - the main document.xml part of a Word document.
use crate::ooxml::docx::shape::InlineShapes;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart};
use crate::ooxml::oxml::text::{CtBody, CtDocument};
use crate::ooxml::oxml::XmlTree;

/// Partname of the main document in a new package
pub const DOCUMENT_PARTNAME: &str = "/word/document.xml";

fn as_document(part: &dyn Part) -> Result<()> {
    if part.content_type() != ct::WML_DOCUMENT_MAIN {
        return Err(OoxmlError::InvalidContentType {
            expected: ct::WML_DOCUMENT_MAIN.to_string(),
            got: part.content_type().to_string(),
        });
    }
    Ok(())
}

/// Read access to the main document part.
///
/// This corresponds to the `/word/document.xml` part in the package.
pub struct DocumentPart<'a> {
    part: &'a XmlPart,
}

impl<'a> DocumentPart<'a> {
    pub fn from_part(part: &'a dyn Part) -> Result<Self> {
        as_document(part)?;
        let part = part.downcast_ref::<XmlPart>().ok_or_else(|| {
            OoxmlError::Xml(format!("{} was not parsed as markup", part.partname()))
        })?;
        Ok(Self { part })
    }

    #[inline]
    pub fn tree(&self) -> &'a XmlTree {
        self.part.tree()
    }

    pub fn document(&self) -> Result<CtDocument> {
        CtDocument::from_tree(self.part.tree())
    }

    pub fn body(&self) -> Result<CtBody> {
        self.document()?
            .body(self.part.tree())
            .ok_or_else(|| OoxmlError::Xml("<w:document> has no <w:body>".to_string()))
    }

    /// Inline shapes of the body, in document order.
    pub fn inline_shapes(&self) -> Result<InlineShapes<'a>> {
        Ok(InlineShapes::new(
            self.part.tree(),
            self.body()?,
            self.part.partname().clone(),
        ))
    }

    /// Largest integer value of any `id` attribute in the document, 0 if none.
    ///
    /// Drawing ids (`wp:docPr/@id`) share one number space with every other
    /// plain `id` in the part, so new shape ids must start above all of them.
    pub fn max_numeric_id(&self) -> u32 {
        let tree = self.part.tree();
        let Some(root) = tree.root() else {
            return 0;
        };
        std::iter::once(root)
            .chain(tree.descendants(root))
            .filter_map(|node| tree.attr(node, "id"))
            .filter_map(|value| atoi_simd::parse::<u32, false, false>(value.as_bytes()).ok())
            .max()
            .unwrap_or(0)
    }

    /// Partname of the image behind relationship `r_id`.
    pub fn image_partname(&self, r_id: &str) -> Result<PackURI> {
        let rel = self
            .part
            .rels()
            .get(r_id)
            .ok_or_else(|| OoxmlError::PartNotFound(format!("no relationship {}", r_id)))?;
        if rel.reltype() != rt::IMAGE {
            return Err(OoxmlError::PartNotFound(format!("{} is not an image relationship", r_id)));
        }
        Ok(rel.target_partname()?)
    }
}

/// Write access to the main document part.
pub struct DocumentPartMut<'a> {
    part: &'a mut XmlPart,
}

impl<'a> DocumentPartMut<'a> {
    pub fn from_part(part: &'a mut dyn Part) -> Result<Self> {
        as_document(part)?;
        let partname = part.partname().to_string();
        let part = part
            .downcast_mut::<XmlPart>()
            .ok_or_else(|| OoxmlError::Xml(format!("{} was not parsed as markup", partname)))?;
        Ok(Self { part })
    }

    pub fn tree_mut(&mut self) -> &mut XmlTree {
        self.part.tree_mut()
    }

    pub fn into_tree(self) -> &'a mut XmlTree {
        let part = self.part;
        part.tree_mut()
    }

    /// Add a fresh image relationship to `image_partname`.
    ///
    /// An existing relationship to the same part is not reused: every inserted
    /// picture gets its own relationship id.
    pub fn relate_image(&mut self, image_partname: &PackURI) -> String {
        let target_ref = image_partname.relative_ref(self.part.partname().base_uri());
        self.part.rels_mut().add(rt::IMAGE, &target_ref, false)
    }
}
