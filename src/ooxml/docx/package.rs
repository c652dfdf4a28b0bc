/// Package implementation for Word documents.
use log::debug;

use crate::ooxml::docx::image::{Image, ImageDescriptor};
use crate::ooxml::docx::parts::document_part::DOCUMENT_PARTNAME;
use crate::ooxml::docx::parts::{DocumentPart, DocumentPartMut, ImagePart};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::part::{Part, PartFactory, XmlPart};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::oxml::text::CtDocument;

/// Id scope shared by every drawing object in the main document.
pub const SHAPE_ID_SCOPE: &str = "shape";

/// A Word (.docx) package.
///
/// Wraps an OPC package and adds what Word needs on top of it: the main
/// document part, image parts shared by content hash, and document-wide shape
/// ids.
///
/// # Examples
///
/// ```rust
/// use docx_oxml::ooxml::docx::Package;
/// use docx_oxml::ooxml::opc::MemPhysPkg;
///
/// let pkg = Package::new()?;
/// let mut phys = MemPhysPkg::new();
/// pkg.save(&mut phys)?;
///
/// let reopened = Package::open(&phys)?;
/// assert_eq!(reopened.opc().part_count(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Package {
    /// The underlying OPC package
    opc: OpcPackage,
}

impl Package {
    /// A package holding one empty document part.
    pub fn new() -> Result<Self> {
        let (tree, _) = CtDocument::new_tree()?;
        let partname = PackURI::new(DOCUMENT_PARTNAME).map_err(OpcError::InvalidPackUri)?;
        let mut opc = OpcPackage::new();
        opc.add_part(Box::new(XmlPart::new(
            partname.clone(),
            ct::WML_DOCUMENT_MAIN.to_string(),
            tree,
        )))?;
        opc.relate_to(&partname, rt::OFFICE_DOCUMENT);
        Ok(Self { opc })
    }

    /// Load a .docx package.
    ///
    /// Image parts are parsed so their content hash is known, and the shape id
    /// sequence is seeded above every numeric id already in the document.
    pub fn open(phys: &dyn PhysPkgReader) -> Result<Self> {
        let mut factory = PartFactory::new();
        factory.register(ct::is_image, ImagePart::load);
        let mut opc = OpcPackage::open_with(phys, &factory)?;

        let main_part = opc
            .main_document_part()
            .map_err(|e| OoxmlError::PartNotFound(format!("main document part: {}", e)))?;
        let max_id = DocumentPart::from_part(main_part)?.max_numeric_id();
        opc.reserve_id(SHAPE_ID_SCOPE, max_id);

        Ok(Self { opc })
    }

    pub fn save(&self, phys: &mut dyn PhysPkgWriter) -> Result<()> {
        Ok(self.opc.save(phys)?)
    }

    #[inline]
    pub fn opc(&self) -> &OpcPackage {
        &self.opc
    }

    #[inline]
    pub fn opc_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }

    pub fn document_part(&self) -> Result<DocumentPart<'_>> {
        DocumentPart::from_part(self.opc.main_document_part()?)
    }

    pub fn document_part_mut(&mut self) -> Result<DocumentPartMut<'_>> {
        let partname = self.opc.main_document_partname()?;
        DocumentPartMut::from_part(self.opc.get_part_mut(&partname)?)
    }

    pub fn image_part(&self, partname: &PackURI) -> Result<&ImagePart> {
        let part = self.opc.get_part(partname)?;
        part.downcast_ref::<ImagePart>()
            .ok_or_else(|| OoxmlError::InvalidContentType {
                expected: "image/*".to_string(),
                got: part.content_type().to_string(),
            })
    }

    /// The image part holding `image`'s bytes, created if no part has them yet.
    ///
    /// New parts are named `/word/media/image{n}.{ext}` with the smallest `n`
    /// free for that extension.
    pub fn get_or_add_image_part(&mut self, image: &Image) -> Result<PackURI> {
        let existing = self
            .opc
            .iter_parts()
            .filter_map(|part| part.downcast_ref::<ImagePart>())
            .find(|part| part.sha256() == image.sha256());
        if let Some(part) = existing {
            debug!("reusing {} for {}", part.partname(), image.filename());
            return Ok(part.partname().clone());
        }

        let template = format!("/word/media/image{{}}.{}", image.ext().to_ascii_lowercase());
        let partname = self.opc.next_partname(&template)?;
        self.opc
            .add_part(Box::new(ImagePart::new(partname.clone(), image.clone())))?;
        Ok(partname)
    }

    /// Store an image and relate it to the document part.
    ///
    /// Returns the image partname and a relationship id that was created by
    /// this call, even when the image part itself was already present.
    pub fn add_image(&mut self, descriptor: impl Into<ImageDescriptor>) -> Result<(PackURI, String)> {
        self.opc.ensure_writable()?;
        let image = Image::load(descriptor.into())?;
        let partname = self.get_or_add_image_part(&image)?;
        let r_id = self.document_part_mut()?.relate_image(&partname);
        Ok((partname, r_id))
    }

    /// Allocate a drawing id unique within the document.
    pub fn next_shape_id(&mut self) -> Result<u32> {
        Ok(self.opc.next_id(SHAPE_ID_SCOPE)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::image::tests::png;
    use crate::ooxml::opc::MemPhysPkg;

    #[test]
    fn test_new_package_has_document() {
        let pkg = Package::new().unwrap();
        let doc = pkg.document_part().unwrap();
        assert!(doc.body().is_ok());
        assert_eq!(
            pkg.opc().main_document_partname().unwrap().as_str(),
            DOCUMENT_PARTNAME
        );
    }

    #[test]
    fn test_image_parts_are_shared_by_content() {
        let mut pkg = Package::new().unwrap();
        let (first, r1) = pkg
            .add_image(ImageDescriptor::bytes(png(10, 10, None), Some("a.png")))
            .unwrap();
        let (second, r2) = pkg
            .add_image(ImageDescriptor::bytes(png(10, 10, None), Some("b.png")))
            .unwrap();
        let (third, _) = pkg
            .add_image(ImageDescriptor::bytes(png(20, 10, None), Some("c.png")))
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(r1, r2);
        assert_eq!(first.as_str(), "/word/media/image1.png");
        assert_eq!(third.as_str(), "/word/media/image2.png");
        assert_eq!(pkg.opc().part_count(), 3);
        assert_eq!(pkg.image_part(&first).unwrap().filename(), "a.png");
    }

    #[test]
    fn test_frozen_package_rejects_images() {
        let mut pkg = Package::new().unwrap();
        pkg.opc_mut().freeze();
        let result = pkg.add_image(ImageDescriptor::bytes(png(1, 1, None), None));
        assert!(matches!(
            result,
            Err(OoxmlError::Opc(OpcError::PackageNotWritable))
        ));
        assert_eq!(pkg.opc().part_count(), 1);
    }

    #[test]
    fn test_unsupported_image_adds_nothing() {
        let mut pkg = Package::new().unwrap();
        let result = pkg.add_image(ImageDescriptor::bytes(b"not an image".to_vec(), None));
        assert!(matches!(result, Err(OoxmlError::UnsupportedFormat(_))));
        assert_eq!(pkg.opc().part_count(), 1);
        assert!(pkg.document_part().unwrap().tree().root().is_some());
    }

    #[test]
    fn test_open_seeds_shape_ids() {
        let mut pkg = Package::new().unwrap();
        {
            let mut doc = pkg.document_part_mut().unwrap();
            let tree = doc.tree_mut();
            let root = tree.root().unwrap();
            let marker = tree.create_element_with_attrs("w:bookmarkStart", &[("id", "41")]);
            tree.append_child(root, marker);
        }
        let mut phys = MemPhysPkg::new();
        pkg.save(&mut phys).unwrap();

        let mut reopened = Package::open(&phys).unwrap();
        assert_eq!(reopened.next_shape_id().unwrap(), 42);
        assert_eq!(reopened.next_shape_id().unwrap(), 43);
    }

    #[test]
    fn test_open_at_id_ceiling_refuses_more_shapes() {
        let mut pkg = Package::new().unwrap();
        {
            let mut doc = pkg.document_part_mut().unwrap();
            let tree = doc.tree_mut();
            let root = tree.root().unwrap();
            let marker = tree.create_element_with_attrs("wp:docPr", &[("id", "4294967295")]);
            tree.append_child(root, marker);
        }
        let mut phys = MemPhysPkg::new();
        pkg.save(&mut phys).unwrap();

        let mut reopened = Package::open(&phys).unwrap();
        assert!(matches!(
            reopened.next_shape_id(),
            Err(OoxmlError::Opc(OpcError::IdSpaceExhausted(_)))
        ));
    }

    #[test]
    fn test_open_rejects_other_main_parts() {
        let mut phys = MemPhysPkg::new();
        phys.insert(
            "[Content_Types].xml",
            format!(
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="{}"/><Default Extension="rels" ContentType="{}"/></Types>"#,
                ct::WML_STYLES,
                ct::OPC_RELATIONSHIPS
            ),
        );
        phys.insert(
            "_rels/.rels",
            format!(
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}" Target="word/styles.xml"/></Relationships>"#,
                rt::OFFICE_DOCUMENT
            ),
        );
        phys.insert("word/styles.xml", r#"<w:styles xmlns:w="urn:w"/>"#);

        assert!(matches!(
            Package::open(&phys),
            Err(OoxmlError::InvalidContentType { .. })
        ));
    }
}
