/// The in-memory package: parts, package relationships and content types.
///
/// OpcPackage owns every part by partname and is the single place where partnames
/// and numeric ids get allocated, so two parts can never collide.
use indexmap::IndexMap;

use crate::common::id::IdScopes;
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory, XmlPart};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;

/// An Open Packaging Conventions package held in memory.
#[derive(Debug)]
pub struct OpcPackage {
    /// Package-level relationships
    rels: Relationships,

    /// All parts in the package, indexed by partname, in the order they were added
    parts: IndexMap<PackURI, Box<dyn Part>>,

    content_types: ContentTypes,

    ids: IdScopes,

    writable: bool,
}

impl OpcPackage {
    /// Create a new empty, writable package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: IndexMap::new(),
            content_types: ContentTypes::new(),
            ids: IdScopes::new(),
            writable: true,
        }
    }

    /// Load a package using the default part factory.
    pub fn open(phys: &dyn PhysPkgReader) -> Result<Self> {
        Self::open_with(phys, &PartFactory::new())
    }

    pub fn open_with(phys: &dyn PhysPkgReader, factory: &PartFactory) -> Result<Self> {
        PackageReader::new(phys, factory).load()
    }

    pub fn save(&self, phys: &mut dyn PhysPkgWriter) -> Result<()> {
        PackageWriter::save(self, phys)
    }

    /// The main document part, the target of the package's `officeDocument`
    /// relationship.
    pub fn main_document_part(&self) -> Result<&dyn Part> {
        let partname = self.main_document_partname()?;
        self.get_part(&partname)
    }

    pub fn main_document_partname(&self) -> Result<PackURI> {
        self.rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()
    }

    pub fn get_part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname)
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        self.parts
            .get_mut(partname)
            .map(|b| &mut **b as &mut dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// The part at `partname` as a markup part.
    pub fn xml_part(&self, partname: &PackURI) -> Result<&XmlPart> {
        self.get_part(partname)?
            .downcast_ref::<XmlPart>()
            .ok_or_else(|| OpcError::XmlError(format!("{} is not a markup part", partname)))
    }

    pub fn xml_part_mut(&mut self, partname: &PackURI) -> Result<&mut XmlPart> {
        self.get_part_mut(partname)?
            .downcast_mut::<XmlPart>()
            .ok_or_else(|| OpcError::XmlError(format!("{} is not a markup part", partname)))
    }

    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    /// Add `part` and declare its content type.
    ///
    /// A second part under an existing partname is refused with
    /// `DuplicatePartName`. Partnames from [`OpcPackage::next_partname`] never
    /// collide, so this only happens when a caller picks partnames itself.
    pub fn add_part(&mut self, part: Box<dyn Part>) -> Result<()> {
        let partname = part.partname().clone();
        if self.parts.contains_key(&partname) {
            return Err(OpcError::DuplicatePartName(partname.to_string()));
        }
        self.content_types
            .register(&partname, part.content_type());
        log::debug!("added part {} ({})", partname, part.content_type());
        self.parts.insert(partname, part);
        Ok(())
    }

    /// Remove a part and its content type override. Relationships that point at it
    /// are left alone.
    pub fn drop_part(&mut self, partname: &PackURI) -> Option<Box<dyn Part>> {
        let part = self.parts.shift_remove(partname)?;
        self.content_types.remove_override(partname);
        Some(part)
    }

    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        self.parts.values().map(|b| &**b as &dyn Part)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// The first partname built from `template` (with a `{}` slot) that is not
    /// taken, counting from 1.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        let mut n = 1u32;
        loop {
            let candidate = PackURI::from_template(template, n).map_err(OpcError::InvalidPackUri)?;
            if !self.parts.contains_key(&candidate) {
                return Ok(candidate);
            }
            n = n.checked_add(1).ok_or_else(|| {
                OpcError::InvalidPackUri(format!("no free partname for {}", template))
            })?;
        }
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Relationship id of a package-level `reltype` relationship to `partname`,
    /// reusing an existing one.
    pub fn relate_to(&mut self, partname: &PackURI, reltype: &str) -> String {
        let target_ref = partname.relative_ref(PACKAGE_URI);
        self.rels.get_or_add(reltype, &target_ref)
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    /// Next unused id in `scope`.
    pub fn next_id(&mut self, scope: &str) -> Result<u32> {
        self.ids
            .next_id(scope)
            .ok_or_else(|| OpcError::IdSpaceExhausted(scope.to_string()))
    }

    /// Keep later ids in `scope` above `id`, which is already in use.
    pub fn reserve_id(&mut self, scope: &str, id: u32) {
        self.ids.reserve(scope, id);
    }

    /// Make the package read-only.
    pub fn freeze(&mut self) {
        self.writable = false;
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// `PackageNotWritable` unless the package accepts edits.
    pub fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(OpcError::PackageNotWritable)
        }
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use crate::ooxml::opc::part::BlobPart;
    use crate::ooxml::opc::phys_pkg::MemPhysPkg;
    use crate::ooxml::oxml::parse_xml;

    fn blob_part(partname: &str, content_type: &str) -> Box<dyn Part> {
        Box::new(BlobPart::new(
            PackURI::new(partname).unwrap(),
            content_type.to_string(),
            vec![0],
        ))
    }

    #[test]
    fn test_duplicate_partname_is_refused() {
        let mut pkg = OpcPackage::new();
        pkg.add_part(blob_part("/word/media/image1.png", ct::PNG))
            .unwrap();
        assert!(matches!(
            pkg.add_part(blob_part("/word/media/image1.png", ct::PNG)),
            Err(OpcError::DuplicatePartName(_))
        ));
        assert_eq!(pkg.part_count(), 1);
    }

    #[test]
    fn test_next_partname_fills_gaps() {
        let mut pkg = OpcPackage::new();
        let template = "/word/media/image{}.png";
        assert_eq!(pkg.next_partname(template).unwrap().as_str(), "/word/media/image1.png");

        pkg.add_part(blob_part("/word/media/image1.png", ct::PNG))
            .unwrap();
        pkg.add_part(blob_part("/word/media/image3.png", ct::PNG))
            .unwrap();
        assert_eq!(pkg.next_partname(template).unwrap().as_str(), "/word/media/image2.png");
        assert_eq!(
            pkg.next_partname("/word/media/image{}.jpeg").unwrap().as_str(),
            "/word/media/image1.jpeg"
        );
    }

    #[test]
    fn test_drop_part_removes_override() {
        let mut pkg = OpcPackage::new();
        let partname = PackURI::new("/word/document.xml").unwrap();
        pkg.add_part(blob_part(partname.as_str(), ct::WML_DOCUMENT_MAIN))
            .unwrap();
        assert_eq!(
            pkg.content_types().content_type_for(&partname).unwrap(),
            ct::WML_DOCUMENT_MAIN
        );

        assert!(pkg.drop_part(&partname).is_some());
        assert!(!pkg.contains_part(&partname));
        assert_eq!(pkg.content_types().content_type_for(&partname).unwrap(), ct::XML);
    }

    #[test]
    fn test_ids_and_freeze() {
        let mut pkg = OpcPackage::new();
        pkg.reserve_id("shape", 7);
        assert_eq!(pkg.next_id("shape").unwrap(), 8);
        assert_eq!(pkg.next_id("bookmark").unwrap(), 1);
        pkg.reserve_id("shape", u32::MAX);
        assert!(matches!(
            pkg.next_id("shape"),
            Err(OpcError::IdSpaceExhausted(scope)) if scope == "shape"
        ));

        assert!(pkg.ensure_writable().is_ok());
        pkg.freeze();
        assert!(!pkg.is_writable());
        assert!(matches!(pkg.ensure_writable(), Err(OpcError::PackageNotWritable)));
    }

    #[test]
    fn test_open_save_round_trip() {
        let mut pkg = OpcPackage::new();
        let partname = PackURI::new("/word/document.xml").unwrap();
        let xml = br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p/></w:body></w:document>"#;
        let tree = parse_xml(xml).unwrap();
        pkg.add_part(Box::new(XmlPart::new(
            partname.clone(),
            ct::WML_DOCUMENT_MAIN.to_string(),
            tree,
        )))
        .unwrap();
        pkg.relate_to(&partname, relationship_type::OFFICE_DOCUMENT);

        let mut phys = MemPhysPkg::new();
        pkg.save(&mut phys).unwrap();
        let reopened = OpcPackage::open(&phys).unwrap();

        assert_eq!(reopened.main_document_partname().unwrap(), partname);
        let doc = reopened.xml_part(&partname).unwrap();
        assert_eq!(doc.blob(), pkg.get_part(&partname).unwrap().blob());
        assert!(reopened.is_writable());
    }
}
