//! Serializes an [`OpcPackage`] into a physical package.
//!
//! Writes `[Content_Types].xml`, the package relationships, then every part
//! followed by its relationships when it has any.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use crate::ooxml::opc::rel::Relationships;

pub struct PackageWriter;

impl PackageWriter {
    /// Validate and write `package` to `phys_writer`.
    ///
    /// Nothing is written when an internal relationship points at a part the
    /// package does not contain.
    pub fn save(package: &OpcPackage, phys_writer: &mut dyn PhysPkgWriter) -> Result<()> {
        Self::validate(package)?;
        Self::write_content_types(phys_writer, package)?;
        Self::write_pkg_rels(phys_writer, package)?;
        Self::write_parts(phys_writer, package)?;

        log::debug!(
            "saved package: {} parts, {} package relationships",
            package.part_count(),
            package.rels().len()
        );
        Ok(())
    }

    /// Check that every internal relationship resolves to a part in `package`.
    pub fn validate(package: &OpcPackage) -> Result<()> {
        Self::validate_rels(package, PACKAGE_URI, package.rels())?;
        for part in package.iter_parts() {
            Self::validate_rels(package, part.partname().as_str(), part.rels())?;
        }
        Ok(())
    }

    fn validate_rels(package: &OpcPackage, source: &str, rels: &Relationships) -> Result<()> {
        for rel in rels.iter().filter(|rel| !rel.is_external()) {
            let unresolved = || OpcError::UnresolvedRelationship {
                source_part: source.to_string(),
                r_id: rel.r_id().to_string(),
                target: rel.target_ref().to_string(),
            };
            let partname = rel.target_partname().map_err(|_| unresolved())?;
            if !package.contains_part(&partname) {
                return Err(unresolved());
            }
        }
        Ok(())
    }

    fn write_content_types(phys_writer: &mut dyn PhysPkgWriter, package: &OpcPackage) -> Result<()> {
        let mut content_types = package.content_types().clone();
        for part in package.iter_parts() {
            content_types.register(part.partname(), part.content_type());
        }

        let uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        phys_writer.write(&uri, content_types.to_xml().as_bytes())
    }

    fn write_pkg_rels(phys_writer: &mut dyn PhysPkgWriter, package: &OpcPackage) -> Result<()> {
        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        phys_writer.write(&package_uri.rels_uri(), package.rels().to_xml().as_bytes())
    }

    fn write_parts(phys_writer: &mut dyn PhysPkgWriter, package: &OpcPackage) -> Result<()> {
        for part in package.iter_parts() {
            phys_writer.write(part.partname(), &part.blob())?;

            if !part.rels().is_empty() {
                let rels_xml = part.rels().to_xml();
                phys_writer.write(&part.partname().rels_uri(), rels_xml.as_bytes())?;
            }
        }
        Ok(())
    }
}
