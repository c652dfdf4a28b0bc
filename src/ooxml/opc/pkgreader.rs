//! Loads a serialized package into an [`OpcPackage`].
//!
//! Parts are discovered by walking the relationship graph outward from the package
//! relationships, so members that nothing refers to are not loaded.

use std::collections::{HashSet, VecDeque};

use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::PartFactory;
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::rel::Relationships;

/// Reads packages from a physical package, building parts through a [`PartFactory`].
pub struct PackageReader<'a> {
    phys: &'a dyn PhysPkgReader,
    factory: &'a PartFactory,
}

impl<'a> PackageReader<'a> {
    pub fn new(phys: &'a dyn PhysPkgReader, factory: &'a PartFactory) -> Self {
        Self { phys, factory }
    }

    /// Load the whole package.
    ///
    /// Internal relationships whose target member is missing are kept but their target
    /// is not loaded; the package then fails validation when it is saved.
    pub fn load(&self) -> Result<OpcPackage> {
        let content_types = ContentTypes::from_xml(&self.phys.content_types_xml()?)?;
        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let pkg_rels = self.load_rels(&package_uri)?;

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        Self::enqueue_targets(&pkg_rels, &mut visited, &mut queue);

        let mut package = OpcPackage::new();
        *package.content_types_mut() = content_types;
        *package.rels_mut() = pkg_rels;

        while let Some(partname) = queue.pop_front() {
            if !self.phys.contains(&partname) {
                log::warn!("relationship target {} is not in the package", partname);
                continue;
            }
            let blob = self.phys.blob_for(&partname)?;
            let content_type = package
                .content_types()
                .content_type_for(&partname)?
                .to_string();
            let rels = self.load_rels(&partname)?;
            Self::enqueue_targets(&rels, &mut visited, &mut queue);

            let mut part = self.factory.load(partname, content_type, blob)?;
            *part.rels_mut() = rels;
            package.add_part(part)?;
        }

        log::debug!(
            "loaded package: {} parts, {} package relationships",
            package.part_count(),
            package.rels().len()
        );
        Ok(package)
    }

    fn load_rels(&self, source_uri: &PackURI) -> Result<Relationships> {
        match self.phys.rels_xml_for(source_uri)? {
            Some(xml) => Relationships::from_xml(source_uri.base_uri(), &xml),
            None => Ok(Relationships::new(source_uri.base_uri().to_string())),
        }
    }

    fn enqueue_targets(
        rels: &Relationships,
        visited: &mut HashSet<PackURI>,
        queue: &mut VecDeque<PackURI>,
    ) {
        for rel in rels.iter().filter(|rel| !rel.is_external()) {
            match rel.target_partname() {
                Ok(partname) => {
                    if visited.insert(partname.clone()) {
                        queue.push_back(partname);
                    }
                },
                Err(e) => log::warn!("skipping relationship {}: {}", rel.r_id(), e),
            }
        }
    }
}
