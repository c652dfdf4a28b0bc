//! Interface to a physical package: a flat store of members keyed by membername.
//!
//! The archive container itself is not handled here. [`MemPhysPkg`] keeps members
//! in memory and [`DirPhysPkg`] maps them onto an extracted directory tree; a zip
//! backend plugs in by implementing the same two traits.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};

/// Read access to the members of a physical package.
pub trait PhysPkgReader {
    /// Bytes of the member for `pack_uri`; `PartNotFound` when absent.
    fn blob_for(&self, pack_uri: &PackURI) -> Result<Vec<u8>>;

    fn contains(&self, pack_uri: &PackURI) -> bool;

    /// The `[Content_Types].xml` stream, which every package must have.
    fn content_types_xml(&self) -> Result<Vec<u8>> {
        let uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        self.blob_for(&uri)
    }

    /// The `.rels` stream for `source_uri`, `None` if the source has none.
    fn rels_xml_for(&self, source_uri: &PackURI) -> Result<Option<Vec<u8>>> {
        match self.blob_for(&source_uri.rels_uri()) {
            Ok(blob) => Ok(Some(blob)),
            Err(OpcError::PartNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Write access to a physical package.
pub trait PhysPkgWriter {
    fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()>;
}

/// An in-memory physical package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemPhysPkg {
    /// Membername -> bytes, in write order
    members: IndexMap<String, Vec<u8>>,
}

impl MemPhysPkg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a member by its membername (no leading slash).
    pub fn insert(&mut self, membername: &str, blob: impl Into<Vec<u8>>) {
        self.members.insert(membername.to_string(), blob.into());
    }

    pub fn remove(&mut self, membername: &str) -> Option<Vec<u8>> {
        self.members.shift_remove(membername)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl PhysPkgReader for MemPhysPkg {
    fn blob_for(&self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        self.members
            .get(pack_uri.membername())
            .cloned()
            .ok_or_else(|| OpcError::PartNotFound(pack_uri.to_string()))
    }

    fn contains(&self, pack_uri: &PackURI) -> bool {
        self.members.contains_key(pack_uri.membername())
    }
}

impl PhysPkgWriter for MemPhysPkg {
    fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        self.insert(pack_uri.membername(), blob);
        Ok(())
    }
}

/// A package extracted into a directory, one file per member.
#[derive(Debug, Clone)]
pub struct DirPhysPkg {
    root: PathBuf,
}

impl DirPhysPkg {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, pack_uri: &PackURI) -> PathBuf {
        pack_uri
            .membername()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl PhysPkgReader for DirPhysPkg {
    fn blob_for(&self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        let path = self.path_for(pack_uri);
        if !path.is_file() {
            return Err(OpcError::PartNotFound(pack_uri.to_string()));
        }
        Ok(fs::read(path)?)
    }

    fn contains(&self, pack_uri: &PackURI) -> bool {
        self.path_for(pack_uri).is_file()
    }
}

impl PhysPkgWriter for DirPhysPkg {
    fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        let path = self.path_for(pack_uri);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_round_trip() {
        let mut pkg = MemPhysPkg::new();
        let uri = PackURI::new("/word/document.xml").unwrap();
        pkg.write(&uri, b"<document/>").unwrap();

        assert!(pkg.contains(&uri));
        assert_eq!(pkg.blob_for(&uri).unwrap(), b"<document/>");
        assert_eq!(pkg.member_names().collect::<Vec<_>>(), ["word/document.xml"]);
        assert!(matches!(
            pkg.blob_for(&PackURI::new("/missing.xml").unwrap()),
            Err(OpcError::PartNotFound(_))
        ));
    }

    #[test]
    fn test_rels_lookup() {
        let mut pkg = MemPhysPkg::new();
        pkg.insert("_rels/.rels", "<Relationships/>");
        pkg.insert("[Content_Types].xml", "<Types/>");

        let root = PackURI::new("/").unwrap();
        assert_eq!(pkg.rels_xml_for(&root).unwrap().unwrap(), b"<Relationships/>");
        let doc = PackURI::new("/word/document.xml").unwrap();
        assert_eq!(pkg.rels_xml_for(&doc).unwrap(), None);
        assert_eq!(pkg.content_types_xml().unwrap(), b"<Types/>");
    }

    #[test]
    fn test_dir_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut pkg = DirPhysPkg::new(dir.path());
        let uri = PackURI::new("/word/media/image1.png").unwrap();
        pkg.write(&uri, &[1, 2, 3]).unwrap();

        assert!(pkg.contains(&uri));
        assert_eq!(pkg.blob_for(&uri).unwrap(), vec![1, 2, 3]);
        assert!(!pkg.contains(&PackURI::new("/word/media").unwrap()));
        assert!(dir.path().join("word/media/image1.png").is_file());
    }
}
