/// Open Packaging Conventions (OPC) implementation.
///
/// A package is a set of parts named by [`PackURI`]s, joined by typed
/// [`Relationship`]s and described by a content type map. This module covers the
/// in-memory graph and its serialization to and from a physical package:
///
/// - Package structure (parts, relationships, content types)
/// - Partname and relationship id allocation
/// - Loading by walking the relationship graph, saving with dangling-target checks
///
/// The archive container is reached through the [`PhysPkgReader`] and
/// [`PhysPkgWriter`] traits.
pub mod constants;
pub mod content_types;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

pub use content_types::ContentTypes;
pub use error::{OpcError, Result};
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, PartFactory, XmlPart};
pub use phys_pkg::{DirPhysPkg, MemPhysPkg, PhysPkgReader, PhysPkgWriter};
pub use rel::{Relationship, Relationships};
