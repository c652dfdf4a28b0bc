/// Package parts.
///
/// A part is a named unit of content with a content type and its own outgoing
/// relationships. Binary payloads live in [`BlobPart`]; markup payloads are parsed
/// into an editable [`XmlTree`] held by [`XmlPart`] and serialized on demand.
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::oxml::{XmlTree, parse_xml};

/// A part in an OPC package.
pub trait Part: Any + fmt::Debug + Send {
    fn partname(&self) -> &PackURI;

    fn content_type(&self) -> &str;

    /// Serialized payload. Markup parts serialize their current tree.
    fn blob(&self) -> Cow<'_, [u8]>;

    fn rels(&self) -> &Relationships;

    fn rels_mut(&mut self) -> &mut Relationships;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Relationship id of a `reltype` relationship to `target`, reusing an
    /// existing one with the same type and target.
    fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        let target_ref = target.relative_ref(self.partname().base_uri());
        self.rels_mut().get_or_add(reltype, &target_ref)
    }

    /// Relationship id of an external `reltype` relationship to `url`.
    fn relate_to_ext(&mut self, url: &str, reltype: &str) -> String {
        self.rels_mut().get_or_add_ext_rel(reltype, url)
    }

    /// Target reference of relationship `r_id`.
    fn target_ref(&self, r_id: &str) -> Result<&str> {
        self.rels()
            .get(r_id)
            .map(|rel| rel.target_ref())
            .ok_or_else(|| OpcError::RelationshipNotFound(format!("rId: {}", r_id)))
    }
}

impl<'a> dyn Part + 'a {
    pub fn downcast_ref<T: Part>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Part>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// A part with an opaque binary payload.
#[derive(Debug)]
pub struct BlobPart {
    partname: PackURI,
    content_type: String,
    blob: Arc<Vec<u8>>,
    rels: Relationships,
}

impl BlobPart {
    pub fn new(partname: PackURI, content_type: String, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            blob: Arc::new(blob),
            rels,
        }
    }
}

impl Part for BlobPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.blob.as_slice())
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A part whose payload is a parsed, editable markup tree.
#[derive(Debug)]
pub struct XmlPart {
    partname: PackURI,
    content_type: String,
    tree: XmlTree,
    rels: Relationships,
}

impl XmlPart {
    pub fn new(partname: PackURI, content_type: String, tree: XmlTree) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            tree,
            rels,
        }
    }

    /// Parse `blob` into a markup part.
    pub fn load(partname: PackURI, content_type: String, blob: &[u8]) -> Result<Self> {
        let tree = parse_xml(blob)
            .map_err(|e| OpcError::XmlError(format!("{}: {}", partname, e)))?;
        Ok(Self::new(partname, content_type, tree))
    }

    #[inline]
    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }

    /// Borrow the tree and the relationships together, for edits that touch both.
    pub fn tree_and_rels_mut(&mut self) -> (&mut XmlTree, &mut Relationships) {
        (&mut self.tree, &mut self.rels)
    }
}

impl Part for XmlPart {
    fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn blob(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.tree.to_document_xml().into_bytes())
    }

    fn rels(&self) -> &Relationships {
        &self.rels
    }

    fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Builds a part from a loaded payload.
pub type PartConstructor = fn(PackURI, String, Vec<u8>) -> Result<Box<dyn Part>>;

/// Selects the part type for loaded content.
///
/// Custom constructors are consulted in registration order; the first whose
/// predicate accepts the content type wins. Otherwise markup content types become
/// [`XmlPart`]s and everything else a [`BlobPart`].
#[derive(Clone, Default)]
pub struct PartFactory {
    custom: Vec<(fn(&str) -> bool, PartConstructor)>,
}

impl PartFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route content types accepted by `predicate` to `constructor`.
    pub fn register(&mut self, predicate: fn(&str) -> bool, constructor: PartConstructor) {
        self.custom.push((predicate, constructor));
    }

    pub fn load(
        &self,
        partname: PackURI,
        content_type: String,
        blob: Vec<u8>,
    ) -> Result<Box<dyn Part>> {
        if let Some((_, constructor)) = self
            .custom
            .iter()
            .find(|(accepts, _)| accepts(&content_type))
        {
            return constructor(partname, content_type, blob);
        }
        if ct::is_xml(&content_type) {
            Ok(Box::new(XmlPart::load(partname, content_type, &blob)?))
        } else {
            Ok(Box::new(BlobPart::new(partname, content_type, blob)))
        }
    }
}

impl fmt::Debug for PartFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartFactory")
            .field("custom", &self.custom.len())
            .finish()
    }
}
