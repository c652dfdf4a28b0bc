//! Arena-backed mutable markup tree.
//!
//! Nodes live in a single `Vec` owned by [`XmlTree`] and are addressed by
//! [`NodeId`] handles. Detached nodes stay in the arena, so a handle never dangles;
//! it simply stops being reachable from the root.
//!
//! Text, comments and CDATA are stored exactly as they appeared in the source
//! (still escaped). Parsed attributes keep their source order, quote character
//! and escaping until they are overwritten, parsed elements remember whether
//! they were written self-closing, and the markup around the root element is
//! kept verbatim. Re-serializing an untouched document is byte-identical to
//! its input.

use smallvec::SmallVec;

use crate::common::xml::{escape_attr, escape_text};
use crate::ooxml::oxml::ns;

/// Handle to a node inside an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One attribute, with its qualified key as written (`r:embed`, `xmlns:w`, `cx`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    /// Unescaped value
    pub value: String,
    /// Quoted value exactly as it appeared in the source
    raw: Option<String>,
}

impl Attribute {
    /// Quoted source text of a parsed, unmodified value.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct ElementData {
    /// Qualified tag as written, e.g. `w:p`
    tag: String,
    attrs: SmallVec<[Attribute; 4]>,
    /// Written as `<x/>` when empty; `false` for parsed `<x></x>`
    self_closing: bool,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementData),
    /// Raw (escaped) character data
    Text(String),
    Comment(String),
    CData(String),
    ProcessingInstruction(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A markup document: an arena of nodes plus an optional root element.
#[derive(Debug, Clone, Default)]
pub struct XmlTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    /// Raw XML declaration including `<?` and `?>`, if the source had one
    declaration: Option<String>,
    /// Raw markup between the declaration and the root element
    prolog: Option<String>,
    /// Raw markup after the root element
    epilog: String,
}

impl XmlTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree whose root is a new, empty element `tag`.
    pub fn with_root(tag: &str) -> Self {
        let mut tree = Self::new();
        let root = tree.create_element(tag);
        tree.root = Some(root);
        tree
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.detach(root);
        self.root = Some(root);
    }

    pub fn declaration(&self) -> Option<&str> {
        self.declaration.as_deref()
    }

    pub fn set_declaration(&mut self, decl: Option<String>) {
        self.declaration = decl;
    }

    /// Markup between the declaration and the root. `None` writes a single newline.
    pub fn prolog(&self) -> Option<&str> {
        self.prolog.as_deref()
    }

    pub fn set_prolog(&mut self, prolog: Option<String>) {
        self.prolog = prolog;
    }

    /// Keep raw markup found outside the root element, in place.
    pub(crate) fn push_misc(&mut self, raw: &str) {
        if self.root.is_some() {
            self.epilog.push_str(raw);
        } else {
            self.prolog.get_or_insert_with(String::new).push_str(raw);
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_string(),
            attrs: SmallVec::new(),
            self_closing: true,
        }))
    }

    /// Create a detached element carrying `attrs` in the given order.
    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        for (key, value) in attrs {
            self.set_attr(id, key, value);
        }
        id
    }

    /// Create a detached text node from already-escaped character data.
    pub fn create_raw_text(&mut self, raw: &str) -> NodeId {
        self.push(NodeKind::Text(raw.to_string()))
    }

    /// Create a detached text node, escaping `text`.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(escape_text(text)))
    }

    pub(crate) fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.push(kind)
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element(_))
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.index()].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Qualified tag of an element, `None` for non-element nodes.
    #[inline]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.tag(id).map(|tag| ns::split_qname(tag).1)
    }

    /// Namespace URI of an element, resolved through `xmlns` declarations in scope
    /// and falling back to the well-known prefix table.
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let tag = self.tag(id)?;
        let (prefix, _) = ns::split_qname(tag);
        self.resolve_prefix(id, prefix)
    }

    /// Resolve `prefix` (or the default namespace for `None`) as seen from `id`.
    pub fn resolve_prefix(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        let decl_key = match prefix {
            Some(p) => format!("xmlns:{}", p),
            None => "xmlns".to_string(),
        };
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if let Some(uri) = self.attr(node, &decl_key) {
                return Some(uri);
            }
            cursor = self.parent(node);
        }
        prefix.and_then(ns::namespace_uri)
    }

    /// Whether element `id` is the element named by the prefixed tag `tag`,
    /// compared by namespace URI and local name.
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        let Some(actual) = self.tag(id) else {
            return false;
        };
        let (prefix, local) = ns::split_qname(tag);
        if ns::split_qname(actual).1 != local {
            return false;
        }
        match prefix.and_then(ns::namespace_uri) {
            Some(expected) => self.namespace_uri(id) == Some(expected),
            // unprefixed or unknown prefix: nothing to resolve against
            None => actual == tag,
        }
    }

    // ------------------------------------------------------------------
    // attributes
    // ------------------------------------------------------------------

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.element(id).map(|el| el.attrs.as_slice()).unwrap_or(&[])
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        self.put_attr(id, key, value, None);
    }

    /// Set a parsed attribute along with its quoted source text.
    pub(crate) fn set_source_attr(&mut self, id: NodeId, key: &str, value: &str, raw: String) {
        self.put_attr(id, key, value, Some(raw));
    }

    fn put_attr(&mut self, id: NodeId, key: &str, value: &str, raw: Option<String>) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        match el.attrs.iter_mut().find(|a| a.key == key) {
            Some(attr) => {
                attr.value = value.to_string();
                attr.raw = raw;
            },
            None => el.attrs.push(Attribute {
                key: key.to_string(),
                value: value.to_string(),
                raw,
            }),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, key: &str) -> Option<String> {
        let el = self.element_mut(id)?;
        let pos = el.attrs.iter().position(|a| a.key == key)?;
        Some(el.attrs.remove(pos).value)
    }

    /// Whether an element with no children is written as `<x/>`.
    pub fn is_self_closing(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.self_closing)
    }

    pub fn set_self_closing(&mut self, id: NodeId, self_closing: bool) {
        if let Some(el) = self.element_mut(id) {
            el.self_closing = self_closing;
        }
    }

    // ------------------------------------------------------------------
    // structure
    // ------------------------------------------------------------------

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Element children in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.is_element(*c))
    }

    /// Detach `child` from wherever it is and append it to `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        self.detach(child);
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
        child
    }

    /// Detach `child` and insert it at `index` among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> NodeId {
        self.detach(child);
        let children = &mut self.nodes[parent.index()].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.index()].parent = Some(parent);
        child
    }

    /// Remove `id` from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
    }

    /// All nodes below `id` in document order (pre-order), excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// First descendant element matching the prefixed tag `tag`.
    pub fn find_descendant(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(id).find(|d| self.is_tag(*d, tag))
    }

    /// Every descendant element matching `tag`, in document order.
    pub fn find_descendants<'a>(
        &'a self,
        id: NodeId,
        tag: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id).filter(move |d| self.is_tag(*d, tag))
    }

    /// Copy the subtree rooted at `id` into fresh detached nodes.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let kind = self.kind(id).clone();
        let copy = self.push(kind);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.deep_copy(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    // ------------------------------------------------------------------
    // serialization
    // ------------------------------------------------------------------

    /// Serialize the subtree rooted at `id`.
    pub fn to_xml(&self, id: NodeId) -> String {
        let mut out = String::with_capacity(256);
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the whole document, declaration included.
    pub fn to_document_xml(&self) -> String {
        let mut out = String::with_capacity(self.nodes.len() * 32);
        if let Some(decl) = &self.declaration {
            out.push_str(decl);
            if self.prolog.is_none() {
                out.push('\n');
            }
        }
        if let Some(prolog) = &self.prolog {
            out.push_str(prolog);
        }
        if let Some(root) = self.root {
            self.write_node(root, &mut out);
        }
        out.push_str(&self.epilog);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.index()];
        match &node.kind {
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for attr in &el.attrs {
                    out.push(' ');
                    out.push_str(&attr.key);
                    out.push('=');
                    match &attr.raw {
                        Some(raw) => out.push_str(raw),
                        None => {
                            out.push('"');
                            out.push_str(&escape_attr(&attr.value));
                            out.push('"');
                        },
                    }
                }
                if node.children.is_empty() && el.self_closing {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in &node.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            },
            NodeKind::Text(raw) => out.push_str(raw),
            NodeKind::Comment(raw) => {
                out.push_str("<!--");
                out.push_str(raw);
                out.push_str("-->");
            },
            NodeKind::CData(raw) => {
                out.push_str("<![CDATA[");
                out.push_str(raw);
                out.push_str("]]>");
            },
            NodeKind::ProcessingInstruction(raw) => {
                out.push_str("<?");
                out.push_str(raw);
                out.push_str("?>");
            },
        }
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct Descendants<'a> {
    tree: &'a XmlTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
