//! Schema-ordered child insertion and typed attribute access.
//!
//! Every modeled element class declares its content model: the ordered sequence of
//! child tags the schema permits. A slot is either a single tag or a choice group
//! whose members share one rank. The insertion routine consults that data to place
//! a new child where the schema requires it, so callers may add children in any
//! order and still get valid markup.

use std::marker::PhantomData;

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::oxml::simpletypes::SimpleType;
use crate::ooxml::oxml::tree::{NodeId, XmlTree};

/// One position in a content model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    One(&'static str),
    /// Tags of equal rank, in any order and multiplicity
    Choice(&'static [&'static str]),
}

impl Slot {
    fn contains(&self, tree: &XmlTree, node: NodeId) -> bool {
        match self {
            Slot::One(tag) => tree.is_tag(node, tag),
            Slot::Choice(tags) => tags.iter().any(|tag| tree.is_tag(node, tag)),
        }
    }

    fn names(&self, tag: &str) -> bool {
        match self {
            Slot::One(t) => *t == tag,
            Slot::Choice(tags) => tags.contains(&tag),
        }
    }
}

/// Ordered permissible children of an element class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentModel {
    pub slots: &'static [Slot],
}

impl ContentModel {
    pub const EMPTY: ContentModel = ContentModel { slots: &[] };

    pub const fn new(slots: &'static [Slot]) -> Self {
        Self { slots }
    }

    /// Rank of a prefixed tag in this model.
    pub fn rank_of_tag(&self, tag: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.names(tag))
    }

    /// Rank of an existing node in this model, `None` for children the model
    /// does not mention (text, comments, unmodeled extensions).
    pub fn rank_of_node(&self, tree: &XmlTree, node: NodeId) -> Option<usize> {
        if !tree.is_element(node) {
            return None;
        }
        self.slots.iter().position(|slot| slot.contains(tree, node))
    }

    /// Tags ranked strictly after `tag`.
    pub fn successors(&self, tag: &str) -> impl Iterator<Item = &'static str> + '_ {
        let start = self.rank_of_tag(tag).map(|r| r + 1).unwrap_or(self.slots.len());
        self.slots[start..].iter().flat_map(|slot| match slot {
            Slot::One(t) => std::slice::from_ref(t).iter().copied(),
            Slot::Choice(tags) => tags.iter().copied(),
        })
    }
}

/// Insert the detached `child` (tagged `tag`) under `parent` in schema order.
///
/// The child goes right after the last existing child ranked at or before `tag`.
/// Without such a child it goes right before the first child ranked after `tag`,
/// and without either it is appended.
pub fn insert_in_order(
    tree: &mut XmlTree,
    parent: NodeId,
    child: NodeId,
    tag: &str,
    model: &ContentModel,
) -> Result<NodeId> {
    let rank = model.rank_of_tag(tag).ok_or_else(|| {
        OoxmlError::Xml(format!(
            "<{}> is not a permitted child of <{}>",
            tag,
            tree.tag(parent).unwrap_or("?")
        ))
    })?;

    let mut last_preceding: Option<usize> = None;
    let mut first_following: Option<usize> = None;
    for (index, existing) in tree.children(parent).iter().enumerate() {
        match model.rank_of_node(tree, *existing) {
            Some(r) if r <= rank => last_preceding = Some(index),
            Some(_) if first_following.is_none() => first_following = Some(index),
            _ => {},
        }
    }

    let index = match (last_preceding, first_following) {
        (Some(i), _) => i + 1,
        (None, Some(i)) => i,
        (None, None) => tree.children(parent).len(),
    };
    Ok(tree.insert_child(parent, index, child))
}

/// First child of `parent` with the prefixed tag `tag`.
pub fn first_child(tree: &XmlTree, parent: NodeId, tag: &str) -> Option<NodeId> {
    tree.element_children(parent).find(|c| tree.is_tag(*c, tag))
}

/// First child whose tag is any of `tags`.
pub fn first_child_found_in(tree: &XmlTree, parent: NodeId, tags: &[&str]) -> Option<NodeId> {
    tree.element_children(parent)
        .find(|c| tags.iter().any(|tag| tree.is_tag(*c, tag)))
}

/// All children with the prefixed tag `tag`, in document order.
pub fn children_with_tag(tree: &XmlTree, parent: NodeId, tag: &str) -> Vec<NodeId> {
    tree.element_children(parent)
        .filter(|c| tree.is_tag(*c, tag))
        .collect()
}

/// Detach every child whose tag is one of `tags`.
pub fn remove_all(tree: &mut XmlTree, parent: NodeId, tags: &[&str]) {
    let doomed: Vec<NodeId> = tree
        .element_children(parent)
        .filter(|c| tags.iter().any(|tag| tree.is_tag(*c, tag)))
        .collect();
    for node in doomed {
        tree.detach(node);
    }
}

/// Existing single-occurrence child `tag`, or a new one produced by `make` and
/// inserted in schema order.
pub fn child_or_insert_with<F>(
    tree: &mut XmlTree,
    parent: NodeId,
    tag: &str,
    model: &ContentModel,
    make: F,
) -> Result<NodeId>
where
    F: FnOnce(&mut XmlTree) -> NodeId,
{
    if let Some(existing) = first_child(tree, parent, tag) {
        return Ok(existing);
    }
    let child = make(tree);
    insert_in_order(tree, parent, child, tag, model)
}

/// Existing single-occurrence child `tag`, or a new empty one inserted in order.
pub fn get_or_add_child(
    tree: &mut XmlTree,
    parent: NodeId,
    tag: &str,
    model: &ContentModel,
) -> Result<NodeId> {
    child_or_insert_with(tree, parent, tag, model, |tree| tree.create_element(tag))
}

/// Create a new element `tag` and insert it in order, even if one already exists.
pub fn add_child(
    tree: &mut XmlTree,
    parent: NodeId,
    tag: &str,
    model: &ContentModel,
) -> Result<NodeId> {
    let child = tree.create_element(tag);
    insert_in_order(tree, parent, child, tag, model)
}

/// An attribute that may be absent; absence means `default`.
pub struct OptionalAttribute<S: SimpleType> {
    name: &'static str,
    default: Option<S::Value>,
    _codec: PhantomData<S>,
}

impl<S: SimpleType> OptionalAttribute<S> {
    pub const fn new(name: &'static str, default: Option<S::Value>) -> Self {
        Self {
            name,
            default,
            _codec: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Decoded value, or the default when the attribute is absent.
    pub fn get(&self, tree: &XmlTree, node: NodeId) -> Result<Option<S::Value>> {
        match tree.attr(node, self.name) {
            None => Ok(self.default.clone()),
            Some(raw) => S::from_xml(raw)
                .map(Some)
                .map_err(|reason| OoxmlError::invalid_attr(self.name, raw, reason)),
        }
    }

    /// Write `value`; `None` or the default value removes the attribute.
    pub fn set(&self, tree: &mut XmlTree, node: NodeId, value: Option<&S::Value>) -> Result<()> {
        match value {
            Some(v) if self.default.as_ref() != Some(v) => {
                let raw = S::to_xml(v).map_err(|reason| {
                    OoxmlError::invalid_attr(self.name, S::convert_to_xml(v), reason)
                })?;
                tree.set_attr(node, self.name, &raw);
            },
            _ => {
                tree.remove_attr(node, self.name);
            },
        }
        Ok(())
    }
}

/// An attribute the schema requires to be present.
pub struct RequiredAttribute<S: SimpleType> {
    name: &'static str,
    _codec: PhantomData<S>,
}

impl<S: SimpleType> RequiredAttribute<S> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _codec: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, tree: &XmlTree, node: NodeId) -> Result<S::Value> {
        let raw = tree.attr(node, self.name).ok_or_else(|| {
            OoxmlError::invalid_attr(self.name, "", "required attribute is missing")
        })?;
        S::from_xml(raw).map_err(|reason| OoxmlError::invalid_attr(self.name, raw, reason))
    }

    pub fn set(&self, tree: &mut XmlTree, node: NodeId, value: &S::Value) -> Result<()> {
        let raw = S::to_xml(value).map_err(|reason| {
            OoxmlError::invalid_attr(self.name, S::convert_to_xml(value), reason)
        })?;
        tree.set_attr(node, self.name, &raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::unit::Length;
    use crate::ooxml::oxml::simpletypes::{StPositiveCoordinate, XsdBoolean};
    use proptest::prelude::*;

    const ABC: ContentModel = ContentModel::new(&[
        Slot::One("w:a"),
        Slot::Choice(&["w:b1", "w:b2"]),
        Slot::One("w:c"),
    ]);

    fn names(tree: &XmlTree, parent: NodeId) -> Vec<String> {
        tree.element_children(parent)
            .map(|c| tree.tag(c).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_insert_respects_model_regardless_of_call_order() {
        let mut tree = XmlTree::with_root("w:parent");
        let root = tree.root().unwrap();
        add_child(&mut tree, root, "w:c", &ABC).unwrap();
        add_child(&mut tree, root, "w:a", &ABC).unwrap();
        add_child(&mut tree, root, "w:b2", &ABC).unwrap();
        add_child(&mut tree, root, "w:b1", &ABC).unwrap();
        assert_eq!(names(&tree, root), ["w:a", "w:b2", "w:b1", "w:c"]);
    }

    #[test]
    fn test_insert_skips_unmodeled_children() {
        let mut tree = XmlTree::with_root("w:parent");
        let root = tree.root().unwrap();
        let ext = tree.create_element("w14:ext");
        tree.append_child(root, ext);
        let c = tree.create_element("w:c");
        tree.append_child(root, c);
        add_child(&mut tree, root, "w:a", &ABC).unwrap();
        assert_eq!(names(&tree, root), ["w14:ext", "w:a", "w:c"]);
    }

    #[test]
    fn test_insert_rejects_tags_outside_model() {
        let mut tree = XmlTree::with_root("w:parent");
        let root = tree.root().unwrap();
        assert!(add_child(&mut tree, root, "w:zzz", &ABC).is_err());
    }

    #[test]
    fn test_get_or_add_returns_existing() {
        let mut tree = XmlTree::with_root("w:parent");
        let root = tree.root().unwrap();
        let first = get_or_add_child(&mut tree, root, "w:a", &ABC).unwrap();
        let second = get_or_add_child(&mut tree, root, "w:a", &ABC).unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.children(root).len(), 1);
    }

    #[test]
    fn test_remove_all_and_lookup_helpers() {
        let mut tree = XmlTree::with_root("w:parent");
        let root = tree.root().unwrap();
        add_child(&mut tree, root, "w:b1", &ABC).unwrap();
        add_child(&mut tree, root, "w:b1", &ABC).unwrap();
        let c = add_child(&mut tree, root, "w:c", &ABC).unwrap();
        assert_eq!(children_with_tag(&tree, root, "w:b1").len(), 2);
        assert_eq!(first_child_found_in(&tree, root, &["w:a", "w:c"]), Some(c));
        remove_all(&mut tree, root, &["w:b1"]);
        assert_eq!(names(&tree, root), ["w:c"]);
    }

    #[test]
    fn test_successors() {
        let after_a: Vec<_> = ABC.successors("w:a").collect();
        assert_eq!(after_a, ["w:b1", "w:b2", "w:c"]);
        assert_eq!(ABC.successors("w:c").count(), 0);
    }

    const NO_CHANGE_ASPECT: OptionalAttribute<XsdBoolean> =
        OptionalAttribute::new("noChangeAspect", Some(false));
    const CX: RequiredAttribute<StPositiveCoordinate> = RequiredAttribute::new("cx");

    #[test]
    fn test_optional_attribute_absent_means_default() {
        let mut tree = XmlTree::with_root("a:graphicFrameLocks");
        let node = tree.root().unwrap();
        assert_eq!(NO_CHANGE_ASPECT.get(&tree, node).unwrap(), Some(false));

        NO_CHANGE_ASPECT.set(&mut tree, node, Some(&true)).unwrap();
        assert_eq!(tree.to_xml(node), r#"<a:graphicFrameLocks noChangeAspect="1"/>"#);

        NO_CHANGE_ASPECT.set(&mut tree, node, Some(&false)).unwrap();
        assert_eq!(tree.to_xml(node), "<a:graphicFrameLocks/>");
    }

    #[test]
    fn test_invalid_attribute_value_is_reported() {
        let mut tree = XmlTree::with_root("wp:extent");
        let node = tree.root().unwrap();
        tree.set_attr(node, "cx", "wide");
        match CX.get(&tree, node) {
            Err(OoxmlError::InvalidAttributeValue { attr, value, .. }) => {
                assert_eq!(attr, "cx");
                assert_eq!(value, "wide");
            },
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_required_attribute_round_trip() {
        let mut tree = XmlTree::with_root("wp:extent");
        let node = tree.root().unwrap();
        assert!(CX.get(&tree, node).is_err());
        CX.set(&mut tree, node, &Length::from_emus(444)).unwrap();
        assert_eq!(CX.get(&tree, node).unwrap(), Length::from_emus(444));
        assert!(CX.set(&mut tree, node, &Length::from_emus(-1)).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_insertion_order_independent(order in Just(vec!["w:a", "w:b1", "w:c"]).prop_shuffle()) {
            let mut tree = XmlTree::with_root("w:parent");
            let root = tree.root().unwrap();
            for tag in &order {
                add_child(&mut tree, root, tag, &ABC).unwrap();
            }
            prop_assert_eq!(names(&tree, root), vec!["w:a", "w:b1", "w:c"]);
        }
    }
}
