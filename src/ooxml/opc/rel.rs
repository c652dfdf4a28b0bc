/// Relationship-related objects for OPC packages.
///
/// This module provides types for managing relationships between parts in an OPC package,
/// including internal and external relationships.
use std::collections::HashSet;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::common::xml::escape_attr;
use crate::ooxml::opc::constants::{namespace, target_mode};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;

/// A single relationship from a source part to a target.
///
/// Represents a connection between parts in an OPC package, identified by an rId
/// (relationship ID). Can be either internal (pointing to another part) or external
/// (pointing to an external URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a relative part reference or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference.
    ///
    /// For internal relationships, this is a relative part reference.
    /// For external relationships, this is an absolute URL.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Get the absolute target partname for internal relationships.
    ///
    /// Returns an error if this is an external relationship.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target partname",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Numeric suffix of an `rId{n}` id.
fn r_id_number(r_id: &str) -> Option<u32> {
    r_id.strip_prefix("rId")
        .and_then(|digits| atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok())
}

/// Outgoing relationships of one source (a part or the package itself).
///
/// Iteration follows insertion order. Every id the collection has ever issued or
/// loaded is remembered, so removing a relationship never makes its id available
/// again.
#[derive(Debug, Clone)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    rels: IndexMap<String, Relationship>,

    /// Numeric suffixes of every `rId{n}` seen by this collection
    issued: HashSet<u32>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    ///
    /// # Arguments
    /// * `base_uri` - Base URI for resolving relative references
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: IndexMap::new(),
            issued: HashSet::new(),
        }
    }

    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Insert a relationship under a caller-chosen id, e.g. when loading.
    ///
    /// Fails when `r_id` is already present in the collection.
    pub fn load(
        &mut self,
        r_id: &str,
        reltype: &str,
        target_ref: &str,
        is_external: bool,
    ) -> Result<&Relationship> {
        if self.rels.contains_key(r_id) {
            return Err(OpcError::InvalidRelationship(format!(
                "duplicate relationship id {}",
                r_id
            )));
        }
        if let Some(n) = r_id_number(r_id) {
            self.issued.insert(n);
        }
        let rel = Relationship::new(
            r_id.to_string(),
            reltype.to_string(),
            target_ref.to_string(),
            self.base_uri.clone(),
            is_external,
        );
        let (index, _) = self.rels.insert_full(r_id.to_string(), rel);
        Ok(&self.rels[index])
    }

    /// Add a relationship with a freshly allocated id and return that id.
    ///
    /// Never deduplicates: two calls with the same type and target yield two
    /// relationships.
    pub fn add(&mut self, reltype: &str, target_ref: &str, is_external: bool) -> String {
        let r_id = self.next_r_id();
        let number = r_id_number(&r_id).unwrap_or_default();
        self.issued.insert(number);
        let rel = Relationship::new(
            r_id.clone(),
            reltype.to_string(),
            target_ref.to_string(),
            self.base_uri.clone(),
            is_external,
        );
        self.rels.insert(r_id.clone(), rel);
        r_id
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Get or add an internal relationship to a target part.
    ///
    /// If a relationship of the given type to the target already exists,
    /// returns its id. Otherwise, creates a new one with the next available rId.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> String {
        match self.find(reltype, target_ref, false) {
            Some(r_id) => r_id,
            None => self.add(reltype, target_ref, false),
        }
    }

    /// Like [`get_or_add`](Self::get_or_add), for external targets.
    pub fn get_or_add_ext_rel(&mut self, reltype: &str, target_ref: &str) -> String {
        match self.find(reltype, target_ref, true) {
            Some(r_id) => r_id,
            None => self.add(reltype, target_ref, true),
        }
    }

    fn find(&self, reltype: &str, target_ref: &str, is_external: bool) -> Option<String> {
        self.rels
            .values()
            .find(|rel| {
                rel.reltype() == reltype
                    && rel.target_ref() == target_ref
                    && rel.is_external() == is_external
            })
            .map(|rel| rel.r_id().to_string())
    }

    /// The smallest `rId{n}` this collection has never issued.
    fn next_r_id(&self) -> String {
        let mut next_num = 1u32;
        while self.issued.contains(&next_num) {
            next_num += 1;
        }
        let mut buf = itoa::Buffer::new();
        let mut r_id = String::with_capacity(8);
        r_id.push_str("rId");
        r_id.push_str(buf.format(next_num));
        r_id
    }

    /// Get the relationship of a specific type.
    ///
    /// Returns an error if no relationship of the type is found,
    /// or if multiple relationships of the type exist.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.rels.values().filter(|rel| rel.reltype() == reltype);
        match (matching.next(), matching.next()) {
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "No relationship of type '{}'",
                reltype
            ))),
            (Some(rel), None) => Ok(rel),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "Multiple relationships of type '{}'",
                reltype
            ))),
        }
    }

    /// Relationships in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Remove a relationship by its ID. The id stays retired.
    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        self.rels.shift_remove(r_id)
    }

    /// Parse a `.rels` document into a collection rooted at `base_uri`.
    pub fn from_xml(base_uri: &str, xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new(base_uri.to_string());
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target = None;
                    let mut external = false;
                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.as_ref() {
                            b"Id" => r_id = Some(value),
                            b"Type" => reltype = Some(value),
                            b"Target" => target = Some(value),
                            b"TargetMode" => external = value == target_mode::EXTERNAL,
                            _ => {},
                        }
                    }
                    match (r_id, reltype, target) {
                        (Some(r_id), Some(reltype), Some(target)) => {
                            rels.load(&r_id, &reltype, &target, external)?;
                        },
                        _ => log::warn!("skipping incomplete relationship in {}", base_uri),
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }
        Ok(rels)
    }

    /// Serialize to a `.rels` document, in insertion order.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Relationships xmlns=""#);
        xml.push_str(namespace::OPC_RELATIONSHIPS);
        xml.push_str(r#"">"#);

        for rel in self.rels.values() {
            xml.push_str(r#"<Relationship Id=""#);
            xml.push_str(&escape_attr(rel.r_id()));
            xml.push_str(r#"" Type=""#);
            xml.push_str(&escape_attr(rel.reltype()));
            xml.push_str(r#"" Target=""#);
            xml.push_str(&escape_attr(rel.target_ref()));
            xml.push('"');
            if rel.is_external() {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    #[test]
    fn test_add_allocates_sequential_ids() {
        let mut rels = Relationships::new("/word".to_string());
        assert_eq!(rels.add(rt::IMAGE, "media/image1.png", false), "rId1");
        assert_eq!(rels.add(rt::IMAGE, "media/image1.png", false), "rId2");
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut rels = Relationships::new("/word".to_string());
        rels.add(rt::IMAGE, "media/image1.png", false);
        let second = rels.add(rt::IMAGE, "media/image2.png", false);
        rels.remove(&second);
        assert_eq!(rels.add(rt::IMAGE, "media/image3.png", false), "rId3");
    }

    #[test]
    fn test_fills_gaps_left_by_loaded_ids() {
        let mut rels = Relationships::new("/word".to_string());
        rels.load("rId1", rt::STYLES, "styles.xml", false).unwrap();
        rels.load("rId3", rt::IMAGE, "media/image1.png", false).unwrap();
        assert_eq!(rels.add(rt::IMAGE, "media/image2.png", false), "rId2");
        assert_eq!(rels.add(rt::IMAGE, "media/image3.png", false), "rId4");
        assert!(rels.load("rId1", rt::STYLES, "styles.xml", false).is_err());
    }

    #[test]
    fn test_get_or_add() {
        let mut rels = Relationships::new("/word".to_string());
        assert_eq!(rels.get_or_add("type1", "target1"), "rId1");
        assert_eq!(rels.get_or_add("type1", "target1"), "rId1");
        assert_eq!(rels.get_or_add("type1", "target2"), "rId2");
        assert_eq!(rels.get_or_add_ext_rel("type1", "target1"), "rId3");
        assert!(rels.get("rId3").unwrap().is_external());
    }

    #[test]
    fn test_target_partname_resolves_against_base() {
        let mut rels = Relationships::new("/word".to_string());
        let r_id = rels.add(rt::IMAGE, "media/image1.png", false);
        let rel = rels.get(&r_id).unwrap();
        assert_eq!(rel.target_partname().unwrap().as_str(), "/word/media/image1.png");

        let ext = rels.add(rt::HYPERLINK, "https://example.com", true);
        assert!(rels.get(&ext).unwrap().target_partname().is_err());
    }

    #[test]
    fn test_part_with_reltype() {
        let mut rels = Relationships::default();
        assert!(rels.part_with_reltype(rt::OFFICE_DOCUMENT).is_err());
        rels.add(rt::OFFICE_DOCUMENT, "word/document.xml", false);
        assert_eq!(
            rels.part_with_reltype(rt::OFFICE_DOCUMENT).unwrap().target_ref(),
            "word/document.xml"
        );
        rels.add(rt::OFFICE_DOCUMENT, "word/other.xml", false);
        assert!(rels.part_with_reltype(rt::OFFICE_DOCUMENT).is_err());
    }

    #[test]
    fn test_xml_round_trip_keeps_ids_and_order() {
        let mut rels = Relationships::new("/word".to_string());
        rels.load("rId5", rt::STYLES, "styles.xml", false).unwrap();
        rels.load("rId2", rt::HYPERLINK, "https://example.com/?a=1&b=2", true)
            .unwrap();
        let xml = rels.to_xml();
        assert!(xml.contains("a=1&amp;b=2"));

        let parsed = Relationships::from_xml("/word", xml.as_bytes()).unwrap();
        let ids: Vec<&str> = parsed.iter().map(|r| r.r_id()).collect();
        assert_eq!(ids, ["rId5", "rId2"]);
        assert!(parsed.get("rId2").unwrap().is_external());
        assert_eq!(
            parsed.get("rId2").unwrap().target_ref(),
            "https://example.com/?a=1&b=2"
        );
        assert_eq!(parsed.to_xml(), xml);
    }
}
