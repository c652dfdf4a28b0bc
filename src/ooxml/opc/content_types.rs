/// The `[Content_Types].xml` stream: content types by extension and by partname.
use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::common::xml::escape_attr;
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;

/// Content type declarations of a package.
///
/// Lookups are case-insensitive, as partnames are in OPC; the spelling first
/// declared is kept for output.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    /// Lowercased extension -> content type
    defaults: IndexMap<String, String>,
    /// Lowercased partname -> (partname as declared, content type)
    overrides: IndexMap<String, (String, String)>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTypes {
    /// Declarations every package needs: `.rels` and plain `.xml`.
    pub fn new() -> Self {
        let mut types = Self::empty();
        types.add_default("rels", ct::OPC_RELATIONSHIPS);
        types.add_default("xml", ct::XML);
        types
    }

    fn empty() -> Self {
        Self {
            defaults: IndexMap::new(),
            overrides: IndexMap::new(),
        }
    }

    /// Parse a `[Content_Types].xml` stream.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut types = Self::empty();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if matches!(e.local_name().as_ref(), b"Default" | b"Override") =>
                {
                    let is_default = e.local_name().as_ref() == b"Default";
                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => {
                                key = Some(attr.unescape_value()?.into_owned())
                            },
                            b"ContentType" => {
                                content_type = Some(attr.unescape_value()?.into_owned())
                            },
                            _ => {},
                        }
                    }
                    match (key, content_type, is_default) {
                        (Some(ext), Some(value), true) => types.add_default(&ext, &value),
                        (Some(partname), Some(value), false) => {
                            types.add_override(&partname, &value)
                        },
                        _ => log::warn!("skipping incomplete content type declaration"),
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(types)
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert(extension.to_ascii_lowercase(), content_type.to_string());
    }

    pub fn add_override(&mut self, partname: &str, content_type: &str) {
        let key = partname.to_ascii_lowercase();
        match self.overrides.get_mut(&key) {
            Some(entry) => entry.1 = content_type.to_string(),
            None => {
                self.overrides
                    .insert(key, (partname.to_string(), content_type.to_string()));
            },
        }
    }

    pub fn remove_override(&mut self, partname: &PackURI) -> Option<String> {
        self.overrides
            .shift_remove(&partname.as_str().to_ascii_lowercase())
            .map(|(_, content_type)| content_type)
    }

    /// Declare `content_type` for `partname`, as an extension default when the
    /// pairing is a well-known one and as an override otherwise.
    pub fn register(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext().to_ascii_lowercase();
        match self.defaults.get(&ext) {
            Some(existing) if existing == content_type => {},
            None if is_default_pairing(&ext, content_type) => {
                self.add_default(&ext, content_type);
            },
            _ => self.add_override(partname.as_str(), content_type),
        }
    }

    /// Content type of `partname`: its override if any, else its extension default.
    pub fn content_type_for(&self, partname: &PackURI) -> Result<&str> {
        if let Some((_, content_type)) = self
            .overrides
            .get(&partname.as_str().to_ascii_lowercase())
        {
            return Ok(content_type);
        }
        self.defaults
            .get(&partname.ext().to_ascii_lowercase())
            .map(String::as_str)
            .ok_or_else(|| OpcError::ContentTypeNotFound(partname.to_string()))
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides
            .values()
            .map(|(partname, content_type)| (partname.as_str(), content_type.as_str()))
    }

    /// Serialize, defaults sorted by extension then overrides sorted by partname.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(
            256 + self.defaults.len() * 96 + self.overrides.len() * 160,
        );

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns=""#);
        xml.push_str(namespace::OPC_CONTENT_TYPES);
        xml.push_str(r#"">"#);

        let mut defaults: Vec<_> = self.defaults().collect();
        defaults.sort_unstable();
        for (ext, content_type) in defaults {
            xml.push_str(r#"<Default Extension=""#);
            xml.push_str(&escape_attr(ext));
            xml.push_str(r#"" ContentType=""#);
            xml.push_str(&escape_attr(content_type));
            xml.push_str(r#""/>"#);
        }

        let mut overrides: Vec<_> = self.overrides().collect();
        overrides.sort_unstable();
        for (partname, content_type) in overrides {
            xml.push_str(r#"<Override PartName=""#);
            xml.push_str(&escape_attr(partname));
            xml.push_str(r#"" ContentType=""#);
            xml.push_str(&escape_attr(content_type));
            xml.push_str(r#""/>"#);
        }

        xml.push_str("</Types>");
        xml
    }
}

/// Extension/content-type pairs written as defaults rather than overrides.
fn is_default_pairing(ext: &str, content_type: &str) -> bool {
    matches!(
        (ext, content_type),
        ("rels", ct::OPC_RELATIONSHIPS)
            | ("xml", ct::XML)
            | ("png", ct::PNG)
            | ("jpg", ct::JPEG)
            | ("jpeg", ct::JPEG)
            | ("jpe", ct::JPEG)
            | ("gif", ct::GIF)
            | ("bmp", ct::BMP)
            | ("tif", ct::TIFF)
            | ("tiff", ct::TIFF)
    )
}
