//! Namespace prefix table.
//!
//! Element tags throughout the crate are written with the conventional prefixes
//! used by Word (`w:p`, `wp:inline`, `a:blip`, ...). The table below maps those
//! prefixes to namespace URIs. It is built at compile time and never mutated.

use phf::phf_map;

pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const C: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
pub const DGM: &str = "http://schemas.openxmlformats.org/drawingml/2006/diagram";
pub const PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

static NSMAP: phf::Map<&'static str, &'static str> = phf_map! {
    "a" => A,
    "c" => C,
    "cp" => "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
    "dc" => "http://purl.org/dc/elements/1.1/",
    "dcmitype" => "http://purl.org/dc/dcmitype/",
    "dcterms" => "http://purl.org/dc/terms/",
    "dgm" => DGM,
    "m" => "http://schemas.openxmlformats.org/officeDocument/2006/math",
    "mc" => "http://schemas.openxmlformats.org/markup-compatibility/2006",
    "pic" => PIC,
    "r" => R,
    "sl" => "http://schemas.openxmlformats.org/schemaLibrary/2006/main",
    "v" => "urn:schemas-microsoft-com:vml",
    "w" => W,
    "w14" => "http://schemas.microsoft.com/office/word/2010/wordml",
    "wp" => WP,
    "wp14" => "http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing",
    "wps" => "http://schemas.microsoft.com/office/word/2010/wordprocessingShape",
    "xml" => "http://www.w3.org/XML/1998/namespace",
    "xsi" => "http://www.w3.org/2001/XMLSchema-instance",
};

/// Namespace URI for a well-known prefix.
#[inline]
pub fn namespace_uri(prefix: &str) -> Option<&'static str> {
    NSMAP.get(prefix).copied()
}

/// Conventional prefix for a namespace URI.
pub fn prefix_for(uri: &str) -> Option<&'static str> {
    NSMAP
        .entries()
        .find(|(_, ns)| **ns == uri)
        .map(|(prefix, _)| *prefix)
}

/// Split a qualified tag like `"w:p"` into `(Some("w"), "p")`.
#[inline]
pub fn split_qname(tag: &str) -> (Option<&str>, &str) {
    match memchr::memchr(b':', tag.as_bytes()) {
        Some(pos) => (Some(&tag[..pos]), &tag[pos + 1..]),
        None => (None, tag),
    }
}

/// Clark notation (`{uri}local`) for a prefixed tag, e.g. for diagnostics.
pub fn clark(tag: &str) -> String {
    match split_qname(tag) {
        (Some(prefix), local) => match namespace_uri(prefix) {
            Some(uri) => format!("{{{}}}{}", uri, local),
            None => tag.to_string(),
        },
        (None, local) => local.to_string(),
    }
}

/// `xmlns:*` declarations for the given prefixes as `(attribute name, uri)` pairs,
/// in the order given. Unknown prefixes are skipped.
pub fn nsdecls(prefixes: &[&str]) -> Vec<(String, &'static str)> {
    prefixes
        .iter()
        .filter_map(|p| namespace_uri(p).map(|uri| (format!("xmlns:{}", p), uri)))
        .collect()
}
