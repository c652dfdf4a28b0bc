/// Partnames: absolute, slash-separated paths that name a part inside a package.
use std::fmt;

/// The package pseudo-partname, the source of package-level relationships
pub const PACKAGE_URI: &str = "/";

/// The partname of the content types stream
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

/// A partname such as `/word/media/image1.png`.
///
/// Always starts with `/`. Comparisons are exact; callers normalize through
/// [`PackURI::from_rel_ref`] when resolving relationship targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Resolve `relative_ref` (e.g. `../media/image1.png`) against the directory
    /// `base_uri`. A reference starting with `/` is taken as already absolute.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        if relative_ref.starts_with('/') {
            return Self::new(normalize(relative_ref));
        }
        let mut joined = String::with_capacity(base_uri.len() + relative_ref.len() + 1);
        joined.push_str(base_uri);
        if !base_uri.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(relative_ref);
        Self::new(normalize(&joined))
    }

    /// The partname `template` with `{}` replaced by `n`, e.g.
    /// `/word/media/image{}.png` with 3 gives `/word/media/image3.png`.
    pub fn from_template(template: &str, n: u32) -> Result<Self, String> {
        if !template.contains("{}") {
            return Err(format!("partname template '{}' has no {{}} slot", template));
        }
        Self::new(template.replacen("{}", itoa::Buffer::new().format(n), 1))
    }

    fn last_slash(&self) -> usize {
        memchr::memrchr(b'/', self.uri.as_bytes()).unwrap_or(0)
    }

    /// Directory portion: `/word` for `/word/document.xml`, `/` at the top level.
    pub fn base_uri(&self) -> &str {
        match self.last_slash() {
            0 => "/",
            pos => &self.uri[..pos],
        }
    }

    /// Final path segment, empty for the package pseudo-partname.
    pub fn filename(&self) -> &str {
        &self.uri[self.last_slash() + 1..]
    }

    /// Extension without the leading period, empty when there is none.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match memchr::memrchr(b'.', filename.as_bytes()) {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Trailing number of the filename stem: 21 for `/ppt/slides/slide21.xml`,
    /// `None` for singleton partnames like `/word/document.xml`.
    pub fn idx(&self) -> Option<u32> {
        let filename = self.filename();
        let stem = match memchr::memrchr(b'.', filename.as_bytes()) {
            Some(pos) => &filename[..pos],
            None => filename,
        };
        let digits = stem.len() - stem.bytes().rev().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits == stem.len() {
            return None;
        }
        atoi_simd::parse::<u32, false, false>(stem[digits..].as_bytes()).ok()
    }

    /// Archive member name: the partname without its leading slash.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Reference to this partname relative to the directory `base_uri`, as written
    /// in a `.rels` Target.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }
        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments: Vec<&str> = vec![".."; from.len() - common];
        segments.extend_from_slice(&to[common..]);
        segments.join("/")
    }

    /// Partname of the `.rels` member for this part:
    /// `/word/_rels/document.xml.rels` for `/word/document.xml`,
    /// `/_rels/.rels` for the package.
    pub fn rels_uri(&self) -> PackURI {
        let base = self.base_uri();
        let sep = if base == "/" { "" } else { "/" };
        PackURI {
            uri: format!("{}{}_rels/{}.rels", base, sep, self.filename()),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

/// Collapse empty, `.` and `..` segments of an absolute path.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            _ => parts.push(part),
        }
    }
    let mut out = String::with_capacity(path.len());
    for part in parts {
        out.push('/');
        out.push_str(part);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

impl fmt::Display for PackURI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/word/document.xml").is_ok());
        assert!(PackURI::new("word/document.xml").is_err());
    }

    #[test]
    fn test_components() {
        let uri = PackURI::new("/word/media/image12.png").unwrap();
        assert_eq!(uri.base_uri(), "/word/media");
        assert_eq!(uri.filename(), "image12.png");
        assert_eq!(uri.ext(), "png");
        assert_eq!(uri.idx(), Some(12));
        assert_eq!(uri.membername(), "word/media/image12.png");

        let root = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(root.base_uri(), "/");
        assert_eq!(root.filename(), "");
        assert_eq!(root.membername(), "");

        assert_eq!(PackURI::new("/word/document.xml").unwrap().idx(), None);
        assert_eq!(PackURI::new("/word/12.xml").unwrap().idx(), None);
    }

    #[test]
    fn test_from_rel_ref() {
        let uri = PackURI::from_rel_ref("/word", "../customXml/item1.xml").unwrap();
        assert_eq!(uri.as_str(), "/customXml/item1.xml");
        let uri = PackURI::from_rel_ref("/", "word/document.xml").unwrap();
        assert_eq!(uri.as_str(), "/word/document.xml");
        let uri = PackURI::from_rel_ref("/word", "/word/./media/a.png").unwrap();
        assert_eq!(uri.as_str(), "/word/media/a.png");
    }

    #[test]
    fn test_relative_ref_inverts_from_rel_ref() {
        let uri = PackURI::new("/ppt/slideLayouts/slideLayout1.xml").unwrap();
        let rel = uri.relative_ref("/ppt/slides");
        assert_eq!(rel, "../slideLayouts/slideLayout1.xml");
        assert_eq!(PackURI::from_rel_ref("/ppt/slides", &rel).unwrap(), uri);

        let media = PackURI::new("/word/media/image1.png").unwrap();
        assert_eq!(media.relative_ref("/word"), "media/image1.png");
        assert_eq!(media.relative_ref("/"), "word/media/image1.png");
    }

    #[test]
    fn test_rels_uri() {
        let doc = PackURI::new("/word/document.xml").unwrap();
        assert_eq!(doc.rels_uri().as_str(), "/word/_rels/document.xml.rels");
        let pkg = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(pkg.rels_uri().as_str(), "/_rels/.rels");
    }

    #[test]
    fn test_from_template() {
        let uri = PackURI::from_template("/word/media/image{}.png", 3).unwrap();
        assert_eq!(uri.as_str(), "/word/media/image3.png");
        assert!(PackURI::from_template("/word/document.xml", 1).is_err());
    }
}
