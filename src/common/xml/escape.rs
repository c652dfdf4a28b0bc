use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Static initialization: automatons are built only once, thread-safe
static ATTR_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\""])
        .expect("Failed to build XML attribute escaper")
});

static TEXT_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">"])
        .expect("Failed to build XML text escaper")
});

/// Escape a value for use inside a double-quoted XML attribute.
///
/// Single quotes are left alone, matching what libxml2-based writers emit.
///
/// # Examples
///
/// ```
/// use docx_oxml::common::xml::escape_attr;
/// assert_eq!(escape_attr("a & b"), "a &amp; b");
/// assert_eq!(escape_attr("<\"it's\">"), "&lt;&quot;it's&quot;&gt;");
/// ```
#[inline]
pub fn escape_attr(s: &str) -> String {
    ATTR_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;"])
}

/// Escape character data.
///
/// # Examples
///
/// ```
/// use docx_oxml::common::xml::escape_text;
/// assert_eq!(escape_text("1 < 2 & \"3\""), "1 &lt; 2 &amp; \"3\"");
/// ```
#[inline]
pub fn escape_text(s: &str) -> String {
    TEXT_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;"])
}
