//! Markup stripping for page summaries. Not an HTML parser: it only removes
//! what cannot be read as prose.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));
static SCRIPTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script pattern")
});
static STYLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("style pattern"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("ws pattern"));
static NUMERIC_REFS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").expect("numeric reference pattern")
});

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    // last, so "&amp;lt;" decodes to "&lt;" and not "<"
    ("&amp;", "&"),
];

/// Plain text of an HTML document with whitespace collapsed. Empty when the
/// page has no readable text.
pub fn strip_markup(html: &str) -> String {
    let text = COMMENTS.replace_all(html, " ");
    let text = SCRIPTS.replace_all(&text, " ");
    let text = STYLES.replace_all(&text, " ");
    let text = TAGS.replace_all(&text, " ");

    let mut decoded = decode_numeric_refs(&text).into_owned();
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// `&#160;` and `&#xA0;` style references. Invalid code points are left as
/// written.
fn decode_numeric_refs(text: &str) -> Cow<'_, str> {
    NUMERIC_REFS.replace_all(text, |caps: &Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse().ok(),
            (None, None) => None,
        };
        match code.and_then(char::from_u32) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// First `limit` characters, never splitting a code point.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
