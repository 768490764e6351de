//! Stream input normalisation.
//!
//! A line-leading `<!--` in a truncated stream opens an HTML block that
//! swallows everything after it until the comment closes, which may be
//! never. Escaping the opener turns it into literal text until the real
//! content arrives.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static LEADING_HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)<!--").unwrap());

/// Escape every line-leading `<!--` (after optional spaces/tabs) with a
/// backslash so a dangling HTML comment cannot absorb the rest of the
/// stream. Returns the input unchanged (borrowed) when nothing matches.
pub fn normalize_stream(source: &str) -> Cow<'_, str> {
    LEADING_HTML_COMMENT.replace_all(source, "${1}\\<!--")
}
