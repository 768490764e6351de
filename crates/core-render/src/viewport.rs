//! Trailing-line viewport clipping.
//!
//! Bounds the on-screen footprint during streaming. The unclipped render is
//! retained by the stream renderer for the final print-out; clipping only
//! shapes what the live surface mirrors.

/// Keep the last `height` lines of `rendered`.
///
/// Splits on `\n`, drops a trailing empty segment (the render's final
/// newline), takes the last `height` entries and rejoins with a single
/// trailing `\n`. `None` or a non-positive height returns the input
/// unclipped; empty input stays empty.
pub fn clip_tail(rendered: &str, height: Option<usize>) -> String {
    let Some(height) = height.filter(|&h| h > 0) else {
        return rendered.to_string();
    };
    if rendered.is_empty() {
        return String::new();
    }
    let mut lines: Vec<&str> = rendered.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    let start = lines.len().saturating_sub(height);
    let mut out = lines[start..].join("\n");
    out.push('\n');
    out
}
