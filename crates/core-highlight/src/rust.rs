//! Tree-sitter walker for Rust code.
//!
//! A full highlight-query engine is overkill for fenced snippets; a cursor
//! walk over the parse tree with a kind → style map covers keywords,
//! literals, comments and type names. Styled spans are emitted whole (a
//! string or comment is never fragmented into its child tokens); everything
//! unstyled passes through verbatim, so `strip_ansi(output) == input`.

use crate::HighlightError;
use core_render::{Color, Style};
use tree_sitter::Parser;

fn keyword_style() -> Style {
    Style::fg(Color::Ansi(5))
}

fn string_style() -> Style {
    Style::fg(Color::Ansi(2))
}

fn comment_style() -> Style {
    Style::fg(Color::Ansi(8))
}

fn number_style() -> Style {
    Style::fg(Color::Ansi(3))
}

fn type_style() -> Style {
    Style::fg(Color::Ansi(6))
}

/// Anonymous keyword tokens have their text as the node kind.
fn is_keyword(kind: &str) -> bool {
    matches!(
        kind,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "union"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "mutable_specifier"
    )
}

fn token_style(kind: &str) -> Option<Style> {
    match kind {
        "line_comment" | "block_comment" => Some(comment_style()),
        "string_literal" | "raw_string_literal" | "char_literal" | "escape_sequence" => {
            Some(string_style())
        }
        "integer_literal" | "float_literal" => Some(number_style()),
        "type_identifier" | "primitive_type" => Some(type_style()),
        "lifetime" => Some(number_style()),
        _ if is_keyword(kind) => Some(keyword_style()),
        _ => None,
    }
}

/// Highlight Rust source to ANSI-escaped text.
pub fn highlight_rust(code: &str) -> Result<String, HighlightError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_rust::LANGUAGE.into())
        .map_err(|e| HighlightError::Backend(e.to_string()))?;
    let tree = parser
        .parse(code, None)
        .ok_or_else(|| HighlightError::Backend("parser produced no tree".into()))?;

    let mut out = String::new();
    let mut last = 0usize;
    let mut cursor = tree.walk();
    'walk: loop {
        let node = cursor.node();
        let style = token_style(node.kind());
        // Styled nodes are emitted as whole spans; unstyled containers are
        // descended into until a leaf token is reached.
        if style.is_none() && cursor.goto_first_child() {
            continue;
        }

        let start = node.start_byte();
        let end = node.end_byte();
        if start >= last && end <= code.len() && start <= end {
            out.push_str(&code[last..start]);
            let text = &code[start..end];
            match style {
                Some(style) => out.push_str(&style.paint(text, true)),
                None => out.push_str(text),
            }
            last = end;
        }

        loop {
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    out.push_str(&code[last..]);
    Ok(out)
}
