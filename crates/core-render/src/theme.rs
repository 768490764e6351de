//! Colour palette keyed by node kind.

use crate::style::{Color, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub heading: Style,
    pub code_fence: Style,
    pub code_text: Style,
    pub inline_code: Style,
    pub blockquote: Style,
    pub link: Style,
    pub list_marker: Style,
    pub rule: Style,
    pub table_border: Style,
    pub html: Style,
    pub diff_add: Style,
    pub diff_remove: Style,
    pub diff_hunk: Style,
    pub diff_meta: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            heading: Style::fg(Color::Ansi(6)).bold(),
            code_fence: Style::fg(Color::Ansi(8)),
            code_text: Style::plain(),
            inline_code: Style::fg(Color::Ansi(3)),
            blockquote: Style::fg(Color::Ansi(8)),
            link: Style::fg(Color::Ansi(4)).underline(),
            list_marker: Style::fg(Color::Ansi(6)),
            rule: Style::fg(Color::Ansi(8)),
            table_border: Style::fg(Color::Ansi(8)),
            html: Style::plain().dim(),
            // Diff lines carry the bare base colour so the `+`/`-` prefix and
            // its text share one SGR run.
            diff_add: Style::fg(Color::Ansi(2)),
            diff_remove: Style::fg(Color::Ansi(1)),
            diff_hunk: Style::fg(Color::Ansi(6)),
            diff_meta: Style::plain().bold(),
        }
    }
}
