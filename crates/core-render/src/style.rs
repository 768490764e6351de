//! SGR styling primitives.

use bitflags::bitflags;

const RESET: &str = "\x1b[0m";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attrs: u8 {
        const BOLD      = 0b0000_0001;
        const DIM       = 0b0000_0010;
        const ITALIC    = 0b0000_0100;
        const UNDERLINE = 0b0000_1000;
        const STRIKE    = 0b0001_0000;
    }
}

/// Foreground colour: the 16 base ANSI colours or a 256-palette index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Ansi(u8),
    Indexed(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub attrs: Attrs,
}

impl Style {
    pub const fn plain() -> Self {
        Self {
            fg: None,
            attrs: Attrs::empty(),
        }
    }

    pub const fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            attrs: Attrs::empty(),
        }
    }

    pub const fn bold(mut self) -> Self {
        self.attrs = self.attrs.union(Attrs::BOLD);
        self
    }

    pub const fn dim(mut self) -> Self {
        self.attrs = self.attrs.union(Attrs::DIM);
        self
    }

    pub const fn italic(mut self) -> Self {
        self.attrs = self.attrs.union(Attrs::ITALIC);
        self
    }

    pub const fn underline(mut self) -> Self {
        self.attrs = self.attrs.union(Attrs::UNDERLINE);
        self
    }

    pub const fn strike(mut self) -> Self {
        self.attrs = self.attrs.union(Attrs::STRIKE);
        self
    }

    pub fn is_plain(&self) -> bool {
        self.fg.is_none() && self.attrs.is_empty()
    }

    fn sgr_open(&self) -> String {
        let mut codes: Vec<String> = Vec::new();
        if self.attrs.contains(Attrs::BOLD) {
            codes.push("1".into());
        }
        if self.attrs.contains(Attrs::DIM) {
            codes.push("2".into());
        }
        if self.attrs.contains(Attrs::ITALIC) {
            codes.push("3".into());
        }
        if self.attrs.contains(Attrs::UNDERLINE) {
            codes.push("4".into());
        }
        if self.attrs.contains(Attrs::STRIKE) {
            codes.push("9".into());
        }
        match self.fg {
            Some(Color::Ansi(n)) if n < 8 => codes.push((30 + u16::from(n)).to_string()),
            Some(Color::Ansi(n)) => codes.push((90 + u16::from(n.saturating_sub(8))).to_string()),
            Some(Color::Indexed(n)) => codes.push(format!("38;5;{n}")),
            None => {}
        }
        format!("\x1b[{}m", codes.join(";"))
    }

    /// Wrap `text` in this style's SGR on/off pair, line by line. Newlines
    /// stay outside the pair so a later erase-to-end-of-line cannot orphan
    /// an open style.
    pub fn paint(&self, text: &str, color: bool) -> String {
        if !color || self.is_plain() || text.is_empty() {
            return text.to_string();
        }
        let open = self.sgr_open();
        text.split('\n')
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{open}{line}{RESET}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
