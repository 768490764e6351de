//! The anchored text surface.
//!
//! The surface mirrors what the terminal should display. Every operation
//! mutates the mirror and returns the patch string that transitions the
//! real screen to match; applying the returned patches in order keeps the
//! two in lockstep.
//!
//! Patch shape: once anchored, every patch opens with an origin return.
//! Rewritten tails are "decorated" (`EL` before each `\n`) so a shorter
//! replacement cannot leave remnants of a longer prior line, and close with
//! `ED` to clear everything below the last written row. Re-sending the tail
//! from the edit point is usually shorter than a character diff and is
//! robust to wide glyphs, since the terminal re-lays-out whatever arrives.

use crate::seq;
use core_text::{Pos, Range, index_to_pos, pos_to_index};

/// Where patches return to before rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Save/restore the cursor position at `begin` time (both DEC and CSI
    /// dialects). The default.
    #[default]
    Cursor,
    /// Absolute screen home. For alternate-screen streaming or prompts
    /// whose save-point is unreliable.
    Home,
}

#[derive(Debug)]
pub struct Surface {
    text: String,
    anchored: bool,
    anchor: Anchor,
}

impl Surface {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            text: String::new(),
            anchored: false,
            anchor,
        }
    }

    /// The text the terminal displays after all returned patches applied.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    fn prologue(&self) -> &'static str {
        match self.anchor {
            Anchor::Cursor => seq::ANCHOR_SAVE,
            Anchor::Home => seq::CURSOR_HOME,
        }
    }

    fn origin(&self) -> &'static str {
        match self.anchor {
            Anchor::Cursor => seq::CURSOR_RESTORE,
            Anchor::Home => seq::CURSOR_HOME,
        }
    }

    /// Anchor now and return the prologue. Also called implicitly by the
    /// first text-producing operation.
    pub fn begin(&mut self) -> String {
        self.anchored = true;
        self.prologue().to_string()
    }

    /// Replace the whole display with `next`.
    pub fn set_text(&mut self, next: &str) -> String {
        let patch = if self.anchored {
            format!("{}{}{}", self.origin(), decorate(next), seq::ERASE_DOWN)
        } else {
            self.anchored = true;
            format!("{}{}", self.prologue(), decorate(next))
        };
        self.text = next.to_string();
        patch
    }

    /// Extend the display at the tail. Assumes the cursor currently sits at
    /// the end of the displayed text, so no repositioning is emitted.
    pub fn append(&mut self, delta: &str) -> String {
        let patch = if self.anchored {
            delta.to_string()
        } else {
            self.anchored = true;
            format!("{}{}", self.prologue(), delta)
        };
        self.text.push_str(delta);
        patch
    }

    /// Insert at a position, rewriting everything from that point down.
    pub fn insert(&mut self, at: Pos, insertion: &str) -> String {
        let i = pos_to_index(&self.text, at);
        let mut next = String::with_capacity(self.text.len() + insertion.len());
        next.push_str(&self.text[..i]);
        next.push_str(insertion);
        next.push_str(&self.text[i..]);
        if !self.anchored {
            return self.set_text(&next);
        }
        let patch = format!(
            "{}{}{}",
            self.move_to(at),
            decorate(&next[i..]),
            seq::ERASE_DOWN
        );
        self.text = next;
        patch
    }

    /// Replace an inclusive position range, rewriting from its start down.
    pub fn replace(&mut self, range: Range, replacement: &str) -> String {
        let (start, end) = range.to_byte_span(&self.text);
        let mut next =
            String::with_capacity(self.text.len() - (end - start) + replacement.len());
        next.push_str(&self.text[..start]);
        next.push_str(replacement);
        next.push_str(&self.text[end..]);
        if !self.anchored {
            return self.set_text(&next);
        }
        let at = index_to_pos(&next, start);
        let patch = format!(
            "{}{}{}",
            self.move_to(at),
            decorate(&next[start..]),
            seq::ERASE_DOWN
        );
        self.text = next;
        patch
    }

    pub fn delete(&mut self, range: Range) -> String {
        self.replace(range, "")
    }

    /// Narrow rewrite: `next` agrees with the displayed text on every byte
    /// before `from`, so only the tail is re-sent. The caller verifies the
    /// prefix; if the byte offset does not land on a boundary of `next`
    /// the operation degrades to a full rewrite.
    pub fn set_text_from(&mut self, next: &str, from: Pos) -> String {
        if !self.anchored {
            return self.set_text(next);
        }
        let i = pos_to_index(&self.text, from);
        let Some(tail) = next.get(i..) else {
            return self.set_text(next);
        };
        let patch = format!(
            "{}{}{}",
            self.move_to(from),
            decorate(tail),
            seq::ERASE_DOWN
        );
        self.text = next.to_string();
        patch
    }

    /// Forget everything; the next operation re-anchors.
    pub fn clear(&mut self) {
        self.text.clear();
        self.anchored = false;
    }

    /// Origin return plus relative movement to a 1-based position.
    fn move_to(&self, p: Pos) -> String {
        let mut out = String::from(self.origin());
        if p.line > 1 {
            out.push_str(&seq::cursor_down(p.line - 1));
            out.push('\r');
        }
        if p.column > 1 {
            out.push_str(&seq::cursor_forward(p.column - 1));
        }
        out
    }
}

/// `EL` before every `\n`: each rewritten row erases its own remnant.
fn decorate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str(seq::ERASE_LINE);
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_prologue_by_anchor() {
        assert_eq!(Surface::new(Anchor::Cursor).begin(), "\r\x1b7\x1b[s");
        assert_eq!(Surface::new(Anchor::Home).begin(), "\x1b[H");
    }

    #[test]
    fn first_set_text_carries_prologue_and_el() {
        let mut surface = Surface::new(Anchor::Cursor);
        let patch = surface.set_text("a\nb\n");
        assert_eq!(patch, "\r\x1b7\x1b[sa\x1b[K\nb\x1b[K\n");
        assert_eq!(surface.text(), "a\nb\n");
    }

    #[test]
    fn anchored_set_text_returns_to_origin_and_erases_down() {
        let mut surface = Surface::new(Anchor::Cursor);
        surface.set_text("old\n");
        let patch = surface.set_text("new\n");
        assert_eq!(patch, "\x1b8\x1b[unew\x1b[K\n\x1b[J");
    }

    #[test]
    fn append_is_verbatim_once_anchored() {
        let mut surface = Surface::new(Anchor::Cursor);
        surface.set_text("a\n");
        let patch = surface.append("b\n");
        assert_eq!(patch, "b\n");
        assert_eq!(surface.text(), "a\nb\n");
    }

    #[test]
    fn unanchored_append_has_prologue_but_no_el() {
        let mut surface = Surface::new(Anchor::Cursor);
        let patch = surface.append("a\nb\n");
        assert_eq!(patch, "\r\x1b7\x1b[sa\nb\n");
    }

    #[test]
    fn set_text_from_rewrites_tail_only() {
        let mut surface = Surface::new(Anchor::Cursor);
        surface.set_text("keep\nold tail\n");
        let patch = surface.set_text_from("keep\nnew tail!\n", Pos::new(2, 1));
        assert_eq!(patch, "\x1b8\x1b[u\x1b[1B\rnew tail!\x1b[K\n\x1b[J");
        assert_eq!(surface.text(), "keep\nnew tail!\n");
    }

    #[test]
    fn move_to_line_one_is_origin_only() {
        let mut surface = Surface::new(Anchor::Cursor);
        surface.set_text("abc\n");
        let patch = surface.set_text_from("abz\n", Pos::new(1, 3));
        assert_eq!(patch, "\x1b8\x1b[u\x1b[2Cz\x1b[K\n\x1b[J");
    }

    #[test]
    fn insert_rewrites_from_position() {
        let mut surface = Surface::new(Anchor::Cursor);
        surface.set_text("ab\ncd\n");
        let patch = surface.insert(Pos::new(2, 1), "X");
        assert_eq!(surface.text(), "ab\nXcd\n");
        assert_eq!(patch, "\x1b8\x1b[u\x1b[1B\rXcd\x1b[K\n\x1b[J");
    }

    #[test]
    fn replace_and_delete_round_trip() {
        let mut surface = Surface::new(Anchor::Cursor);
        surface.set_text("hello world\n");
        let range = Range::new(Pos::new(1, 7), Pos::new(1, 11));
        surface.replace(range, "there");
        assert_eq!(surface.text(), "hello there\n");
        surface.delete(Range::new(Pos::new(1, 6), Pos::new(1, 11)));
        assert_eq!(surface.text(), "hello\n");
    }

    #[test]
    fn home_anchor_never_uses_dec_save() {
        let mut surface = Surface::new(Anchor::Home);
        let first = surface.set_text("a\n");
        let second = surface.set_text("b\n");
        for patch in [&first, &second] {
            assert!(!patch.contains("\x1b7"));
            assert!(patch.contains("\x1b[H"));
        }
        assert!(!second.contains("\x1b8"));
    }

    #[test]
    fn clear_drops_anchor() {
        let mut surface = Surface::new(Anchor::Cursor);
        surface.set_text("x\n");
        surface.clear();
        assert_eq!(surface.text(), "");
        assert!(!surface.is_anchored());
        // The next patch re-anchors with a fresh prologue.
        assert!(surface.set_text("y\n").starts_with("\r\x1b7\x1b[s"));
    }
}
