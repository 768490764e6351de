//! 7-bit control sequence fragments used in patches.
//!
//! The cursor anchor emits both the DEC (`ESC 7`/`ESC 8`) and CSI
//! (`CSI s`/`CSI u`) save/restore dialects in tandem; terminals differ in
//! which one they honour.

/// Absolute cursor home (`home` anchor prologue and origin return).
pub const CURSOR_HOME: &str = "\x1b[H";

/// `cursor` anchor prologue: column 1, then save in both dialects.
pub const ANCHOR_SAVE: &str = "\r\x1b7\x1b[s";

/// `cursor` anchor origin return: restore in both dialects.
pub const CURSOR_RESTORE: &str = "\x1b8\x1b[u";

/// Erase from cursor to end of screen.
pub const ERASE_DOWN: &str = "\x1b[J";

/// Erase from cursor to end of line.
pub const ERASE_LINE: &str = "\x1b[K";

/// Move down `n` rows (clamped to at least one), keeping the column.
pub fn cursor_down(n: usize) -> String {
    format!("\x1b[{}B", n.max(1))
}

/// Move right `n` columns (clamped to at least one).
pub fn cursor_forward(n: usize) -> String {
    format!("\x1b[{}C", n.max(1))
}
