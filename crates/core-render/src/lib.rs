//! Markdown node tree → styled terminal text.
//!
//! The renderer is a pure function: given a tree, a theme, a colour flag and
//! an optional highlight lookup it produces a string ending in exactly one
//! `\n` (or the empty string for an empty document). All coordinate
//! arithmetic downstream depends on two emission rules:
//!
//! - `\n` never sits inside an SGR on/off pair; styles are opened and reset
//!   per line so erase-to-end-of-line truncation works row by row;
//! - table cells are padded by terminal cell width, not character count.
//!
//! A code block flagged as the streaming tail renders without its closing
//! fence; everything else renders fence to fence.

pub mod render;
pub mod style;
pub mod theme;
pub mod viewport;

pub use render::{RenderOptions, render_tree};
pub use style::{Attrs, Color, Style};
pub use theme::Theme;
pub use viewport::clip_tail;
