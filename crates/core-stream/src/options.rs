//! Renderer configuration.

use crate::surface::Anchor;
use core_render::Theme;

/// Patch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Append when the new render extends the previous one; rewrite a
    /// just-closed code block in place from its opening fence. The default.
    #[default]
    Smart,
    /// Always rewrite the whole view from the anchor.
    Redraw,
}

/// Colour selection for the demo/session layer. The renderer itself takes
/// the resolved flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// `Auto` honours `NO_COLOR`, then `FORCE_COLOR`, then TTY status.
    pub fn resolve(self, stdout_is_tty: bool) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
                    false
                } else if std::env::var_os("FORCE_COLOR").is_some_and(|v| v != "0") {
                    true
                } else {
                    stdout_is_tty
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RendererOptions {
    pub anchor: Anchor,
    pub strategy: Strategy,
    /// Trailing-line clip for the live view; `None` leaves it unclipped.
    pub viewport_height: Option<usize>,
    /// Degrade non-append, non-prefix-preserving transitions to a full
    /// rewrite instead of raising.
    pub full_redraw_on_mismatch: bool,
    /// Resolved colour flag (see [`ColorMode::resolve`]).
    pub color: bool,
    /// Width for thematic breaks.
    pub width: Option<usize>,
    pub theme: Theme,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            anchor: Anchor::default(),
            strategy: Strategy::default(),
            viewport_height: None,
            full_redraw_on_mismatch: true,
            color: false,
            width: None,
            theme: Theme::default(),
        }
    }
}
