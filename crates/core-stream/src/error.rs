//! Streaming error kinds.
//!
//! Each variant is only reachable with `full_redraw_on_mismatch` disabled;
//! under the default policy every one of these conditions degrades to a
//! full `set_text` rewrite instead.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// The new render does not start with the previous one, so an append
    /// patch is impossible.
    #[error("update is not an append of the previous frame and full redraw fallback is disabled")]
    NonAppendUpdate,

    /// A code block closed but no rewrite origin was ever recorded (the
    /// opening fence was never located, e.g. clipped out of the viewport).
    #[error("code block rewrite origin was never recorded")]
    MissingRewriteOrigin,

    /// The displayed text before the rewrite origin changed between
    /// frames, so a narrow rewrite would corrupt the screen.
    #[error("text before the rewrite origin changed between frames")]
    RewritePrefixChanged,
}
