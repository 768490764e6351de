//! Streaming Markdown → terminal patch engine.
//!
//! Two coupled pieces:
//!
//! - [`Surface`]: the in-memory mirror of what the terminal displays,
//!   producing minimal-movement ANSI patches for every mutation;
//! - [`StreamRenderer`]: re-parses the accumulating Markdown on each chunk,
//!   classifies the transition (append, in-place code-block rewrite, full
//!   redraw) and coordinates asynchronously resolved syntax highlights.
//!
//! Patches are opaque byte strings the caller writes to its terminal, in
//! order. The engine never touches the output stream itself.

pub mod cache;
pub mod error;
pub mod options;
pub mod renderer;
pub mod seq;
pub mod surface;

pub use error::StreamError;
pub use options::{ColorMode, RendererOptions, Strategy};
pub use renderer::StreamRenderer;
pub use surface::{Anchor, Surface};
