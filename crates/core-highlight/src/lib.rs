//! Syntax highlighting contract and built-in backends.
//!
//! A highlighter maps `(code, language)` to ANSI-escaped text, either
//! immediately or through a future. The stream renderer treats `None` as
//! "language not supported", a `Ready(Err(_))` as a swallowed failure (the
//! plain body stays on screen), and a `Deferred` result as an in-place
//! rewrite to apply when the future resolves. Results are cached with the
//! trailing newline stripped, so backends need not care about terminators.

mod rust;

pub use rust::highlight_rust;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("language `{0}` is not supported")]
    Unsupported(String),
    #[error("highlight backend failed: {0}")]
    Backend(String),
}

pub type HighlightFuture =
    Pin<Box<dyn Future<Output = Result<String, HighlightError>> + Send + 'static>>;

/// A highlight result: available now, or later.
pub enum Outcome {
    Ready(Result<String, HighlightError>),
    Deferred(HighlightFuture),
}

pub trait Highlighter: Send + Sync {
    /// Highlight `code` written in `language`. `None` means the language is
    /// not supported and the plain rendering should be kept.
    fn highlight(&self, code: &str, language: &str) -> Option<Outcome>;
}

/// Wraps a closure as a highlighter; the shape tests and ad-hoc backends
/// want.
pub struct FnHighlighter<F>(pub F);

impl<F> Highlighter for FnHighlighter<F>
where
    F: Fn(&str, &str) -> Option<Outcome> + Send + Sync,
{
    fn highlight(&self, code: &str, language: &str) -> Option<Outcome> {
        (self.0)(code, language)
    }
}

/// Built-in tree-sitter backend. Currently Rust only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterHighlighter;

impl Highlighter for TreeSitterHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Option<Outcome> {
        match language {
            "rust" | "rs" => Some(Outcome::Ready(highlight_rust(code))),
            _ => None,
        }
    }
}

/// Wraps any highlighter into the deferred path with a fixed latency.
/// Exercises the async rewrite machinery in demos and tests.
pub struct Delayed<H> {
    inner: H,
    delay: Duration,
}

impl<H> Delayed<H> {
    pub fn new(inner: H, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<H: Highlighter> Highlighter for Delayed<H> {
    fn highlight(&self, code: &str, language: &str) -> Option<Outcome> {
        let outcome = self.inner.highlight(code, language)?;
        let delay = self.delay;
        Some(Outcome::Deferred(Box::pin(async move {
            tokio::time::sleep(delay).await;
            match outcome {
                Outcome::Ready(result) => result,
                Outcome::Deferred(fut) => fut.await,
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_sitter_covers_rust_only() {
        let hl = TreeSitterHighlighter;
        assert!(hl.highlight("fn main() {}", "rust").is_some());
        assert!(hl.highlight("fn main() {}", "rs").is_some());
        assert!(hl.highlight("print('x')", "python").is_none());
    }

    #[tokio::test]
    async fn delayed_wraps_ready_results() {
        let hl = Delayed::new(TreeSitterHighlighter, Duration::from_millis(1));
        match hl.highlight("let x = 1;", "rust") {
            Some(Outcome::Deferred(fut)) => {
                let out = fut.await.expect("highlight succeeds");
                assert!(out.contains("\x1b["));
            }
            _ => panic!("expected a deferred outcome"),
        }
    }
}
