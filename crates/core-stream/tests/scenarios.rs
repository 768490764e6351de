//! End-to-end streaming scenarios with literal patch expectations.

mod common;

use common::fake_terminal::FakeTerminal;
use core_highlight::{FnHighlighter, Highlighter, Outcome};
use core_stream::{Anchor, RendererOptions, StreamError, StreamRenderer, Strategy};
use std::sync::{Arc, Mutex};

/// Synchronous `h(code) = "<<" + uppercase(code) + ">>"`.
fn upper() -> Arc<dyn Highlighter> {
    Arc::new(FnHighlighter(|code: &str, _language: &str| {
        Some(Outcome::Ready(Ok(format!("<<{}>>", code.to_uppercase()))))
    }))
}

/// The same highlighter behind a future.
fn deferred_upper() -> Arc<dyn Highlighter> {
    Arc::new(FnHighlighter(|code: &str, _language: &str| {
        let code = code.to_string();
        Some(Outcome::Deferred(Box::pin(async move {
            Ok(format!("<<{}>>", code.to_uppercase()))
        })))
    }))
}

#[test]
fn s1_smart_sync_highlight() {
    let mut renderer =
        StreamRenderer::new(RendererOptions::default()).with_highlighter(upper());

    let first = renderer.push("```ts\nconst x = 1\n").expect("push");
    assert_eq!(first, "\r\x1b7\x1b[s```ts\nconst x = 1\n");

    let second = renderer.push("```").expect("push");
    assert_eq!(
        second,
        "\x1b8\x1b[u```ts\x1b[K\n<<CONST X = 1>>\x1b[K\n```\x1b[K\n\x1b[J"
    );
    assert_eq!(renderer.rendered_text(), "```ts\n<<CONST X = 1>>\n```\n");
}

#[test]
fn s2_redraw_sync_highlight() {
    let mut renderer = StreamRenderer::new(RendererOptions {
        strategy: Strategy::Redraw,
        ..RendererOptions::default()
    })
    .with_highlighter(upper());

    let first = renderer.push("```ts\nconst x = 1\n").expect("push");
    assert_eq!(first, "\r\x1b7\x1b[s```ts\x1b[K\nconst x = 1\x1b[K\n");

    let second = renderer.push("```").expect("push");
    assert_eq!(
        second,
        "\x1b8\x1b[u```ts\x1b[K\n<<CONST X = 1>>\x1b[K\n```\x1b[K\n\x1b[J"
    );
}

#[tokio::test]
async fn s3_smart_async_highlight() {
    let late = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&late);
    let mut renderer = StreamRenderer::new(RendererOptions::default())
        .with_highlighter(deferred_upper())
        .with_on_patch(move |patch| sink.lock().unwrap().push(patch.to_string()));

    let first = renderer.push("```ts\nconst x = 1\n").expect("push");
    assert_eq!(first, "\r\x1b7\x1b[s```ts\nconst x = 1\n");

    // The closing fence appends plainly; the rewrite arrives later.
    let second = renderer.push("```").expect("push");
    assert_eq!(second, "```\n");

    let queued = renderer.flush().await;
    assert_eq!(
        queued,
        vec!["\x1b8\x1b[u```ts\x1b[K\n<<CONST X = 1>>\x1b[K\n```\x1b[K\n\x1b[J".to_string()]
    );
    // The same patch went through the callback, after the surface update.
    assert_eq!(*late.lock().unwrap(), queued);
    assert_eq!(renderer.rendered_text(), "```ts\n<<CONST X = 1>>\n```\n");
    assert_eq!(renderer.full_rendered_text(), "```ts\n<<CONST X = 1>>\n```\n");
}

#[test]
fn s4_viewport_clipping() {
    let mut renderer = StreamRenderer::new(RendererOptions {
        viewport_height: Some(3),
        ..RendererOptions::default()
    });
    renderer.push("# A\n\nB\n\nC\n\nD\n\nE\n").expect("push");
    assert!(renderer.rendered_text().lines().count() <= 3);
    assert!(renderer.full_rendered_text().lines().count() > 3);
}

#[test]
fn s5_home_anchor() {
    let mut renderer = StreamRenderer::new(RendererOptions {
        anchor: Anchor::Home,
        ..RendererOptions::default()
    });
    let patch = renderer.push("# A\n\nB\n").expect("push");
    assert!(patch.contains("\x1b[H"));
    assert!(!patch.contains("\x1b7"));
    assert!(!patch.contains("\x1b8"));
}

#[test]
fn s6_diff_block_colours() {
    let mut renderer = StreamRenderer::new(RendererOptions {
        color: true,
        ..RendererOptions::default()
    });
    let patch = renderer
        .push("```diff\n@@ -1 +1 @@\n-old\n+new\n unchanged\n```\n")
        .expect("push");
    assert!(patch.contains("\x1b[31m-old"));
    assert!(patch.contains("\x1b[32m+new"));
    assert!(core_text::strip_ansi(&patch).contains("@@ -1 +1 @@"));
}

#[test]
fn sync_highlight_failure_keeps_plain_form() {
    let failing: Arc<dyn Highlighter> = Arc::new(FnHighlighter(|_: &str, language: &str| {
        Some(Outcome::Ready(Err(core_highlight::HighlightError::Backend(
            format!("broken backend for {language}"),
        ))))
    }));
    let mut renderer = StreamRenderer::new(RendererOptions::default()).with_highlighter(failing);
    renderer.push("```ts\nconst x = 1\n").expect("push");
    renderer.push("```\n").expect("push");
    assert_eq!(renderer.rendered_text(), "```ts\nconst x = 1\n```\n");
}

#[tokio::test]
async fn deferred_highlight_failure_is_swallowed() {
    let failing: Arc<dyn Highlighter> = Arc::new(FnHighlighter(|_: &str, _: &str| {
        Some(Outcome::Deferred(Box::pin(async {
            Err(core_highlight::HighlightError::Backend("late failure".into()))
        })))
    }));
    let mut renderer = StreamRenderer::new(RendererOptions::default()).with_highlighter(failing);
    renderer.push("```ts\nx\n").expect("push");
    renderer.push("```\n").expect("push");
    let queued = renderer.flush().await;
    assert!(queued.is_empty());
    assert_eq!(renderer.rendered_text(), "```ts\nx\n```\n");
}

#[test]
fn unsupported_language_renders_plain() {
    let rust_only: Arc<dyn Highlighter> = Arc::new(FnHighlighter(|code: &str, language: &str| {
        (language == "rust").then(|| Outcome::Ready(Ok(format!("<<{code}>>"))))
    }));
    let mut renderer = StreamRenderer::new(RendererOptions::default()).with_highlighter(rust_only);
    renderer.push("```python\nprint(1)\n```\n").expect("push");
    assert_eq!(renderer.rendered_text(), "```python\nprint(1)\n```\n");
}

#[test]
fn cache_key_distinguishes_languages() {
    let tagged: Arc<dyn Highlighter> = Arc::new(FnHighlighter(|code: &str, language: &str| {
        Some(Outcome::Ready(Ok(format!("[{language}]{code}"))))
    }));
    let mut renderer = StreamRenderer::new(RendererOptions::default()).with_highlighter(tagged);
    renderer
        .push("```a\nsame\n```\n\n```b\nsame\n```\n")
        .expect("push");
    let text = renderer.rendered_text();
    assert!(text.contains("[a]same"));
    assert!(text.contains("[b]same"));
}

#[test]
fn clipped_fence_without_fallback_raises_missing_origin() {
    let mut renderer = StreamRenderer::new(RendererOptions {
        viewport_height: Some(2),
        full_redraw_on_mismatch: false,
        ..RendererOptions::default()
    });
    // The opening fence scrolls out of the 2-line viewport immediately.
    renderer.push("```rs\nA\nB\nC\n").expect("push");
    assert_eq!(renderer.push("```"), Err(StreamError::MissingRewriteOrigin));
}

#[test]
fn shifted_viewport_without_fallback_raises_prefix_change() {
    let mut renderer = StreamRenderer::new(RendererOptions {
        viewport_height: Some(3),
        full_redraw_on_mismatch: false,
        ..RendererOptions::default()
    });
    // Fence sits on line 2 of the clipped view...
    renderer.push("intro\n\n```rs\nAAA\n").expect("push");
    // ...then the close shifts the viewport, so the prefix no longer holds.
    assert_eq!(
        renderer.push("BBB\n```"),
        Err(StreamError::RewritePrefixChanged)
    );
}

#[test]
fn shifted_viewport_with_fallback_redraws() {
    let mut renderer = StreamRenderer::new(RendererOptions {
        viewport_height: Some(3),
        ..RendererOptions::default()
    });
    renderer.push("intro\n\n```rs\nAAA\n").expect("push");
    let patch = renderer.push("BBB\n```").expect("push");
    assert!(patch.starts_with("\x1b8\x1b[u"));
    assert_eq!(renderer.rendered_text(), "AAA\nBBB\n```\n");
}

/// Apply every patch of a chunked stream to the emulator and compare the
/// final screen against the surface mirror.
#[test]
fn emulator_matches_surface_for_chunked_stream() {
    let source = "# Title\n\nSome *styled* text with `code`.\n\n\
                  - one\n- two\n\n\
                  ```ts\nconst x = 1\nconst y = 2\n```\n\n\
                  | a | b |\n|---|---|\n| 1 | 2 |\n\n\
                  > quoted\n";
    for chunk_size in [1, 3, 7, 64, source.len()] {
        let mut renderer = StreamRenderer::new(RendererOptions {
            color: true,
            ..RendererOptions::default()
        })
        .with_highlighter(upper());
        let mut term = FakeTerminal::new(120, 60);

        let chunks: Vec<String> = source
            .chars()
            .collect::<Vec<_>>()
            .chunks(chunk_size)
            .map(|c| c.iter().collect())
            .collect();
        for chunk in &chunks {
            let patch = renderer.push(chunk).expect("push");
            term.feed(&patch);
        }

        let expected = core_text::strip_ansi(&renderer.rendered_text());
        assert_eq!(
            term.screen_text(),
            expected.trim_end(),
            "chunk size {chunk_size}"
        );
    }
}

#[tokio::test]
async fn emulator_matches_surface_after_late_highlight() {
    let mut renderer =
        StreamRenderer::new(RendererOptions::default()).with_highlighter(deferred_upper());
    let mut term = FakeTerminal::new(100, 40);

    for chunk in ["```ts\n", "const x", " = 1\n", "```", "\n\ntail\n"] {
        let patch = renderer.push(chunk).expect("push");
        term.feed(&patch);
    }
    for patch in renderer.flush().await {
        term.feed(&patch);
    }
    let expected = core_text::strip_ansi(&renderer.rendered_text());
    assert_eq!(term.screen_text(), expected.trim_end());
}

#[test]
fn begin_emits_prologue_before_first_push() {
    let mut renderer = StreamRenderer::new(RendererOptions::default());
    assert_eq!(renderer.begin(), "\r\x1b7\x1b[s");
    // Already anchored: the first push is a bare append.
    assert_eq!(renderer.push("hi\n").expect("push"), "hi\n");
}
