//! The stream renderer: re-parse, classify, patch.
//!
//! `push` is synchronous and never awaits. Each chunk re-parses the full
//! accumulated source, re-renders it, and classifies the transition:
//!
//! - tail code block still loading → remember (once) where its opening
//!   fence starts, then append or rewrite;
//! - tail code block just closed with its highlight at hand → narrow
//!   rewrite from the remembered fence origin when the preceding bytes are
//!   untouched, full rewrite otherwise;
//! - tail code block just closed but highlighting is deferred → show the
//!   plain form now and hand the fence origin to the pending job;
//! - anything else → append when the render extends the previous one,
//!   full rewrite otherwise.
//!
//! Deferred highlights are spawned as tasks sharing the renderer state
//! behind a mutex. A completion re-parses, re-renders, patches the surface,
//! queues the patch for `flush`, and forwards it to the `on_patch`
//! callback, strictly after the surface reflects it. `reset` bumps a
//! generation counter; completions from before the reset become
//! unobservable. `push` must not be re-entered from `on_patch`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use core_highlight::{HighlightError, HighlightFuture, Highlighter, Outcome};
use core_markdown::{
    Node, code_blocks, last_code_block, normalize_stream, parse, trailing_loading_code_block,
};
use core_render::{RenderOptions, clip_tail, render_tree};
use core_text::{Pos, index_to_pos, pos_to_index};
use tokio::task::JoinHandle;

use crate::cache::{HighlightCache, cache_key};
use crate::error::StreamError;
use crate::options::{RendererOptions, Strategy};
use crate::surface::Surface;

type PatchCallback = Box<dyn FnMut(&str) + Send>;

pub struct StreamRenderer {
    inner: Arc<Mutex<Inner>>,
    tasks: Vec<JoinHandle<()>>,
}

struct Inner {
    opts: RendererOptions,
    content: String,
    surface: Surface,
    cache: HighlightCache,
    pending: Vec<String>,
    was_loading: bool,
    start_pos: Option<Pos>,
    last_full: String,
    highlighter: Option<Arc<dyn Highlighter>>,
    on_patch: Option<PatchCallback>,
    generation: u64,
}

/// A deferred highlight bound for a spawned task. `origin` is set only for
/// the block that closed in the triggering push; its completion may then
/// use the narrow rewrite.
struct HighlightJob {
    key: String,
    future: HighlightFuture,
    origin: Option<Pos>,
    generation: u64,
}

fn lock(inner: &Arc<Mutex<Inner>>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StreamRenderer {
    pub fn new(opts: RendererOptions) -> Self {
        let surface = Surface::new(opts.anchor);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                opts,
                content: String::new(),
                surface,
                cache: HighlightCache::default(),
                pending: Vec::new(),
                was_loading: false,
                start_pos: None,
                last_full: String::new(),
                highlighter: None,
                on_patch: None,
                generation: 0,
            })),
            tasks: Vec::new(),
        }
    }

    pub fn with_highlighter(self, highlighter: Arc<dyn Highlighter>) -> Self {
        lock(&self.inner).highlighter = Some(highlighter);
        self
    }

    /// Observe every patch produced by asynchronously resolved highlights.
    /// The callback always sees the surface in its post-patch state.
    pub fn with_on_patch(self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        lock(&self.inner).on_patch = Some(Box::new(callback));
        self
    }

    /// Anchor the surface now and return the prologue patch.
    pub fn begin(&mut self) -> String {
        lock(&self.inner).surface.begin()
    }

    /// Feed a chunk; returns the patch to write to the terminal.
    pub fn push(&mut self, chunk: &str) -> Result<String, StreamError> {
        let (result, jobs) = lock(&self.inner).push_locked(chunk);
        for job in jobs {
            self.spawn(job);
        }
        result
    }

    /// Await every in-flight highlight task, then drain the patches their
    /// completions queued (already forwarded to `on_patch`, in order).
    pub async fn flush(&mut self) -> Vec<String> {
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await
                && !err.is_cancelled()
            {
                tracing::debug!(target: "stream.flush", %err, "highlight_task_failed");
            }
        }
        std::mem::take(&mut lock(&self.inner).pending)
    }

    /// Forget the stream. In-flight highlight tasks are not cancelled;
    /// their completions are simply no longer observable here.
    pub fn reset(&mut self) {
        self.tasks.clear();
        let mut inner = lock(&self.inner);
        inner.generation += 1;
        inner.content.clear();
        inner.cache.clear();
        inner.pending.clear();
        inner.was_loading = false;
        inner.start_pos = None;
        inner.last_full.clear();
        inner.surface.clear();
    }

    /// The accumulated Markdown source.
    pub fn content(&self) -> String {
        lock(&self.inner).content.clone()
    }

    /// What the terminal displays now (the clipped view).
    pub fn rendered_text(&self) -> String {
        lock(&self.inner).surface.text().to_string()
    }

    /// The last unclipped render; what a session prints after streaming.
    pub fn full_rendered_text(&self) -> String {
        lock(&self.inner).last_full.clone()
    }

    fn spawn(&mut self, job: HighlightJob) {
        let inner = Arc::clone(&self.inner);
        let HighlightJob {
            key,
            future,
            origin,
            generation,
        } = job;
        let handle = tokio::spawn(async move {
            let result = future.await;
            complete_highlight(&inner, key, origin, generation, result);
        });
        self.tasks.push(handle);
    }
}

impl Inner {
    fn push_locked(&mut self, chunk: &str) -> (Result<String, StreamError>, Vec<HighlightJob>) {
        self.content.push_str(chunk);
        let doc = {
            let normalized = normalize_stream(&self.content);
            parse(&normalized)
        };
        let mut jobs = self.schedule_highlights(&doc);
        let (rendered, rendered_full) = self.render_doc(&doc);
        self.last_full = rendered_full;

        let loading_now = trailing_loading_code_block(&doc).is_some();
        let was_loading = self.was_loading;
        let prev = self.surface.text().to_string();

        let result = if loading_now {
            if !was_loading {
                self.start_pos = match self.opts.strategy {
                    Strategy::Smart => fence_origin(&rendered),
                    Strategy::Redraw => None,
                };
            }
            self.was_loading = true;
            self.emit_default(&rendered)
        } else if was_loading {
            self.was_loading = false;
            let origin = self.start_pos.take();
            let closed_key = last_code_block(&doc)
                .map(|block| cache_key(&block.language, block.trimmed_code()));
            match closed_key {
                Some(key) if self.cache.is_in_flight(&key) => {
                    // Highlight still pending: show the plain form now and
                    // let the job's completion do the in-place rewrite.
                    if let Some(job) = jobs.iter_mut().find(|job| job.key == key) {
                        job.origin = origin;
                    }
                    self.emit_default(&rendered)
                }
                _ => self.emit_closed_rewrite(&rendered, &prev, origin),
            }
        } else {
            self.start_pos = None;
            self.emit_default(&rendered)
        };

        tracing::trace!(
            target: "stream.push",
            chunk_len = chunk.len(),
            content_len = self.content.len(),
            loading = loading_now,
            deferred = jobs.len(),
            ok = result.is_ok(),
            "push"
        );
        (result, jobs)
    }

    /// Offer every settled (non-loading) code block to the highlighter.
    /// Sync results land in the cache before rendering; deferred ones are
    /// returned as jobs for the caller to spawn once the lock is released.
    fn schedule_highlights(&mut self, doc: &Node) -> Vec<HighlightJob> {
        let mut jobs = Vec::new();
        let Some(highlighter) = self.highlighter.clone() else {
            return jobs;
        };
        for block in code_blocks(doc) {
            if block.loading {
                continue;
            }
            let key = cache_key(&block.language, block.trimmed_code());
            if self.cache.is_known(&key) {
                continue;
            }
            match highlighter.highlight(block.trimmed_code(), &block.language) {
                None => self.cache.mark_failed(key),
                Some(Outcome::Ready(Ok(text))) => self.cache.insert(key, text),
                Some(Outcome::Ready(Err(err))) => {
                    tracing::debug!(
                        target: "stream.highlight",
                        language = block.language.as_str(),
                        %err,
                        "highlight_failed"
                    );
                    self.cache.mark_failed(key);
                }
                Some(Outcome::Deferred(future)) => {
                    self.cache.begin_flight(key.clone());
                    jobs.push(HighlightJob {
                        key,
                        future,
                        origin: None,
                        generation: self.generation,
                    });
                }
            }
        }
        jobs
    }

    /// Render the document with the cache as the highlight lookup.
    /// Returns `(clipped view, full render)`.
    fn render_doc(&self, doc: &Node) -> (String, String) {
        let theme = self.opts.theme;
        let render_opts = RenderOptions {
            theme: &theme,
            color: self.opts.color,
            width: self.opts.width,
            streaming: true,
        };
        let cache = &self.cache;
        let mut lookup = |code: &str, language: &str| {
            cache.get(&cache_key(language, code)).map(str::to_string)
        };
        let full = render_tree(doc, &render_opts, &mut lookup);
        let clipped = clip_tail(&full, self.opts.viewport_height);
        (clipped, full)
    }

    /// The append-or-rewrite decision shared by every non-rewrite case.
    fn emit_default(&mut self, rendered: &str) -> Result<String, StreamError> {
        match self.opts.strategy {
            Strategy::Redraw => Ok(self.surface.set_text(rendered)),
            Strategy::Smart => match rendered.strip_prefix(self.surface.text()) {
                Some(delta) => Ok(self.surface.append(delta)),
                None if self.opts.full_redraw_on_mismatch => {
                    Ok(self.surface.set_text(rendered))
                }
                None => Err(StreamError::NonAppendUpdate),
            },
        }
    }

    /// A code block closed and its final body is already in `rendered`:
    /// rewrite in place from the fence origin when the prefix held.
    fn emit_closed_rewrite(
        &mut self,
        rendered: &str,
        prev: &str,
        origin: Option<Pos>,
    ) -> Result<String, StreamError> {
        if self.opts.strategy == Strategy::Redraw {
            return Ok(self.surface.set_text(rendered));
        }
        let Some(origin) = origin else {
            return if self.opts.full_redraw_on_mismatch {
                Ok(self.surface.set_text(rendered))
            } else {
                Err(StreamError::MissingRewriteOrigin)
            };
        };
        let idx = pos_to_index(prev, origin);
        if rendered.get(..idx).is_some_and(|head| head == &prev[..idx]) {
            Ok(self.surface.set_text_from(rendered, origin))
        } else if self.opts.full_redraw_on_mismatch {
            Ok(self.surface.set_text(rendered))
        } else {
            Err(StreamError::RewritePrefixChanged)
        }
    }
}

/// Start-of-line position of the last opening fence in the rendered view.
fn fence_origin(rendered: &str) -> Option<Pos> {
    let idx = rendered.rfind("```")?;
    Some(Pos::line_start(index_to_pos(rendered, idx).line))
}

/// Runs on the task runner when a deferred highlight settles: cache the
/// result, re-render, and emit exactly one patch through the narrow/wide
/// decision. Failures are swallowed; the plain form stays on screen.
fn complete_highlight(
    inner: &Arc<Mutex<Inner>>,
    key: String,
    origin: Option<Pos>,
    generation: u64,
    result: Result<String, HighlightError>,
) {
    let mut inner = lock(inner);
    if inner.generation != generation {
        return;
    }
    match result {
        Err(err) => {
            tracing::debug!(target: "stream.highlight", %err, "deferred_highlight_failed");
            inner.cache.mark_failed(key);
            return;
        }
        Ok(text) => inner.cache.insert(key, text),
    }

    let doc = {
        let normalized = normalize_stream(&inner.content);
        parse(&normalized)
    };
    let (rendered, rendered_full) = inner.render_doc(&doc);
    inner.last_full = rendered_full;
    if rendered == inner.surface.text() {
        return;
    }

    let prev = inner.surface.text().to_string();
    let patch = match origin {
        Some(origin) if inner.opts.strategy == Strategy::Smart => {
            let idx = pos_to_index(&prev, origin);
            if rendered.get(..idx).is_some_and(|head| head == &prev[..idx]) {
                inner.surface.set_text_from(&rendered, origin)
            } else {
                inner.surface.set_text(&rendered)
            }
        }
        _ => inner.surface.set_text(&rendered),
    };
    inner.pending.push(patch.clone());
    // Surface first, callback second: an `on_patch` observer reading the
    // rendered text always sees the post-patch state.
    if let Some(callback) = inner.on_patch.as_mut() {
        callback(&patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RendererOptions;

    fn renderer() -> StreamRenderer {
        StreamRenderer::new(RendererOptions::default())
    }

    #[test]
    fn appends_extend_without_repositioning() {
        let mut r = renderer();
        let first = r.push("# A\n").expect("push");
        assert_eq!(first, "\r\x1b7\x1b[s# A\n");
        let second = r.push("\nB\n").expect("push");
        assert_eq!(second, "\nB\n");
        assert_eq!(r.rendered_text(), "# A\n\nB\n");
    }

    #[test]
    fn growing_paragraph_falls_back_to_rewrite() {
        let mut r = renderer();
        r.push("Hel").expect("push");
        let patch = r.push("lo").expect("push");
        assert!(patch.starts_with("\x1b8\x1b[u"));
        assert_eq!(r.rendered_text(), "Hello\n");
    }

    #[test]
    fn mismatch_without_fallback_raises() {
        let mut r = StreamRenderer::new(RendererOptions {
            full_redraw_on_mismatch: false,
            ..RendererOptions::default()
        });
        r.push("Hel").expect("push");
        assert_eq!(r.push("lo"), Err(StreamError::NonAppendUpdate));
    }

    #[test]
    fn fence_origin_is_line_start_of_last_fence() {
        assert_eq!(fence_origin("text\n```rs\nx\n"), Some(Pos::new(2, 1)));
        assert_eq!(fence_origin("no fence here\n"), None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut r = renderer();
        r.push("# A\n").expect("push");
        r.reset();
        assert_eq!(r.content(), "");
        assert_eq!(r.rendered_text(), "");
        assert_eq!(r.full_rendered_text(), "");
        // A fresh push re-anchors from scratch.
        let patch = r.push("B\n").expect("push");
        assert!(patch.starts_with("\r\x1b7\x1b[s"));
    }

    #[test]
    fn content_accumulates_verbatim() {
        let mut r = renderer();
        r.push("a").expect("push");
        r.push("b").expect("push");
        assert_eq!(r.content(), "ab");
    }
}
