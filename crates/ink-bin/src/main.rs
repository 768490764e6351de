//! inkstream entrypoint: stream Markdown into the terminal.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{AnchorArg, ColorArg, ConfigFile, StrategyArg};
use core_highlight::{Delayed, Highlighter, TreeSitterHighlighter};
use core_stream::{Anchor, ColorMode, RendererOptions, StreamRenderer};
use core_terminal::{SessionOptions, StreamSession};
use crossterm::tty::IsTty;
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "inkstream",
    version,
    about = "Stream Markdown to the terminal with minimal-movement updates"
)]
struct Args {
    /// Markdown file to stream; stdin is streamed as it arrives when omitted.
    pub path: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `inkstream.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
    #[arg(long, value_enum)]
    pub anchor: Option<AnchorArg>,
    /// Trailing-line viewport height; unset streams unclipped.
    #[arg(long)]
    pub viewport: Option<usize>,
    /// Render width for thematic breaks; defaults to the terminal width.
    #[arg(long)]
    pub width: Option<usize>,
    #[arg(long, value_enum)]
    pub color: Option<ColorArg>,
    /// Stream inside the alternate screen (requires a TTY).
    #[arg(long)]
    pub alt_screen: bool,
    /// Disable synchronised-update bracketing around patches.
    #[arg(long)]
    pub no_sync: bool,
    /// Chunk size in characters when simulating a stream from a file.
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Delay between simulated chunks in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Disable the built-in syntax highlighter.
    #[arg(long)]
    pub no_highlight: bool,
    /// Artificial highlight latency; exercises the async rewrite path.
    #[arg(long)]
    pub highlight_delay_ms: Option<u64>,
}

/// Effective settings after merging CLI flags over the config file.
struct Settings {
    renderer: RendererOptions,
    session: SessionOptions,
    chunk_size: usize,
    delay: Duration,
    highlight: bool,
    highlight_delay: Duration,
    print_final: bool,
}

impl Settings {
    fn merge(args: &Args, file: &ConfigFile, stdout_is_tty: bool) -> Self {
        let strategy = args.strategy.or(file.render.strategy).map(Into::into);
        let anchor = args.anchor.or(file.render.anchor).map(Into::into);
        let viewport = args.viewport.or(file.render.viewport);
        let color_mode: ColorMode = args
            .color
            .or(file.render.color)
            .map(Into::into)
            .unwrap_or_default();
        let width = args
            .width
            .or(file.render.width)
            .or_else(|| crossterm::terminal::size().ok().map(|(w, _)| w as usize));

        let alt_screen = args.alt_screen || file.session.alt_screen.unwrap_or(false);
        let mut renderer = RendererOptions {
            viewport_height: viewport,
            color: color_mode.resolve(stdout_is_tty),
            width,
            ..RendererOptions::default()
        };
        if let Some(strategy) = strategy {
            renderer.strategy = strategy;
        }
        if let Some(anchor) = anchor {
            renderer.anchor = anchor;
        } else if alt_screen {
            // The prompt save-point is meaningless on a fresh alternate
            // screen; absolute home is the reliable origin there.
            renderer.anchor = Anchor::Home;
        }

        let synchronized = if args.no_sync {
            false
        } else {
            file.session.synchronized.unwrap_or(true)
        };

        Self {
            renderer,
            session: SessionOptions {
                alt_screen,
                synchronized,
                ..SessionOptions::default()
            },
            chunk_size: args.chunk_size.or(file.demo.chunk_size).unwrap_or(64).max(1),
            delay: Duration::from_millis(args.delay_ms.or(file.demo.delay_ms).unwrap_or(0)),
            highlight: !args.no_highlight && file.highlight.enabled.unwrap_or(true),
            highlight_delay: Duration::from_millis(
                args.highlight_delay_ms
                    .or(file.highlight.delay_ms)
                    .unwrap_or(0),
            ),
            print_final: alt_screen || viewport.is_some(),
        }
    }
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_path = std::path::Path::new("inkstream.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(log_path);
    }
    let file_appender = tracing_appender::rolling::never(".", "inkstream.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    // stdout carries patch bytes; logs must never mix into it.
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: std::sync::Once = std::sync::Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let file_config = config::load_from(args.config.clone())?;
    let stdout = std::io::stdout();
    let settings = Settings::merge(&args, &file_config, stdout.is_tty());
    let path_str = args.path.as_ref().map(|p| p.display().to_string());
    info!(
        target: "runtime.startup",
        path = path_str.as_deref(),
        strategy = ?settings.renderer.strategy,
        anchor = ?settings.renderer.anchor,
        viewport = settings.renderer.viewport_height,
        color = settings.renderer.color,
        "bootstrap_complete"
    );

    let result = run_stream(args.path, settings, stdout).await;
    if let Err(err) = &result {
        error!(target: "runtime", ?err, "stream_error");
    }
    info!(target: "runtime", "shutdown");
    result
}

async fn run_stream(path: Option<PathBuf>, settings: Settings, stdout: Stdout) -> Result<()> {
    let mut renderer = StreamRenderer::new(settings.renderer);
    if settings.highlight {
        let highlighter: Arc<dyn Highlighter> = if settings.highlight_delay.is_zero() {
            Arc::new(TreeSitterHighlighter)
        } else {
            Arc::new(Delayed::new(TreeSitterHighlighter, settings.highlight_delay))
        };
        renderer = renderer.with_highlighter(highlighter);
    }

    let mut session = if settings.session.alt_screen {
        StreamSession::for_tty(stdout, settings.session)?
    } else {
        StreamSession::new(stdout, settings.session)
    };
    session.start()?;
    session.patch(&renderer.begin())?;

    let streamed = match path {
        Some(path) => stream_file(&mut renderer, &mut session, &path, &settings).await,
        None => stream_stdin(&mut renderer, &mut session).await,
    };

    // Late highlight patches land before teardown regardless of how the
    // stream itself went.
    for patch in renderer.flush().await {
        session.patch(&patch)?;
    }
    session.finish()?;
    if settings.print_final && streamed.is_ok() {
        session.print(&renderer.full_rendered_text())?;
    }
    streamed
}

async fn stream_file(
    renderer: &mut StreamRenderer,
    session: &mut StreamSession<Stdout>,
    path: &Path,
    settings: &Settings,
) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let chars: Vec<char> = content.chars().collect();
    for chunk in chars.chunks(settings.chunk_size) {
        let chunk: String = chunk.iter().collect();
        let patch = renderer.push(&chunk)?;
        session.patch(&patch)?;
        if !settings.delay.is_zero() {
            tokio::time::sleep(settings.delay).await;
        }
    }
    Ok(())
}

async fn stream_stdin(
    renderer: &mut StreamRenderer,
    session: &mut StreamSession<Stdout>,
) -> Result<()> {
    let mut stdin = tokio::io::stdin();
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = stdin.read(&mut buf).await.context("reading stdin")?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buf[..n]);
        // Only the valid UTF-8 prefix is pushed; a split code point waits
        // for its remaining bytes.
        let valid = match std::str::from_utf8(&pending) {
            Ok(s) => s.len(),
            Err(e) => e.valid_up_to(),
        };
        if valid == 0 {
            continue;
        }
        let chunk = String::from_utf8_lossy(&pending[..valid]).into_owned();
        pending.drain(..valid);
        let patch = renderer.push(&chunk)?;
        session.patch(&patch)?;
    }
    if !pending.is_empty() {
        let chunk = String::from_utf8_lossy(&pending).into_owned();
        let patch = renderer.push(&chunk)?;
        session.patch(&patch)?;
    }
    Ok(())
}
