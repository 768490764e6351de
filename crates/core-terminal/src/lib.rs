//! Terminal session wrapper for streaming output.
//!
//! Pure output sugar around a `Write`: cursor hiding, optional alternate
//! screen (cleared, scrollback purged), and synchronised-update bracketing
//! so a multi-row patch lands in one frame. Patch bytes pass through
//! untouched; the stream renderer owns their content. No raw mode, since
//! the session only writes.

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::execute;
use crossterm::terminal::{
    BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::tty::IsTty;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a TTY is required but the output stream is not one")]
    NotATty,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Stream inside the alternate screen (clears it on entry).
    pub alt_screen: bool,
    /// Bracket every patch in `CSI ?2026h` / `CSI ?2026l`.
    pub synchronized: bool,
    pub hide_cursor: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            alt_screen: false,
            synchronized: true,
            hide_cursor: true,
        }
    }
}

/// Owns the terminal for the lifetime of one stream and restores it on
/// drop, even if the caller early-returns.
pub struct StreamSession<W: Write> {
    out: W,
    opts: SessionOptions,
    active: bool,
}

impl<W: Write> StreamSession<W> {
    pub fn new(out: W, opts: SessionOptions) -> Self {
        Self {
            out,
            opts,
            active: false,
        }
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.active {
            return Ok(());
        }
        if self.opts.hide_cursor {
            execute!(self.out, Hide)?;
        }
        if self.opts.alt_screen {
            execute!(
                self.out,
                EnterAlternateScreen,
                Clear(ClearType::All),
                Clear(ClearType::Purge),
                MoveTo(0, 0)
            )?;
        }
        self.active = true;
        Ok(())
    }

    /// Write one patch, synchronised when configured.
    pub fn patch(&mut self, patch: &str) -> Result<(), SessionError> {
        if self.opts.synchronized {
            execute!(self.out, BeginSynchronizedUpdate)?;
            self.out.write_all(patch.as_bytes())?;
            self.out.flush()?;
            execute!(self.out, EndSynchronizedUpdate)?;
        } else {
            self.out.write_all(patch.as_bytes())?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Plain write, outside any synchronised bracket. For the final
    /// full-render print after streaming ends.
    pub fn print(&mut self, text: &str) -> Result<(), SessionError> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), SessionError> {
        if !self.active {
            return Ok(());
        }
        if self.opts.alt_screen {
            execute!(self.out, LeaveAlternateScreen)?;
        }
        if self.opts.hide_cursor {
            execute!(self.out, Show)?;
        }
        self.out.flush()?;
        self.active = false;
        Ok(())
    }
}

impl<W: Write + IsTty> StreamSession<W> {
    /// Construct only when the stream really is a TTY.
    pub fn for_tty(out: W, opts: SessionOptions) -> Result<Self, SessionError> {
        if !out.is_tty() {
            return Err(SessionError::NotATty);
        }
        Ok(Self::new(out, opts))
    }
}

impl<W: Write> Drop for StreamSession<W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
