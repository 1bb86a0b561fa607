//! Cursor-relative frame painting.
//!
//! Interactive components redraw by moving the cursor up over the previous
//! frame and repainting in place, so a menu with thousands of items costs one
//! viewport of output per keystroke and never flickers a full-screen clear.
//! The [`RenderSurface`] trait is the seam: the real implementation emits ANSI
//! through crossterm, the capture implementation records frames for tests.

use std::io::{self, Stdout, Write};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;

/// Target for interactive frames.
///
/// Producers are responsible for clipping line content to [`width`] before
/// styling; a line that wraps would desynchronize the row bookkeeping.
///
/// [`width`]: RenderSurface::width
pub trait RenderSurface {
    /// Replace the previous frame with `lines`.
    fn repaint(&mut self, lines: &[String]) -> io::Result<()>;

    /// Erase the current frame entirely, leaving the cursor at column 0.
    fn clear(&mut self) -> io::Result<()>;

    /// Usable terminal width in columns.
    fn width(&self) -> usize;
}

/// Clip `text` to at most `max` characters.
///
/// Plain character counting; styled lines must be clipped before the ANSI
/// codes are applied.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

/// Real terminal surface writing ANSI to stdout.
pub struct TermSurface {
    out: Stdout,
    cursor_row: usize,
    last_frame: Vec<String>,
}

impl TermSurface {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            cursor_row: 0,
            last_frame: Vec::new(),
        }
    }
}

impl Default for TermSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for TermSurface {
    fn repaint(&mut self, lines: &[String]) -> io::Result<()> {
        // Identical frames are skipped so held keys that change nothing
        // (e.g. Up at the top of a clamped list) do not repaint at all.
        if lines == self.last_frame.as_slice() {
            return Ok(());
        }

        if self.cursor_row > 0 {
            self.out.queue(MoveUp(self.cursor_row as u16))?;
        }
        self.out.queue(MoveToColumn(0))?;
        self.out.queue(Clear(ClearType::FromCursorDown))?;

        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                self.out.queue(Print("\r\n"))?;
            }
            self.out.queue(Print(line))?;
        }
        self.out.flush()?;

        self.cursor_row = lines.len().saturating_sub(1);
        self.last_frame = lines.to_vec();
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        if self.cursor_row > 0 {
            self.out.queue(MoveUp(self.cursor_row as u16))?;
        }
        self.out.queue(MoveToColumn(0))?;
        self.out.queue(Clear(ClearType::FromCursorDown))?;
        self.out.flush()?;
        self.cursor_row = 0;
        self.last_frame.clear();
        Ok(())
    }

    fn width(&self) -> usize {
        super::size().0 as usize
    }
}

/// Frame-capturing surface for tests.
pub struct CaptureSurface {
    pub frames: Vec<Vec<String>>,
    pub clears: usize,
    width: usize,
}

impl CaptureSurface {
    pub fn new() -> Self {
        Self::with_width(80)
    }

    pub fn with_width(width: usize) -> Self {
        Self {
            frames: Vec::new(),
            clears: 0,
            width,
        }
    }

    /// The most recently painted frame.
    pub fn last_frame(&self) -> Option<&[String]> {
        self.frames.last().map(|f| f.as_slice())
    }

    /// Whether any painted frame contains `needle` on any line.
    pub fn ever_contains(&self, needle: &str) -> bool {
        self.frames
            .iter()
            .any(|frame| frame.iter().any(|line| line.contains(needle)))
    }
}

impl Default for CaptureSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for CaptureSurface {
    fn repaint(&mut self, lines: &[String]) -> io::Result<()> {
        self.frames.push(lines.to_vec());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.clears += 1;
        Ok(())
    }

    fn width(&self) -> usize {
        self.width
    }
}
