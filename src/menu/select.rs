//! Single-select (radio) menu state machine.
//!
//! Navigation walks a precomputed list of selectable entry indices with
//! wraparound; separators, headers, and disabled items are skipped. A hotkey
//! press resolves the menu exactly as if that item were focused and Enter
//! pressed. The state machine is a pure function of (state, key event); the
//! `run_*` methods bolt real or scripted I/O onto it.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Result;

use crate::cancel::{CancellationContext, CtrlC, Flow};
use crate::menu::viewport::{ViewportState, SCROLL_MARGIN};
use crate::menu::{page_jump, render_list_frame, validate, wrap_next, wrap_prev, MenuEntry, MenuError};
use crate::output::formatter;
use crate::term;
use crate::term::keys::{Key, KeyEvent, KeySource, TerminalKeys};
use crate::term::surface::{RenderSurface, TermSurface};

const FOOTER: &str = "↑/↓ move · Enter select · Esc cancel";
const KEY_POLL: Duration = Duration::from_millis(100);

/// Terminal state of a single-select menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(String),
    Cancelled,
}

pub struct SelectMenu {
    title: String,
    entries: Vec<MenuEntry>,
    /// Entry indices the cursor may land on, in declaration order.
    selectable: Vec<usize>,
    /// Cursor position within `selectable`.
    pos: usize,
    viewport: ViewportState,
    margin: usize,
}

impl SelectMenu {
    /// Validate entries and build the menu. Fails with
    /// [`MenuError::NoSelectableItems`] when nothing can be chosen.
    pub fn new(title: impl Into<String>, entries: Vec<MenuEntry>) -> Result<Self, MenuError> {
        let selectable = validate(&entries)?;
        let total = entries.len();
        let focus = selectable[0];
        let mut menu = Self {
            title: title.into(),
            entries,
            selectable,
            pos: 0,
            viewport: ViewportState::new(total, 10),
            margin: SCROLL_MARGIN,
        };
        menu.viewport = menu.viewport.update(focus, menu.margin);
        Ok(menu)
    }

    /// Override the visible window height (rows of entries).
    pub fn height(mut self, rows: usize) -> Self {
        self.viewport = ViewportState::new(self.entries.len(), rows)
            .update(self.focused_entry(), self.margin);
        self
    }

    /// Entry index currently under the cursor.
    pub fn focused_entry(&self) -> usize {
        self.selectable[self.pos]
    }

    fn focused_value(&self) -> String {
        self.entries[self.focused_entry()]
            .as_item()
            .map(|item| item.value.clone())
            .unwrap_or_default()
    }

    fn move_to(&mut self, pos: usize) {
        self.pos = pos;
        self.viewport = self.viewport.update(self.focused_entry(), self.margin);
    }

    fn hotkey_match(&self, c: char) -> Option<String> {
        let folded = c.to_ascii_lowercase();
        self.selectable.iter().find_map(|&idx| {
            let item = self.entries[idx].as_item()?;
            let key = item.hotkey?;
            (key.to_ascii_lowercase() == folded).then(|| item.value.clone())
        })
    }

    /// Feed one key event. `None` keeps the menu open.
    pub fn handle_key(&mut self, ev: &KeyEvent) -> Option<SelectOutcome> {
        if ev.is_ctrl_c() {
            return Some(SelectOutcome::Cancelled);
        }
        if let Some(c) = ev.printable() {
            if let Some(value) = self.hotkey_match(c) {
                return Some(SelectOutcome::Selected(value));
            }
        }
        let len = self.selectable.len();
        match ev.key {
            Key::Enter => return Some(SelectOutcome::Selected(self.focused_value())),
            Key::Escape => return Some(SelectOutcome::Cancelled),
            Key::Up => self.move_to(wrap_prev(self.pos, len)),
            Key::Down => self.move_to(wrap_next(self.pos, len)),
            Key::Home => self.move_to(0),
            Key::End => self.move_to(len - 1),
            Key::PageUp => {
                let jump = self.viewport.height as isize;
                self.move_to(page_jump(self.pos, len, -jump));
            }
            Key::PageDown => {
                let jump = self.viewport.height as isize;
                self.move_to(page_jump(self.pos, len, jump));
            }
            _ => {}
        }
        None
    }

    /// Current frame for the render surface.
    pub fn render_lines(&self, width: usize) -> Vec<String> {
        render_list_frame(
            &self.title,
            &self.entries,
            &self.viewport,
            self.focused_entry(),
            None,
            FOOTER,
            None,
            width,
        )
    }

    /// Drive the menu over injected I/O until it resolves.
    pub fn run_with(
        &mut self,
        keys: &mut dyn KeySource,
        surface: &mut dyn RenderSurface,
        ctx: &CancellationContext,
    ) -> Result<Flow<SelectOutcome>> {
        loop {
            surface.repaint(&self.render_lines(surface.width()))?;
            let Some(ev) = keys.read_key(Some(KEY_POLL))? else {
                continue;
            };
            if ev.is_ctrl_c() {
                match ctx.press_ctrl_c() {
                    CtrlC::ForceExit => {
                        surface.clear()?;
                        return Ok(Flow::ForceExit);
                    }
                    CtrlC::Soft => {
                        surface.clear()?;
                        return Ok(Flow::Resolved(SelectOutcome::Cancelled));
                    }
                }
            }
            if let Some(outcome) = self.handle_key(&ev) {
                surface.clear()?;
                return Ok(Flow::Resolved(outcome));
            }
        }
    }

    /// Run on the real terminal, degrading to a numbered prompt when raw
    /// mode is unavailable.
    pub fn run(&mut self, ctx: &CancellationContext) -> Result<SelectOutcome> {
        if term::probe() == term::Capability::Degraded {
            return self.run_fallback();
        }
        let guard = term::TermGuard::acquire()?;
        let mut keys = TerminalKeys;
        let mut surface = TermSurface::new();
        let flow = self.run_with(&mut keys, &mut surface, ctx)?;
        guard.release();
        match flow {
            Flow::ForceExit => term::force_exit(130),
            Flow::Resolved(outcome) => {
                if outcome == SelectOutcome::Cancelled {
                    formatter::print_cancelled();
                }
                Ok(outcome)
            }
        }
    }

    /// Numbered-list fallback for non-interactive terminals.
    fn run_fallback(&self) -> Result<SelectOutcome> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", self.title)?;
        for (n, &idx) in self.selectable.iter().enumerate() {
            if let Some(item) = self.entries[idx].as_item() {
                writeln!(out, "  {}. {}", n + 1, item.label)?;
            }
        }
        write!(out, "  pick [1-{}] (empty to cancel): ", self.selectable.len())?;
        out.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            formatter::print_cancelled();
            return Ok(SelectOutcome::Cancelled);
        }
        let trimmed = line.trim();
        match trimmed.parse::<usize>() {
            Ok(n) if n >= 1 && n <= self.selectable.len() => {
                let idx = self.selectable[n - 1];
                Ok(SelectOutcome::Selected(self.focused_value_at(idx)))
            }
            _ => {
                formatter::print_cancelled();
                Ok(SelectOutcome::Cancelled)
            }
        }
    }

    fn focused_value_at(&self, entry_idx: usize) -> String {
        self.entries[entry_idx]
            .as_item()
            .map(|item| item.value.clone())
            .unwrap_or_default()
    }
}
