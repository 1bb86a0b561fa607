//! Multi-select (checkbox) menu state machine.
//!
//! Space toggles the focused item, `a`/`n` select all/none, and Enter only
//! resolves once the minimum-selection constraint holds — an Enter below the
//! minimum keeps the menu open with an inline notice, by design. Resolution
//! returns checked values in item-declaration order, not selection order.

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

const FOOTER: &str = "Space toggle · a all · n none · Enter confirm · Esc cancel";
const KEY_POLL: Duration = Duration::from_millis(100);

/// Terminal state of a multi-select menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiOutcome {
    /// Checked values in declaration order.
    Submitted(Vec<String>),
    Cancelled,
}

pub struct MultiSelectMenu {
    title: String,
    entries: Vec<MenuEntry>,
    checked: Vec<bool>,
    selectable: Vec<usize>,
    pos: usize,
    viewport: ViewportState,
    margin: usize,
    min_select: usize,
    max_select: Option<usize>,
    allow_empty: bool,
    notice: Option<String>,
}

impl MultiSelectMenu {
    pub fn new(title: impl Into<String>, entries: Vec<MenuEntry>) -> Result<Self, MenuError> {
        let selectable = validate(&entries)?;
        let total = entries.len();
        let checked = vec![false; total];
        let focus = selectable[0];
        let mut menu = Self {
            title: title.into(),
            entries,
            checked,
            selectable,
            pos: 0,
            viewport: ViewportState::new(total, 10),
            margin: SCROLL_MARGIN,
            min_select: 0,
            max_select: None,
            allow_empty: false,
            notice: None,
        };
        menu.viewport = menu.viewport.update(focus, menu.margin);
        Ok(menu)
    }

    pub fn min_select(mut self, min: usize) -> Self {
        self.min_select = min;
        self
    }

    pub fn max_select(mut self, max: usize) -> Self {
        self.max_select = Some(max);
        self
    }

    /// Permit resolving with nothing checked (overrides the implicit
    /// at-least-one rule when `min_select` is 0).
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn height(mut self, rows: usize) -> Self {
        self.viewport = ViewportState::new(self.entries.len(), rows)
            .update(self.focused_entry(), self.margin);
        self
    }

    /// Pre-check items by value before the menu opens.
    pub fn preselect(mut self, values: &[&str]) -> Self {
        for &idx in &self.selectable {
            if let Some(item) = self.entries[idx].as_item() {
                if values.contains(&item.value.as_str()) {
                    self.checked[idx] = true;
                }
            }
        }
        self
    }

    pub fn focused_entry(&self) -> usize {
        self.selectable[self.pos]
    }

    pub fn checked_count(&self) -> usize {
        self.checked.iter().filter(|&&c| c).count()
    }

    /// Checked values in declaration order.
    pub fn checked_values(&self) -> Vec<String> {
        self.selectable
            .iter()
            .filter(|&&idx| self.checked[idx])
            .filter_map(|&idx| self.entries[idx].as_item().map(|i| i.value.clone()))
            .collect()
    }

    fn move_to(&mut self, pos: usize) {
        self.pos = pos;
        self.viewport = self.viewport.update(self.focused_entry(), self.margin);
    }

    fn toggle_focused(&mut self) {
        let idx = self.focused_entry();
        if self.checked[idx] {
            self.checked[idx] = false;
            self.notice = None;
            return;
        }
        // Checking past the cap is a silent no-op, not an error.
        if let Some(max) = self.max_select {
            if self.checked_count() >= max {
                return;
            }
        }
        self.checked[idx] = true;
        self.notice = None;
    }

    fn select_all(&mut self) {
        let cap = self.max_select.unwrap_or(usize::MAX);
        let mut count = self.checked_count();
        for &idx in &self.selectable {
            if count >= cap {
                break;
            }
            if !self.checked[idx] {
                self.checked[idx] = true;
                count += 1;
            }
        }
        self.notice = None;
    }

    fn select_none(&mut self) {
        self.checked.iter_mut().for_each(|c| *c = false);
        self.notice = None;
    }

    fn required_minimum(&self) -> usize {
        if self.allow_empty {
            self.min_select
        } else {
            self.min_select.max(1)
        }
    }

    /// Feed one key event. `None` keeps the menu open.
    pub fn handle_key(&mut self, ev: &KeyEvent) -> Option<MultiOutcome> {
        if ev.is_ctrl_c() {
            return Some(MultiOutcome::Cancelled);
        }
        let len = self.selectable.len();
        match ev.key {
            Key::Char(' ') => self.toggle_focused(),
            Key::Char('a') | Key::Char('A') if !ev.ctrl && !ev.alt => self.select_all(),
            Key::Char('n') | Key::Char('N') if !ev.ctrl && !ev.alt => self.select_none(),
            Key::Enter => {
                let minimum = self.required_minimum();
                if self.checked_count() < minimum {
                    self.notice = Some(if minimum == 1 {
                        "select at least one item".to_string()
                    } else {
                        format!("select at least {minimum} items")
                    });
                    return None;
                }
                return Some(MultiOutcome::Submitted(self.checked_values()));
            }
            Key::Escape => return Some(MultiOutcome::Cancelled),
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

    pub fn render_lines(&self, width: usize) -> Vec<String> {
        render_list_frame(
            &self.title,
            &self.entries,
            &self.viewport,
            self.focused_entry(),
            Some(&self.checked),
            FOOTER,
            self.notice.as_deref(),
            width,
        )
    }

    /// Drive the menu over injected I/O until it resolves.
    pub fn run_with(
        &mut self,
        keys: &mut dyn KeySource,
        surface: &mut dyn RenderSurface,
        ctx: &CancellationContext,
    ) -> Result<Flow<MultiOutcome>> {
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
                        return Ok(Flow::Resolved(MultiOutcome::Cancelled));
                    }
                }
            }
            if let Some(outcome) = self.handle_key(&ev) {
                surface.clear()?;
                return Ok(Flow::Resolved(outcome));
            }
        }
    }

    /// Run on the real terminal, degrading to a comma-separated number
    /// prompt when raw mode is unavailable.
    pub fn run(&mut self, ctx: &CancellationContext) -> Result<MultiOutcome> {
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
                if outcome == MultiOutcome::Cancelled {
                    formatter::print_cancelled();
                }
                Ok(outcome)
            }
        }
    }

    fn run_fallback(&mut self) -> Result<MultiOutcome> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", self.title)?;
        for (n, &idx) in self.selectable.iter().enumerate() {
            if let Some(item) = self.entries[idx].as_item() {
                writeln!(out, "  {}. {}", n + 1, item.label)?;
            }
        }
        write!(out, "  pick numbers, comma-separated (empty to cancel): ")?;
        out.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            formatter::print_cancelled();
            return Ok(MultiOutcome::Cancelled);
        }
        for part in line.trim().split(',') {
            if let Ok(n) = part.trim().parse::<usize>() {
                if n >= 1 && n <= self.selectable.len() {
                    let idx = self.selectable[n - 1];
                    // Reuse the interactive toggle so the max cap holds here too.
                    if !self.checked[idx] {
                        self.pos = n - 1;
                        self.toggle_focused();
                    }
                }
            }
        }
        if self.checked_count() < self.required_minimum() {
            formatter::print_cancelled();
            return Ok(MultiOutcome::Cancelled);
        }
        Ok(MultiOutcome::Submitted(self.checked_values()))
    }
}
