//! Validated interactive prompts.
//!
//! Every prompt is a retry loop: render label and constraints, edit, validate,
//! and on failure paint an inline error and re-edit. Validation failures never
//! escape to the caller; cancellation comes back as an explicit outcome.

pub mod confirm;
pub mod editor;
pub mod line;
pub mod search;
pub mod wizard;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

use crate::cancel::{CancellationContext, CtrlC, Flow};
use crate::output::formatter;
use crate::prompt::editor::{EditAction, LineEditor};
use crate::term::keys::KeySource;
use crate::term::surface::{clip, RenderSurface};

use std::time::Duration;

pub(crate) const KEY_POLL: Duration = Duration::from_millis(100);

/// How a prompt ended. Cancellation is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    Submitted(T),
    Cancelled,
}

impl<T> PromptOutcome<T> {
    pub fn submitted(self) -> Option<T> {
        match self {
            PromptOutcome::Submitted(value) => Some(value),
            PromptOutcome::Cancelled => None,
        }
    }
}

/// Render the edit buffer with an inverse-video cursor cell.
pub(crate) fn render_input_line(display: &str, cursor: usize) -> String {
    let chars: Vec<char> = display.chars().collect();
    if cursor >= chars.len() {
        return format!("  > {display}{}", " ".reversed());
    }
    let before: String = chars[..cursor].iter().collect();
    let at: String = chars[cursor].to_string();
    let after: String = chars[cursor + 1..].iter().collect();
    format!("  > {before}{}{after}", at.reversed())
}

/// Frame for a line-editing prompt: label, input line, optional error.
pub(crate) fn render_prompt_frame(
    label: &str,
    constraints: Option<&str>,
    display: &str,
    cursor: usize,
    error: Option<&str>,
    width: usize,
) -> Vec<String> {
    let mut title = clip(label, width.saturating_sub(2)).bold().to_string();
    if let Some(hint) = constraints {
        title = format!("{title} {}", format!("({hint})").dimmed());
    }
    let mut lines = vec![format!("{} {title}", "•".cyan())];
    lines.push(render_input_line(display, cursor));
    if let Some(msg) = error {
        lines.push(format!("  {} {}", "✗".red(), clip(msg, width.saturating_sub(4)).red()));
    }
    lines
}

/// Drive one line-editing prompt over injected I/O until commit or cancel.
///
/// `validate` maps the committed text to the typed value or to an inline
/// error message, in which case the loop re-renders and keeps editing.
pub(crate) fn run_line_prompt<T>(
    label: &str,
    constraints: Option<String>,
    mut editor: LineEditor,
    mut validate: impl FnMut(&str) -> std::result::Result<T, String>,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<PromptOutcome<T>>> {
    let mut error: Option<String> = None;
    loop {
        let frame = render_prompt_frame(
            label,
            constraints.as_deref(),
            &editor.display(),
            editor.cursor(),
            error.as_deref(),
            surface.width(),
        );
        surface.repaint(&frame)?;

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
                    return Ok(Flow::Resolved(PromptOutcome::Cancelled));
                }
            }
        }
        match editor.apply(&ev) {
            EditAction::Commit => match validate(&editor.text()) {
                Ok(value) => {
                    surface.clear()?;
                    return Ok(Flow::Resolved(PromptOutcome::Submitted(value)));
                }
                Err(msg) => error = Some(msg),
            },
            EditAction::Cancel => {
                surface.clear()?;
                return Ok(Flow::Resolved(PromptOutcome::Cancelled));
            }
            EditAction::Edited => error = None,
            EditAction::Ignored => {}
        }
    }
}

/// Dispatch a prompt between the interactive and degraded paths.
///
/// Interactive: acquire the terminal guard, run `interactive` over real
/// keys and a real surface, translate `ForceExit` into a terminal-restoring
/// process exit, and acknowledge cancellation. Degraded: run `fallback`.
pub(crate) fn run_prompt<T>(
    ctx: &CancellationContext,
    interactive: impl FnOnce(
        &mut dyn KeySource,
        &mut dyn RenderSurface,
        &CancellationContext,
    ) -> Result<Flow<PromptOutcome<T>>>,
    fallback: impl FnOnce() -> Result<PromptOutcome<T>>,
) -> Result<PromptOutcome<T>> {
    if crate::term::probe() == crate::term::Capability::Degraded {
        return fallback();
    }
    let guard = crate::term::TermGuard::acquire()?;
    let mut keys = crate::term::keys::TerminalKeys;
    let mut surface = crate::term::surface::TermSurface::new();
    let flow = interactive(&mut keys, &mut surface, ctx)?;
    guard.release();
    match flow {
        Flow::ForceExit => crate::term::force_exit(130),
        Flow::Resolved(outcome) => {
            if matches!(outcome, PromptOutcome::Cancelled) {
                formatter::print_cancelled();
            }
            Ok(outcome)
        }
    }
}

/// Line-based fallback for non-interactive terminals.
///
/// Same retry semantics as the interactive loop; EOF cancels.
pub(crate) fn run_line_fallback<T>(
    label: &str,
    constraints: Option<&str>,
    mut validate: impl FnMut(&str) -> std::result::Result<T, String>,
) -> Result<PromptOutcome<T>> {
    let stdin = io::stdin();
    loop {
        match constraints {
            Some(hint) => print!("{label} ({hint}): "),
            None => print!("{label}: "),
        }
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            formatter::print_cancelled();
            return Ok(PromptOutcome::Cancelled);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        match validate(trimmed) {
            Ok(value) => return Ok(PromptOutcome::Submitted(value)),
            Err(msg) => println!("  ✗ {msg}"),
        }
    }
}
