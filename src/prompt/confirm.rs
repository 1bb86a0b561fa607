//! Yes/no confirmation prompt.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

use crate::cancel::{CancellationContext, CtrlC, Flow};
use crate::output::formatter;
use crate::prompt::{run_prompt, PromptOutcome, KEY_POLL};
use crate::term::keys::{Key, KeyEvent, KeySource};
use crate::term::surface::{clip, RenderSurface};

/// Feed one key to a confirm prompt. `None` keeps it open.
pub fn handle_key(ev: &KeyEvent, default_yes: bool) -> Option<PromptOutcome<bool>> {
    if ev.is_ctrl_c() {
        return Some(PromptOutcome::Cancelled);
    }
    match ev.printable() {
        Some('y') | Some('Y') => return Some(PromptOutcome::Submitted(true)),
        Some('n') | Some('N') => return Some(PromptOutcome::Submitted(false)),
        _ => {}
    }
    match ev.key {
        Key::Enter => Some(PromptOutcome::Submitted(default_yes)),
        Key::Escape => Some(PromptOutcome::Cancelled),
        _ => None,
    }
}

pub fn render_lines(message: &str, default_yes: bool, width: usize) -> Vec<String> {
    let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
    vec![format!(
        "{} {} {}",
        "•".cyan(),
        clip(message, width.saturating_sub(8)).bold(),
        hint.dimmed()
    )]
}

pub fn confirm_with(
    message: &str,
    default_yes: bool,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<PromptOutcome<bool>>> {
    loop {
        surface.repaint(&render_lines(message, default_yes, surface.width()))?;
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
        if let Some(outcome) = handle_key(&ev, default_yes) {
            surface.clear()?;
            return Ok(Flow::Resolved(outcome));
        }
    }
}

/// Ask a yes/no question. Enter takes the default; Escape cancels.
pub fn confirm(
    message: &str,
    default_yes: bool,
    ctx: &CancellationContext,
) -> Result<PromptOutcome<bool>> {
    run_prompt(
        ctx,
        |keys, surface, ctx| confirm_with(message, default_yes, keys, surface, ctx),
        || confirm_fallback(message, default_yes),
    )
}

pub(crate) fn confirm_fallback(message: &str, default_yes: bool) -> Result<PromptOutcome<bool>> {
    let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
    print!("{message} {hint} ");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        formatter::print_cancelled();
        return Ok(PromptOutcome::Cancelled);
    }
    let trimmed = line.trim().to_lowercase();
    let value = match trimmed.as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    };
    Ok(PromptOutcome::Submitted(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::keys::ScriptedKeys;
    use crate::term::surface::CaptureSurface;

    #[test]
    fn y_and_n_answer_directly() {
        assert_eq!(
            handle_key(&KeyEvent::ch('y'), false),
            Some(PromptOutcome::Submitted(true))
        );
        assert_eq!(
            handle_key(&KeyEvent::ch('N'), true),
            Some(PromptOutcome::Submitted(false))
        );
    }

    #[test]
    fn enter_takes_the_default() {
        assert_eq!(
            handle_key(&KeyEvent::plain(Key::Enter), true),
            Some(PromptOutcome::Submitted(true))
        );
        assert_eq!(
            handle_key(&KeyEvent::plain(Key::Enter), false),
            Some(PromptOutcome::Submitted(false))
        );
    }

    #[test]
    fn escape_cancels_other_keys_wait() {
        assert_eq!(
            handle_key(&KeyEvent::plain(Key::Escape), true),
            Some(PromptOutcome::Cancelled)
        );
        assert_eq!(handle_key(&KeyEvent::ch('x'), true), None);
    }

    #[test]
    fn run_loop_renders_hint() {
        let mut keys = ScriptedKeys::new(vec![KeyEvent::ch('y')]);
        let mut surface = CaptureSurface::new();
        let ctx = CancellationContext::new();
        let flow = confirm_with("Delete session?", false, &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow.unwrap_resolved(), PromptOutcome::Submitted(true));
        assert!(surface.ever_contains("[y/N]"));
    }
}
