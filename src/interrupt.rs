//! The three-option interrupt menu, driver checkpoints, and the degraded
//! OS-signal fallback for mid-loop interrupt support.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::cancel::{CancellationContext, CtrlC, Flow, InterruptState};
use crate::term;
use crate::term::keys::{Key, KeyEvent, KeySource, TerminalKeys};
use crate::term::surface::{clip, RenderSurface, TermSurface};

const KEY_POLL: Duration = Duration::from_millis(100);

/// Operator's answer to "an operation is running — what now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptChoice {
    /// Abort at the next checkpoint.
    CancelNow,
    /// Let the in-flight step finish, then leave the loop.
    StopAfter,
    /// Resume as if nothing happened.
    Continue,
}

const OPTIONS: [&str; 3] = [
    "Cancel now",
    "Finish current step, then stop",
    "Continue",
];

/// Releases the menu-active guard on every exit path.
struct MenuGuard<'a> {
    ctx: &'a CancellationContext,
}

impl Drop for MenuGuard<'_> {
    fn drop(&mut self) {
        self.ctx.leave_menu();
    }
}

fn render_lines(label: &str, focus: usize, width: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}",
        "‼".yellow(),
        clip(&format!("Interrupted — {label}"), width.saturating_sub(2)).bold()
    )];
    for (idx, option) in OPTIONS.iter().enumerate() {
        let marker = if idx == focus { "▶" } else { " " };
        let row = format!("{marker} {}. {option}", idx + 1);
        if idx == focus {
            lines.push(row.cyan().to_string());
        } else {
            lines.push(row);
        }
    }
    lines.push(format!(
        "  {}",
        "1-3 pick · Enter select · Esc continue".dimmed()
    ));
    lines
}

fn choice_at(focus: usize) -> InterruptChoice {
    match focus {
        0 => InterruptChoice::CancelNow,
        1 => InterruptChoice::StopAfter,
        _ => InterruptChoice::Continue,
    }
}

/// Drive the interrupt menu over injected I/O.
///
/// Re-entrant opens resolve `Continue` without rendering anything; the
/// menu-active guard makes concurrent triggers a silent no-op. Resolution
/// writes the shared [`InterruptState`]; `Continue` leaves it untouched.
pub fn interrupt_menu_with(
    label: &str,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<InterruptChoice>> {
    if !ctx.try_enter_menu() {
        return Ok(Flow::Resolved(InterruptChoice::Continue));
    }
    let _guard = MenuGuard { ctx };

    // Safest option is the default focus.
    let mut focus = 2usize;

    let resolved = loop {
        surface.repaint(&render_lines(label, focus, surface.width()))?;
        let Some(ev) = keys.read_key(Some(KEY_POLL))? else {
            continue;
        };
        if ev.is_ctrl_c() {
            match ctx.press_ctrl_c() {
                CtrlC::ForceExit => {
                    surface.clear()?;
                    return Ok(Flow::ForceExit);
                }
                // Soft Ctrl+C closes the menu like Escape does.
                CtrlC::Soft => break InterruptChoice::Continue,
            }
        }
        if let Some(choice) = handle_key(&ev, &mut focus) {
            break choice;
        }
    };
    surface.clear()?;

    match resolved {
        InterruptChoice::CancelNow => ctx.request_cancel(),
        InterruptChoice::StopAfter => ctx.request_stop_after(),
        InterruptChoice::Continue => {}
    }
    Ok(Flow::Resolved(resolved))
}

/// Feed one key. Digit keys 1/2/3 short-circuit navigation state entirely.
fn handle_key(ev: &KeyEvent, focus: &mut usize) -> Option<InterruptChoice> {
    if let Some(c) = ev.printable() {
        match c {
            '1' => return Some(InterruptChoice::CancelNow),
            '2' => return Some(InterruptChoice::StopAfter),
            '3' => return Some(InterruptChoice::Continue),
            _ => return None,
        }
    }
    match ev.key {
        Key::Enter => return Some(choice_at(*focus)),
        Key::Escape => return Some(InterruptChoice::Continue),
        Key::Up => *focus = focus.saturating_sub(1),
        Key::Down => *focus = (*focus + 1).min(OPTIONS.len() - 1),
        Key::Home => *focus = 0,
        Key::End => *focus = OPTIONS.len() - 1,
        _ => {}
    }
    None
}

/// Show the interrupt menu on the real terminal.
///
/// `label` names the operation being interrupted (e.g. "iteration 3").
/// Non-interactive terminals never see the menu; the call resolves
/// `Continue` and the OS-signal fallback stays in charge.
pub fn show_interrupt_menu(label: &str, ctx: &CancellationContext) -> Result<InterruptChoice> {
    if term::probe() == term::Capability::Degraded {
        return Ok(InterruptChoice::Continue);
    }
    let guard = term::TermGuard::acquire()?;
    let mut keys = TerminalKeys;
    let mut surface = TermSurface::new();
    let flow = interrupt_menu_with(label, &mut keys, &mut surface, ctx)?;
    guard.release();
    match flow {
        Flow::ForceExit => term::force_exit(130),
        Flow::Resolved(choice) => Ok(choice),
    }
}

/// What the driver should do at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// No interrupt pending; run the next step.
    Proceed,
    /// Abort immediately.
    AbortNow,
    /// Emit a stopping notice, leave the loop, and reset the state to
    /// `None` via [`CancellationContext::reset_interrupt_state`].
    StopLoop,
}

/// Evaluate the interrupt state at a well-defined driver checkpoint
/// (top of an iteration, or after an agent call returns).
pub fn checkpoint(ctx: &CancellationContext) -> Checkpoint {
    // The degraded fallback's plain SIGINT maps to an immediate cancel.
    if os_interrupted() {
        return Checkpoint::AbortNow;
    }
    match ctx.interrupt_state() {
        InterruptState::CancelRequested => Checkpoint::AbortNow,
        InterruptState::StopAfterIteration => Checkpoint::StopLoop,
        InterruptState::None => Checkpoint::Proceed,
    }
}

/// Global interrupt flag for the degraded (no raw mode) path, registered
/// once with SIGINT.
static OS_INTERRUPT: OnceLock<Arc<AtomicBool>> = OnceLock::new();
static OS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register the SIGINT fallback handler. Safe to call multiple times (only
/// the first call registers; subsequent calls are no-ops).
pub fn register_os_fallback() -> Result<()> {
    let flag = OS_INTERRUPT.get_or_init(|| Arc::new(AtomicBool::new(false)));
    if OS_REGISTERED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    // First handler: set the flag on first Ctrl+C.
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(flag))?;

    // Second handler: if the flag is already set (i.e. second Ctrl+C),
    // force-exit with the terminal restored.
    let flag_clone = Arc::clone(flag);
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGINT, move || {
            if flag_clone.load(Ordering::SeqCst) {
                let _ = crossterm::terminal::disable_raw_mode();
                signal_hook::low_level::exit(130);
            }
        })?;
    }

    Ok(())
}

/// Whether the degraded-path interrupt flag is set.
pub fn os_interrupted() -> bool {
    OS_INTERRUPT
        .get()
        .map(|f| f.load(Ordering::SeqCst))
        .unwrap_or(false)
}

/// Clear the degraded-path flag so the next iteration starts clean.
pub fn clear_os_interrupt() {
    if let Some(flag) = OS_INTERRUPT.get() {
        flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::keys::ScriptedKeys;
    use crate::term::surface::CaptureSurface;

    fn key(k: Key) -> KeyEvent {
        KeyEvent::plain(k)
    }

    #[test]
    fn digit_two_resolves_stop_after_and_sets_state() {
        // Operator presses `2` mid-operation; the next checkpoint stops the
        // loop and the reset leaves a clean state for the next run.
        let ctx = CancellationContext::new();
        let mut keys = ScriptedKeys::new(vec![KeyEvent::ch('2')]);
        let mut surface = CaptureSurface::new();

        let flow = interrupt_menu_with("iteration 3", &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow.unwrap_resolved(), InterruptChoice::StopAfter);
        assert_eq!(ctx.interrupt_state(), InterruptState::StopAfterIteration);

        assert_eq!(checkpoint(&ctx), Checkpoint::StopLoop);
        ctx.reset_interrupt_state();
        assert_eq!(ctx.interrupt_state(), InterruptState::None);
        assert_eq!(checkpoint(&ctx), Checkpoint::Proceed);
    }

    #[test]
    fn digit_one_requests_cancel() {
        let ctx = CancellationContext::new();
        let mut keys = ScriptedKeys::new(vec![KeyEvent::ch('1')]);
        let mut surface = CaptureSurface::new();

        let flow = interrupt_menu_with("deploy", &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow.unwrap_resolved(), InterruptChoice::CancelNow);
        assert_eq!(ctx.interrupt_state(), InterruptState::CancelRequested);
        assert_eq!(checkpoint(&ctx), Checkpoint::AbortNow);
    }

    #[test]
    fn digits_short_circuit_navigation() {
        // Navigation moved the focus, but the digit ignores it.
        let ctx = CancellationContext::new();
        let mut keys = ScriptedKeys::new(vec![key(Key::Up), key(Key::Up), KeyEvent::ch('2')]);
        let mut surface = CaptureSurface::new();

        let flow = interrupt_menu_with("step", &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow.unwrap_resolved(), InterruptChoice::StopAfter);
    }

    #[test]
    fn arrows_and_enter_match_digits() {
        // Default focus is Continue (index 2); two Ups reach Cancel now.
        let ctx = CancellationContext::new();
        let mut keys = ScriptedKeys::new(vec![key(Key::Up), key(Key::Up), key(Key::Enter)]);
        let mut surface = CaptureSurface::new();

        let flow = interrupt_menu_with("step", &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow.unwrap_resolved(), InterruptChoice::CancelNow);
        assert_eq!(ctx.interrupt_state(), InterruptState::CancelRequested);
    }

    #[test]
    fn escape_continues_without_touching_state() {
        let ctx = CancellationContext::new();
        let mut keys = ScriptedKeys::new(vec![key(Key::Escape)]);
        let mut surface = CaptureSurface::new();

        let flow = interrupt_menu_with("step", &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow.unwrap_resolved(), InterruptChoice::Continue);
        assert_eq!(ctx.interrupt_state(), InterruptState::None);
    }

    #[test]
    fn reentrant_open_resolves_continue_silently() {
        let ctx = CancellationContext::new();
        assert!(ctx.try_enter_menu());

        // Second opener: no keys are consumed, nothing is rendered.
        let mut keys = ScriptedKeys::new(vec![]);
        let mut surface = CaptureSurface::new();
        let flow = interrupt_menu_with("step", &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow.unwrap_resolved(), InterruptChoice::Continue);
        assert!(surface.frames.is_empty());

        ctx.leave_menu();
    }

    #[test]
    fn menu_guard_releases_after_resolution() {
        let ctx = CancellationContext::new();
        let mut keys = ScriptedKeys::new(vec![key(Key::Escape)]);
        let mut surface = CaptureSurface::new();
        interrupt_menu_with("step", &mut keys, &mut surface, &ctx).unwrap();
        assert!(!ctx.menu_active());
    }

    #[test]
    fn checkpoint_defaults_to_proceed() {
        let ctx = CancellationContext::new();
        assert_eq!(checkpoint(&ctx), Checkpoint::Proceed);
    }
}
