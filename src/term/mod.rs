//! Terminal mode control: raw input, cursor visibility, capability probing.
//!
//! Raw mode and the hidden cursor are a scoped resource. Every interactive
//! component acquires a [`TermGuard`] before reading keys and the guard's
//! `Drop` restores the user's shell on every exit path, including panics.
//! Process-level termination is covered by [`register_restore_on_term`] and
//! [`force_exit`], which restore the terminal before exiting.

pub mod keys;
pub mod surface;

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// What the attached terminal can do, probed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Raw mode available; full interactive components run.
    Interactive,
    /// Not a TTY (pipe, CI, redirected stdin). Every component degrades to
    /// its line-based fallback and the interrupt menu is skipped entirely.
    Degraded,
}

static FORCE_DEGRADED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Force the degraded path for the rest of the process (`--no-ui`,
/// `CRANK_UI=0`). There is no undo; capability changes once, at startup.
pub fn force_degraded() {
    FORCE_DEGRADED.store(true, std::sync::atomic::Ordering::SeqCst);
}

/// Probe stdin/stdout once. The result holds for the process lifetime.
pub fn probe() -> Capability {
    if FORCE_DEGRADED.load(std::sync::atomic::Ordering::SeqCst) {
        return Capability::Degraded;
    }
    probe_for(io::stdin().is_terminal(), io::stdout().is_terminal())
}

fn probe_for(stdin_is_tty: bool, stdout_is_tty: bool) -> Capability {
    if stdin_is_tty && stdout_is_tty {
        Capability::Interactive
    } else {
        Capability::Degraded
    }
}

/// Terminal dimensions in (columns, rows), defaulting to 80x24.
pub fn size() -> (u16, u16) {
    crossterm::terminal::size().unwrap_or((80, 24))
}

/// RAII guard over raw mode + hidden cursor.
pub struct TermGuard {
    active: bool,
}

impl TermGuard {
    /// Enter raw mode and hide the cursor.
    ///
    /// In raw mode Ctrl+C is delivered as a key event instead of SIGINT, so
    /// the cancellation state machine sees every press.
    pub fn acquire() -> Result<Self> {
        enable_raw_mode().context("terminal does not support raw mode")?;
        execute!(io::stdout(), Hide).context("failed to hide cursor")?;
        Ok(Self { active: true })
    }

    /// Restore early, before the guard goes out of scope.
    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if self.active {
            restore();
            self.active = false;
        }
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Best-effort terminal restore: cooked mode, visible cursor.
///
/// Idempotent; callable from cleanup paths that cannot propagate errors.
pub fn restore() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), Show);
    let _ = io::stdout().flush();
}

/// Restore the terminal and terminate the process.
///
/// The only place this crate exits on its own is the confirmed
/// double-Ctrl+C force-exit path.
pub fn force_exit(code: i32) -> ! {
    restore();
    std::process::exit(code);
}

/// Restore the terminal when SIGTERM arrives outside a guard's drop.
///
/// Safe to call multiple times; only the first call registers.
pub fn register_restore_on_term() -> Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    static REGISTERED: AtomicBool = AtomicBool::new(false);
    if REGISTERED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || {
            // tcsetattr is async-signal-safe; the cursor escape goes straight
            // to the fd. Then fall through to the default termination.
            let _ = disable_raw_mode();
            let _ = signal_hook::low_level::emulate_default_handler(
                signal_hook::consts::SIGTERM,
            );
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_requires_both_ttys() {
        assert_eq!(probe_for(true, true), Capability::Interactive);
        assert_eq!(probe_for(false, true), Capability::Degraded);
        assert_eq!(probe_for(true, false), Capability::Degraded);
        assert_eq!(probe_for(false, false), Capability::Degraded);
    }

    #[test]
    fn size_has_fallback() {
        let (cols, rows) = size();
        assert!(cols > 0);
        assert!(rows > 0);
    }
}
