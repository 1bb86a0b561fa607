//! Cancellation state shared between the console and the build-iteration
//! driver.
//!
//! The context is an explicit value passed to every interactive call, not a
//! hidden global, so tests run independent contexts in parallel. Writes only
//! happen while the terminal-owning thread resolves a menu; reads are plain
//! value checks at driver checkpoints. Atomics keep that safe even when a
//! background key watcher is in play.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// What the operator has asked the driver to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptState {
    /// Keep going.
    None,
    /// Finish the in-flight step, then leave the loop.
    StopAfterIteration,
    /// Abort at the next checkpoint.
    CancelRequested,
}

/// Classification of one Ctrl+C press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlC {
    /// First press (or a press outside the window): soft-cancel the current
    /// interactive context.
    Soft,
    /// Second press within the window: restore the terminal and exit.
    ForceExit,
}

/// How an interactive run loop ended.
///
/// `ForceExit` propagates to the public wrapper, which restores the terminal
/// and terminates the process; state machines themselves never exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow<T> {
    Resolved(T),
    ForceExit,
}

impl<T> Flow<T> {
    /// The resolved value, panicking on `ForceExit`. Test helper.
    pub fn unwrap_resolved(self) -> T {
        match self {
            Flow::Resolved(value) => value,
            Flow::ForceExit => panic!("flow ended in ForceExit"),
        }
    }
}

/// Window within which a second Ctrl+C means "force exit".
pub const DOUBLE_CTRL_C_WINDOW: Duration = Duration::from_millis(2000);

const STATE_NONE: u8 = 0;
const STATE_STOP_AFTER: u8 = 1;
const STATE_CANCEL: u8 = 2;

/// Process-wide cancellation state plus the double-Ctrl+C timer.
pub struct CancellationContext {
    state: AtomicU8,
    menu_active: AtomicBool,
    last_ctrl_c: Mutex<Option<Instant>>,
    window: Duration,
}

impl CancellationContext {
    pub fn new() -> Self {
        Self::with_window(DOUBLE_CTRL_C_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            state: AtomicU8::new(STATE_NONE),
            menu_active: AtomicBool::new(false),
            last_ctrl_c: Mutex::new(None),
            window,
        }
    }

    /// Record a Ctrl+C press at the current monotonic time.
    pub fn press_ctrl_c(&self) -> CtrlC {
        self.press_ctrl_c_at(Instant::now())
    }

    /// Record a Ctrl+C press at an injected time. Timing tests use this so
    /// the 2-second window needs no real sleeping.
    pub fn press_ctrl_c_at(&self, now: Instant) -> CtrlC {
        let mut last = self
            .last_ctrl_c
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match *last {
            Some(prev) if now.duration_since(prev) < self.window => {
                *last = None;
                CtrlC::ForceExit
            }
            _ => {
                *last = Some(now);
                CtrlC::Soft
            }
        }
    }

    /// Current interrupt state; read by the driver at checkpoints.
    pub fn interrupt_state(&self) -> InterruptState {
        match self.state.load(Ordering::SeqCst) {
            STATE_STOP_AFTER => InterruptState::StopAfterIteration,
            STATE_CANCEL => InterruptState::CancelRequested,
            _ => InterruptState::None,
        }
    }

    /// Clear the interrupt state when a new iteration begins.
    pub fn reset_interrupt_state(&self) {
        self.state.store(STATE_NONE, Ordering::SeqCst);
    }

    /// Operator chose "cancel now".
    pub fn request_cancel(&self) {
        self.state.store(STATE_CANCEL, Ordering::SeqCst);
    }

    /// Operator chose "finish this step, then stop".
    pub fn request_stop_after(&self) {
        self.state.store(STATE_STOP_AFTER, Ordering::SeqCst);
    }

    /// Claim the interrupt menu. Returns `false` if a menu is already open;
    /// the re-entrant caller must resolve as `Continue` without showing
    /// anything.
    pub fn try_enter_menu(&self) -> bool {
        self.menu_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the interrupt-menu guard.
    pub fn leave_menu(&self) {
        self.menu_active.store(false, Ordering::SeqCst);
    }

    /// Whether the interrupt menu is currently open.
    pub fn menu_active(&self) -> bool {
        self.menu_active.load(Ordering::SeqCst)
    }
}

impl Default for CancellationContext {
    fn default() -> Self {
        Self::new()
    }
}
