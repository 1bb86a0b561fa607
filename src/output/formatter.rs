//! Terminal output formatting with ANSI colors.

use colored::Colorize;

use crate::term;

/// Print the cancellation acknowledgment.
///
/// Every cancellation path ends here so the operator always knows the
/// prompt exited, even when the frame above it was wiped.
pub fn print_cancelled() {
    println!("{}", "(cancelled)".dimmed());
}

/// Print the stop-after-iteration notice at the driver checkpoint.
pub fn print_stopping_after() {
    println!("{}", "Stopping after this iteration.".yellow());
}

/// Print the cancel-requested notice.
pub fn print_cancel_requested() {
    println!("{}", "Cancel requested — aborting.".red());
}

/// Hint shown after a soft Ctrl+C while an operation is running.
pub fn print_force_quit_hint() {
    println!(
        "{}",
        "(interrupt requested — press Ctrl+C again within 2s to force quit)".dimmed()
    );
}

/// Print iteration information.
pub fn print_iteration(iteration: u32, total: u32) {
    if total == 0 {
        println!("Iteration {} (unlimited)", iteration);
    } else {
        println!("Iteration {} of {}", iteration, total);
    }
}

/// Print a selected-value acknowledgment.
pub fn print_selected(value: &str) {
    println!("{} {}", "✓".green(), value);
}

/// Print completion message.
pub fn print_complete() {
    println!("{}", "Loop complete.".green());
}

/// Print iteration separator.
pub fn print_separator() {
    let width = term::size().0 as usize;
    println!("{}", "-".repeat(width).dimmed());
}

/// Note that the terminal is non-interactive and menus are degraded.
pub fn print_degraded_notice() {
    println!(
        "{}",
        "Non-interactive terminal: menus degraded to line input, Ctrl+C handled by the OS."
            .dimmed()
    );
}
