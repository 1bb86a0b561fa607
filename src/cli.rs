//! CLI argument parsing using clap.

use clap::{Parser, Subcommand};

/// Interactive console and cancellation control for agent build loops.
///
/// The subcommands are live demos driving each interactive component on the
/// real terminal; `loop` simulates a build-iteration driver so the interrupt
/// flow (Esc for the menu, double Ctrl+C to force quit) can be exercised
/// end to end.
#[derive(Parser, Debug)]
#[command(name = "crank", version, about, long_about = None)]
pub struct Args {
    /// Color output: auto, always, never
    #[arg(long, value_name = "MODE", env = "CRANK_COLOR", global = true)]
    pub color: Option<String>,

    /// Disable the interactive console (line-input fallbacks only)
    #[arg(long, global = true)]
    pub no_ui: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Session picker demo
    Sessions,
    /// Single-select menu demo (hotkeys, disabled items, long lists)
    Menu,
    /// Multi-select menu demo (min/max constraints)
    Multi,
    /// Prompt demos: text, password, number, path, search
    Prompts,
    /// Multi-step wizard demo with back navigation
    Wizard,
    /// Simulated build loop with interrupt checkpoints
    Loop {
        /// Number of iterations to simulate
        #[arg(long, value_name = "N", default_value_t = 4)]
        iterations: u32,

        /// Simulated duration of each step in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 2000)]
        step_ms: u64,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
