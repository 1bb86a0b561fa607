//! Crank - interactive console and cancellation control for agent build loops.

mod cancel;
mod cli;
mod config;
mod interrupt;
mod menu;
mod output;
mod prompt;
mod session;
mod term;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Result;

use cancel::{CancellationContext, CtrlC};
use interrupt::{Checkpoint, InterruptChoice};
use menu::multi::{MultiOutcome, MultiSelectMenu};
use menu::select::{SelectMenu, SelectOutcome};
use menu::{MenuEntry, MenuItem};
use output::formatter;
use output::logger::Trace;
use prompt::line::{NumberPrompt, PasswordPrompt, PathKind, PathPrompt, TextPrompt};
use prompt::search::{ChoicePrompt, SearchPrompt};
use prompt::wizard::{WizardOutcome, WizardStep};
use session::{SessionAction, SessionInfo, SessionOutcome};
use term::keys::{Key, KeySource, TerminalKeys};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = cli::Args::parse_args();

    let mut console = config::ConsoleConfig::load()?;
    if let Some(mode) = &args.color {
        console.color = config::ColorMode::from_str(mode)?;
    }
    console.apply_color();
    if config::UiMode::resolve(args.no_ui) == config::UiMode::Off {
        term::force_degraded();
    }

    let ctx = CancellationContext::with_window(console.ctrl_c_window());
    let mut trace = Trace::from_env();

    match args.command {
        cli::Command::Sessions => demo_sessions(&ctx),
        cli::Command::Menu => demo_menu(&console, &ctx),
        cli::Command::Multi => demo_multi(&console, &ctx),
        cli::Command::Prompts => demo_prompts(&console, &ctx),
        cli::Command::Wizard => demo_wizard(&ctx),
        cli::Command::Loop {
            iterations,
            step_ms,
        } => demo_loop(iterations, step_ms, &ctx, &mut trace),
    }
}

fn demo_sessions(ctx: &CancellationContext) -> Result<ExitCode> {
    let sessions = vec![
        SessionInfo::new("widget-factory").description("14 iterations, stopped clean"),
        SessionInfo::new("parser-rewrite").description("3 iterations, cancelled"),
        SessionInfo::new("api-cleanup"),
    ];
    match session::show_session_menu(&sessions, ctx)? {
        SessionOutcome::Action(SessionAction::Select(name)) => {
            formatter::print_selected(&format!("resume session '{name}'"));
        }
        SessionOutcome::Action(SessionAction::New) => {
            formatter::print_selected("start a new session");
        }
        SessionOutcome::Action(SessionAction::Delete(name)) => {
            formatter::print_selected(&format!("delete session '{name}'"));
        }
        SessionOutcome::Action(SessionAction::Quit) => {
            formatter::print_selected("quit");
        }
        SessionOutcome::Cancelled => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn demo_menu(console: &config::ConsoleConfig, ctx: &CancellationContext) -> Result<ExitCode> {
    let mut entries = vec![
        MenuEntry::Header("Build targets".to_string()),
        MenuEntry::Item(MenuItem::new("Debug build", "debug").hotkey('d')),
        MenuEntry::Item(MenuItem::new("Release build", "release").hotkey('r')),
        MenuEntry::Item(
            MenuItem::new("Cross-compile", "cross").disabled("no toolchain installed"),
        ),
        MenuEntry::Separator,
        MenuEntry::Header("Maintenance".to_string()),
    ];
    for i in 1..=12 {
        entries.push(MenuEntry::item(
            format!("Clean workspace {i}"),
            format!("clean-{i}"),
        ));
    }

    let mut menu = SelectMenu::new("What should this iteration do?", entries)?
        .height(console.menu_height);
    match menu.run(ctx)? {
        SelectOutcome::Selected(value) => formatter::print_selected(&value),
        SelectOutcome::Cancelled => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn demo_multi(console: &config::ConsoleConfig, ctx: &CancellationContext) -> Result<ExitCode> {
    let entries: Vec<MenuEntry> = [
        "unit tests",
        "integration tests",
        "lint",
        "type checks",
        "docs build",
        "benchmarks",
    ]
    .iter()
    .map(|name| MenuEntry::item(name.to_string(), name.to_string()))
    .collect();

    let mut menu = MultiSelectMenu::new("Verification steps (1-3)", entries)?
        .min_select(1)
        .max_select(3)
        .height(console.menu_height);
    match menu.run(ctx)? {
        MultiOutcome::Submitted(values) => formatter::print_selected(&values.join(", ")),
        MultiOutcome::Cancelled => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn demo_prompts(console: &config::ConsoleConfig, ctx: &CancellationContext) -> Result<ExitCode> {
    let name = prompt::line::prompt_text(&TextPrompt::new("Task title").required(), ctx)?;
    let Some(name) = name.submitted() else {
        return Ok(ExitCode::SUCCESS);
    };
    formatter::print_selected(&name);

    if let Some(_token) =
        prompt::line::prompt_password(&PasswordPrompt::new("API token").min_len(6), ctx)?
            .submitted()
    {
        formatter::print_selected("token accepted");
    }

    if let Some(workers) = prompt::line::prompt_number(
        &NumberPrompt::new("Parallel workers")
            .integer()
            .min(1.0)
            .max(8.0)
            .default_value(2.0),
        ctx,
    )?
    .submitted()
    {
        formatter::print_selected(&format!("{workers} workers"));
    }

    if let Some(dir) = prompt::line::prompt_path(
        &PathPrompt::new("Project directory")
            .must_exist()
            .expect(PathKind::Directory)
            .default_value("."),
        ctx,
    )?
    .submitted()
    {
        formatter::print_selected(&dir.display().to_string());
    }

    let branches: Vec<String> = [
        "main",
        "develop",
        "feature/interrupt-menu",
        "feature/session-picker",
        "feature/wizard",
        "hotfix/raw-mode-leak",
        "hotfix/cursor-restore",
        "release/0.3",
        "release/0.2",
        "chore/deps",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    if let Some(branch) = prompt::search::prompt_search(
        &SearchPrompt::new("Base branch", branches).max_results(console.max_search_results),
        ctx,
    )?
    .submitted()
    {
        formatter::print_selected(&branch);
    }

    Ok(ExitCode::SUCCESS)
}

fn demo_wizard(ctx: &CancellationContext) -> Result<ExitCode> {
    let steps = vec![
        WizardStep::Text {
            name: "project".to_string(),
            spec: TextPrompt::new("Project name").required(),
        },
        WizardStep::Path {
            name: "root".to_string(),
            spec: PathPrompt::new("Project root")
                .must_exist()
                .expect(PathKind::Directory)
                .default_value("."),
        },
        WizardStep::Number {
            name: "iterations".to_string(),
            spec: NumberPrompt::new("Iteration limit")
                .integer()
                .min(0.0)
                .default_value(0.0),
        },
        WizardStep::Choice {
            name: "mode".to_string(),
            spec: ChoicePrompt::new(
                "Run mode",
                vec![
                    "supervised".to_string(),
                    "autonomous".to_string(),
                    "dry-run".to_string(),
                ],
            ),
        },
        WizardStep::Confirm {
            name: "verify".to_string(),
            message: "Run verification after each iteration?".to_string(),
            default_yes: true,
        },
    ];

    match prompt::wizard::run_wizard(&steps, ctx)? {
        WizardOutcome::Completed(values) => {
            for (name, value) in &values {
                formatter::print_selected(&format!("{name} = {value:?}"));
            }
        }
        WizardOutcome::Cancelled => {}
    }
    Ok(ExitCode::SUCCESS)
}

/// Simulated build-iteration driver.
///
/// Each "step" is a timed wait standing in for an external agent call. The
/// operator can press Esc to open the interrupt menu or Ctrl+C to cancel;
/// the loop consults the checkpoint at the top of each iteration and again
/// after the step returns, exactly where a real driver would.
fn demo_loop(
    iterations: u32,
    step_ms: u64,
    ctx: &CancellationContext,
    trace: &mut Option<Trace>,
) -> Result<ExitCode> {
    term::register_restore_on_term()?;
    let degraded = term::probe() == term::Capability::Degraded;
    if degraded {
        interrupt::register_os_fallback()?;
        formatter::print_degraded_notice();
    } else {
        println!("Esc opens the interrupt menu · Ctrl+C cancels (twice quickly to force quit)");
    }

    for iteration in 1..=iterations {
        match interrupt::checkpoint(ctx) {
            Checkpoint::AbortNow => {
                formatter::print_cancel_requested();
                return Ok(ExitCode::from(130));
            }
            Checkpoint::StopLoop => {
                formatter::print_stopping_after();
                ctx.reset_interrupt_state();
                return Ok(ExitCode::SUCCESS);
            }
            Checkpoint::Proceed => {}
        }

        formatter::print_separator();
        formatter::print_iteration(iteration, iterations);
        if let Some(t) = trace {
            t.note("iteration", &iteration.to_string());
        }

        run_step(iteration, step_ms, ctx, trace)?;

        // Checkpoint after the step returns: stop-after armed mid-step
        // lets the step finish, then stops here.
        match interrupt::checkpoint(ctx) {
            Checkpoint::AbortNow => {
                formatter::print_cancel_requested();
                return Ok(ExitCode::from(130));
            }
            Checkpoint::StopLoop => {
                formatter::print_stopping_after();
                ctx.reset_interrupt_state();
                return Ok(ExitCode::SUCCESS);
            }
            Checkpoint::Proceed => {}
        }
    }

    formatter::print_complete();
    Ok(ExitCode::SUCCESS)
}

/// One simulated step: wait out the deadline while listening for Esc and
/// Ctrl+C. Returns early when the operator asked for cancellation.
fn run_step(
    iteration: u32,
    step_ms: u64,
    ctx: &CancellationContext,
    trace: &mut Option<Trace>,
) -> Result<()> {
    let deadline = Instant::now() + Duration::from_millis(step_ms);

    if term::probe() == term::Capability::Degraded {
        while Instant::now() < deadline {
            if interrupt::os_interrupted() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        return Ok(());
    }

    loop {
        let guard = term::TermGuard::acquire()?;
        let mut keys = TerminalKeys;

        while Instant::now() < deadline {
            let Some(ev) = keys.read_key(Some(Duration::from_millis(50)))? else {
                continue;
            };
            if let Some(t) = trace {
                t.key(&ev);
            }
            if ev.is_ctrl_c() {
                match ctx.press_ctrl_c() {
                    CtrlC::ForceExit => {
                        guard.release();
                        term::force_exit(130);
                    }
                    CtrlC::Soft => {
                        ctx.request_cancel();
                        guard.release();
                        formatter::print_force_quit_hint();
                        return Ok(());
                    }
                }
            }
            if ev.key == Key::Escape {
                // The menu owns the terminal; give up raw mode first.
                guard.release();
                let choice =
                    interrupt::show_interrupt_menu(&format!("iteration {iteration}"), ctx)?;
                if let Some(t) = trace {
                    t.note("interrupt-menu", &format!("{choice:?}"));
                }
                match choice {
                    InterruptChoice::CancelNow => return Ok(()),
                    // StopAfter lets this step run to completion.
                    InterruptChoice::StopAfter | InterruptChoice::Continue => break,
                }
            }
        }

        // Either the step finished or we need to re-enter after the menu.
        if Instant::now() >= deadline {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_after_checkpoint_round_trip() {
        // Arm stop-after the way the interrupt menu would, then walk the
        // same checkpoints demo_loop uses.
        let ctx = CancellationContext::new();
        ctx.request_stop_after();
        assert_eq!(interrupt::checkpoint(&ctx), Checkpoint::StopLoop);
        ctx.reset_interrupt_state();
        assert_eq!(interrupt::checkpoint(&ctx), Checkpoint::Proceed);
    }

    #[test]
    fn cancel_checkpoint_aborts() {
        let ctx = CancellationContext::new();
        ctx.request_cancel();
        assert_eq!(interrupt::checkpoint(&ctx), Checkpoint::AbortNow);
    }
}
