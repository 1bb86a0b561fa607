//! Multi-step prompt wizard with back navigation.
//!
//! Each step is one prompt kind. Cancelling a non-first step steps back one
//! (its previous answer is re-asked and overwritten); cancelling the first
//! step cancels the whole wizard.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::cancel::{CancellationContext, Flow};
use crate::output::formatter;
use crate::prompt::confirm;
use crate::prompt::line::{self, NumberPrompt, PasswordPrompt, PathPrompt, TextPrompt};
use crate::prompt::search::{self, ChoicePrompt};
use crate::prompt::{run_line_fallback, PromptOutcome};
use crate::term;
use crate::term::keys::{KeySource, TerminalKeys};
use crate::term::surface::{RenderSurface, TermSurface};

/// One wizard step: a named prompt.
pub enum WizardStep {
    Text { name: String, spec: TextPrompt },
    Password { name: String, spec: PasswordPrompt },
    Number { name: String, spec: NumberPrompt },
    Path { name: String, spec: PathPrompt },
    Confirm { name: String, message: String, default_yes: bool },
    Choice { name: String, spec: ChoicePrompt },
}

impl WizardStep {
    pub fn name(&self) -> &str {
        match self {
            WizardStep::Text { name, .. }
            | WizardStep::Password { name, .. }
            | WizardStep::Number { name, .. }
            | WizardStep::Path { name, .. }
            | WizardStep::Confirm { name, .. }
            | WizardStep::Choice { name, .. } => name,
        }
    }
}

/// A committed step value.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Path(PathBuf),
    Choice(usize),
}

/// Terminal state of a wizard run.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardOutcome {
    Completed(BTreeMap<String, WizardValue>),
    Cancelled,
}

/// Drive all steps over injected I/O.
pub fn run_wizard_with(
    steps: &[WizardStep],
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<WizardOutcome>> {
    let mut values: BTreeMap<String, WizardValue> = BTreeMap::new();
    let mut idx = 0usize;

    while idx < steps.len() {
        let step = &steps[idx];
        let resolved: PromptOutcome<WizardValue> = match step {
            WizardStep::Text { spec, .. } => match line::text_with(spec, keys, surface, ctx)? {
                Flow::ForceExit => return Ok(Flow::ForceExit),
                Flow::Resolved(outcome) => outcome_map(outcome, WizardValue::Text),
            },
            WizardStep::Password { spec, .. } => {
                match line::password_with(spec, keys, surface, ctx)? {
                    Flow::ForceExit => return Ok(Flow::ForceExit),
                    Flow::Resolved(outcome) => outcome_map(outcome, WizardValue::Text),
                }
            }
            WizardStep::Number { spec, .. } => match line::number_with(spec, keys, surface, ctx)? {
                Flow::ForceExit => return Ok(Flow::ForceExit),
                Flow::Resolved(outcome) => outcome_map(outcome, WizardValue::Number),
            },
            WizardStep::Path { spec, .. } => match line::path_with(spec, keys, surface, ctx)? {
                Flow::ForceExit => return Ok(Flow::ForceExit),
                Flow::Resolved(outcome) => outcome_map(outcome, WizardValue::Path),
            },
            WizardStep::Confirm {
                message,
                default_yes,
                ..
            } => match confirm::confirm_with(message, *default_yes, keys, surface, ctx)? {
                Flow::ForceExit => return Ok(Flow::ForceExit),
                Flow::Resolved(outcome) => outcome_map(outcome, WizardValue::Bool),
            },
            WizardStep::Choice { spec, .. } => {
                match search::choice_with(spec, keys, surface, ctx)? {
                    Flow::ForceExit => return Ok(Flow::ForceExit),
                    Flow::Resolved(outcome) => outcome_map(outcome, WizardValue::Choice),
                }
            }
        };

        match resolved {
            PromptOutcome::Submitted(value) => {
                values.insert(step.name().to_string(), value);
                idx += 1;
            }
            PromptOutcome::Cancelled => {
                if idx == 0 {
                    return Ok(Flow::Resolved(WizardOutcome::Cancelled));
                }
                idx -= 1;
            }
        }
    }

    Ok(Flow::Resolved(WizardOutcome::Completed(values)))
}

fn outcome_map<T>(
    outcome: PromptOutcome<T>,
    wrap: impl FnOnce(T) -> WizardValue,
) -> PromptOutcome<WizardValue> {
    match outcome {
        PromptOutcome::Submitted(value) => PromptOutcome::Submitted(wrap(value)),
        PromptOutcome::Cancelled => PromptOutcome::Cancelled,
    }
}

/// Run the wizard on the real terminal.
///
/// The raw-mode guard spans all steps so the screen does not flash between
/// them. The degraded path walks the same steps over line input; EOF on the
/// first step cancels.
pub fn run_wizard(steps: &[WizardStep], ctx: &CancellationContext) -> Result<WizardOutcome> {
    if term::probe() == term::Capability::Degraded {
        return run_wizard_fallback(steps);
    }
    let guard = term::TermGuard::acquire()?;
    let mut keys = TerminalKeys;
    let mut surface = TermSurface::new();
    let flow = run_wizard_with(steps, &mut keys, &mut surface, ctx)?;
    guard.release();
    match flow {
        Flow::ForceExit => term::force_exit(130),
        Flow::Resolved(outcome) => {
            if outcome == WizardOutcome::Cancelled {
                formatter::print_cancelled();
            }
            Ok(outcome)
        }
    }
}

fn run_wizard_fallback(steps: &[WizardStep]) -> Result<WizardOutcome> {
    let mut values: BTreeMap<String, WizardValue> = BTreeMap::new();
    let mut idx = 0usize;

    while idx < steps.len() {
        let step = &steps[idx];
        let resolved: PromptOutcome<WizardValue> = match step {
            WizardStep::Text { spec, .. } => outcome_map(
                run_line_fallback(&spec.label, spec.constraints().as_deref(), |t| {
                    spec.validate(t)
                })?,
                WizardValue::Text,
            ),
            WizardStep::Password { spec, .. } => outcome_map(
                run_line_fallback(&spec.label, None, |t| spec.validate(t))?,
                WizardValue::Text,
            ),
            WizardStep::Number { spec, .. } => outcome_map(
                run_line_fallback(&spec.label, spec.constraints().as_deref(), |t| {
                    spec.validate(t)
                })?,
                WizardValue::Number,
            ),
            WizardStep::Path { spec, .. } => outcome_map(
                run_line_fallback(&spec.label, spec.constraints().as_deref(), |t| {
                    spec.validate(t)
                })?,
                WizardValue::Path,
            ),
            WizardStep::Confirm {
                message,
                default_yes,
                ..
            } => outcome_map(
                confirm::confirm_fallback(message, *default_yes)?,
                WizardValue::Bool,
            ),
            WizardStep::Choice { spec, .. } => {
                outcome_map(search::choice_fallback(spec)?, WizardValue::Choice)
            }
        };

        match resolved {
            PromptOutcome::Submitted(value) => {
                values.insert(step.name().to_string(), value);
                idx += 1;
            }
            PromptOutcome::Cancelled => {
                if idx == 0 {
                    return Ok(WizardOutcome::Cancelled);
                }
                idx -= 1;
            }
        }
    }
    Ok(WizardOutcome::Completed(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::keys::{presses, Key, KeyEvent, ScriptedKeys};
    use crate::term::surface::CaptureSurface;

    fn enter() -> KeyEvent {
        KeyEvent::plain(Key::Enter)
    }

    fn esc() -> KeyEvent {
        KeyEvent::plain(Key::Escape)
    }

    fn steps() -> Vec<WizardStep> {
        vec![
            WizardStep::Text {
                name: "project".to_string(),
                spec: TextPrompt::new("Project name").required(),
            },
            WizardStep::Number {
                name: "workers".to_string(),
                spec: NumberPrompt::new("Workers").integer().min(1.0),
            },
            WizardStep::Confirm {
                name: "verify".to_string(),
                message: "Enable verification?".to_string(),
                default_yes: true,
            },
        ]
    }

    #[test]
    fn wizard_collects_named_values() {
        let mut script = presses("demo");
        script.push(enter());
        script.extend(presses("4"));
        script.push(enter());
        script.push(enter()); // confirm default yes

        let mut keys = ScriptedKeys::new(script);
        let mut surface = CaptureSurface::new();
        let ctx = CancellationContext::new();

        let flow = run_wizard_with(&steps(), &mut keys, &mut surface, &ctx).unwrap();
        let WizardOutcome::Completed(values) = flow.unwrap_resolved() else {
            panic!("wizard cancelled");
        };
        assert_eq!(
            values.get("project"),
            Some(&WizardValue::Text("demo".to_string()))
        );
        assert_eq!(values.get("workers"), Some(&WizardValue::Number(4.0)));
        assert_eq!(values.get("verify"), Some(&WizardValue::Bool(true)));
    }

    #[test]
    fn cancel_on_later_step_goes_back() {
        // Answer step 1, cancel step 2, re-answer step 1, then finish.
        let mut script = presses("one");
        script.push(enter());
        script.push(esc()); // back to step 1
        script.extend(presses("two"));
        script.push(enter());
        script.extend(presses("2"));
        script.push(enter());
        script.push(KeyEvent::ch('n'));

        let mut keys = ScriptedKeys::new(script);
        let mut surface = CaptureSurface::new();
        let ctx = CancellationContext::new();

        let flow = run_wizard_with(&steps(), &mut keys, &mut surface, &ctx).unwrap();
        let WizardOutcome::Completed(values) = flow.unwrap_resolved() else {
            panic!("wizard cancelled");
        };
        assert_eq!(
            values.get("project"),
            Some(&WizardValue::Text("two".to_string()))
        );
        assert_eq!(values.get("verify"), Some(&WizardValue::Bool(false)));
    }

    #[test]
    fn cancel_on_first_step_cancels_wizard() {
        let mut keys = ScriptedKeys::new(vec![esc()]);
        let mut surface = CaptureSurface::new();
        let ctx = CancellationContext::new();

        let flow = run_wizard_with(&steps(), &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow.unwrap_resolved(), WizardOutcome::Cancelled);
    }

    #[test]
    fn force_exit_propagates_from_any_step() {
        let ctx = CancellationContext::new();
        // Pre-arm the window so the scripted Ctrl+C is the second press.
        ctx.press_ctrl_c();

        let mut keys = ScriptedKeys::new(vec![KeyEvent::ctrl('c')]);
        let mut surface = CaptureSurface::new();
        let flow = run_wizard_with(&steps(), &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(flow, Flow::ForceExit);
    }
}
