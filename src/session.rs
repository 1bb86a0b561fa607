//! Session picker: a single-select wrapper the orchestrator calls between
//! runs.

use anyhow::Result;

use crate::cancel::{CancellationContext, Flow};
use crate::menu::select::{SelectMenu, SelectOutcome};
use crate::menu::{MenuEntry, MenuItem};
use crate::output::formatter;
use crate::term;
use crate::term::keys::{KeySource, TerminalKeys};
use crate::term::surface::{RenderSurface, TermSurface};

/// One stored session as the orchestrator describes it.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub name: String,
    pub description: Option<String>,
}

impl SessionInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Select(String),
    New,
    Delete(String),
    Quit,
}

/// Terminal state of the session menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Action(SessionAction),
    Cancelled,
}

const VALUE_NEW: &str = "new";
const VALUE_DELETE: &str = "delete";
const VALUE_QUIT: &str = "quit";
const SELECT_PREFIX: &str = "select:";

fn build_entries(sessions: &[SessionInfo]) -> Vec<MenuEntry> {
    let mut entries = Vec::new();
    if !sessions.is_empty() {
        entries.push(MenuEntry::Header("Sessions".to_string()));
        for session in sessions {
            let mut item = MenuItem::new(
                session.name.clone(),
                format!("{SELECT_PREFIX}{}", session.name),
            );
            if let Some(desc) = &session.description {
                item = item.description(desc.clone());
            }
            entries.push(MenuEntry::Item(item));
        }
        entries.push(MenuEntry::Separator);
    }
    entries.push(MenuEntry::Item(
        MenuItem::new("New session", VALUE_NEW).hotkey('n'),
    ));
    if sessions.is_empty() {
        entries.push(MenuEntry::Item(
            MenuItem::new("Delete a session", VALUE_DELETE)
                .hotkey('d')
                .disabled("no sessions"),
        ));
    } else {
        entries.push(MenuEntry::Item(
            MenuItem::new("Delete a session", VALUE_DELETE).hotkey('d'),
        ));
    }
    entries.push(MenuEntry::Item(MenuItem::new("Quit", VALUE_QUIT).hotkey('q')));
    entries
}

fn delete_entries(sessions: &[SessionInfo]) -> Vec<MenuEntry> {
    sessions
        .iter()
        .map(|s| MenuEntry::item(s.name.clone(), s.name.clone()))
        .collect()
}

/// Drive the session menu over injected I/O.
///
/// "Delete a session" opens a second picker naming the victim; cancelling
/// that picker returns to the main menu rather than losing the whole dialog.
pub fn session_menu_with(
    sessions: &[SessionInfo],
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<SessionOutcome>> {
    loop {
        let mut menu = SelectMenu::new("Select a session", build_entries(sessions))?;
        let value = match menu.run_with(keys, surface, ctx)? {
            Flow::ForceExit => return Ok(Flow::ForceExit),
            Flow::Resolved(SelectOutcome::Cancelled) => {
                return Ok(Flow::Resolved(SessionOutcome::Cancelled))
            }
            Flow::Resolved(SelectOutcome::Selected(value)) => value,
        };

        if let Some(name) = value.strip_prefix(SELECT_PREFIX) {
            return Ok(Flow::Resolved(SessionOutcome::Action(
                SessionAction::Select(name.to_string()),
            )));
        }
        match value.as_str() {
            VALUE_NEW => {
                return Ok(Flow::Resolved(SessionOutcome::Action(SessionAction::New)))
            }
            VALUE_QUIT => {
                return Ok(Flow::Resolved(SessionOutcome::Action(SessionAction::Quit)))
            }
            VALUE_DELETE => {
                let mut picker =
                    SelectMenu::new("Delete which session?", delete_entries(sessions))?;
                match picker.run_with(keys, surface, ctx)? {
                    Flow::ForceExit => return Ok(Flow::ForceExit),
                    Flow::Resolved(SelectOutcome::Selected(name)) => {
                        return Ok(Flow::Resolved(SessionOutcome::Action(
                            SessionAction::Delete(name),
                        )));
                    }
                    // Back to the main menu.
                    Flow::Resolved(SelectOutcome::Cancelled) => continue,
                }
            }
            other => anyhow::bail!("unexpected session menu value '{other}'"),
        }
    }
}

/// Show the session menu on the real terminal.
pub fn show_session_menu(
    sessions: &[SessionInfo],
    ctx: &CancellationContext,
) -> Result<SessionOutcome> {
    if term::probe() == term::Capability::Degraded {
        return session_menu_fallback(sessions, ctx);
    }
    let guard = term::TermGuard::acquire()?;
    let mut keys = TerminalKeys;
    let mut surface = TermSurface::new();
    let flow = session_menu_with(sessions, &mut keys, &mut surface, ctx)?;
    guard.release();
    match flow {
        Flow::ForceExit => term::force_exit(130),
        Flow::Resolved(outcome) => {
            if outcome == SessionOutcome::Cancelled {
                formatter::print_cancelled();
            }
            Ok(outcome)
        }
    }
}

fn session_menu_fallback(
    sessions: &[SessionInfo],
    ctx: &CancellationContext,
) -> Result<SessionOutcome> {
    let mut menu = SelectMenu::new("Select a session", build_entries(sessions))?;
    match menu.run(ctx)? {
        SelectOutcome::Cancelled => Ok(SessionOutcome::Cancelled),
        SelectOutcome::Selected(value) => {
            if let Some(name) = value.strip_prefix(SELECT_PREFIX) {
                return Ok(SessionOutcome::Action(SessionAction::Select(
                    name.to_string(),
                )));
            }
            match value.as_str() {
                VALUE_NEW => Ok(SessionOutcome::Action(SessionAction::New)),
                VALUE_QUIT => Ok(SessionOutcome::Action(SessionAction::Quit)),
                VALUE_DELETE => {
                    let mut picker =
                        SelectMenu::new("Delete which session?", delete_entries(sessions))?;
                    match picker.run(ctx)? {
                        SelectOutcome::Selected(name) => {
                            Ok(SessionOutcome::Action(SessionAction::Delete(name)))
                        }
                        SelectOutcome::Cancelled => Ok(SessionOutcome::Cancelled),
                    }
                }
                other => anyhow::bail!("unexpected session menu value '{other}'"),
            }
        }
    }
}
