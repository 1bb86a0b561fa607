//! Choice and incremental-search prompts.
//!
//! Choice: a short fixed list answered with one digit (or navigation).
//! Search: case-insensitive substring filtering over a candidate list on
//! every keystroke, with a capped result window and an overflow count.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

use crate::cancel::{CancellationContext, CtrlC, Flow};
use crate::output::formatter;
use crate::prompt::editor::{EditAction, LineEditor};
use crate::prompt::{render_input_line, run_prompt, PromptOutcome, KEY_POLL};
use crate::term::keys::{Key, KeyEvent, KeySource};
use crate::term::surface::{clip, RenderSurface};

/// Fixed-option prompt answered with a single digit keypress.
#[derive(Debug, Clone)]
pub struct ChoicePrompt {
    pub label: String,
    pub options: Vec<String>,
}

impl ChoicePrompt {
    pub fn new(label: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            label: label.into(),
            options,
        }
    }
}

/// State machine for the choice prompt.
pub struct ChoiceState<'a> {
    spec: &'a ChoicePrompt,
    focus: usize,
}

impl<'a> ChoiceState<'a> {
    pub fn new(spec: &'a ChoicePrompt) -> Self {
        Self { spec, focus: 0 }
    }

    /// Feed one key. Digits short-circuit navigation entirely.
    pub fn handle_key(&mut self, ev: &KeyEvent) -> Option<PromptOutcome<usize>> {
        if ev.is_ctrl_c() {
            return Some(PromptOutcome::Cancelled);
        }
        if let Some(c) = ev.printable() {
            if let Some(digit) = c.to_digit(10) {
                let idx = digit as usize;
                if idx >= 1 && idx <= self.spec.options.len() {
                    return Some(PromptOutcome::Submitted(idx - 1));
                }
                return None;
            }
        }
        match ev.key {
            Key::Enter => return Some(PromptOutcome::Submitted(self.focus)),
            Key::Escape => return Some(PromptOutcome::Cancelled),
            Key::Up => self.focus = self.focus.saturating_sub(1),
            Key::Down => {
                self.focus = (self.focus + 1).min(self.spec.options.len().saturating_sub(1));
            }
            _ => {}
        }
        None
    }

    pub fn render_lines(&self, width: usize) -> Vec<String> {
        let mut lines = vec![format!(
            "{} {}",
            "•".cyan(),
            clip(&self.spec.label, width.saturating_sub(2)).bold()
        )];
        for (idx, option) in self.spec.options.iter().enumerate() {
            let marker = if idx == self.focus { "▶" } else { " " };
            let row = format!("{marker} {}. {}", idx + 1, clip(option, width.saturating_sub(6)));
            if idx == self.focus {
                lines.push(row.cyan().to_string());
            } else {
                lines.push(row);
            }
        }
        lines.push(format!("  {}", "1-9 pick · Enter select · Esc cancel".dimmed()));
        lines
    }
}

pub fn choice_with(
    spec: &ChoicePrompt,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<PromptOutcome<usize>>> {
    let mut state = ChoiceState::new(spec);
    loop {
        surface.repaint(&state.render_lines(surface.width()))?;
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
        if let Some(outcome) = state.handle_key(&ev) {
            surface.clear()?;
            return Ok(Flow::Resolved(outcome));
        }
    }
}

pub fn prompt_choice(spec: &ChoicePrompt, ctx: &CancellationContext) -> Result<PromptOutcome<usize>> {
    run_prompt(
        ctx,
        |keys, surface, ctx| choice_with(spec, keys, surface, ctx),
        || choice_fallback(spec),
    )
}

pub(crate) fn choice_fallback(spec: &ChoicePrompt) -> Result<PromptOutcome<usize>> {
    println!("{}", spec.label);
    for (idx, option) in spec.options.iter().enumerate() {
        println!("  {}. {}", idx + 1, option);
    }
    print!("  pick [1-{}] (empty to cancel): ", spec.options.len());
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
        formatter::print_cancelled();
        return Ok(PromptOutcome::Cancelled);
    }
    match line.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= spec.options.len() => Ok(PromptOutcome::Submitted(n - 1)),
        _ => {
            formatter::print_cancelled();
            Ok(PromptOutcome::Cancelled)
        }
    }
}

/// Incremental filter over a candidate list.
#[derive(Debug, Clone)]
pub struct SearchPrompt {
    pub label: String,
    pub candidates: Vec<String>,
    pub max_results: usize,
}

impl SearchPrompt {
    pub fn new(label: impl Into<String>, candidates: Vec<String>) -> Self {
        Self {
            label: label.into(),
            candidates,
            max_results: 8,
        }
    }

    pub fn max_results(mut self, cap: usize) -> Self {
        self.max_results = cap.max(1);
        self
    }
}

/// State machine for the search prompt.
pub struct SearchState<'a> {
    spec: &'a SearchPrompt,
    query: LineEditor,
    focus: usize,
}

impl<'a> SearchState<'a> {
    pub fn new(spec: &'a SearchPrompt) -> Self {
        Self {
            spec,
            query: LineEditor::new(""),
            focus: 0,
        }
    }

    pub fn query(&self) -> String {
        self.query.text()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Candidate indices matching the query, case-insensitive substring.
    /// An empty query matches everything.
    pub fn filtered(&self) -> Vec<usize> {
        let needle = self.query.text().to_lowercase();
        self.spec
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| needle.is_empty() || c.to_lowercase().contains(&needle))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn handle_key(&mut self, ev: &KeyEvent) -> Option<PromptOutcome<String>> {
        if ev.is_ctrl_c() {
            return Some(PromptOutcome::Cancelled);
        }
        match ev.key {
            Key::Enter => {
                let filtered = self.filtered();
                let idx = *filtered.get(self.focus)?;
                return Some(PromptOutcome::Submitted(self.spec.candidates[idx].clone()));
            }
            Key::Escape => return Some(PromptOutcome::Cancelled),
            Key::Up => {
                self.focus = self.focus.saturating_sub(1);
                return None;
            }
            Key::Down => {
                let len = self.filtered().len();
                self.focus = (self.focus + 1).min(len.saturating_sub(1));
                return None;
            }
            _ => {}
        }
        // Everything else edits the query; any edit resets the focus so the
        // cursor never points at a stale result.
        if self.query.apply(ev) == EditAction::Edited {
            self.focus = 0;
        }
        None
    }

    pub fn render_lines(&self, width: usize) -> Vec<String> {
        let mut lines = vec![format!(
            "{} {} {}",
            "•".cyan(),
            clip(&self.spec.label, width.saturating_sub(20)).bold(),
            "(type to filter)".dimmed()
        )];
        lines.push(render_input_line(&self.query.display(), self.query.cursor()));

        let filtered = self.filtered();
        if filtered.is_empty() {
            lines.push(format!("  {}", "no matches".dimmed()));
            return lines;
        }
        for (pos, &idx) in filtered.iter().take(self.spec.max_results).enumerate() {
            let marker = if pos == self.focus { "▶" } else { " " };
            let row = format!(
                "{marker} {}",
                clip(&self.spec.candidates[idx], width.saturating_sub(4))
            );
            if pos == self.focus {
                lines.push(row.cyan().to_string());
            } else {
                lines.push(row);
            }
        }
        if filtered.len() > self.spec.max_results {
            let hidden = filtered.len() - self.spec.max_results;
            lines.push(format!("  {}", format!("… and {hidden} more").dimmed()));
        }
        lines
    }
}

pub fn search_with(
    spec: &SearchPrompt,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<PromptOutcome<String>>> {
    let mut state = SearchState::new(spec);
    loop {
        surface.repaint(&state.render_lines(surface.width()))?;
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
        if let Some(outcome) = state.handle_key(&ev) {
            surface.clear()?;
            return Ok(Flow::Resolved(outcome));
        }
    }
}

pub fn prompt_search(
    spec: &SearchPrompt,
    ctx: &CancellationContext,
) -> Result<PromptOutcome<String>> {
    run_prompt(
        ctx,
        |keys, surface, ctx| search_with(spec, keys, surface, ctx),
        || search_fallback(spec),
    )
}

/// Degraded search: one shot at a query, then a numbered pick.
fn search_fallback(spec: &SearchPrompt) -> Result<PromptOutcome<String>> {
    print!("{} (filter, empty for all): ", spec.label);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        formatter::print_cancelled();
        return Ok(PromptOutcome::Cancelled);
    }
    let needle = line.trim().to_lowercase();
    let matches: Vec<&String> = spec
        .candidates
        .iter()
        .filter(|c| needle.is_empty() || c.to_lowercase().contains(&needle))
        .collect();
    if matches.is_empty() {
        println!("  no matches");
        formatter::print_cancelled();
        return Ok(PromptOutcome::Cancelled);
    }
    for (idx, candidate) in matches.iter().enumerate() {
        println!("  {}. {}", idx + 1, candidate);
    }
    print!("  pick [1-{}] (empty to cancel): ", matches.len());
    io::stdout().flush()?;

    line.clear();
    if io::stdin().lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
        formatter::print_cancelled();
        return Ok(PromptOutcome::Cancelled);
    }
    match line.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= matches.len() => {
            Ok(PromptOutcome::Submitted(matches[n - 1].clone()))
        }
        _ => {
            formatter::print_cancelled();
            Ok(PromptOutcome::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::keys::presses;

    fn key(k: Key) -> KeyEvent {
        KeyEvent::plain(k)
    }

    fn branches() -> SearchPrompt {
        SearchPrompt::new(
            "Branch",
            vec![
                "main".to_string(),
                "develop".to_string(),
                "feature/menus".to_string(),
                "feature/prompts".to_string(),
                "hotfix/cursor".to_string(),
            ],
        )
    }

    #[test]
    fn digit_short_circuits_choice_navigation() {
        let spec = ChoicePrompt::new(
            "Mode",
            vec!["fast".to_string(), "safe".to_string(), "dry".to_string()],
        );
        let mut state = ChoiceState::new(&spec);
        // Focus is elsewhere; the digit still wins.
        state.handle_key(&key(Key::Down));
        assert_eq!(
            state.handle_key(&KeyEvent::ch('3')),
            Some(PromptOutcome::Submitted(2))
        );
    }

    #[test]
    fn out_of_range_digit_is_ignored() {
        let spec = ChoicePrompt::new("Mode", vec!["a".to_string(), "b".to_string()]);
        let mut state = ChoiceState::new(&spec);
        assert_eq!(state.handle_key(&KeyEvent::ch('9')), None);
    }

    #[test]
    fn choice_enter_selects_focused() {
        let spec = ChoicePrompt::new("Mode", vec!["a".to_string(), "b".to_string()]);
        let mut state = ChoiceState::new(&spec);
        state.handle_key(&key(Key::Down));
        assert_eq!(
            state.handle_key(&key(Key::Enter)),
            Some(PromptOutcome::Submitted(1))
        );
    }

    #[test]
    fn search_filters_case_insensitively() {
        let spec = branches();
        let mut state = SearchState::new(&spec);
        for ev in presses("FEAT") {
            state.handle_key(&ev);
        }
        assert_eq!(state.filtered(), vec![2, 3]);
    }

    #[test]
    fn query_change_resets_focus() {
        let spec = branches();
        let mut state = SearchState::new(&spec);
        state.handle_key(&key(Key::Down));
        assert_eq!(state.focus(), 1);
        state.handle_key(&KeyEvent::ch('f'));
        assert_eq!(state.focus(), 0);
        // Backspace is also a query change.
        state.handle_key(&key(Key::Down));
        state.handle_key(&key(Key::Backspace));
        assert_eq!(state.focus(), 0);
    }

    #[test]
    fn enter_selects_within_filtered_set() {
        let spec = branches();
        let mut state = SearchState::new(&spec);
        for ev in presses("feature") {
            state.handle_key(&ev);
        }
        state.handle_key(&key(Key::Down));
        assert_eq!(
            state.handle_key(&key(Key::Enter)),
            Some(PromptOutcome::Submitted("feature/prompts".to_string()))
        );
    }

    #[test]
    fn enter_with_no_matches_keeps_prompt_open() {
        let spec = branches();
        let mut state = SearchState::new(&spec);
        for ev in presses("zzz") {
            state.handle_key(&ev);
        }
        assert_eq!(state.handle_key(&key(Key::Enter)), None);
    }

    #[test]
    fn overflow_count_is_rendered() {
        let spec = branches().max_results(2);
        let state = SearchState::new(&spec);
        let lines = state.render_lines(80);
        assert!(lines.iter().any(|l| l.contains("and 3 more")));
    }

    #[test]
    fn empty_query_lists_head_of_candidates() {
        let spec = branches();
        let state = SearchState::new(&spec);
        assert_eq!(state.filtered().len(), 5);
        assert!(state.render_lines(80).iter().any(|l| l.contains("main")));
    }
}
