//! Normalized key events and the input-source seam.
//!
//! Every interactive state machine in this crate consumes [`KeyEvent`]s, never
//! raw crossterm events. The [`KeySource`] trait is the single point where real
//! terminal input enters the system, so tests replay scripted key sequences
//! through the exact same code paths.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use serde::Serialize;

/// A decoded, normalized key.
///
/// Escape-sequence disambiguation (lone Esc vs CSI/SS3, arrow and page-key
/// sequences) happens in the crossterm backend; anything it reports that has
/// no mapping here classifies as `Unknown` rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Insert,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Unknown,
}

/// One physical keypress with its modifier classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    /// A printable character with no modifiers.
    pub fn ch(c: char) -> Self {
        Self::plain(Key::Char(c))
    }

    /// A Ctrl-modified character (e.g. `KeyEvent::ctrl('c')`).
    pub fn ctrl(c: char) -> Self {
        Self {
            key: Key::Char(c),
            ctrl: true,
            alt: false,
            shift: false,
        }
    }

    /// Whether this event is the Ctrl+C interrupt key.
    ///
    /// Raw mode suppresses the OS-level SIGINT so Ctrl+C arrives here like
    /// any other key and cancellation stays a deliberate state transition.
    pub fn is_ctrl_c(&self) -> bool {
        self.ctrl && matches!(self.key, Key::Char('c') | Key::Char('C'))
    }

    /// The plain printable character carried by this event, if any.
    ///
    /// Ctrl- and Alt-modified characters are not printable input.
    pub fn printable(&self) -> Option<char> {
        match self.key {
            Key::Char(c) if !self.ctrl && !self.alt && !c.is_control() => Some(c),
            _ => None,
        }
    }
}

/// Map a crossterm key event into the normalized model.
pub fn from_crossterm(key: event::KeyEvent) -> KeyEvent {
    let code = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Esc => Key::Escape,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        _ => Key::Unknown,
    };
    KeyEvent {
        key: code,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
    }
}

/// Source of key events for an interactive component.
///
/// `read_key` blocks until a key arrives or the timeout elapses (`None` on
/// timeout). Components that must stay responsive to external cancellation
/// always pass a bounded timeout and loop.
pub trait KeySource {
    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<KeyEvent>>;
}

/// Real terminal input via crossterm. Requires raw mode to be active.
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<KeyEvent>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            // Bound each poll so non-key events (resize, mouse, key release)
            // never consume the whole timeout budget.
            let wait = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return Ok(None);
                    }
                    d - now
                }
                None => Duration::from_millis(250),
            };
            if !event::poll(wait)? {
                if deadline.is_some() {
                    return Ok(None);
                }
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
                    continue;
                }
                return Ok(Some(from_crossterm(key)));
            }
        }
    }
}

/// Deterministic scripted input for tests and replay.
///
/// Popping an empty script is an error so a state machine that fails to
/// resolve on the scripted sequence fails loudly instead of spinning.
pub struct ScriptedKeys {
    queue: VecDeque<KeyEvent>,
}

impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            queue: keys.into_iter().collect(),
        }
    }

    /// Keys remaining in the script.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl KeySource for ScriptedKeys {
    fn read_key(&mut self, _timeout: Option<Duration>) -> Result<Option<KeyEvent>> {
        match self.queue.pop_front() {
            Some(ev) => Ok(Some(ev)),
            None => bail!("scripted key sequence exhausted before the component resolved"),
        }
    }
}

/// Convenience constructors for scripted sequences.
pub fn presses(text: &str) -> Vec<KeyEvent> {
    text.chars().map(KeyEvent::ch).collect()
}
