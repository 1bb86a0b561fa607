//! Menu item model and the pieces shared by both selection engines.

pub mod multi;
pub mod select;
pub mod viewport;

use std::fmt;

use colored::Colorize;

use crate::term::surface::clip;

/// A selectable menu row.
///
/// Optional capabilities are explicit fields validated when the menu is
/// constructed, not discovered at render time.
#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: String,
    pub value: String,
    pub hotkey: Option<char>,
    pub disabled: bool,
    pub disabled_reason: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            hotkey: None,
            disabled: false,
            disabled_reason: None,
            description: None,
            group: None,
        }
    }

    pub fn hotkey(mut self, key: char) -> Self {
        self.hotkey = Some(key);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.group = Some(name.into());
        self
    }

    pub fn disabled(mut self, reason: impl Into<String>) -> Self {
        self.disabled = true;
        self.disabled_reason = Some(reason.into());
        self
    }
}

/// A menu row: a real item, or non-selectable chrome.
#[derive(Debug, Clone)]
pub enum MenuEntry {
    Item(MenuItem),
    Separator,
    Header(String),
}

impl MenuEntry {
    pub fn item(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Item(MenuItem::new(label, value))
    }

    /// Whether the cursor can land on this row.
    pub fn selectable(&self) -> bool {
        matches!(self, Self::Item(item) if !item.disabled)
    }

    pub fn as_item(&self) -> Option<&MenuItem> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }
}

/// Menu construction errors, reported to the caller rather than recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuError {
    /// Every item is disabled or the menu holds only chrome.
    NoSelectableItems,
    /// Two enabled items declared the same hotkey (case-insensitive).
    DuplicateHotkey(char),
    /// A hotkey that can never be typed as a plain printable key.
    UnprintableHotkey(char),
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuError::NoSelectableItems => write!(f, "menu has no selectable items"),
            MenuError::DuplicateHotkey(c) => write!(f, "duplicate menu hotkey '{c}'"),
            MenuError::UnprintableHotkey(c) => {
                write!(f, "menu hotkey {c:?} is not a printable character")
            }
        }
    }
}

impl std::error::Error for MenuError {}

/// Validate entries and return the selectable entry indices in order.
pub fn validate(entries: &[MenuEntry]) -> Result<Vec<usize>, MenuError> {
    let mut selectable = Vec::new();
    let mut hotkeys: Vec<char> = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        let MenuEntry::Item(item) = entry else {
            continue;
        };
        if let Some(key) = item.hotkey {
            if key.is_control() || key.is_whitespace() {
                return Err(MenuError::UnprintableHotkey(key));
            }
            let folded = key.to_ascii_lowercase();
            if !item.disabled {
                if hotkeys.contains(&folded) {
                    return Err(MenuError::DuplicateHotkey(key));
                }
                hotkeys.push(folded);
            }
        }
        if !item.disabled {
            selectable.push(idx);
        }
    }

    if selectable.is_empty() {
        return Err(MenuError::NoSelectableItems);
    }
    Ok(selectable)
}

/// Next position in a wrapping cursor walk.
pub(crate) fn wrap_next(pos: usize, len: usize) -> usize {
    (pos + 1) % len
}

/// Previous position in a wrapping cursor walk.
pub(crate) fn wrap_prev(pos: usize, len: usize) -> usize {
    (pos + len - 1) % len
}

/// Jump `delta` positions forward or backward, clamped to the ends.
pub(crate) fn page_jump(pos: usize, len: usize, delta: isize) -> usize {
    let target = pos as isize + delta;
    target.clamp(0, len.saturating_sub(1) as isize) as usize
}

/// Render one entry row.
///
/// `checked` is `Some` only for multi-select menus. The row budget is
/// `width` columns; content is clipped before styling.
pub(crate) fn render_entry(
    entry: &MenuEntry,
    focused: bool,
    checked: Option<bool>,
    width: usize,
) -> String {
    match entry {
        MenuEntry::Separator => "  ────────".dimmed().to_string(),
        MenuEntry::Header(text) => {
            format!("  {}", clip(text, width.saturating_sub(2)).bold())
        }
        MenuEntry::Item(item) => {
            let marker = if focused { "▶" } else { " " };
            let checkbox = match checked {
                Some(true) => "[x] ",
                Some(false) => "[ ] ",
                None => "",
            };
            let hotkey = item
                .hotkey
                .map(|k| format!(" ({k})"))
                .unwrap_or_default();
            let mut label = item.label.clone();
            if item.disabled {
                if let Some(reason) = &item.disabled_reason {
                    label = format!("{label} — {reason}");
                }
            } else if let Some(desc) = &item.description {
                label = format!("{label} · {desc}");
            }
            let budget = width.saturating_sub(2 + checkbox.len() + hotkey.chars().count() + 1);
            let label = clip(&label, budget);

            if item.disabled {
                format!("{marker} {checkbox}{}", label.dimmed())
            } else if focused {
                format!(
                    "{} {checkbox}{}{}",
                    marker.cyan(),
                    label.cyan(),
                    hotkey.dimmed()
                )
            } else {
                format!("{marker} {checkbox}{label}{}", hotkey.dimmed())
            }
        }
    }
}

/// Render title, viewport window, scroll indicators, and a key-hint footer.
pub(crate) fn render_list_frame(
    title: &str,
    entries: &[MenuEntry],
    viewport: &viewport::ViewportState,
    focus_entry: usize,
    checked: Option<&[bool]>,
    footer: &str,
    notice: Option<&str>,
    width: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        "•".cyan(),
        clip(title, width.saturating_sub(2)).bold()
    ));

    let range = viewport.range();
    if range.more_above {
        lines.push(format!("  {}", "↑ more".dimmed()));
    }
    for idx in range.start..range.end {
        let focused = idx == focus_entry;
        let checked = checked.map(|flags| flags[idx]);
        lines.push(render_entry(&entries[idx], focused, checked, width));
    }
    if range.more_below {
        lines.push(format!("  {}", "↓ more".dimmed()));
    }

    if let Some(notice) = notice {
        lines.push(format!("  {}", clip(notice, width.saturating_sub(2)).yellow()));
    }
    lines.push(format!("  {}", clip(footer, width.saturating_sub(2)).dimmed()));
    lines
}
