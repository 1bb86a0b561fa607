//! Text, password, number, and path prompts.
//!
//! Each prompt pairs a spec struct with a validator closure fed to the shared
//! retry loop; the interactive and degraded paths use the same validator so
//! behavior matches exactly.

use std::env;
use std::path::{Component, Path, PathBuf};

use anyhow::Result;

use crate::cancel::{CancellationContext, Flow};
use crate::prompt::editor::LineEditor;
use crate::prompt::{run_line_fallback, run_line_prompt, run_prompt, PromptOutcome};
use crate::term::keys::KeySource;
use crate::term::surface::RenderSurface;

/// Free-text prompt.
#[derive(Debug, Clone, Default)]
pub struct TextPrompt {
    pub label: String,
    pub required: bool,
    pub default: Option<String>,
    pub max_len: Option<usize>,
}

impl TextPrompt {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub(crate) fn constraints(&self) -> Option<String> {
        match (&self.default, self.required) {
            (Some(d), _) => Some(format!("default: {d}")),
            (None, true) => Some("required".to_string()),
            (None, false) => None,
        }
    }

    pub(crate) fn validate(&self, text: &str) -> std::result::Result<String, String> {
        if text.is_empty() {
            if let Some(default) = &self.default {
                return Ok(default.clone());
            }
            if self.required {
                return Err("required".to_string());
            }
            return Ok(String::new());
        }
        if let Some(max) = self.max_len {
            if text.chars().count() > max {
                return Err(format!("at most {max} characters"));
            }
        }
        Ok(text.to_string())
    }
}

pub fn text_with(
    spec: &TextPrompt,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<PromptOutcome<String>>> {
    let mut editor = LineEditor::new("");
    if let Some(max) = spec.max_len {
        editor = editor.max_len(max);
    }
    run_line_prompt(
        &spec.label,
        spec.constraints(),
        editor,
        |text| spec.validate(text),
        keys,
        surface,
        ctx,
    )
}

pub fn prompt_text(spec: &TextPrompt, ctx: &CancellationContext) -> Result<PromptOutcome<String>> {
    run_prompt(
        ctx,
        |keys, surface, ctx| text_with(spec, keys, surface, ctx),
        || run_line_fallback(&spec.label, spec.constraints().as_deref(), |t| spec.validate(t)),
    )
}

/// Masked secret prompt. No default and no echo; the mask character is the
/// only feedback.
#[derive(Debug, Clone)]
pub struct PasswordPrompt {
    pub label: String,
    pub min_len: Option<usize>,
}

impl PasswordPrompt {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            min_len: None,
        }
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    pub(crate) fn validate(&self, text: &str) -> std::result::Result<String, String> {
        if text.is_empty() {
            return Err("required".to_string());
        }
        if let Some(min) = self.min_len {
            if text.chars().count() < min {
                return Err(format!("at least {min} characters"));
            }
        }
        Ok(text.to_string())
    }
}

pub fn password_with(
    spec: &PasswordPrompt,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<PromptOutcome<String>>> {
    run_line_prompt(
        &spec.label,
        None,
        LineEditor::new("").mask('•'),
        |text| spec.validate(text),
        keys,
        surface,
        ctx,
    )
}

pub fn prompt_password(
    spec: &PasswordPrompt,
    ctx: &CancellationContext,
) -> Result<PromptOutcome<String>> {
    run_prompt(
        ctx,
        |keys, surface, ctx| password_with(spec, keys, surface, ctx),
        // The degraded path cannot suppress echo without raw mode; the
        // prompt still works, it just shows what is typed.
        || run_line_fallback(&spec.label, None, |t| spec.validate(t)),
    )
}

/// Numeric prompt with optional integer mode and bounds.
#[derive(Debug, Clone, Default)]
pub struct NumberPrompt {
    pub label: String,
    pub integer: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: Option<f64>,
}

impl NumberPrompt {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.default = Some(value);
        self
    }

    pub(crate) fn constraints(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.integer {
            parts.push("whole number".to_string());
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) => parts.push(format!("{min}..{max}")),
            (Some(min), None) => parts.push(format!("≥ {min}")),
            (None, Some(max)) => parts.push(format!("≤ {max}")),
            (None, None) => {}
        }
        if let Some(d) = self.default {
            parts.push(format!("default: {d}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    pub(crate) fn validate(&self, text: &str) -> std::result::Result<f64, String> {
        if text.is_empty() {
            return match self.default {
                Some(d) => Ok(d),
                None => Err("required".to_string()),
            };
        }
        let value: f64 = text
            .trim()
            .parse()
            .map_err(|_| "enter a number".to_string())?;
        if self.integer && value.fract() != 0.0 {
            return Err("enter a whole number".to_string());
        }
        if let Some(min) = self.min {
            if value < min {
                return Err(format!("must be ≥ {min}"));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(format!("must be ≤ {max}"));
            }
        }
        Ok(value)
    }
}

pub fn number_with(
    spec: &NumberPrompt,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<PromptOutcome<f64>>> {
    run_line_prompt(
        &spec.label,
        spec.constraints(),
        LineEditor::new(""),
        |text| spec.validate(text),
        keys,
        surface,
        ctx,
    )
}

pub fn prompt_number(spec: &NumberPrompt, ctx: &CancellationContext) -> Result<PromptOutcome<f64>> {
    run_prompt(
        ctx,
        |keys, surface, ctx| number_with(spec, keys, surface, ctx),
        || run_line_fallback(&spec.label, spec.constraints().as_deref(), |t| spec.validate(t)),
    )
}

/// What a path prompt expects the target to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

/// Filesystem path prompt with normalization before existence checks.
#[derive(Debug, Clone, Default)]
pub struct PathPrompt {
    pub label: String,
    pub must_exist: bool,
    pub kind: Option<PathKind>,
    pub default: Option<PathBuf>,
}

impl PathPrompt {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn must_exist(mut self) -> Self {
        self.must_exist = true;
        self
    }

    pub fn expect(mut self, kind: PathKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn default_value(mut self, path: impl Into<PathBuf>) -> Self {
        self.default = Some(path.into());
        self
    }

    pub(crate) fn constraints(&self) -> Option<String> {
        match self.kind {
            Some(PathKind::File) => Some("file".to_string()),
            Some(PathKind::Directory) => Some("directory".to_string()),
            None => self.must_exist.then(|| "existing path".to_string()),
        }
    }

    pub(crate) fn validate(&self, text: &str) -> std::result::Result<PathBuf, String> {
        if text.is_empty() {
            return match &self.default {
                Some(d) => Ok(d.clone()),
                None => Err("required".to_string()),
            };
        }
        let base = env::current_dir().map_err(|e| e.to_string())?;
        let home = env::var_os("HOME").map(PathBuf::from);
        let path = normalize_path(text, &base, home.as_deref());

        if self.must_exist && !path.exists() {
            return Err(format!("no such path: {}", path.display()));
        }
        match self.kind {
            Some(PathKind::File) if path.exists() && !path.is_file() => {
                Err(format!("not a file: {}", path.display()))
            }
            Some(PathKind::Directory) if path.exists() && !path.is_dir() => {
                Err(format!("not a directory: {}", path.display()))
            }
            _ => Ok(path),
        }
    }
}

/// Resolve tilde and relative notation into an unambiguous absolute path.
///
/// Lexical only: `.` segments drop, `..` pops (never past the root), and no
/// symlinks are followed — existence checks happen after normalization.
pub fn normalize_path(raw: &str, base: &Path, home: Option<&Path>) -> PathBuf {
    let expanded: PathBuf = if raw == "~" {
        home.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(raw))
    } else if let Some(rest) = raw.strip_prefix("~/") {
        match home {
            Some(h) => h.join(rest),
            None => PathBuf::from(raw),
        }
    } else {
        PathBuf::from(raw)
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // At the root there is nothing to pop; the `..` just drops.
                if !cleaned.pop() && !cleaned.has_root() {
                    cleaned.push(component.as_os_str());
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

pub fn path_with(
    spec: &PathPrompt,
    keys: &mut dyn KeySource,
    surface: &mut dyn RenderSurface,
    ctx: &CancellationContext,
) -> Result<Flow<PromptOutcome<PathBuf>>> {
    run_line_prompt(
        &spec.label,
        spec.constraints(),
        LineEditor::new(""),
        |text| spec.validate(text),
        keys,
        surface,
        ctx,
    )
}

pub fn prompt_path(spec: &PathPrompt, ctx: &CancellationContext) -> Result<PromptOutcome<PathBuf>> {
    run_prompt(
        ctx,
        |keys, surface, ctx| path_with(spec, keys, surface, ctx),
        || run_line_fallback(&spec.label, spec.constraints().as_deref(), |t| spec.validate(t)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::keys::{presses, Key, KeyEvent, ScriptedKeys};
    use crate::term::surface::CaptureSurface;

    fn enter() -> KeyEvent {
        KeyEvent::plain(Key::Enter)
    }

    #[test]
    fn required_text_reprompts_on_empty() {
        // Scenario: Enter on an empty required buffer re-prompts inline
        // and does not return until something is typed.
        let spec = TextPrompt::new("Name").required();
        let mut script = vec![enter()];
        script.extend(presses("ok"));
        script.push(enter());

        let mut keys = ScriptedKeys::new(script);
        let mut surface = CaptureSurface::new();
        let ctx = CancellationContext::new();

        let flow = text_with(&spec, &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(
            flow.unwrap_resolved(),
            PromptOutcome::Submitted("ok".to_string())
        );
        assert!(surface.ever_contains("required"));
    }

    #[test]
    fn empty_text_uses_default() {
        let spec = TextPrompt::new("Branch").default_value("main");
        assert_eq!(spec.validate(""), Ok("main".to_string()));
        assert_eq!(spec.validate("dev"), Ok("dev".to_string()));
    }

    #[test]
    fn optional_text_accepts_empty() {
        let spec = TextPrompt::new("Note");
        assert_eq!(spec.validate(""), Ok(String::new()));
    }

    #[test]
    fn password_masks_display() {
        let spec = PasswordPrompt::new("Token").min_len(4);
        let mut script = presses("hunter2");
        script.push(enter());

        let mut keys = ScriptedKeys::new(script);
        let mut surface = CaptureSurface::new();
        let ctx = CancellationContext::new();

        let flow = password_with(&spec, &mut keys, &mut surface, &ctx).unwrap();
        assert_eq!(
            flow.unwrap_resolved(),
            PromptOutcome::Submitted("hunter2".to_string())
        );
        // No frame may contain the secret.
        assert!(!surface.ever_contains("hunter2"));
        assert!(surface.ever_contains("•••"));
    }

    #[test]
    fn password_too_short_is_rejected() {
        let spec = PasswordPrompt::new("Token").min_len(8);
        assert!(spec.validate("short").is_err());
    }

    #[test]
    fn number_integer_mode_rejects_decimals() {
        let spec = NumberPrompt::new("Count").integer();
        assert!(spec.validate("2.5").is_err());
        assert_eq!(spec.validate("3"), Ok(3.0));
    }

    #[test]
    fn number_bounds_are_enforced() {
        let spec = NumberPrompt::new("Workers").min(1.0).max(8.0);
        assert!(spec.validate("0").is_err());
        assert!(spec.validate("9").is_err());
        assert_eq!(spec.validate("4"), Ok(4.0));
        assert!(spec.validate("abc").is_err());
    }

    #[test]
    fn number_empty_uses_default() {
        let spec = NumberPrompt::new("Limit").default_value(10.0);
        assert_eq!(spec.validate(""), Ok(10.0));
    }

    #[test]
    fn normalize_expands_tilde() {
        let home = PathBuf::from("/home/op");
        let base = PathBuf::from("/work");
        assert_eq!(
            normalize_path("~/notes.md", &base, Some(&home)),
            PathBuf::from("/home/op/notes.md")
        );
        assert_eq!(normalize_path("~", &base, Some(&home)), home);
    }

    #[test]
    fn normalize_resolves_relative_against_base() {
        let base = PathBuf::from("/work/project");
        assert_eq!(
            normalize_path("src/main.rs", &base, None),
            PathBuf::from("/work/project/src/main.rs")
        );
    }

    #[test]
    fn normalize_cleans_dot_segments() {
        let base = PathBuf::from("/work/project");
        assert_eq!(
            normalize_path("../other/./lib.rs", &base, None),
            PathBuf::from("/work/other/lib.rs")
        );
        // `..` never pops past the root.
        assert_eq!(
            normalize_path("/../../etc", &base, None),
            PathBuf::from("/etc")
        );
    }

    #[test]
    fn path_must_exist_checks_after_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("present.txt");
        std::fs::write(&file, "x").unwrap();

        let spec = PathPrompt::new("File").must_exist().expect(PathKind::File);
        let ok = spec.validate(file.to_str().unwrap());
        assert_eq!(ok, Ok(file.clone()));

        let missing = dir.path().join("absent.txt");
        assert!(spec.validate(missing.to_str().unwrap()).is_err());

        let dir_spec = PathPrompt::new("Dir").must_exist().expect(PathKind::Directory);
        assert!(dir_spec.validate(file.to_str().unwrap()).is_err());
        assert!(dir_spec.validate(dir.path().to_str().unwrap()).is_ok());
    }
}
