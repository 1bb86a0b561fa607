//! Console configuration: `crank.toml` plus environment overrides.

use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Color handling for all user-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Color when stdout is a terminal (the `colored` crate's default).
    Auto,
    Always,
    Never,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Auto => write!(f, "auto"),
            ColorMode::Always => write!(f, "always"),
            ColorMode::Never => write!(f, "never"),
        }
    }
}

impl ColorMode {
    /// Parse a mode name into a ColorMode variant.
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            _ => bail!("invalid color mode '{}'", s),
        }
    }
}

/// Whether the interactive console is allowed at all.
///
/// `CRANK_UI=0` forces every component onto its degraded path even on a
/// real terminal, which is how CI exercises the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    On,
    Off,
}

impl UiMode {
    fn from_env() -> Self {
        match env::var("CRANK_UI") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => Self::On,
                "0" | "false" | "off" => Self::Off,
                _ => Self::Auto,
            },
            Err(_) => Self::Auto,
        }
    }

    pub fn resolve(no_ui_flag: bool) -> Self {
        if no_ui_flag {
            Self::Off
        } else {
            Self::from_env()
        }
    }
}

/// Contents of the `[console]` section of `crank.toml`.
#[derive(Debug, Clone, Deserialize)]
struct ConsoleSection {
    #[serde(default = "default_color")]
    color: String,
    #[serde(default = "default_scroll_margin")]
    scroll_margin: usize,
    #[serde(default = "default_menu_height")]
    menu_height: usize,
    #[serde(default = "default_double_ctrl_c_ms")]
    double_ctrl_c_ms: u64,
    #[serde(default = "default_max_search_results")]
    max_search_results: usize,
}

impl Default for ConsoleSection {
    fn default() -> Self {
        Self {
            color: default_color(),
            scroll_margin: default_scroll_margin(),
            menu_height: default_menu_height(),
            double_ctrl_c_ms: default_double_ctrl_c_ms(),
            max_search_results: default_max_search_results(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    console: ConsoleSection,
}

fn default_color() -> String {
    "auto".to_string()
}

fn default_scroll_margin() -> usize {
    2
}

fn default_menu_height() -> usize {
    10
}

fn default_double_ctrl_c_ms() -> u64 {
    2000
}

fn default_max_search_results() -> usize {
    8
}

/// Resolved console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub color: ColorMode,
    pub scroll_margin: usize,
    pub menu_height: usize,
    pub double_ctrl_c_ms: u64,
    pub max_search_results: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            scroll_margin: default_scroll_margin(),
            menu_height: default_menu_height(),
            double_ctrl_c_ms: default_double_ctrl_c_ms(),
            max_search_results: default_max_search_results(),
        }
    }
}

impl ConsoleConfig {
    /// Load `crank.toml` from the working directory (if present), then apply
    /// environment overrides (`NO_COLOR`).
    pub fn load() -> Result<Self> {
        let mut config = match std::fs::read_to_string("crank.toml") {
            Ok(raw) => Self::from_toml(&raw).context("failed to parse crank.toml")?,
            Err(_) => Self::default(),
        };
        if env::var_os("NO_COLOR").is_some() {
            config.color = ColorMode::Never;
        }
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        let section = file.console;
        Ok(Self {
            color: ColorMode::from_str(&section.color)?,
            scroll_margin: section.scroll_margin,
            menu_height: section.menu_height.max(1),
            double_ctrl_c_ms: section.double_ctrl_c_ms,
            max_search_results: section.max_search_results.max(1),
        })
    }

    /// Load configuration from a specific file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&raw)
    }

    /// The double-Ctrl+C force-exit window.
    pub fn ctrl_c_window(&self) -> Duration {
        Duration::from_millis(self.double_ctrl_c_ms)
    }

    /// Apply the color mode to the global `colored` state.
    pub fn apply_color(&self) {
        match self.color {
            ColorMode::Always => colored::control::set_override(true),
            ColorMode::Never => colored::control::set_override(false),
            ColorMode::Auto => colored::control::unset_override(),
        }
    }
}
