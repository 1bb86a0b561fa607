//! Raw JSON trace logging for debugging interactive sessions.
//!
//! Opt-in via `CRANK_TRACE=1`. Key events and component resolutions are
//! appended as JSON lines so a misbehaving menu can be replayed offline.

use std::env;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde_json::json;

use crate::term::keys::KeyEvent;

/// Get the log directory path.
pub fn log_directory() -> PathBuf {
    let base_dir = env::var("TMPDIR")
        .or_else(|_| env::var("XDG_RUNTIME_DIR"))
        .unwrap_or_else(|_| "/tmp".to_string());

    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    PathBuf::from(base_dir)
        .join("crank")
        .join("logs")
        .join(project_name)
}

/// JSON-lines trace writer.
pub struct Trace {
    file: File,
    pub path: PathBuf,
}

impl Trace {
    /// Open a trace file if `CRANK_TRACE` is set to a truthy value.
    pub fn from_env() -> Option<Trace> {
        match env::var("CRANK_TRACE") {
            Ok(raw) if matches!(raw.trim(), "1" | "true" | "on") => Trace::open().ok(),
            _ => None,
        }
    }

    /// Open a trace file under the log directory.
    pub fn open() -> std::io::Result<Trace> {
        let log_dir = log_directory();
        std::fs::create_dir_all(&log_dir)?;

        let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
        let path = log_dir.join(format!("{}.log", timestamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Trace { file, path })
    }

    fn write(&mut self, value: serde_json::Value) {
        if let Ok(line) = serde_json::to_string(&value) {
            let _ = writeln!(self.file, "{line}");
        }
    }

    /// Record one decoded key event.
    pub fn key(&mut self, ev: &KeyEvent) {
        self.write(json!({
            "ts": Utc::now().to_rfc3339(),
            "kind": "key",
            "event": ev,
        }));
    }

    /// Record a component resolution or driver transition.
    pub fn note(&mut self, what: &str, detail: &str) {
        self.write(json!({
            "ts": Utc::now().to_rfc3339(),
            "kind": what,
            "detail": detail,
        }));
    }
}
