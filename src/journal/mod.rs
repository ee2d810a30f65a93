//! Append-only JSONL run journal.
//!
//! One log per instruction file, under `<root>/00-Journal/<config-stem>/
//! events.jsonl`. Journal writes are best-effort: a full disk must not turn
//! a successful collection run into a failure.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const JOURNAL_AREA: &str = "00-Journal";

/// Run lifecycle events, one JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        config: String,
        run_id: String,
        run_date: String,
        lode_version: String,
    },
    TaskStarted {
        name: String,
        kind: String,
        domain: String,
    },
    TaskSucceeded {
        name: String,
        items: u32,
        output_path: String,
    },
    TaskFailed {
        name: String,
        error: String,
    },
    RunCompleted {
        run_id: String,
        tasks_executed: u32,
        tasks_skipped: u32,
        tasks_failed: u32,
        total_seconds: f64,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: RunEvent,
}

/// Current UTC timestamp, second precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Generate a run ID.
pub fn generate_run_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("r-{:012x}", nanos & 0xFFFF_FFFF_FFFF)
}

/// Derive the journal path for an instruction file's stem.
pub fn journal_path(root: &Path, config_stem: &str) -> PathBuf {
    root.join(JOURNAL_AREA).join(config_stem).join("events.jsonl")
}

/// Append one event to the journal.
pub fn append_event(root: &Path, config_stem: &str, event: RunEvent) -> Result<(), String> {
    let path = journal_path(root, config_stem);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
    }

    let wrapped = TimestampedEvent {
        ts: now_iso8601(),
        event,
    };
    let line =
        serde_json::to_string(&wrapped).map_err(|e| format!("serialize error: {}", e))?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    writeln!(file, "{}", line).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    Ok(())
}

/// Read all events back, skipping unparseable lines.
pub fn read_events(root: &Path, config_stem: &str) -> Vec<TimestampedEvent> {
    let path = journal_path(root, config_stem);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}
