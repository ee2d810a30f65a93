//! Instruction file schema and run report types.
//!
//! Raw serde types (`InstructionFile`, `TaskSpec`) mirror the JSON on disk
//! and deliberately keep `cadence` and `type` as strings: a bad value in one
//! task must fail that task at resolution time, not the whole file at parse
//! time. Resolved types (`TaskDefinition`, `TaskAction`) are the closed
//! variants the dispatcher matches on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Instruction file (raw)
// ============================================================================

/// A parsed instruction file: a default domain plus an ordered task list.
/// Declaration order is execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionFile {
    /// Domain applied to tasks that do not name their own.
    #[serde(default = "default_domain")]
    pub default_domain: String,

    /// Ordered task declarations.
    pub tasks: Vec<TaskSpec>,
}

fn default_domain() -> String {
    "GeneralNews".to_string()
}

/// One task declaration, exactly as written in the instruction file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default = "unnamed_task")]
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `daily` or `monthly`; resolved per task, not at file parse time.
    #[serde(default = "daily")]
    pub cadence: String,

    /// Required for monthly tasks, 1-31.
    #[serde(default)]
    pub day_of_month: Option<i64>,

    /// `search` or `page-text`.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Overrides the file's default domain when present.
    #[serde(default)]
    pub domain: Option<String>,

    // -- search fields --
    #[serde(default)]
    pub query: Option<String>,

    #[serde(default)]
    pub max_results: Option<u32>,

    // -- page-text fields --
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub max_links: Option<u32>,

    /// Word budget per collected page.
    #[serde(default)]
    pub words: Option<u32>,
}

fn unnamed_task() -> String {
    "Unnamed Task".to_string()
}

fn default_true() -> bool {
    true
}

fn daily() -> String {
    "daily".to_string()
}

pub const DEFAULT_MAX_RESULTS: u32 = 8;
pub const DEFAULT_MAX_LINKS: u32 = 8;
pub const DEFAULT_WORDS: u32 = 200;

// ============================================================================
// Resolved task
// ============================================================================

/// Closed task action, resolved once from the raw `type` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    Search { query: String, max_results: u32 },
    PageText { url: String, max_links: u32, words: u32 },
}

impl TaskAction {
    /// The wire name of this action's task type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::PageText { .. } => "page-text",
        }
    }
}

/// A due task ready for dispatch: validated domain, closed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub name: String,
    pub domain: String,
    pub action: TaskAction,
}

// ============================================================================
// Cadence scope
// ============================================================================

/// Which cadences a run considers. `All` unions daily and monthly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CadenceScope {
    #[default]
    Daily,
    Monthly,
    All,
}

impl fmt::Display for CadenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Monthly => write!(f, "monthly"),
            Self::All => write!(f, "all"),
        }
    }
}

// ============================================================================
// Run parameters
// ============================================================================

/// Parameters for one orchestrator run, threaded in explicitly — no ambient
/// defaults inside deep call paths.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub run_date: NaiveDate,
    pub scope: CadenceScope,
    pub dry_run: bool,
    /// 0 = unlimited.
    pub max_tasks: u32,
    /// Glob pattern for multi-config discovery, relative to the base
    /// config's directory.
    pub config_pattern: String,
    /// Seconds to sleep between instruction files in multi-config mode.
    pub inter_config_delay_secs: u64,
    /// Append run events to the datastore journal.
    pub journal: bool,
}

impl RunParams {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            scope: CadenceScope::Daily,
            dry_run: false,
            max_tasks: 0,
            config_pattern: "*_instructions.json".to_string(),
            inter_config_delay_secs: 0,
            journal: true,
        }
    }
}

// ============================================================================
// Run reports
// ============================================================================

/// Terminal status of one task within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Planned,
    Succeeded,
    Failed,
    Skipped,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planned => write!(f, "planned"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-task record accumulated into the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub status: TaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Results collected / links processed, as reported by the collector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn skipped(name: &str, reason: String) -> Self {
        Self {
            name: name.to_string(),
            status: TaskStatus::Skipped,
            reason: Some(reason),
            kind: None,
            domain: None,
            output_path: None,
            items: None,
            error: None,
        }
    }

    pub fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            status: TaskStatus::Failed,
            reason: None,
            kind: None,
            domain: None,
            output_path: None,
            items: None,
            error: Some(error),
        }
    }
}

/// Run-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    PartialError,
    Error,
}

/// Summary of one instruction file's run. Built incrementally, immutable
/// once returned.
///
/// Counter convention: `tasks_executed` counts only tasks actually handed
/// to a collector. A task that fails before dispatch (invalid cadence
/// config, unresolvable type, unwritable output path) counts in
/// `tasks_failed` alone, so `executed` is always the number of collector
/// invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub run_ts: String,
    pub run_date: String,
    pub cadence: CadenceScope,
    pub dry_run: bool,
    pub config_path: PathBuf,
    pub tasks_total: u32,
    pub tasks_due: u32,
    pub tasks_executed: u32,
    pub tasks_skipped: u32,
    pub tasks_failed: u32,
    pub results: Vec<TaskRecord>,

    /// Run-level error (config unreadable, malformed JSON, bad default
    /// domain). Task-level errors live in `results`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A task that would run, with its resolved (never created) output address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedTask {
    pub name: String,
    pub kind: String,
    pub domain: String,
    pub output_path: PathBuf,
}

/// Dry-run product: the tasks that would run, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    pub config_path: PathBuf,
    pub run_date: String,
    pub cadence: CadenceScope,
    pub tasks: Vec<PlannedTask>,
}

/// Aggregate report for a multi-config run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiRunReport {
    pub status: RunStatus,
    pub run_ts: String,
    pub config_directory: PathBuf,
    pub inter_config_delay_seconds: u64,
    pub configs_total: u32,
    pub configs_failed: u32,
    pub tasks_total: u32,
    pub tasks_due: u32,
    pub tasks_executed: u32,
    pub tasks_skipped: u32,
    pub tasks_failed: u32,
    pub config_runs: Vec<RunSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_file_parse() {
        let json = r#"{
            "default_domain": "News",
            "tasks": [
                {
                    "name": "Morning sweep",
                    "type": "search",
                    "cadence": "daily",
                    "query": "energy markets",
                    "max_results": 5
                },
                {
                    "name": "Monthly digest",
                    "type": "page-text",
                    "cadence": "monthly",
                    "day_of_month": 1,
                    "url": "https://example.org/digest",
                    "domain": "Energy"
                }
            ]
        }"#;
        let file: InstructionFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.default_domain, "News");
        assert_eq!(file.tasks.len(), 2);
        assert_eq!(file.tasks[0].kind, "search");
        assert!(file.tasks[0].enabled);
        assert_eq!(file.tasks[1].day_of_month, Some(1));
        assert_eq!(file.tasks[1].domain.as_deref(), Some("Energy"));
    }

    #[test]
    fn test_task_spec_defaults() {
        let spec: TaskSpec = serde_json::from_str(r#"{"type": "search"}"#).unwrap();
        assert_eq!(spec.name, "Unnamed Task");
        assert!(spec.enabled);
        assert_eq!(spec.cadence, "daily");
        assert!(spec.day_of_month.is_none());
        assert!(spec.domain.is_none());
    }

    #[test]
    fn test_default_domain_fallback() {
        let file: InstructionFile = serde_json::from_str(r#"{"tasks": []}"#).unwrap();
        assert_eq!(file.default_domain, "GeneralNews");
    }

    #[test]
    fn test_unknown_type_string_survives_parse() {
        // Type validity is a per-task concern at resolution time; parsing
        // must not reject the file.
        let spec: TaskSpec = serde_json::from_str(r#"{"type": "carrier-pigeon"}"#).unwrap();
        assert_eq!(spec.kind, "carrier-pigeon");
    }

    #[test]
    fn test_action_kind_names() {
        let search = TaskAction::Search {
            query: "q".to_string(),
            max_results: 3,
        };
        let page = TaskAction::PageText {
            url: "https://example.org".to_string(),
            max_links: 2,
            words: 100,
        };
        assert_eq!(search.kind(), "search");
        assert_eq!(page.kind(), "page-text");
    }

    #[test]
    fn test_cadence_scope_serde() {
        assert_eq!(
            serde_json::to_string(&CadenceScope::All).unwrap(),
            "\"all\""
        );
        let s: CadenceScope = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(s, CadenceScope::Monthly);
    }

    #[test]
    fn test_task_record_serialization_omits_empty() {
        let record = TaskRecord::skipped("t", "disabled".to_string());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"skipped\""));
        assert!(!json.contains("output_path"));
        assert!(!json.contains("error"));
    }
}
