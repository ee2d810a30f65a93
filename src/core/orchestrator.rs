//! Run orchestration — the per-file state machine and multi-config driver.
//!
//! One instruction file moves through Loaded -> Filtered -> (DryRunReported |
//! Executing) -> Summarized. Tasks run strictly sequentially in declaration
//! order; a task's failure is recorded and the run continues. In multi-config
//! mode each discovered file gets the full state machine, with a fixed delay
//! between files so rate-sensitive collectors are never hammered
//! back-to-back.

use super::cadence::{self, DueDecision};
use super::dispatcher;
use super::error::Error;
use super::navigator::{validate_domain, FolderNavigator};
use super::parser;
use super::types::{
    InstructionFile, MultiRunReport, PlannedTask, RunParams, RunPlan, RunStatus, RunSummary,
    TaskRecord, TaskStatus,
};
use crate::collectors::Collectors;
use crate::journal::{self, RunEvent};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The area written by collection runs.
const MINE_AREA: &str = "mine";

pub struct Orchestrator<'a> {
    navigator: FolderNavigator,
    collectors: &'a dyn Collectors,
}

impl<'a> Orchestrator<'a> {
    pub fn new(navigator: FolderNavigator, collectors: &'a dyn Collectors) -> Self {
        Self {
            navigator,
            collectors,
        }
    }

    pub fn navigator(&self) -> &FolderNavigator {
        &self.navigator
    }

    /// Run one instruction file through the full state machine. Run-level
    /// failures (unreadable file, malformed JSON, invalid default domain)
    /// produce an `Error`-status summary; task-level failures are recorded
    /// per task and never abort the run.
    pub fn run_file(&self, config_path: &Path, params: &RunParams) -> RunSummary {
        let run_ts = journal::now_iso8601();
        match self.load(config_path) {
            Ok(file) => self.execute(config_path, &file, params, run_ts),
            Err(e) => error_summary(config_path, params, run_ts, e.to_string()),
        }
    }

    /// Produce the dry-run plan for one instruction file: the tasks that
    /// would run, with resolved output addresses. Creates nothing on disk.
    pub fn plan_file(&self, config_path: &Path, params: &RunParams) -> Result<RunPlan, Error> {
        let file = self.load(config_path)?;
        let mut dry = params.clone();
        dry.dry_run = true;
        let summary = self.execute(config_path, &file, &dry, journal::now_iso8601());

        let tasks = summary
            .results
            .into_iter()
            .filter(|r| r.status == TaskStatus::Planned)
            .map(|r| PlannedTask {
                name: r.name,
                kind: r.kind.unwrap_or_default(),
                domain: r.domain.unwrap_or_default(),
                output_path: r.output_path.unwrap_or_default(),
            })
            .collect();

        Ok(RunPlan {
            config_path: config_path.to_path_buf(),
            run_date: params.run_date.to_string(),
            cadence: params.scope,
            tasks,
        })
    }

    /// Run every instruction file matching `params.config_pattern` in the
    /// base config's directory. Files run sequentially with the configured
    /// delay between them; one file's parse failure never stops the others.
    pub fn run_all(&self, base_config: &Path, params: &RunParams) -> MultiRunReport {
        let run_ts = journal::now_iso8601();
        let config_dir = base_config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let config_paths = discover_configs(&config_dir, &params.config_pattern, base_config);

        let mut report = MultiRunReport {
            status: RunStatus::Ok,
            run_ts,
            config_directory: config_dir,
            inter_config_delay_seconds: params.inter_config_delay_secs,
            configs_total: u32::try_from(config_paths.len()).unwrap_or(u32::MAX),
            configs_failed: 0,
            tasks_total: 0,
            tasks_due: 0,
            tasks_executed: 0,
            tasks_skipped: 0,
            tasks_failed: 0,
            config_runs: Vec::new(),
        };

        let last = config_paths.len().saturating_sub(1);
        for (index, config_path) in config_paths.iter().enumerate() {
            let summary = self.run_file(config_path, params);

            report.tasks_total += summary.tasks_total;
            report.tasks_due += summary.tasks_due;
            report.tasks_executed += summary.tasks_executed;
            report.tasks_skipped += summary.tasks_skipped;
            report.tasks_failed += summary.tasks_failed;
            if summary.status != RunStatus::Ok {
                report.configs_failed += 1;
            }
            report.config_runs.push(summary);

            if params.inter_config_delay_secs > 0 && index < last {
                std::thread::sleep(std::time::Duration::from_secs(
                    params.inter_config_delay_secs,
                ));
            }
        }

        if report.configs_failed > 0 || report.tasks_failed > 0 {
            report.status = RunStatus::PartialError;
        }
        report
    }

    fn load(&self, config_path: &Path) -> Result<InstructionFile, Error> {
        let file = parser::load_instruction_file(config_path)?;
        // An unusable default domain poisons every task that relies on it;
        // treat it as a file-level failure.
        validate_domain(&file.default_domain).map_err(|e| Error::ConfigParseError {
            path: config_path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(file)
    }

    fn execute(
        &self,
        config_path: &Path,
        file: &InstructionFile,
        params: &RunParams,
        run_ts: String,
    ) -> RunSummary {
        let start = Instant::now();
        let stem = config_stem(config_path);
        let journaling = params.journal && !params.dry_run;
        let run_id = journal::generate_run_id();

        if journaling {
            let _ = journal::append_event(
                self.navigator.root(),
                &stem,
                RunEvent::RunStarted {
                    config: config_path.display().to_string(),
                    run_id: run_id.clone(),
                    run_date: params.run_date.to_string(),
                    lode_version: env!("CARGO_PKG_VERSION").to_string(),
                },
            );
        }

        let mut summary = RunSummary {
            status: RunStatus::Ok,
            run_ts,
            run_date: params.run_date.to_string(),
            cadence: params.scope,
            dry_run: params.dry_run,
            config_path: config_path.to_path_buf(),
            tasks_total: u32::try_from(file.tasks.len()).unwrap_or(u32::MAX),
            tasks_due: 0,
            tasks_executed: 0,
            tasks_skipped: 0,
            tasks_failed: 0,
            results: Vec::new(),
            error: None,
        };

        // Due tasks admitted past the cap, planned or dispatched.
        let mut taken = 0u32;

        for task in &file.tasks {
            let decision = match cadence::evaluate(task, params.run_date, params.scope) {
                Ok(d) => d,
                Err(e) => {
                    self.record_failure(&mut summary, &stem, journaling, &task.name, e);
                    continue;
                }
            };

            match decision {
                DueDecision::Skipped { reason } => {
                    summary.tasks_skipped += 1;
                    summary.results.push(TaskRecord::skipped(&task.name, reason));
                    continue;
                }
                DueDecision::Due => summary.tasks_due += 1,
            }

            if params.max_tasks > 0 && taken >= params.max_tasks {
                summary.tasks_skipped += 1;
                summary.results.push(TaskRecord::skipped(
                    &task.name,
                    "max_tasks cap reached".to_string(),
                ));
                continue;
            }

            let resolved = match dispatcher::resolve(task, &file.default_domain) {
                Ok(r) => r,
                Err(e) => {
                    self.record_failure(&mut summary, &stem, journaling, &task.name, e);
                    continue;
                }
            };

            let output_path = match self.navigator.date_path(
                MINE_AREA,
                &resolved.domain,
                params.run_date,
                !params.dry_run,
            ) {
                Ok(p) => p,
                Err(e) => {
                    self.record_failure(&mut summary, &stem, journaling, &task.name, e);
                    continue;
                }
            };

            taken += 1;

            if params.dry_run {
                summary.results.push(TaskRecord {
                    name: resolved.name.clone(),
                    status: TaskStatus::Planned,
                    reason: None,
                    kind: Some(resolved.action.kind().to_string()),
                    domain: Some(resolved.domain.clone()),
                    output_path: Some(output_path),
                    items: None,
                    error: None,
                });
                continue;
            }

            if journaling {
                let _ = journal::append_event(
                    self.navigator.root(),
                    &stem,
                    RunEvent::TaskStarted {
                        name: resolved.name.clone(),
                        kind: resolved.action.kind().to_string(),
                        domain: resolved.domain.clone(),
                    },
                );
            }

            let record = dispatcher::dispatch(&resolved, &output_path, self.collectors);
            summary.tasks_executed += 1;

            if journaling {
                let event = match record.status {
                    TaskStatus::Failed => RunEvent::TaskFailed {
                        name: record.name.clone(),
                        error: record.error.clone().unwrap_or_default(),
                    },
                    _ => RunEvent::TaskSucceeded {
                        name: record.name.clone(),
                        items: record.items.unwrap_or(0),
                        output_path: output_path.display().to_string(),
                    },
                };
                let _ = journal::append_event(self.navigator.root(), &stem, event);
            }

            if record.status == TaskStatus::Failed {
                summary.tasks_failed += 1;
            }
            summary.results.push(record);
        }

        if summary.tasks_failed > 0 {
            summary.status = RunStatus::PartialError;
        }

        if journaling {
            let _ = journal::append_event(
                self.navigator.root(),
                &stem,
                RunEvent::RunCompleted {
                    run_id,
                    tasks_executed: summary.tasks_executed,
                    tasks_skipped: summary.tasks_skipped,
                    tasks_failed: summary.tasks_failed,
                    total_seconds: start.elapsed().as_secs_f64(),
                },
            );
        }

        summary
    }

    fn record_failure(
        &self,
        summary: &mut RunSummary,
        stem: &str,
        journaling: bool,
        name: &str,
        error: Error,
    ) {
        summary.tasks_failed += 1;
        if journaling {
            let _ = journal::append_event(
                self.navigator.root(),
                stem,
                RunEvent::TaskFailed {
                    name: name.to_string(),
                    error: error.to_string(),
                },
            );
        }
        summary.results.push(TaskRecord::failed(name, error.to_string()));
    }
}

fn error_summary(
    config_path: &Path,
    params: &RunParams,
    run_ts: String,
    error: String,
) -> RunSummary {
    RunSummary {
        status: RunStatus::Error,
        run_ts,
        run_date: params.run_date.to_string(),
        cadence: params.scope,
        dry_run: params.dry_run,
        config_path: config_path.to_path_buf(),
        tasks_total: 0,
        tasks_due: 0,
        tasks_executed: 0,
        tasks_skipped: 0,
        tasks_failed: 0,
        results: Vec::new(),
        error: Some(error),
    }
}

fn config_stem(config_path: &Path) -> String {
    config_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string())
}

/// Instruction files matching `pattern` within `config_dir`, sorted by path.
/// The base config is always included even when it escapes the pattern.
/// Duplicate detection resolves both sides, so a base spelled
/// `./x_instructions.json` still matches the glob result for the same file.
fn discover_configs(config_dir: &Path, pattern: &str, base_config: &Path) -> Vec<PathBuf> {
    let full_pattern = config_dir.join(pattern).display().to_string();
    let mut paths: Vec<PathBuf> = glob::glob(&full_pattern)
        .map(|entries| entries.flatten().collect())
        .unwrap_or_default();
    let base_resolved = resolve_for_dedup(base_config);
    if !paths.iter().any(|p| resolve_for_dedup(p) == base_resolved) {
        paths.push(base_config.to_path_buf());
    }
    paths.sort();
    paths
}

/// Canonical form used only for duplicate detection; a path that cannot be
/// canonicalized (e.g. the file does not exist yet) compares as written.
fn resolve_for_dedup(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
