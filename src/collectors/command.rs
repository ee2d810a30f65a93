//! External-program collectors.
//!
//! Each task type maps to one configured executable. The program receives the
//! domain, its task parameters, and the resolved output directory; it prints
//! a JSON object as its final stdout line (`{"count": …, "status": "ok"}`).
//! Spawn failures, non-zero exits, and unparseable output all become error
//! outcomes — never a panic across the dispatch boundary.

use super::{CollectorOutcome, Collectors, PageTextRequest, SearchRequest};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Collectors backed by external command-line programs.
#[derive(Debug, Clone)]
pub struct CommandCollectors {
    search_program: PathBuf,
    page_text_program: PathBuf,
}

impl CommandCollectors {
    pub fn new(search_program: impl Into<PathBuf>, page_text_program: impl Into<PathBuf>) -> Self {
        Self {
            search_program: search_program.into(),
            page_text_program: page_text_program.into(),
        }
    }

    fn run(&self, program: &Path, args: &[String], output_path: &Path) -> CollectorOutcome {
        let spawned = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = match spawned {
            Ok(out) => out,
            Err(e) => {
                return CollectorOutcome::error(
                    output_path.to_path_buf(),
                    format!("failed to spawn {}: {}", program.display(), e),
                );
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let report = parse_trailing_json(&stdout);

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let detail = report
                .as_ref()
                .and_then(|r| r.get("error").and_then(|e| e.as_str()))
                .map(str::to_string)
                .unwrap_or_else(|| stderr.trim().to_string());
            return CollectorOutcome::error(
                output_path.to_path_buf(),
                format!("exit code {}: {}", code, detail),
            );
        }

        let Some(report) = report else {
            return CollectorOutcome::error(
                output_path.to_path_buf(),
                "collector produced no JSON report on stdout",
            );
        };

        if report.get("status").and_then(|s| s.as_str()) == Some("error") {
            let detail = report
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unspecified collector error");
            return CollectorOutcome::error(output_path.to_path_buf(), detail);
        }

        let items = report
            .get("count")
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        CollectorOutcome::ok(items, output_path.to_path_buf())
    }
}

impl Collectors for CommandCollectors {
    fn search(&self, req: &SearchRequest) -> CollectorOutcome {
        let args = vec![
            req.domain.clone(),
            "--query".to_string(),
            req.query.clone(),
            "--max".to_string(),
            req.max_results.to_string(),
            "--out".to_string(),
            req.output_path.display().to_string(),
        ];
        self.run(&self.search_program, &args, &req.output_path)
    }

    fn page_text(&self, req: &PageTextRequest) -> CollectorOutcome {
        let args = vec![
            req.domain.clone(),
            req.url.clone(),
            "--max-links".to_string(),
            req.max_links.to_string(),
            "--words".to_string(),
            req.words.to_string(),
            "--out".to_string(),
            req.output_path.display().to_string(),
        ];
        self.run(&self.page_text_program, &args, &req.output_path)
    }
}

/// Extract the last line of `text` that parses as a JSON object. Collectors
/// are chatty on stdout; only their final report line is contractual.
pub fn parse_trailing_json(text: &str) -> Option<serde_json::Value> {
    for line in text.lines().rev() {
        let line = line.trim();
        if line.starts_with('{') && line.ends_with('}') {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
                return Some(value);
            }
        }
    }
    let whole = text.trim();
    if whole.starts_with('{') {
        return serde_json::from_str(whole).ok();
    }
    None
}
