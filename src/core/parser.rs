//! Instruction file loading and validation.
//!
//! Loading is strict (malformed JSON aborts that file's run); validation is a
//! lint pass that reports every finding without stopping at the first, so
//! `lode validate` can show the whole picture at once.

use super::error::Error;
use super::navigator::validate_domain;
use super::types::{InstructionFile, TaskSpec};
use std::path::Path;

/// A single validation finding.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Load an instruction file from disk.
pub fn load_instruction_file(path: &Path) -> Result<InstructionFile, Error> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_instructions(&content).map_err(|message| Error::ConfigParseError {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse an instruction file from a JSON string.
pub fn parse_instructions(json: &str) -> Result<InstructionFile, String> {
    serde_json::from_str(json).map_err(|e| format!("JSON parse error: {}", e))
}

/// Validate a parsed instruction file. Returns a list of findings
/// (empty = valid).
pub fn validate_instructions(file: &InstructionFile) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(e) = validate_domain(&file.default_domain) {
        errors.push(ValidationError {
            message: format!("default_domain: {}", e),
        });
    }

    for (index, task) in file.tasks.iter().enumerate() {
        validate_task(task, index, &mut errors);
    }

    errors
}

fn validate_task(task: &TaskSpec, index: usize, errors: &mut Vec<ValidationError>) {
    let label = format!("task {} ('{}')", index + 1, task.name);

    if task.name.trim().is_empty() {
        errors.push(ValidationError {
            message: format!("task {}: name must not be empty", index + 1),
        });
    }

    if let Some(ref domain) = task.domain {
        if let Err(e) = validate_domain(domain) {
            errors.push(ValidationError {
                message: format!("{}: {}", label, e),
            });
        }
    }

    match task.cadence.trim().to_ascii_lowercase().as_str() {
        "daily" => {}
        "monthly" => match task.day_of_month {
            None => errors.push(ValidationError {
                message: format!("{}: monthly cadence requires day_of_month", label),
            }),
            Some(day) if !(1..=31).contains(&day) => errors.push(ValidationError {
                message: format!("{}: day_of_month {} outside 1-31", label, day),
            }),
            Some(_) => {}
        },
        other => errors.push(ValidationError {
            message: format!(
                "{}: cadence must be 'daily' or 'monthly', got '{}'",
                label, other
            ),
        }),
    }

    match task.kind.trim() {
        "search" => {
            if task.query.as_deref().map_or(true, |q| q.trim().is_empty()) {
                errors.push(ValidationError {
                    message: format!("{}: search task has no query", label),
                });
            }
        }
        "page-text" => {
            if task.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                errors.push(ValidationError {
                    message: format!("{}: page-text task has no url", label),
                });
            }
        }
        other => errors.push(ValidationError {
            message: format!("{}: unknown task type '{}'", label, other),
        }),
    }
}
