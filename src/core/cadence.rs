//! Cadence resolution — is a task due on a given run date?

use super::error::Error;
use super::types::{CadenceScope, TaskSpec};
use chrono::{Datelike, NaiveDate};

/// Outcome of evaluating one task against a run date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueDecision {
    Due,
    Skipped { reason: String },
}

impl DueDecision {
    pub fn is_due(&self) -> bool {
        matches!(self, DueDecision::Due)
    }

    fn skipped(reason: impl Into<String>) -> Self {
        DueDecision::Skipped {
            reason: reason.into(),
        }
    }
}

/// Decide whether `task` is due on `run_date` under the given cadence scope.
///
/// The disabled check comes first and short-circuits everything, including
/// cadence validation — a disabled task is never due and never an error.
/// A monthly task whose day-of-month does not occur in the run month (e.g.
/// 31 in February) is simply skipped; no makeup execution is scheduled.
pub fn evaluate(
    task: &TaskSpec,
    run_date: NaiveDate,
    scope: CadenceScope,
) -> Result<DueDecision, Error> {
    if !task.enabled {
        return Ok(DueDecision::skipped("disabled"));
    }

    let cadence = task.cadence.trim().to_ascii_lowercase();
    match cadence.as_str() {
        "daily" => {
            if scope == CadenceScope::Monthly {
                return Ok(DueDecision::skipped("filtered by cadence=monthly"));
            }
            Ok(DueDecision::Due)
        }
        "monthly" => {
            // Scope filtering precedes day validation: a monthly task the
            // run is not considering is filtered, not failed, even when its
            // day_of_month is broken.
            if scope == CadenceScope::Daily {
                return Ok(DueDecision::skipped("filtered by cadence=daily"));
            }
            let day = task.day_of_month.ok_or_else(|| {
                Error::CadenceConfigInvalid(format!(
                    "task '{}' is monthly but has no day_of_month",
                    task.name
                ))
            })?;
            if !(1..=31).contains(&day) {
                return Err(Error::CadenceConfigInvalid(format!(
                    "task '{}' has day_of_month {} outside 1-31",
                    task.name, day
                )));
            }
            if i64::from(run_date.day()) != day {
                return Ok(DueDecision::skipped(format!(
                    "monthly task due on day {}",
                    day
                )));
            }
            Ok(DueDecision::Due)
        }
        other => Err(Error::CadenceConfigInvalid(format!(
            "task '{}' has unsupported cadence '{}'",
            task.name, other
        ))),
    }
}
