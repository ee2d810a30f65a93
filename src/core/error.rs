//! Error taxonomy shared across the core.
//!
//! Task-level errors (`CadenceConfigInvalid`, `UnknownTaskType`,
//! `CollaboratorFailure`, …) are recorded against the failing task and never
//! abort sibling tasks. File-level errors (`ConfigParseError`) abort only the
//! instruction file that raised them.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Timeframe expression rejected; names the offending segment.
    InvalidTimeframe { segment: String, reason: String },

    /// Domain failed the alphabetic-only check.
    DomainInvalid(String),

    /// Filesystem denied creation or write access under the datastore.
    PathUnwritable { path: PathBuf, reason: String },

    /// Monthly task without a usable day-of-month, or an unknown cadence.
    CadenceConfigInvalid(String),

    /// Task type string has no mapped collector.
    UnknownTaskType(String),

    /// Task is missing or misusing a type-specific parameter.
    TaskInvalid { task: String, message: String },

    /// Instruction file could not be read or parsed.
    ConfigParseError { path: PathBuf, message: String },

    /// An external collector reported failure.
    CollaboratorFailure { task: String, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimeframe { segment, reason } => {
                write!(f, "invalid timeframe segment '{}': {}", segment, reason)
            }
            Self::DomainInvalid(domain) => write!(
                f,
                "invalid domain '{}': must be alphabetic only (A-Z, a-z)",
                domain
            ),
            Self::PathUnwritable { path, reason } => {
                write!(f, "cannot write {}: {}", path.display(), reason)
            }
            Self::CadenceConfigInvalid(msg) => write!(f, "invalid cadence config: {}", msg),
            Self::UnknownTaskType(kind) => write!(f, "unknown task type '{}'", kind),
            Self::TaskInvalid { task, message } => {
                write!(f, "invalid task '{}': {}", task, message)
            }
            Self::ConfigParseError { path, message } => {
                write!(f, "cannot load {}: {}", path.display(), message)
            }
            Self::CollaboratorFailure { task, message } => {
                write!(f, "collector failed for task '{}': {}", task, message)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_segment() {
        let e = Error::InvalidTimeframe {
            segment: "13".to_string(),
            reason: "month must be in range 01-12".to_string(),
        };
        assert!(e.to_string().contains("'13'"));
        assert!(e.to_string().contains("01-12"));
    }

    #[test]
    fn test_display_domain() {
        let e = Error::DomainInvalid("bad-domain".to_string());
        assert!(e.to_string().contains("bad-domain"));
        assert!(e.to_string().contains("alphabetic"));
    }

    #[test]
    fn test_display_config_parse() {
        let e = Error::ConfigParseError {
            path: PathBuf::from("/tmp/instructions.json"),
            message: "expected value".to_string(),
        };
        assert!(e.to_string().contains("/tmp/instructions.json"));
    }
}
