//! Task resolution and dispatch.
//!
//! A due [`TaskSpec`] is resolved exactly once into a [`TaskDefinition`]
//! (validated domain, closed action variant); dispatch is then an exhaustive
//! match with no stringly-typed routing left. The dispatcher never retries —
//! retry policy belongs to the collector.

use super::error::Error;
use super::navigator::validate_domain;
use super::types::{
    TaskAction, TaskDefinition, TaskRecord, TaskSpec, TaskStatus, DEFAULT_MAX_LINKS,
    DEFAULT_MAX_RESULTS, DEFAULT_WORDS,
};
use crate::collectors::{Collectors, PageTextRequest, SearchRequest};
use std::path::Path;

/// Resolve a raw task against the instruction file's default domain.
/// The task-level domain wins when present.
pub fn resolve(task: &TaskSpec, default_domain: &str) -> Result<TaskDefinition, Error> {
    let domain = validate_domain(task.domain.as_deref().unwrap_or(default_domain))?;

    let action = match task.kind.trim() {
        "search" => {
            let query = task
                .query
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .ok_or_else(|| Error::TaskInvalid {
                    task: task.name.clone(),
                    message: "search task missing 'query'".to_string(),
                })?;
            TaskAction::Search {
                query: query.to_string(),
                max_results: task.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            }
        }
        "page-text" => {
            let url = task
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| Error::TaskInvalid {
                    task: task.name.clone(),
                    message: "page-text task missing 'url'".to_string(),
                })?;
            TaskAction::PageText {
                url: url.to_string(),
                max_links: task.max_links.unwrap_or(DEFAULT_MAX_LINKS),
                words: task.words.unwrap_or(DEFAULT_WORDS),
            }
        }
        other => return Err(Error::UnknownTaskType(other.to_string())),
    };

    Ok(TaskDefinition {
        name: task.name.clone(),
        domain: domain.to_string(),
        action,
    })
}

/// Dispatch a resolved task to its collector and fold the structured outcome
/// into a task record.
pub fn dispatch(
    task: &TaskDefinition,
    output_path: &Path,
    collectors: &dyn Collectors,
) -> TaskRecord {
    let outcome = match &task.action {
        TaskAction::Search { query, max_results } => collectors.search(&SearchRequest {
            query: query.clone(),
            max_results: *max_results,
            domain: task.domain.clone(),
            output_path: output_path.to_path_buf(),
        }),
        TaskAction::PageText {
            url,
            max_links,
            words,
        } => collectors.page_text(&PageTextRequest {
            url: url.clone(),
            max_links: *max_links,
            words: *words,
            domain: task.domain.clone(),
            output_path: output_path.to_path_buf(),
        }),
    };

    let status = if outcome.is_ok() {
        TaskStatus::Succeeded
    } else {
        TaskStatus::Failed
    };
    let error = outcome.error.map(|message| {
        Error::CollaboratorFailure {
            task: task.name.clone(),
            message,
        }
        .to_string()
    });

    TaskRecord {
        name: task.name.clone(),
        status,
        reason: None,
        kind: Some(task.action.kind().to_string()),
        domain: Some(task.domain.clone()),
        output_path: Some(outcome.output_path),
        items: Some(outcome.items),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::CollectorOutcome;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Records requests and replays scripted outcomes.
    pub(crate) struct ScriptedCollectors {
        pub searches: RefCell<Vec<SearchRequest>>,
        pub page_texts: RefCell<Vec<PageTextRequest>>,
        pub fail_matching: Option<String>,
    }

    impl ScriptedCollectors {
        pub fn ok() -> Self {
            Self {
                searches: RefCell::new(Vec::new()),
                page_texts: RefCell::new(Vec::new()),
                fail_matching: None,
            }
        }

        pub fn failing_on(query_fragment: &str) -> Self {
            Self {
                fail_matching: Some(query_fragment.to_string()),
                ..Self::ok()
            }
        }
    }

    impl Collectors for ScriptedCollectors {
        fn search(&self, req: &SearchRequest) -> CollectorOutcome {
            self.searches.borrow_mut().push(req.clone());
            if let Some(ref fragment) = self.fail_matching {
                if req.query.contains(fragment.as_str()) {
                    return CollectorOutcome::error(req.output_path.clone(), "scripted failure");
                }
            }
            CollectorOutcome::ok(3, req.output_path.clone())
        }

        fn page_text(&self, req: &PageTextRequest) -> CollectorOutcome {
            self.page_texts.borrow_mut().push(req.clone());
            CollectorOutcome::ok(2, req.output_path.clone())
        }
    }

    fn spec(json: &str) -> TaskSpec {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_resolve_search() {
        let t = spec(r#"{"name": "s", "type": "search", "query": "markets", "max_results": 4}"#);
        let def = resolve(&t, "News").unwrap();
        assert_eq!(def.domain, "News");
        assert_eq!(
            def.action,
            TaskAction::Search {
                query: "markets".to_string(),
                max_results: 4
            }
        );
    }

    #[test]
    fn test_resolve_task_domain_wins() {
        let t = spec(
            r#"{"name": "s", "type": "search", "query": "q", "domain": "Energy"}"#,
        );
        let def = resolve(&t, "News").unwrap();
        assert_eq!(def.domain, "Energy");
    }

    #[test]
    fn test_resolve_page_text_defaults() {
        let t = spec(r#"{"name": "p", "type": "page-text", "url": "https://example.org"}"#);
        let def = resolve(&t, "News").unwrap();
        assert_eq!(
            def.action,
            TaskAction::PageText {
                url: "https://example.org".to_string(),
                max_links: DEFAULT_MAX_LINKS,
                words: DEFAULT_WORDS,
            }
        );
    }

    #[test]
    fn test_resolve_unknown_type() {
        let t = spec(r#"{"name": "x", "type": "carrier-pigeon"}"#);
        let err = resolve(&t, "News").unwrap_err();
        assert_eq!(err, Error::UnknownTaskType("carrier-pigeon".to_string()));
    }

    #[test]
    fn test_resolve_missing_query() {
        let t = spec(r#"{"name": "s", "type": "search"}"#);
        assert!(resolve(&t, "News").is_err());
        let t = spec(r#"{"name": "s", "type": "search", "query": "   "}"#);
        assert!(resolve(&t, "News").is_err());
    }

    #[test]
    fn test_resolve_invalid_default_domain() {
        let t = spec(r#"{"name": "s", "type": "search", "query": "q"}"#);
        let err = resolve(&t, "general news").unwrap_err();
        assert!(matches!(err, Error::DomainInvalid(_)));
    }

    #[test]
    fn test_dispatch_routes_search() {
        let collectors = ScriptedCollectors::ok();
        let def = TaskDefinition {
            name: "s".to_string(),
            domain: "News".to_string(),
            action: TaskAction::Search {
                query: "markets".to_string(),
                max_results: 4,
            },
        };
        let record = dispatch(&def, Path::new("/tmp/out"), &collectors);
        assert_eq!(record.status, TaskStatus::Succeeded);
        assert_eq!(record.items, Some(3));
        assert_eq!(record.kind.as_deref(), Some("search"));
        assert_eq!(record.output_path, Some(PathBuf::from("/tmp/out")));

        let seen = collectors.searches.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].query, "markets");
        assert_eq!(seen[0].domain, "News");
        assert!(collectors.page_texts.borrow().is_empty());
    }

    #[test]
    fn test_dispatch_routes_page_text() {
        let collectors = ScriptedCollectors::ok();
        let def = TaskDefinition {
            name: "p".to_string(),
            domain: "Energy".to_string(),
            action: TaskAction::PageText {
                url: "https://example.org".to_string(),
                max_links: 2,
                words: 120,
            },
        };
        let record = dispatch(&def, Path::new("/tmp/out"), &collectors);
        assert_eq!(record.status, TaskStatus::Succeeded);
        assert_eq!(collectors.page_texts.borrow().len(), 1);
        assert!(collectors.searches.borrow().is_empty());
    }

    #[test]
    fn test_dispatch_collector_failure_is_failed_record() {
        let collectors = ScriptedCollectors::failing_on("markets");
        let def = TaskDefinition {
            name: "s".to_string(),
            domain: "News".to_string(),
            action: TaskAction::Search {
                query: "markets".to_string(),
                max_results: 4,
            },
        };
        let record = dispatch(&def, Path::new("/tmp/out"), &collectors);
        assert_eq!(record.status, TaskStatus::Failed);
        let err = record.error.unwrap();
        assert!(err.contains("scripted failure"));
        assert!(err.contains("'s'"));
    }
}
