//! Collector interfaces — the boundary between the scheduler core and the
//! external programs that actually fetch content.
//!
//! Collectors return a structured [`CollectorOutcome`] in every case, success
//! or failure; nothing is allowed to unwind past this boundary. Retry policy,
//! if any, lives inside the collector.

pub mod command;

use std::path::PathBuf;

/// A query-based collection request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
    pub domain: String,
    pub output_path: PathBuf,
}

/// A URL-based collection request.
#[derive(Debug, Clone)]
pub struct PageTextRequest {
    pub url: String,
    pub max_links: u32,
    pub words: u32,
    pub domain: String,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStatus {
    Ok,
    Error,
}

/// Structured result from a collector invocation.
#[derive(Debug, Clone)]
pub struct CollectorOutcome {
    /// Search results collected or links processed.
    pub items: u32,
    pub output_path: PathBuf,
    pub status: CollectorStatus,
    pub error: Option<String>,
}

impl CollectorOutcome {
    pub fn ok(items: u32, output_path: PathBuf) -> Self {
        Self {
            items,
            output_path,
            status: CollectorStatus::Ok,
            error: None,
        }
    }

    pub fn error(output_path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            items: 0,
            output_path,
            status: CollectorStatus::Error,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CollectorStatus::Ok
    }
}

/// The pair of collector entry points the dispatcher routes to.
pub trait Collectors {
    fn search(&self, req: &SearchRequest) -> CollectorOutcome;
    fn page_text(&self, req: &PageTextRequest) -> CollectorOutcome;
}
