//! Lode — cadence-scheduled topic mining over a date-partitioned datastore.
//!
//! Declarative instruction files. Deterministic folder addressing.
//! Sequential dispatch to external collectors, with per-task fault isolation.

pub mod cli;
pub mod collectors;
pub mod core;
pub mod journal;
