//! Core scheduling logic — timeframes, navigation, cadence, dispatch,
//! orchestration.

pub mod cadence;
pub mod dispatcher;
pub mod error;
pub mod navigator;
pub mod orchestrator;
pub mod parser;
pub mod timeframe;
pub mod types;
