//! StratLab Runner — pipeline orchestration, configuration, persistence.
//!
//! This crate builds on `stratlab-core` to provide:
//! - Layered configuration (defaults, TOML file, `STRATLAB_*` environment)
//! - Extract → transform → load pipeline with single and batch entry points
//! - JSONL prompt history with listing, search, deletion and stats
//! - CSV export of classified records
//! - Text and JSON rendering of combined reports

pub mod config;
pub mod export;
pub mod history;
pub mod pipeline;
pub mod report;

pub use config::{ConfigError, LimitsConfig, PatternsConfig, PipelineConfig, StorageConfig};
pub use export::{export_records_csv, records_to_csv, ExportError};
pub use history::{HistoryError, HistoryStats, HistorySummary, PromptHistory, ResultEntry};
pub use pipeline::{Pipeline, PipelineError, PipelineResult, Staged};
pub use report::{render_json, render_text};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn pipeline_is_send_sync() {
        assert_send::<Pipeline>();
        assert_sync::<Pipeline>();
    }

    #[test]
    fn pipeline_result_is_send_sync() {
        assert_send::<PipelineResult>();
        assert_sync::<PipelineResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
        assert_send::<LimitsConfig>();
        assert_sync::<LimitsConfig>();
    }

    #[test]
    fn history_types_are_send_sync() {
        assert_send::<PromptHistory>();
        assert_sync::<PromptHistory>();
        assert_send::<HistoryStats>();
        assert_sync::<HistoryStats>();
        assert_send::<ResultEntry>();
        assert_sync::<ResultEntry>();
    }
}
