//! CSV export of classified records.
//!
//! Columns: record_id, prompt_id, strategy_type, primary_asset,
//! secondary_assets (`|`-joined), risk_level, target_rate, duration_days,
//! confidence_score, execution_priority, auto_compound, created_at.
//! Absent optional values are written as empty cells.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use stratlab_core::domain::StrategyRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV writer: {0}")]
    Flush(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub const RECORD_COLUMNS: [&str; 12] = [
    "record_id",
    "prompt_id",
    "strategy_type",
    "primary_asset",
    "secondary_assets",
    "risk_level",
    "target_rate",
    "duration_days",
    "confidence_score",
    "execution_priority",
    "auto_compound",
    "created_at",
];

/// Render records as CSV text with a header row.
pub fn records_to_csv(records: &[StrategyRecord]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(RECORD_COLUMNS)?;

    for r in records {
        let secondary: Vec<&str> = r.secondary_assets().iter().map(|a| a.as_str()).collect();
        let secondary = secondary.join("|");
        let rate = r.target_rate().map(|v| format!("{v:.2}")).unwrap_or_default();
        let days = r.duration_days().map(|d| d.to_string()).unwrap_or_default();
        let confidence = format!("{:.4}", r.confidence());
        let created = r.created_at().to_rfc3339();
        let row: [&str; 12] = [
            r.id().as_str(),
            r.source_id().as_str(),
            r.strategy_kind().as_str(),
            r.primary_asset().as_str(),
            &secondary,
            r.risk_level().as_str(),
            &rate,
            &days,
            &confidence,
            r.execution_priority().as_str(),
            if r.auto_compound() { "true" } else { "false" },
            &created,
        ];
        wtr.write_record(row)?;
    }

    let data = wtr.into_inner().map_err(|e| ExportError::Flush(e.to_string()))?;
    String::from_utf8(data).map_err(|e| ExportError::Flush(e.to_string()))
}

/// Write records to `path`, creating parent directories. Returns the row count.
pub fn export_records_csv(records: &[StrategyRecord], path: &Path) -> Result<usize, ExportError> {
    let body = records_to_csv(records)?;
    let write_err = |source| ExportError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, body).map_err(write_err)?;
    Ok(records.len())
}
