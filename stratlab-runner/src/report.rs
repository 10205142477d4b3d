//! Combined report rendering for a processed prompt.
//!
//! Two forms:
//! - **Text**: sectioned, human-readable summary for the terminal
//! - **JSON**: the full [`PipelineResult`], pretty-printed

use std::fmt::Write as _;

use stratlab_core::domain::StrategyRecord;
use stratlab_core::gate::ValidationReport;
use stratlab_core::quality::QualityReport;

use crate::history::{HistoryStats, HistorySummary};
use crate::pipeline::PipelineResult;

pub fn render_json(result: &PipelineResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Render the record, validation and quality sections plus any errors and warnings.
pub fn render_text(result: &PipelineResult) -> String {
    let mut out = String::with_capacity(1024);

    let status = if result.success { "OK" } else { "FAILED" };
    let _ = writeln!(out, "Prompt {} [{status}] in {:.1} ms", result.prompt.id, result.processing_ms);
    let _ = writeln!(out, "Mapped: {}", result.mapped_text);
    out.push('\n');

    out.push_str(&render_record(&result.record));
    out.push('\n');
    out.push_str(&render_validation(&result.validation));
    out.push('\n');
    out.push_str(&render_quality(&result.quality));

    if !result.warnings.is_empty() {
        out.push_str("\nWarnings\n");
        for w in &result.warnings {
            let _ = writeln!(out, "  ! {w}");
        }
    }
    if !result.errors.is_empty() {
        out.push_str("\nErrors\n");
        for e in &result.errors {
            let _ = writeln!(out, "  x {e}");
        }
    }
    out
}

pub fn render_record(record: &StrategyRecord) -> String {
    let mut out = String::from("Strategy Record\n");
    let secondary: Vec<&str> = record.secondary_assets().iter().map(|a| a.as_str()).collect();
    let rows = [
        ("Strategy", record.strategy_kind().to_string()),
        ("Primary asset", record.primary_asset().to_string()),
        ("Secondary", if secondary.is_empty() { "-".into() } else { secondary.join(", ") }),
        ("Risk", record.risk_level().to_string()),
        ("Target APY", record.target_rate().map_or("-".into(), |r| format!("{r}%"))),
        ("Duration", record.duration_days().map_or("-".into(), |d| format!("{d} days"))),
        ("Priority", record.execution_priority().to_string()),
        ("Auto-compound", record.auto_compound().to_string()),
        ("Confidence", format!("{:.2}", record.confidence())),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<14} {value}");
    }
    for note in record.notes() {
        let _ = writeln!(out, "  - {note}");
    }
    out
}

pub fn render_validation(report: &ValidationReport) -> String {
    if report.is_valid {
        return "Validation: passed\n".to_string();
    }
    let mut out = format!("Validation: {} error(s)\n", report.errors.len());
    for e in &report.errors {
        let _ = writeln!(out, "  - {e}");
    }
    out
}

pub fn render_quality(report: &QualityReport) -> String {
    let mut out = format!("Quality: {}/{} ({})\n", report.score, report.max_score, report.band);
    for r in &report.recommendations {
        let _ = writeln!(out, "  * {r}");
    }
    out
}

/// One line per stored prompt: id, timestamp, user and preview.
pub fn render_history(rows: &[HistorySummary]) -> String {
    if rows.is_empty() {
        return "No prompts stored.\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let user = row.user_id.as_deref().unwrap_or("anonymous");
        let _ = writeln!(
            out,
            "{}  {}  {user:<12} {} ({} words)",
            row.id,
            row.captured_at.format("%Y-%m-%d %H:%M:%S"),
            row.preview,
            row.word_count
        );
    }
    out
}

pub fn render_stats(stats: &HistoryStats) -> String {
    let mut out = String::from("History\n");
    let _ = writeln!(out, "  prompts        {}", stats.total_prompts);
    let _ = writeln!(out, "    with user    {}", stats.user_prompts);
    let _ = writeln!(out, "    anonymous    {}", stats.anonymous_prompts);
    let _ = writeln!(out, "  records        {}", stats.total_records);
    let _ = writeln!(
        out,
        "  results        {} ({} successful)",
        stats.total_results, stats.successful_results
    );
    if let Some(mean) = stats.mean_confidence {
        let _ = writeln!(out, "  confidence     {mean:.2} mean");
    }
    for (strategy, count) in &stats.records_by_strategy {
        let _ = writeln!(out, "  {strategy:<14} {count}");
    }
    let _ = writeln!(out, "  size           {} bytes", stats.size_bytes);
    out
}
