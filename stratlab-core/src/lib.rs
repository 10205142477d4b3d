//! StratLab Core — strategy prompt classification and validation.
//!
//! This crate contains the classification-and-validation core:
//! - Domain types (strategy kinds, assets, risk levels, prompts, records)
//! - Pattern catalog: per-domain matching rules and term substitutions
//! - Signal extractor: text → detections → immutable `StrategyRecord`
//! - Compatibility gate: strict, itemized structural validation
//! - Quality scorer: weighted 0–100 completeness score with recommendations
//!
//! Nothing here performs I/O. Every operation is a pure function of its
//! input and the read-only catalog and rule table.

pub mod catalog;
pub mod domain;
pub mod extract;
pub mod gate;
pub mod quality;

pub use catalog::{Catalog, CatalogBuilder, CatalogError};
pub use domain::{
    AssetKind, ExecutionPriority, Metadata, PromptId, RecordDraft, RecordError, RecordId,
    RiskLevel, StrategyKind, StrategyRecord, UserPrompt,
};
pub use extract::{Detection, Extractor, NumericFields};
pub use gate::{CompatibilityGate, RecordCandidate, RuleTable, ValidationReport, ValidationSchema};
pub use quality::{QualityBand, QualityReport, QualityScorer};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: every public core type can cross threads.
    ///
    /// The runner classifies batches in parallel over shared catalog and
    /// rule-table handles. If any type fails this check, the build breaks.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::StrategyKind>();
        require_sync::<domain::StrategyKind>();
        require_send::<domain::AssetKind>();
        require_sync::<domain::AssetKind>();
        require_send::<domain::RiskLevel>();
        require_sync::<domain::RiskLevel>();
        require_send::<domain::UserPrompt>();
        require_sync::<domain::UserPrompt>();
        require_send::<domain::StrategyRecord>();
        require_sync::<domain::StrategyRecord>();
        require_send::<domain::RecordDraft>();
        require_sync::<domain::RecordDraft>();

        // ID types
        require_send::<domain::PromptId>();
        require_sync::<domain::PromptId>();
        require_send::<domain::RecordId>();
        require_sync::<domain::RecordId>();

        // Catalog and extraction
        require_send::<catalog::Catalog>();
        require_sync::<catalog::Catalog>();
        require_send::<extract::Extractor>();
        require_sync::<extract::Extractor>();
        require_send::<extract::Detection<domain::StrategyKind>>();
        require_sync::<extract::Detection<domain::StrategyKind>>();
        require_send::<extract::AssetDetection>();
        require_sync::<extract::AssetDetection>();

        // Gate and scorer
        require_send::<gate::CompatibilityGate>();
        require_sync::<gate::CompatibilityGate>();
        require_send::<gate::RuleTable>();
        require_sync::<gate::RuleTable>();
        require_send::<gate::ValidationReport>();
        require_sync::<gate::ValidationReport>();
        require_send::<quality::QualityScorer>();
        require_sync::<quality::QualityScorer>();
        require_send::<quality::QualityReport>();
        require_sync::<quality::QualityReport>();
    }

    /// Architecture contract: the gate and the scorer see only the record.
    ///
    /// Neither takes raw text or a catalog, so they cannot depend on how the
    /// record was produced.
    #[test]
    fn gate_and_scorer_take_only_the_record() {
        fn _check(
            gate: &CompatibilityGate,
            scorer: &QualityScorer,
            record: &StrategyRecord,
        ) -> (ValidationReport, QualityReport) {
            (gate.validate_record(record), scorer.assess(record))
        }
    }
}
