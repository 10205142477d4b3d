//! Pipeline — extract → transform → load over the classification core.
//!
//! A [`Pipeline`] owns one extractor, gate and scorer plus an optional
//! [`PromptHistory`]. The components are read-only after construction, so a
//! single pipeline can serve a rayon batch without locking.
//!
//! Storage is best-effort: a failed append is logged, reported in
//! [`PipelineResult::errors`], and classification carries on.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use stratlab_core::domain::{Metadata, StrategyRecord, UserPrompt};
use stratlab_core::extract::{normalize, Extractor};
use stratlab_core::gate::{CompatibilityGate, ValidationReport};
use stratlab_core::quality::{QualityReport, QualityScorer};

use crate::config::{ConfigError, LimitsConfig, PipelineConfig};
use crate::history::{HistoryError, PromptHistory, ResultEntry};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Everything one `process` call produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// False when any stage reported an error. Validation failures do not
    /// count; they live in `validation`.
    pub success: bool,
    pub prompt: UserPrompt,
    pub record: StrategyRecord,
    /// Normalized prompt text after term substitution.
    pub mapped_text: String,
    pub validation: ValidationReport,
    pub quality: QualityReport,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub processing_ms: f64,
}

impl PipelineResult {
    fn to_entry(&self) -> ResultEntry {
        ResultEntry {
            prompt_id: self.prompt.id.clone(),
            record_id: Some(self.record.id().clone()),
            success: self.success,
            is_valid: self.validation.is_valid,
            quality_score: Some(self.quality.score),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
            processing_ms: self.processing_ms,
            recorded_at: chrono::Utc::now(),
        }
    }
}

/// Case-insensitive substrings that mark a prompt as DeFi-related.
const DEFI_TERMS: [&str; 11] =
    ["yield", "farm", "liquidity", "stake", "swap", "borrow", "lend", "near", "usdc", "apy", "apr"];

/// Output of one stage. `storage_error` is set when the history append failed;
/// the value is usable either way.
#[derive(Debug)]
pub struct Staged<T> {
    pub value: T,
    pub storage_error: Option<HistoryError>,
}

impl<T> Staged<T> {
    /// The value, or the storage failure when strict persistence is required.
    pub fn into_result(self) -> Result<T, HistoryError> {
        match self.storage_error {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}

pub struct Pipeline {
    extractor: Extractor,
    gate: CompatibilityGate,
    scorer: QualityScorer,
    limits: LimitsConfig,
    history: Option<PromptHistory>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Extractor::default(), LimitsConfig::default())
    }
}

impl Pipeline {
    /// In-memory pipeline; nothing is persisted.
    pub fn new(extractor: Extractor, limits: LimitsConfig) -> Self {
        Self {
            extractor,
            gate: CompatibilityGate::default(),
            scorer: QualityScorer,
            limits,
            history: None,
        }
    }

    pub fn with_history(mut self, history: PromptHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Build from configuration: catalog overrides, limits and storage.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let extractor = Extractor::new(config.catalog()?);
        let pipeline = Self::new(extractor, config.limits.clone());
        if config.storage.enabled {
            let history = PromptHistory::open(&config.storage.dir)?;
            return Ok(pipeline.with_history(history));
        }
        Ok(pipeline)
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn gate(&self) -> &CompatibilityGate {
        &self.gate
    }

    pub fn history(&self) -> Option<&PromptHistory> {
        self.history.as_ref()
    }

    // ─── Stages ──────────────────────────────────────────────────────

    /// Capture a prompt and store it.
    pub fn extract(&self, raw_text: &str, user_id: Option<&str>, metadata: Metadata) -> Staged<UserPrompt> {
        let prompt = UserPrompt::capture(raw_text, user_id.map(String::from), metadata);
        let storage_error = self.store("prompt", |h| h.append_prompt(&prompt));
        Staged { value: prompt, storage_error }
    }

    /// Classify a captured prompt and store the record.
    pub fn transform(&self, prompt: &UserPrompt) -> Staged<StrategyRecord> {
        let record = self.extractor.classify(&prompt.raw_text, prompt.id.clone());
        let storage_error = self.store("record", |h| h.append_record(&record));
        Staged { value: record, storage_error }
    }

    fn store<F>(&self, what: &str, append: F) -> Option<HistoryError>
    where
        F: FnOnce(&PromptHistory) -> Result<(), HistoryError>,
    {
        let history = self.history.as_ref()?;
        let e = append(history).err()?;
        warn!(what, error = %e, "failed to store {what}");
        Some(e)
    }

    /// Input-quality warnings. None of them stops the run.
    fn prompt_warnings(&self, prompt: &UserPrompt) -> Vec<String> {
        let mut warnings = Vec::new();
        let len = prompt.raw_text.chars().count();
        let LimitsConfig { min_prompt_len, max_prompt_len, min_prompt_words, .. } = self.limits;
        if len < min_prompt_len {
            warnings.push(format!("Prompt is shorter than {min_prompt_len} characters ({len})"));
        } else if len > max_prompt_len {
            warnings.push(format!("Prompt is longer than {max_prompt_len} characters ({len})"));
        }

        let words = prompt.word_count();
        if words < min_prompt_words {
            warnings.push(format!("Prompt has fewer than {min_prompt_words} words ({words})"));
        }

        let lowered = prompt.raw_text.to_lowercase();
        if !DEFI_TERMS.iter().any(|term| lowered.contains(term)) {
            warnings.push("No common DeFi terms detected".to_string());
        }
        warnings
    }

    // ─── Full run ────────────────────────────────────────────────────

    /// Run all stages for one prompt and store the outcome.
    pub fn process(&self, raw_text: &str, user_id: Option<&str>, metadata: Metadata) -> PipelineResult {
        let started = Instant::now();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let Staged { value: prompt, storage_error } = self.extract(raw_text, user_id, metadata);
        errors.extend(storage_error.map(|e| format!("Failed to store prompt: {e}")));
        warnings.extend(self.prompt_warnings(&prompt));

        let Staged { value: record, storage_error } = self.transform(&prompt);
        errors.extend(storage_error.map(|e| format!("Failed to store record: {e}")));
        if record.confidence() < self.limits.warn_confidence_below {
            warnings.push(format!("Low confidence score: {:.2}", record.confidence()));
        }

        let mapped_text = self.extractor.substitute_terms(&normalize(&prompt.raw_text));
        let validation = self.gate.validate_record(&record);
        let quality = self.scorer.assess(&record);

        let mut result = PipelineResult {
            success: errors.is_empty(),
            prompt,
            record,
            mapped_text,
            validation,
            quality,
            errors,
            warnings,
            processing_ms: started.elapsed().as_secs_f64() * 1000.0,
        };

        let entry = result.to_entry();
        if let Some(e) = self.store("result", |h| h.append_result(&entry)) {
            result.errors.push(format!("Failed to store result: {e}"));
        }
        result.success = result.errors.is_empty();

        info!(
            prompt = %result.prompt.id,
            strategy = %result.record.strategy_kind(),
            valid = result.validation.is_valid,
            score = result.quality.score,
            "prompt processed"
        );
        result
    }

    /// Process many prompts in parallel. Output order follows input order.
    pub fn process_batch(&self, prompts: &[String], user_id: Option<&str>) -> Vec<PipelineResult> {
        prompts
            .par_iter()
            .map(|text| self.process(text, user_id, Metadata::new()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_prompt_warns_but_succeeds() {
        let result = Pipeline::default().process("stake", None, Metadata::new());
        assert!(result.success);
        assert!(result.warnings.iter().any(|w| w.starts_with("Prompt is shorter than 10")));
    }

    #[test]
    fn low_confidence_warning_uses_two_decimals() {
        let result = Pipeline::default().process("do something with my coins", None, Metadata::new());
        assert!(result.warnings.contains(&"Low confidence score: 0.17".to_string()));
    }

    #[test]
    fn threshold_is_configurable() {
        let limits = LimitsConfig { warn_confidence_below: 0.0, ..LimitsConfig::default() };
        let pipeline = Pipeline::new(Extractor::default(), limits);
        let result = pipeline.process("do something with my coins", None, Metadata::new());
        assert!(!result.warnings.iter().any(|w| w.starts_with("Low confidence")));
    }

    #[test]
    fn mapped_text_applies_substitutions() {
        let result =
            Pipeline::default().process("Join a Liquidity  Pool for 30 days", None, Metadata::new());
        assert_eq!(result.mapped_text, "join a NEAR liquidity pool for 30 days");
    }

    #[test]
    fn few_words_and_no_defi_terms_warn() {
        let result = Pipeline::default().process("Grow my savings quickly", None, Metadata::new());
        assert!(!result.warnings.iter().any(|w| w.starts_with("Prompt has fewer")));
        assert!(result.warnings.contains(&"No common DeFi terms detected".to_string()));

        let result = Pipeline::default().process("Stake NEARtokens", None, Metadata::new());
        assert!(result.warnings.contains(&"Prompt has fewer than 3 words (2)".to_string()));
        assert!(!result.warnings.iter().any(|w| w.starts_with("No common DeFi")));
    }

    #[test]
    fn stages_without_history_report_no_storage_error() {
        let pipeline = Pipeline::default();
        let prompt = pipeline.extract("Lend USDC for 30 days", None, Metadata::new());
        assert!(prompt.storage_error.is_none());
        let record = pipeline.transform(&prompt.value).into_result().unwrap();
        assert_eq!(record.source_id(), &prompt.value.id);
    }
}
