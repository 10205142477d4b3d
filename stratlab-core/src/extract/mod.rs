//! Signal extraction — free-form text to a [`StrategyRecord`].
//!
//! Pipeline for one prompt:
//! 1. `normalize` (lowercase, collapse whitespace)
//! 2. `detect_category` for strategy kind and risk level (best variant wins)
//! 3. `detect_assets` (every variant with at least one match)
//! 4. `extract_numbers` for target rate and duration
//! 5. `build_notes`, then `classify` assembles the record
//!
//! Every step is a pure function of the input text and the catalog. No input,
//! including the empty string, fails: each domain has a fixed fallback.

pub mod numbers;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, PatternSet};
use crate::domain::{AssetKind, PromptId, RecordDraft, RiskLevel, StrategyKind, StrategyRecord};

pub use numbers::{extract_numbers, NumericFields};

// ─── Categories ──────────────────────────────────────────────────────

/// A closed enumeration the extractor can detect from text.
pub trait Category: Copy + PartialEq + fmt::Display + Send + Sync + 'static {
    const DOMAIN: &'static str;
    /// Returned when no variant matches.
    const FALLBACK: Self;
    const FALLBACK_CONFIDENCE: f64;

    fn patterns(catalog: &Catalog) -> &PatternSet<Self>;
}

impl Category for StrategyKind {
    const DOMAIN: &'static str = "strategy";
    const FALLBACK: Self = StrategyKind::YieldFarming;
    const FALLBACK_CONFIDENCE: f64 = 0.3;

    fn patterns(catalog: &Catalog) -> &PatternSet<Self> {
        catalog.strategies()
    }
}

impl Category for AssetKind {
    const DOMAIN: &'static str = "asset";
    const FALLBACK: Self = AssetKind::Near;
    const FALLBACK_CONFIDENCE: f64 = 0.2;

    fn patterns(catalog: &Catalog) -> &PatternSet<Self> {
        catalog.assets()
    }
}

impl Category for RiskLevel {
    const DOMAIN: &'static str = "risk";
    const FALLBACK: Self = RiskLevel::Medium;
    const FALLBACK_CONFIDENCE: f64 = 0.0;

    fn patterns(catalog: &Catalog) -> &PatternSet<Self> {
        catalog.risks()
    }
}

/// A detected variant and how strongly the text supports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection<K> {
    pub value: K,
    pub confidence: f64,
}

impl<K: Category> Detection<K> {
    pub fn fallback() -> Self {
        Self { value: K::FALLBACK, confidence: K::FALLBACK_CONFIDENCE }
    }

    pub fn is_fallback(&self) -> bool {
        self.value == K::FALLBACK && self.confidence == K::FALLBACK_CONFIDENCE
    }
}

/// All assets found in a prompt, in catalog order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetection {
    pub assets: Vec<AssetKind>,
    pub confidence: f64,
}

impl AssetDetection {
    pub fn primary(&self) -> AssetKind {
        self.assets.first().copied().unwrap_or(AssetKind::FALLBACK)
    }

    pub fn secondary(&self) -> &[AssetKind] {
        self.assets.get(1..).unwrap_or_default()
    }
}

/// Everything detected in one prompt, used to render notes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectedItems {
    pub strategy_kind: Option<StrategyKind>,
    pub assets: Vec<AssetKind>,
    pub risk_level: Option<RiskLevel>,
    pub target_rate: Option<f64>,
    pub duration_days: Option<u32>,
}

// ─── Free functions ──────────────────────────────────────────────────

/// Lowercase and collapse whitespace runs to single spaces. Idempotent.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One note per populated field, in fixed order.
pub fn build_notes(items: &DetectedItems) -> Vec<String> {
    let mut notes = Vec::with_capacity(5);
    if let Some(kind) = items.strategy_kind {
        notes.push(format!("Detected strategy type: {kind}"));
    }
    if !items.assets.is_empty() {
        let names: Vec<&str> = items.assets.iter().map(|a| a.as_str()).collect();
        notes.push(format!("Detected assets: {}", names.join(", ")));
    }
    if let Some(risk) = items.risk_level {
        notes.push(format!("Detected risk level: {risk}"));
    }
    if let Some(rate) = items.target_rate {
        notes.push(format!("Extracted target APY: {rate:?}%"));
    }
    if let Some(days) = items.duration_days {
        notes.push(format!("Extracted duration: {days} days"));
    }
    notes
}

// ─── Extractor ───────────────────────────────────────────────────────

/// Catalog-backed detector. Cheap to clone; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Extractor {
    catalog: Arc<Catalog>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}

impl Extractor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Best-scoring variant of domain `K`.
    ///
    /// Score = matching rules / total rules for the variant, capped at 1.0.
    /// Only a strictly higher score replaces the current best, so ties go to
    /// the variant declared first.
    pub fn detect_category<K: Category>(&self, text: &str) -> Detection<K> {
        let normalized = normalize(text);
        let mut best: Option<Detection<K>> = None;

        for entry in K::patterns(&self.catalog).entries() {
            let matches = entry.match_count(&normalized);
            if matches == 0 {
                continue;
            }
            let score = (matches as f64 / entry.rule_count() as f64).min(1.0);
            if best.map_or(true, |b| score > b.confidence) {
                best = Some(Detection { value: entry.kind, confidence: score });
            }
        }

        let detection = best.unwrap_or_else(Detection::fallback);
        debug!(
            domain = K::DOMAIN,
            value = %detection.value,
            confidence = detection.confidence,
            "category detected"
        );
        detection
    }

    pub fn detect_strategy(&self, text: &str) -> Detection<StrategyKind> {
        self.detect_category(text)
    }

    pub fn detect_risk(&self, text: &str) -> Detection<RiskLevel> {
        self.detect_category(text)
    }

    /// Every asset with at least one matching rule.
    ///
    /// Confidence = total matches / distinct assets detected, capped at 1.0.
    pub fn detect_assets(&self, text: &str) -> AssetDetection {
        let normalized = normalize(text);
        let mut assets = Vec::new();
        let mut total_matches = 0usize;

        for entry in self.catalog.assets().entries() {
            let matches = entry.match_count(&normalized);
            if matches > 0 {
                assets.push(entry.kind);
                total_matches += matches;
            }
        }

        let detection = if assets.is_empty() {
            AssetDetection {
                assets: vec![AssetKind::FALLBACK],
                confidence: AssetKind::FALLBACK_CONFIDENCE,
            }
        } else {
            let confidence = (total_matches as f64 / assets.len() as f64).min(1.0);
            AssetDetection { assets, confidence }
        };
        debug!(
            domain = AssetKind::DOMAIN,
            count = detection.assets.len(),
            confidence = detection.confidence,
            "assets detected"
        );
        detection
    }

    pub fn extract_numbers(&self, text: &str) -> NumericFields {
        extract_numbers(text)
    }

    /// Replace generic phrases with their protocol-specific forms.
    pub fn substitute_terms(&self, text: &str) -> String {
        self.catalog.terms().apply(text)
    }

    /// Run every detector and assemble an immutable record.
    pub fn classify(&self, text: &str, source_id: PromptId) -> StrategyRecord {
        let strategy = self.detect_strategy(text);
        let assets = self.detect_assets(text);
        let risk = self.detect_risk(text);
        let numbers = self.extract_numbers(text);

        let confidence =
            ((strategy.confidence + assets.confidence + risk.confidence) / 3.0).clamp(0.0, 1.0);

        let notes = build_notes(&DetectedItems {
            strategy_kind: Some(strategy.value),
            assets: assets.assets.clone(),
            risk_level: Some(risk.value),
            target_rate: numbers.target_rate,
            duration_days: numbers.duration_days,
        });

        let draft =
            RecordDraft::new(source_id, strategy.value, assets.primary(), risk.value, confidence)
                .with_secondary_assets(assets.secondary().to_vec())
                .with_target_rate(numbers.target_rate)
                .with_duration_days(numbers.duration_days)
                .with_notes(notes);

        match draft.finish() {
            Ok(record) => record,
            // Every detector caps at 1.0 and the mean is clamped, so this arm
            // is unreachable for any input text.
            Err(err) => unreachable!("classifier produced an invalid record: {err}"),
        }
    }
}
