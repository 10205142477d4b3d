//! The structured record produced by classification.
//!
//! A `StrategyRecord` is immutable once built. The only ways to obtain one
//! are `RecordDraft::finish()` and deserialization, and both reject a
//! confidence score outside `[0.0, 1.0]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{PromptId, RecordId};
use super::kinds::{AssetKind, ExecutionPriority, RiskLevel, StrategyKind};

/// The single protocol identifier records are built for.
pub const SUPPORTED_PROTOCOL: &str = "NEAR";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("confidence score {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
}

/// Mutable builder for a [`StrategyRecord`].
///
/// Derived fields (execution priority, auto-compound) are filled by
/// [`RecordDraft::new`] and may be overridden before `finish()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub source_id: PromptId,
    pub strategy_kind: StrategyKind,
    pub primary_asset: AssetKind,
    #[serde(default)]
    pub secondary_assets: Vec<AssetKind>,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub target_rate: Option<f64>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_true")]
    pub agent_compatible: bool,
    #[serde(default)]
    pub execution_priority: ExecutionPriority,
    #[serde(default)]
    pub auto_compound: bool,
    pub confidence: f64,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_protocol() -> String {
    SUPPORTED_PROTOCOL.to_string()
}

fn default_true() -> bool {
    true
}

impl RecordDraft {
    pub fn new(
        source_id: PromptId,
        strategy_kind: StrategyKind,
        primary_asset: AssetKind,
        risk_level: RiskLevel,
        confidence: f64,
    ) -> Self {
        Self {
            id: None,
            source_id,
            strategy_kind,
            primary_asset,
            secondary_assets: Vec::new(),
            risk_level,
            target_rate: None,
            duration_days: None,
            protocol: default_protocol(),
            agent_compatible: true,
            execution_priority: ExecutionPriority::derive(strategy_kind, risk_level),
            auto_compound: strategy_kind.auto_compounds(),
            confidence,
            notes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_secondary_assets(mut self, assets: Vec<AssetKind>) -> Self {
        self.secondary_assets = assets;
        self
    }

    pub fn with_target_rate(mut self, rate: Option<f64>) -> Self {
        self.target_rate = rate;
        self
    }

    pub fn with_duration_days(mut self, days: Option<u32>) -> Self {
        self.duration_days = days;
        self
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Validate the construction invariants and freeze the record.
    pub fn finish(self) -> Result<StrategyRecord, RecordError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(RecordError::ConfidenceOutOfRange(self.confidence));
        }
        let id = self
            .id
            .unwrap_or_else(|| RecordId::derive(&self.source_id, self.created_at));
        Ok(StrategyRecord {
            id,
            source_id: self.source_id,
            strategy_kind: self.strategy_kind,
            primary_asset: self.primary_asset,
            secondary_assets: self.secondary_assets,
            risk_level: self.risk_level,
            target_rate: self.target_rate,
            duration_days: self.duration_days,
            protocol: self.protocol,
            agent_compatible: self.agent_compatible,
            execution_priority: self.execution_priority,
            auto_compound: self.auto_compound,
            confidence: self.confidence,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

/// Classification output for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordDraft")]
pub struct StrategyRecord {
    id: RecordId,
    source_id: PromptId,
    strategy_kind: StrategyKind,
    primary_asset: AssetKind,
    secondary_assets: Vec<AssetKind>,
    risk_level: RiskLevel,
    target_rate: Option<f64>,
    duration_days: Option<u32>,
    protocol: String,
    agent_compatible: bool,
    execution_priority: ExecutionPriority,
    auto_compound: bool,
    confidence: f64,
    notes: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecordDraft> for StrategyRecord {
    type Error = RecordError;

    fn try_from(draft: RecordDraft) -> Result<Self, Self::Error> {
        draft.finish()
    }
}

impl StrategyRecord {
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn source_id(&self) -> &PromptId {
        &self.source_id
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy_kind
    }

    pub fn primary_asset(&self) -> AssetKind {
        self.primary_asset
    }

    pub fn secondary_assets(&self) -> &[AssetKind] {
        &self.secondary_assets
    }

    /// Primary asset followed by the secondary assets, in detection order.
    pub fn assets(&self) -> impl Iterator<Item = AssetKind> + '_ {
        std::iter::once(self.primary_asset).chain(self.secondary_assets.iter().copied())
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn target_rate(&self) -> Option<f64> {
        self.target_rate
    }

    pub fn duration_days(&self) -> Option<u32> {
        self.duration_days
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn agent_compatible(&self) -> bool {
        self.agent_compatible
    }

    pub fn execution_priority(&self) -> ExecutionPriority {
        self.execution_priority
    }

    pub fn auto_compound(&self) -> bool {
        self.auto_compound
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reopen the record as a draft, e.g. to derive a variant in tests or
    /// re-tag a stored record. The copy keeps the original ID.
    pub fn to_draft(&self) -> RecordDraft {
        RecordDraft {
            id: Some(self.id.clone()),
            source_id: self.source_id.clone(),
            strategy_kind: self.strategy_kind,
            primary_asset: self.primary_asset,
            secondary_assets: self.secondary_assets.clone(),
            risk_level: self.risk_level,
            target_rate: self.target_rate,
            duration_days: self.duration_days,
            protocol: self.protocol.clone(),
            agent_compatible: self.agent_compatible,
            execution_priority: self.execution_priority,
            auto_compound: self.auto_compound,
            confidence: self.confidence,
            notes: self.notes.clone(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(confidence: f64) -> RecordDraft {
        RecordDraft::new(
            PromptId::new("p1"),
            StrategyKind::Staking,
            AssetKind::Near,
            RiskLevel::Low,
            confidence,
        )
    }

    #[test]
    fn confidence_bounds_are_inclusive() {
        assert!(draft(0.0).finish().is_ok());
        assert!(draft(1.0).finish().is_ok());
    }

    #[test]
    fn confidence_out_of_range_rejected() {
        assert_eq!(draft(1.01).finish().unwrap_err(), RecordError::ConfidenceOutOfRange(1.01));
        assert!(draft(-0.1).finish().is_err());
        assert!(draft(f64::NAN).finish().is_err());
    }

    #[test]
    fn derived_fields_follow_strategy_and_risk() {
        let record = draft(0.5).finish().unwrap();
        assert!(record.auto_compound());
        assert_eq!(record.execution_priority(), ExecutionPriority::Normal);
        assert_eq!(record.protocol(), SUPPORTED_PROTOCOL);
        assert!(record.agent_compatible());
    }

    #[test]
    fn deserialization_enforces_confidence() {
        let record = draft(0.5).finish().unwrap();
        let mut value = serde_json::to_value(&record).unwrap();
        let back: StrategyRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, record);

        value["confidence"] = serde_json::json!(1.5);
        assert!(serde_json::from_value::<StrategyRecord>(value).is_err());
    }

    #[test]
    fn fixed_creation_time_gives_stable_id() {
        use chrono::TimeZone;

        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let first = draft(0.5).with_created_at(at).finish().unwrap();
        let second = draft(0.9).with_created_at(at).finish().unwrap();
        assert_eq!(first.created_at(), at);
        assert_eq!(first.id(), second.id());
        assert_eq!(first.id(), &RecordId::derive(&PromptId::new("p1"), at));

        let later = draft(0.5).with_created_at(at + chrono::Duration::seconds(1)).finish().unwrap();
        assert_ne!(later.id(), first.id());
    }

    #[test]
    fn assets_iterates_primary_then_secondary() {
        let record = draft(0.5)
            .with_secondary_assets(vec![AssetKind::StNear, AssetKind::Shade])
            .finish()
            .unwrap();
        let assets: Vec<_> = record.assets().collect();
        assert_eq!(assets, vec![AssetKind::Near, AssetKind::StNear, AssetKind::Shade]);
    }
}
