//! Compatibility gate — strict pass/fail check of a record's structure.
//!
//! Checks run in a fixed order and accumulate every error:
//! 1. required fields present (strategy, primary asset, risk, confidence)
//! 2. strategy type known (the only check that stops early)
//! 3. confidence at or above the strategy's minimum
//! 4. primary asset allowed for the strategy
//! 5. each secondary asset allowed for the strategy
//! 6. primary asset in the strategy's required set
//! 7. target rate within [0, 1000] percent
//! 8. duration within [1, 3650] days
//! 9. protocol identifier is the supported one
//! 10. agent-compatible flag set
//!
//! The gate sees a [`RecordCandidate`], a loosely-typed view, so records read
//! back from storage or sent by another process can be checked even when they
//! are missing fields or name an unknown strategy.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::domain::{AssetKind, StrategyKind, StrategyRecord, SUPPORTED_PROTOCOL};

pub const TARGET_RATE_RANGE: (f64, f64) = (0.0, 1000.0);
pub const DURATION_DAYS_RANGE: (i64, i64) = (1, 3650);
pub const CONFIDENCE_RANGE: (f64, f64) = (0.0, 1.0);

/// Fields every candidate must carry, in check order.
pub const REQUIRED_FIELDS: [&str; 4] = ["strategy_type", "primary_asset", "risk_level", "confidence_score"];

// ─── Rule table ──────────────────────────────────────────────────────

/// Asset constraints and confidence floor for one strategy kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRule {
    pub required_assets: Vec<AssetKind>,
    pub optional_assets: Vec<AssetKind>,
    pub min_confidence: f64,
}

impl AssetRule {
    pub fn new(required: &[AssetKind], optional: &[AssetKind], min_confidence: f64) -> Self {
        Self {
            required_assets: required.to_vec(),
            optional_assets: optional.to_vec(),
            min_confidence,
        }
    }

    pub fn is_required(&self, asset: AssetKind) -> bool {
        self.required_assets.contains(&asset)
    }

    /// Required or optional.
    pub fn allows(&self, asset: AssetKind) -> bool {
        self.is_required(asset) || self.optional_assets.contains(&asset)
    }
}

/// Per-strategy rules. Read-only once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleTable {
    rules: Vec<(StrategyKind, AssetRule)>,
}

static BUILTIN_RULES: OnceLock<Arc<RuleTable>> = OnceLock::new();

impl RuleTable {
    pub fn new(rules: Vec<(StrategyKind, AssetRule)>) -> Self {
        Self { rules }
    }

    /// The built-in table, one rule per strategy kind.
    pub fn builtin() -> Arc<RuleTable> {
        BUILTIN_RULES.get_or_init(|| Arc::new(Self::default_rules())).clone()
    }

    fn default_rules() -> Self {
        use AssetKind::*;
        Self::new(vec![
            (StrategyKind::YieldFarming, AssetRule::new(&[Near, Usdc, Usdt], &[Shade, StNear, Linear], 0.4)),
            (StrategyKind::LiquidityProviding, AssetRule::new(&[Near, Usdc], &[Usdt, Dai, Wbtc, Eth], 0.5)),
            (StrategyKind::Staking, AssetRule::new(&[Near], &[StNear, Shade], 0.6)),
            (StrategyKind::Lending, AssetRule::new(&[Near, Usdc, Usdt], &[Dai, Wbtc, Eth], 0.5)),
            (StrategyKind::Borrowing, AssetRule::new(&[Near, Usdc], &[Usdt, Dai], 0.6)),
            (StrategyKind::Swapping, AssetRule::new(&[Near], &[Usdc, Usdt, Dai, Wbtc, Eth], 0.4)),
            (StrategyKind::Arbitrage, AssetRule::new(&[Near, Usdc], &[Usdt, Dai, Wbtc, Eth], 0.7)),
            (StrategyKind::Compounding, AssetRule::new(&[Near, Usdc], &[Usdt, Shade, StNear], 0.5)),
        ])
    }

    pub fn get(&self, kind: StrategyKind) -> Option<&AssetRule> {
        self.rules.iter().find(|(k, _)| *k == kind).map(|(_, rule)| rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrategyKind, &AssetRule)> {
        self.rules.iter().map(|(k, rule)| (*k, rule))
    }
}

// ─── Candidate ───────────────────────────────────────────────────────

/// Record fields as they arrive for validation. Nothing is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCandidate {
    #[serde(default)]
    pub strategy_type: Option<String>,
    #[serde(default)]
    pub primary_asset: Option<String>,
    #[serde(default)]
    pub secondary_assets: Vec<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub target_rate: Option<f64>,
    #[serde(default)]
    pub duration_days: Option<i64>,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub agent_compatible: bool,
}

impl From<&StrategyRecord> for RecordCandidate {
    fn from(record: &StrategyRecord) -> Self {
        Self {
            strategy_type: Some(record.strategy_kind().as_str().to_string()),
            primary_asset: Some(record.primary_asset().as_str().to_string()),
            secondary_assets: record
                .secondary_assets()
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            risk_level: Some(record.risk_level().as_str().to_string()),
            confidence_score: Some(record.confidence()),
            target_rate: record.target_rate(),
            duration_days: record.duration_days().map(i64::from),
            protocol: record.protocol().to_string(),
            agent_compatible: record.agent_compatible(),
        }
    }
}

// ─── Reports ─────────────────────────────────────────────────────────

/// Gate outcome. `is_valid` holds exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self { is_valid: errors.is_empty(), errors }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRuleSchema {
    pub required_assets: Vec<String>,
    pub optional_assets: Vec<String>,
    pub min_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSchema {
    pub target_rate_range: [f64; 2],
    pub duration_days_range: [i64; 2],
    pub confidence_score_range: [f64; 2],
}

/// Machine-readable description of everything the gate checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSchema {
    pub required_fields: Vec<String>,
    pub protocol: String,
    pub strategy_combinations: BTreeMap<String, StrategyRuleSchema>,
    pub constraints: ConstraintSchema,
}

// ─── Gate ────────────────────────────────────────────────────────────

fn asset_names(assets: &[AssetKind]) -> Vec<String> {
    assets.iter().map(|a| a.as_str().to_string()).collect()
}

fn parse_asset(name: &str) -> Option<AssetKind> {
    name.parse().ok()
}

#[derive(Debug, Clone)]
pub struct CompatibilityGate {
    rules: Arc<RuleTable>,
}

impl Default for CompatibilityGate {
    fn default() -> Self {
        Self::new(RuleTable::builtin())
    }
}

impl CompatibilityGate {
    pub fn new(rules: Arc<RuleTable>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn validate_record(&self, record: &StrategyRecord) -> ValidationReport {
        self.validate(&RecordCandidate::from(record))
    }

    pub fn validate(&self, candidate: &RecordCandidate) -> ValidationReport {
        let mut errors = Vec::new();

        // 1. Required fields
        let present = [
            candidate.strategy_type.is_some(),
            candidate.primary_asset.is_some(),
            candidate.risk_level.is_some(),
            candidate.confidence_score.is_some(),
        ];
        for (field, ok) in REQUIRED_FIELDS.iter().zip(present) {
            if !ok {
                errors.push(format!("Missing required field: {field}"));
            }
        }

        // 2. Strategy type (early exit: nothing below works without a rule)
        let strategy_name = candidate.strategy_type.as_deref();
        let rule = strategy_name
            .and_then(|name| name.parse::<StrategyKind>().ok())
            .and_then(|kind| self.rules.get(kind).map(|rule| (kind, rule)));
        let Some((strategy, rule)) = rule else {
            errors.push(format!("Invalid strategy type: {}", strategy_name.unwrap_or("none")));
            return ValidationReport::from_errors(errors);
        };

        // 3. Confidence floor
        if let Some(confidence) = candidate.confidence_score {
            if confidence < rule.min_confidence {
                errors.push(format!(
                    "Confidence score {confidence:.2} below minimum {} for {strategy}",
                    rule.min_confidence
                ));
            }
        }

        let primary = candidate.primary_asset.as_deref();

        // 4. Primary asset allowed
        if let Some(name) = primary {
            if !parse_asset(name).is_some_and(|a| rule.allows(a)) {
                errors.push(format!(
                    "Primary asset {name} not compatible with strategy type {strategy}"
                ));
            }
        }

        // 5. Secondary assets allowed
        for name in &candidate.secondary_assets {
            if !parse_asset(name).is_some_and(|a| rule.allows(a)) {
                errors.push(format!(
                    "Secondary asset {name} not compatible with strategy type {strategy}"
                ));
            }
        }

        // 6. Primary asset required
        if !primary.and_then(parse_asset).is_some_and(|a| rule.is_required(a)) {
            errors.push(format!(
                "Strategy {strategy} requires one of: {}",
                asset_names(&rule.required_assets).join(", ")
            ));
        }

        // 7. / 8. Numeric ranges
        if let Some(rate) = candidate.target_rate {
            if !(TARGET_RATE_RANGE.0..=TARGET_RATE_RANGE.1).contains(&rate) {
                errors.push("Target APY must be between 0% and 1000%".to_string());
            }
        }
        if let Some(days) = candidate.duration_days {
            if !(DURATION_DAYS_RANGE.0..=DURATION_DAYS_RANGE.1).contains(&days) {
                errors.push("Duration must be between 1 and 3650 days".to_string());
            }
        }

        // 9. / 10. Fixed invariants
        if candidate.protocol != SUPPORTED_PROTOCOL {
            errors.push(format!(
                "Protocol must be {SUPPORTED_PROTOCOL} for agent compatibility"
            ));
        }
        if !candidate.agent_compatible {
            errors.push("Record must be marked as agent compatible".to_string());
        }

        ValidationReport::from_errors(errors)
    }

    pub fn schema(&self) -> ValidationSchema {
        let strategy_combinations = self
            .rules
            .iter()
            .map(|(kind, rule)| {
                (
                    kind.as_str().to_string(),
                    StrategyRuleSchema {
                        required_assets: asset_names(&rule.required_assets),
                        optional_assets: asset_names(&rule.optional_assets),
                        min_confidence: rule.min_confidence,
                    },
                )
            })
            .collect();

        ValidationSchema {
            required_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            protocol: SUPPORTED_PROTOCOL.to_string(),
            strategy_combinations,
            constraints: ConstraintSchema {
                target_rate_range: [TARGET_RATE_RANGE.0, TARGET_RATE_RANGE.1],
                duration_days_range: [DURATION_DAYS_RANGE.0, DURATION_DAYS_RANGE.1],
                confidence_score_range: [CONFIDENCE_RANGE.0, CONFIDENCE_RANGE.1],
            },
        }
    }
}
