//! Integration tests for the compatibility gate and quality scorer.
//!
//! Tests:
//! 1. Confidence shortfall reports actual and required values
//! 2. Asset incompatibility names asset and strategy
//! 3. Errors accumulate across checks
//! 4. Candidates read back from JSON with missing or unknown fields
//! 5. Quality scoring on records built by hand and by the extractor

use pretty_assertions::assert_eq;
use stratlab_core::domain::{AssetKind, PromptId, RecordDraft, RiskLevel, StrategyKind};
use stratlab_core::extract::Extractor;
use stratlab_core::gate::{CompatibilityGate, RecordCandidate};
use stratlab_core::quality::{QualityBand, QualityScorer};
use stratlab_core::StrategyRecord;

// ── Helpers ──────────────────────────────────────────────────────────

fn record(strategy: StrategyKind, primary: AssetKind, confidence: f64) -> RecordDraft {
    RecordDraft::new(PromptId::new("p"), strategy, primary, RiskLevel::Medium, confidence)
}

fn build(draft: RecordDraft) -> StrategyRecord {
    draft.finish().expect("valid draft")
}

// ── 1. Confidence ────────────────────────────────────────────────────

#[test]
fn arbitrage_below_threshold_reports_both_values() {
    let report = CompatibilityGate::default()
        .validate_record(&build(record(StrategyKind::Arbitrage, AssetKind::Near, 0.5)));

    assert!(!report.is_valid);
    assert_eq!(report.errors, vec!["Confidence score 0.50 below minimum 0.7 for arbitrage"]);
    assert!(report.errors[0].contains("0.50"));
    assert!(report.errors[0].contains("0.7"));
}

#[test]
fn confidence_at_threshold_passes() {
    let report = CompatibilityGate::default()
        .validate_record(&build(record(StrategyKind::Staking, AssetKind::Near, 0.6)));
    assert!(report.is_valid, "{:?}", report.errors);
}

// ── 2. Assets ────────────────────────────────────────────────────────

#[test]
fn staking_with_wbtc_is_incompatible() {
    let report = CompatibilityGate::default()
        .validate_record(&build(record(StrategyKind::Staking, AssetKind::Wbtc, 0.9)));

    assert!(!report.is_valid);
    let incompatible = report
        .errors
        .iter()
        .find(|e| e.contains("not compatible"))
        .expect("incompatibility error");
    assert!(incompatible.contains("WBTC"));
    assert!(incompatible.contains("staking"));
    assert_eq!(
        report.errors,
        vec![
            "Primary asset WBTC not compatible with strategy type staking",
            "Strategy staking requires one of: NEAR",
        ]
    );
}

#[test]
fn one_error_per_bad_secondary_asset() {
    let draft = record(StrategyKind::Borrowing, AssetKind::Usdc, 0.9).with_secondary_assets(vec![
        AssetKind::Dai,
        AssetKind::Eth,
        AssetKind::Meta,
    ]);
    let report = CompatibilityGate::default().validate_record(&build(draft));
    assert_eq!(
        report.errors,
        vec![
            "Secondary asset ETH not compatible with strategy type borrowing",
            "Secondary asset META not compatible with strategy type borrowing",
        ]
    );
}

// ── 3. Accumulation ──────────────────────────────────────────────────

#[test]
fn every_failing_check_is_reported_in_order() {
    let mut draft = record(StrategyKind::Staking, AssetKind::Eth, 0.1)
        .with_secondary_assets(vec![AssetKind::Usdc])
        .with_target_rate(Some(2500.0))
        .with_duration_days(Some(5000));
    draft.protocol = "SOL".into();
    draft.agent_compatible = false;

    let report = CompatibilityGate::default().validate_record(&build(draft));
    assert_eq!(
        report.errors,
        vec![
            "Confidence score 0.10 below minimum 0.6 for staking",
            "Primary asset ETH not compatible with strategy type staking",
            "Secondary asset USDC not compatible with strategy type staking",
            "Strategy staking requires one of: NEAR",
            "Target APY must be between 0% and 1000%",
            "Duration must be between 1 and 3650 days",
            "Protocol must be NEAR for agent compatibility",
            "Record must be marked as agent compatible",
        ]
    );
}

// ── 4. Loosely-typed candidates ──────────────────────────────────────

#[test]
fn candidate_from_json_with_missing_fields() {
    let candidate: RecordCandidate = serde_json::from_value(serde_json::json!({
        "strategy_type": "lending",
        "secondary_assets": ["USDT"],
        "protocol": "NEAR",
        "agent_compatible": true
    }))
    .unwrap();

    let report = CompatibilityGate::default().validate(&candidate);
    assert_eq!(
        report.errors,
        vec![
            "Missing required field: primary_asset",
            "Missing required field: risk_level",
            "Missing required field: confidence_score",
            "Strategy lending requires one of: NEAR, USDC, USDT",
        ]
    );
}

#[test]
fn candidate_with_negative_duration() {
    let mut candidate = RecordCandidate::from(&build(record(
        StrategyKind::Lending,
        AssetKind::Near,
        0.9,
    )));
    candidate.duration_days = Some(-3);
    assert_eq!(
        CompatibilityGate::default().validate(&candidate).errors,
        vec!["Duration must be between 1 and 3650 days"]
    );
}

#[test]
fn unknown_strategy_name_short_circuits() {
    let candidate: RecordCandidate = serde_json::from_value(serde_json::json!({
        "strategy_type": "flash_loan",
        "primary_asset": "NEAR",
        "risk_level": "high",
        "confidence_score": 0.01
    }))
    .unwrap();
    let report = CompatibilityGate::default().validate(&candidate);
    assert_eq!(report.errors, vec!["Invalid strategy type: flash_loan"]);
}

#[test]
fn candidate_without_strategy_reports_missing_and_invalid() {
    let candidate: RecordCandidate = serde_json::from_value(serde_json::json!({
        "primary_asset": "NEAR",
        "risk_level": "low",
        "confidence_score": 0.9,
        "protocol": "NEAR",
        "agent_compatible": true
    }))
    .unwrap();
    let report = CompatibilityGate::default().validate(&candidate);
    assert!(!report.is_valid);
    assert_eq!(
        report.errors,
        vec!["Missing required field: strategy_type", "Invalid strategy type: none"]
    );
}

// ── 5. Quality ───────────────────────────────────────────────────────

#[test]
fn quality_sums_each_pool() {
    // 20 (confidence) + 15 + 4 (assets) + 15 + 10 (parameters) + 8 (notes)
    let draft = record(StrategyKind::Lending, AssetKind::Near, 0.79)
        .with_secondary_assets(vec![AssetKind::Usdc, AssetKind::Usdt])
        .with_target_rate(Some(8.0))
        .with_duration_days(Some(30))
        .with_notes(vec!["a".into(), "b".into()]);
    let report = QualityScorer.assess(&build(draft));

    assert_eq!(report.score, 72);
    assert_eq!(report.band, QualityBand::Good);
    assert_eq!(report.band.to_string(), "Good");
    assert!(report.recommendations.is_empty());
    assert!(report.asset_completeness);
    assert!(report.parameter_completeness);
    assert_eq!(report.notes_count, 2);
}

#[test]
fn confidence_of_point_eight_reaches_top_tier() {
    let draft = record(StrategyKind::Lending, AssetKind::Near, 0.8)
        .with_secondary_assets(vec![AssetKind::Usdc, AssetKind::Usdt])
        .with_target_rate(Some(8.0))
        .with_duration_days(Some(30))
        .with_notes(vec!["a".into(), "b".into()]);
    let report = QualityScorer.assess(&build(draft));
    assert_eq!(report.score, 82);
    assert_eq!(report.band, QualityBand::Excellent);
}

#[test]
fn sparse_prompt_gets_targeted_advice() {
    let record = Extractor::default().classify("do something with my coins", PromptId::new("p"));
    let report = QualityScorer.assess(&record);

    // Fallback confidence (0.3 + 0.2 + 0.0) / 3 scores nothing.
    // 15 for the fallback primary asset, 12 for three notes.
    assert_eq!(report.score, 27);
    assert_eq!(report.band, QualityBand::Poor);
    assert_eq!(
        report.recommendations,
        vec![
            "Consider improving prompt clarity for better confidence",
            "Consider adding secondary assets for strategy diversification",
            "Consider specifying target APY for better strategy definition",
        ]
    );
}
