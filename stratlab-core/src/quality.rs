//! Quality scoring — graded, advisory completeness assessment.
//!
//! Four independently capped pools summed to a 0–100 score:
//! - **Confidence** (30): ≥0.8 → 30, ≥0.6 → 20, ≥0.4 → 10
//! - **Assets** (25): 15 for a primary asset, 2 per secondary up to 10
//! - **Parameters** (25): 15 for a target rate, 10 for a duration
//! - **Notes** (20): 4 per transformation note up to 20

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::StrategyRecord;

pub const MAX_SCORE: u32 = 100;

/// Score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityBand {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityBand {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            Self::Excellent
        } else if score >= 60 {
            Self::Good
        } else if score >= 40 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "Poor",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for QualityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: u32,
    pub max_score: u32,
    pub band: QualityBand,
    pub recommendations: Vec<String>,
    pub confidence: f64,
    /// A primary asset is present.
    pub asset_completeness: bool,
    /// A target rate or a duration is present.
    pub parameter_completeness: bool,
    pub notes_count: usize,
}

/// Inputs the scorer reads. Implemented for [`StrategyRecord`]; kept as a
/// view so stored candidates with missing fields can be scored too.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityInput<'a> {
    pub confidence: f64,
    pub has_primary_asset: bool,
    pub secondary_count: usize,
    pub target_rate: Option<f64>,
    pub duration_days: Option<u32>,
    pub notes: &'a [String],
}

impl<'a> From<&'a StrategyRecord> for QualityInput<'a> {
    fn from(record: &'a StrategyRecord) -> Self {
        Self {
            confidence: record.confidence(),
            has_primary_asset: true,
            secondary_count: record.secondary_assets().len(),
            target_rate: record.target_rate(),
            duration_days: record.duration_days(),
            notes: record.notes(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn assess(&self, record: &StrategyRecord) -> QualityReport {
        self.assess_input(QualityInput::from(record))
    }

    pub fn assess_input(&self, input: QualityInput<'_>) -> QualityReport {
        let mut recommendations = Vec::new();

        let confidence_points = match input.confidence {
            c if c >= 0.8 => 30,
            c if c >= 0.6 => 20,
            c if c >= 0.4 => 10,
            _ => 0,
        };
        if input.confidence < 0.6 {
            recommendations.push("Consider improving prompt clarity for better confidence".to_string());
        }

        let mut asset_points = if input.has_primary_asset { 15 } else { 0 };
        asset_points += (2 * input.secondary_count).min(10) as u32;
        if input.secondary_count == 0 {
            recommendations
                .push("Consider adding secondary assets for strategy diversification".to_string());
        }

        let mut parameter_points = 0;
        if input.target_rate.is_some() {
            parameter_points += 15;
        } else {
            recommendations
                .push("Consider specifying target APY for better strategy definition".to_string());
        }
        if input.duration_days.is_some() {
            parameter_points += 10;
        }

        let notes_points = (4 * input.notes.len()).min(20) as u32;
        if input.notes.is_empty() {
            recommendations.push("Add transformation notes for better traceability".to_string());
        }

        let score = confidence_points + asset_points + parameter_points + notes_points;
        QualityReport {
            score,
            max_score: MAX_SCORE,
            band: QualityBand::from_score(score),
            recommendations,
            confidence: input.confidence,
            asset_completeness: input.has_primary_asset,
            parameter_completeness: input.target_rate.is_some() || input.duration_days.is_some(),
            notes_count: input.notes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(confidence: f64, secondary: usize, notes: &[String]) -> QualityInput<'_> {
        QualityInput {
            confidence,
            has_primary_asset: true,
            secondary_count: secondary,
            target_rate: Some(10.0),
            duration_days: Some(30),
            notes,
        }
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(QualityBand::from_score(100), QualityBand::Excellent);
        assert_eq!(QualityBand::from_score(80), QualityBand::Excellent);
        assert_eq!(QualityBand::from_score(79), QualityBand::Good);
        assert_eq!(QualityBand::from_score(60), QualityBand::Good);
        assert_eq!(QualityBand::from_score(40), QualityBand::Fair);
        assert_eq!(QualityBand::from_score(39), QualityBand::Poor);
        assert_eq!(QualityBand::from_score(0), QualityBand::Poor);
    }

    #[test]
    fn confidence_pool_steps() {
        let notes = vec!["n".to_string()];
        let points = |c| QualityScorer.assess_input(input(c, 0, &notes)).score - 44;
        assert_eq!(points(0.8), 30);
        assert_eq!(points(0.79), 20);
        assert_eq!(points(0.6), 20);
        assert_eq!(points(0.4), 10);
        assert_eq!(points(0.39), 0);
    }

    #[test]
    fn pools_are_capped() {
        let notes: Vec<String> = (0..9).map(|i| format!("note {i}")).collect();
        let report = QualityScorer.assess_input(input(0.95, 8, &notes));
        assert_eq!(report.score, MAX_SCORE);
        assert_eq!(report.band, QualityBand::Excellent);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn empty_input_collects_every_recommendation() {
        let report = QualityScorer.assess_input(QualityInput {
            confidence: 0.1,
            has_primary_asset: false,
            secondary_count: 0,
            target_rate: None,
            duration_days: None,
            notes: &[],
        });
        assert_eq!(report.score, 0);
        assert_eq!(report.band, QualityBand::Poor);
        assert_eq!(report.recommendations.len(), 4);
        assert!(!report.asset_completeness);
        assert!(!report.parameter_completeness);
    }

    #[test]
    fn duration_alone_completes_parameters() {
        let report = QualityScorer.assess_input(QualityInput {
            target_rate: None,
            ..input(0.7, 1, &[])
        });
        assert!(report.parameter_completeness);
        assert_eq!(report.score, 20 + 15 + 2 + 10);
        assert_eq!(
            report.recommendations,
            vec![
                "Consider specifying target APY for better strategy definition",
                "Add transformation notes for better traceability",
            ]
        );
    }
}
