//! Closed category enumerations: strategy kind, asset kind, risk level.
//!
//! The declaration order of every `ALL` array is the catalog order used for
//! tie-breaking during detection and for ordering detected assets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {domain} '{value}'")]
pub struct ParseKindError {
    pub domain: &'static str,
    pub value: String,
}

fn parse_by_name<K: Copy>(
    all: &[K],
    name_of: fn(K) -> &'static str,
    domain: &'static str,
    s: &str,
) -> Result<K, ParseKindError> {
    let wanted = s.trim();
    all.iter()
        .copied()
        .find(|k| name_of(*k).eq_ignore_ascii_case(wanted))
        .ok_or_else(|| ParseKindError { domain, value: s.to_string() })
}

// ─── Strategy kind ───────────────────────────────────────────────────

/// Category of financial action a prompt describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    YieldFarming,
    LiquidityProviding,
    Lending,
    Borrowing,
    Staking,
    Swapping,
    Arbitrage,
    Compounding,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 8] = [
        Self::YieldFarming,
        Self::LiquidityProviding,
        Self::Lending,
        Self::Borrowing,
        Self::Staking,
        Self::Swapping,
        Self::Arbitrage,
        Self::Compounding,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::YieldFarming => "yield_farming",
            Self::LiquidityProviding => "liquidity_providing",
            Self::Lending => "lending",
            Self::Borrowing => "borrowing",
            Self::Staking => "staking",
            Self::Swapping => "swapping",
            Self::Arbitrage => "arbitrage",
            Self::Compounding => "compounding",
        }
    }

    /// Strategies whose rewards are re-deposited automatically.
    pub fn auto_compounds(self) -> bool {
        matches!(self, Self::YieldFarming | Self::Staking | Self::Compounding)
    }

    /// Strategies that are time-sensitive regardless of risk appetite.
    pub fn is_time_sensitive(self) -> bool {
        matches!(self, Self::Arbitrage | Self::Swapping)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_by_name(&Self::ALL, Self::as_str, "strategy type", s)
    }
}

// ─── Asset kind ──────────────────────────────────────────────────────

/// Token recognized by the target protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "NEAR")]
    Near,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "USDT")]
    Usdt,
    #[serde(rename = "DAI")]
    Dai,
    #[serde(rename = "WBTC")]
    Wbtc,
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "SHADE")]
    Shade,
    #[serde(rename = "stNEAR")]
    StNear,
    #[serde(rename = "LINEAR")]
    Linear,
    #[serde(rename = "META")]
    Meta,
}

impl AssetKind {
    pub const ALL: [AssetKind; 10] = [
        Self::Near,
        Self::Usdc,
        Self::Usdt,
        Self::Dai,
        Self::Wbtc,
        Self::Eth,
        Self::Shade,
        Self::StNear,
        Self::Linear,
        Self::Meta,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Near => "NEAR",
            Self::Usdc => "USDC",
            Self::Usdt => "USDT",
            Self::Dai => "DAI",
            Self::Wbtc => "WBTC",
            Self::Eth => "ETH",
            Self::Shade => "SHADE",
            Self::StNear => "stNEAR",
            Self::Linear => "LINEAR",
            Self::Meta => "META",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_by_name(&Self::ALL, Self::as_str, "asset", s)
    }
}

// ─── Risk level ──────────────────────────────────────────────────────

/// Ordinal risk appetite: `Low < Medium < High < VeryHigh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }

    pub fn is_elevated(self) -> bool {
        self >= Self::High
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_by_name(&Self::ALL, Self::as_str, "risk level", s)
    }
}

// ─── Execution priority ──────────────────────────────────────────────

/// Derived scheduling hint for the downstream executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPriority {
    #[default]
    Normal,
    High,
}

impl ExecutionPriority {
    /// `High` when the risk level is high/very high or the strategy is
    /// arbitrage/swapping, otherwise `Normal`.
    pub fn derive(strategy: StrategyKind, risk: RiskLevel) -> Self {
        if risk.is_elevated() || strategy.is_time_sensitive() {
            Self::High
        } else {
            Self::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ExecutionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_wire_names_roundtrip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn asset_parse_is_case_insensitive() {
        assert_eq!("stnear".parse::<AssetKind>().unwrap(), AssetKind::StNear);
        assert_eq!("usdc".parse::<AssetKind>().unwrap(), AssetKind::Usdc);
        assert_eq!(serde_json::to_string(&AssetKind::StNear).unwrap(), "\"stNEAR\"");
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "invalid_strategy".parse::<StrategyKind>().unwrap_err();
        assert_eq!(err.domain, "strategy type");
        assert_eq!(err.to_string(), "unknown strategy type 'invalid_strategy'");
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::VeryHigh);
        assert!(!RiskLevel::Medium.is_elevated());
        assert!(RiskLevel::VeryHigh.is_elevated());
    }

    #[test]
    fn execution_priority_rules() {
        use ExecutionPriority::*;
        assert_eq!(ExecutionPriority::derive(StrategyKind::Staking, RiskLevel::Low), Normal);
        assert_eq!(ExecutionPriority::derive(StrategyKind::Staking, RiskLevel::High), High);
        assert_eq!(ExecutionPriority::derive(StrategyKind::Lending, RiskLevel::VeryHigh), High);
        assert_eq!(ExecutionPriority::derive(StrategyKind::Arbitrage, RiskLevel::Low), High);
        assert_eq!(ExecutionPriority::derive(StrategyKind::Swapping, RiskLevel::Medium), High);
    }

    #[test]
    fn auto_compound_strategies() {
        let compounding: Vec<_> =
            StrategyKind::ALL.into_iter().filter(|k| k.auto_compounds()).collect();
        assert_eq!(
            compounding,
            vec![StrategyKind::YieldFarming, StrategyKind::Staking, StrategyKind::Compounding]
        );
    }
}
