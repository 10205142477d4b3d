//! Built-in pattern tables.
//!
//! Every rule is a case-insensitive regular expression delimited by word
//! boundaries. Row order is declaration order: detection ties resolve to the
//! earlier row, and detected assets are reported in this order.

use crate::domain::{AssetKind, RiskLevel, StrategyKind};

pub type PatternTable<K> = &'static [(K, &'static [&'static str])];

pub const STRATEGY_PATTERNS: PatternTable<StrategyKind> = &[
    (
        StrategyKind::YieldFarming,
        &[
            r"\byield\s*farm\w*\b",
            r"\bfarm\w*\s*yield\b",
            r"\bharvest\w*\b",
            r"\bapy\b",
            r"\bapr\b",
            r"\breturn\w*\b",
            r"\bprofit\w*\b",
        ],
    ),
    (
        StrategyKind::LiquidityProviding,
        &[
            r"\bliquidity\s*provid\w*\b",
            r"\bprovide\s*liquidity\b",
            r"\blp\b",
            r"\bamm\b",
            r"\bpool\w*\b",
            r"\bswap\w*\b",
            r"\bdex\b",
            r"\bexchange\b",
        ],
    ),
    (
        StrategyKind::Lending,
        &[
            r"\blend\w*\b",
            r"\bdeposit\w*\b",
            r"\binterest\b",
            r"\bcredit\b",
            r"\bsavings\b",
            r"\baccount\w*\b",
        ],
    ),
    (
        StrategyKind::Borrowing,
        &[
            r"\bborrow\w*\b",
            r"\bloan\w*\b",
            r"\bdebt\b",
            r"\bleverage\w*\b",
            r"\bcollateral\b",
            r"\bunderwater\b",
        ],
    ),
    (
        StrategyKind::Staking,
        &[
            r"\bstak\w*\b",
            r"\bdelegat\w*\b",
            r"\bvalidator\w*\b",
            r"\bconsensus\b",
            r"\bproof\s*of\s*stake\b",
            r"\bpos\b",
        ],
    ),
    (
        StrategyKind::Swapping,
        &[
            r"\bswap\w*\b",
            r"\btrade\w*\b",
            r"\bconvert\w*\b",
            r"\bexchange\w*\b",
            r"\bbuy\w*\b",
            r"\bsell\w*\b",
        ],
    ),
    (
        StrategyKind::Arbitrage,
        &[
            r"\barbitrage\w*\b",
            r"\barb\b",
            r"\bprice\s*difference\b",
            r"\bcross\s*exchange\b",
            r"\bprofit\s*from\s*difference\b",
        ],
    ),
    (
        StrategyKind::Compounding,
        &[
            r"\bcompound\w*\b",
            r"\breinvest\w*\b",
            r"\bauto\s*compound\b",
            r"\broll\w*\s*over\b",
            r"\baccumulate\w*\b",
        ],
    ),
];

pub const ASSET_PATTERNS: PatternTable<AssetKind> = &[
    (AssetKind::Near, &[r"\bnear\b", r"\bprotocol\b", r"\bnative\b"]),
    (AssetKind::Usdc, &[r"\busdc\b", r"\busd\s*coin\b", r"\bstablecoin\b"]),
    (AssetKind::Usdt, &[r"\busdt\b", r"\btether\b"]),
    (AssetKind::Dai, &[r"\bdai\b", r"\bdecentralized\s*stablecoin\b"]),
    (AssetKind::Wbtc, &[r"\bwbtc\b", r"\bwrapped\s*bitcoin\b", r"\bbtc\b"]),
    (AssetKind::Eth, &[r"\beth\b", r"\bethereum\b"]),
    (AssetKind::Shade, &[r"\bshade\b", r"\bshd\b"]),
    (AssetKind::StNear, &[r"\bstnear\b", r"\bstaked\s*near\b"]),
    (AssetKind::Linear, &[r"\blinear\b", r"\blin\b"]),
    (AssetKind::Meta, &[r"\bmeta\b", r"\bmetaverse\b"]),
];

pub const RISK_PATTERNS: PatternTable<RiskLevel> = &[
    (
        RiskLevel::Low,
        &[
            r"\blow\s*risk\b",
            r"\bsafe\b",
            r"\bconservative\b",
            r"\bstable\b",
            r"\bblue\s*chip\b",
            r"\bestablished\b",
        ],
    ),
    (
        RiskLevel::Medium,
        &[r"\bmedium\s*risk\b", r"\bmoderate\b", r"\bbalanced\b", r"\bstandard\b"],
    ),
    (
        RiskLevel::High,
        &[r"\bhigh\s*risk\b", r"\baggressive\b", r"\bvolatile\b", r"\bspeculative\b"],
    ),
    (
        RiskLevel::VeryHigh,
        &[r"\bvery\s*high\s*risk\b", r"\bextreme\b", r"\bmaximum\b", r"\brisky\b"],
    ),
];

/// Generic phrase → protocol-specific phrase.
pub const TERM_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("yield farming", "NEAR yield farming"),
    ("liquidity pool", "NEAR liquidity pool"),
    ("liquidity pools", "NEAR liquidity pools"),
    ("staking", "NEAR staking"),
    ("defi", "NEAR DeFi"),
    ("protocol", "NEAR protocol"),
    ("blockchain", "NEAR blockchain"),
    ("smart contract", "NEAR smart contract"),
];
