//! Pattern catalog — per-domain matching rules and term substitutions.
//!
//! Tables are plain data (see [`tables`]); this module compiles them once into
//! [`PatternSet`]s. The built-in catalog is a process-wide read-only singleton.
//! Extra rules can be layered on with [`CatalogBuilder`] without touching the
//! extraction algorithm.

pub mod tables;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::domain::{AssetKind, RiskLevel, StrategyKind};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid {domain} pattern '{pattern}': {source}")]
    InvalidPattern {
        domain: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("empty generic phrase in term substitution")]
    EmptyTerm,
}

fn compile_rule(domain: &'static str, pattern: &str) -> Result<Regex, CatalogError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| CatalogError::InvalidPattern {
            domain,
            pattern: pattern.to_string(),
            source,
        })
}

// ─── Pattern sets ────────────────────────────────────────────────────

/// Compiled rules for one variant.
#[derive(Debug, Clone)]
pub struct PatternEntry<K> {
    pub kind: K,
    rules: Vec<Regex>,
}

impl<K: Copy> PatternEntry<K> {
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of rules matching anywhere in `text`.
    pub fn match_count(&self, text: &str) -> usize {
        self.rules.iter().filter(|rule| rule.is_match(text)).count()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.as_str())
    }
}

/// All compiled rules for one domain, in declaration order.
#[derive(Debug, Clone)]
pub struct PatternSet<K> {
    domain: &'static str,
    entries: Vec<PatternEntry<K>>,
}

impl<K: Copy + PartialEq> PatternSet<K> {
    pub fn compile(domain: &'static str, table: &[(K, &[&str])]) -> Result<Self, CatalogError> {
        let mut set = Self { domain, entries: Vec::with_capacity(table.len()) };
        for (kind, patterns) in table {
            set.extend(*kind, patterns.iter().copied())?;
        }
        Ok(set)
    }

    /// Append rules to a variant. A variant not yet in the set is added at the end.
    pub fn extend<'a>(
        &mut self,
        kind: K,
        patterns: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), CatalogError> {
        let compiled = patterns
            .into_iter()
            .map(|p| compile_rule(self.domain, p))
            .collect::<Result<Vec<_>, _>>()?;
        match self.entries.iter_mut().find(|e| e.kind == kind) {
            Some(entry) => entry.rules.extend(compiled),
            None => self.entries.push(PatternEntry { kind, rules: compiled }),
        }
        Ok(())
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    pub fn entries(&self) -> &[PatternEntry<K>] {
        &self.entries
    }

    pub fn get(&self, kind: K) -> Option<&PatternEntry<K>> {
        self.entries.iter().find(|e| e.kind == kind)
    }
}

// ─── Term substitutions ──────────────────────────────────────────────

/// Generic → protocol-specific phrase table compiled into a single pass.
///
/// Phrases are tried longest first so "liquidity pools" wins over
/// "liquidity pool". Each occurrence is replaced at most once; replacement
/// text is never rescanned.
#[derive(Debug, Clone)]
pub struct TermMap {
    phrases: Vec<(String, String)>,
    matcher: Option<Regex>,
    lookup: HashMap<String, String>,
}

impl TermMap {
    pub fn compile(pairs: &[(String, String)]) -> Result<Self, CatalogError> {
        let mut phrases: Vec<(String, String)> = Vec::with_capacity(pairs.len());
        for (generic, specific) in pairs {
            let generic = generic.trim().to_lowercase();
            if generic.is_empty() {
                return Err(CatalogError::EmptyTerm);
            }
            match phrases.iter_mut().find(|(g, _)| *g == generic) {
                Some(existing) => existing.1 = specific.clone(),
                None => phrases.push((generic, specific.clone())),
            }
        }

        let matcher = if phrases.is_empty() {
            None
        } else {
            let mut by_length: Vec<&str> = phrases.iter().map(|(g, _)| g.as_str()).collect();
            by_length.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let alternation: Vec<String> = by_length.iter().map(|g| regex::escape(g)).collect();
            let pattern = format!(r"\b(?:{})\b", alternation.join("|"));
            Some(compile_rule("term", &pattern)?)
        };

        let lookup = phrases.iter().cloned().collect();
        Ok(Self { phrases, matcher, lookup })
    }

    pub fn phrases(&self) -> &[(String, String)] {
        &self.phrases
    }

    /// Replace every generic phrase occurrence, case-insensitively.
    pub fn apply(&self, text: &str) -> String {
        let Some(matcher) = &self.matcher else {
            return text.to_string();
        };
        matcher
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let found = &caps[0];
                self.lookup
                    .get(&found.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| found.to_string())
            })
            .into_owned()
    }
}

// ─── Catalog ─────────────────────────────────────────────────────────

/// The three detection domains plus the term table.
#[derive(Debug, Clone)]
pub struct Catalog {
    strategies: PatternSet<StrategyKind>,
    assets: PatternSet<AssetKind>,
    risks: PatternSet<RiskLevel>,
    terms: TermMap,
}

static BUILTIN: OnceLock<Arc<Catalog>> = OnceLock::new();

impl Catalog {
    /// The built-in catalog, compiled on first use.
    ///
    /// The built-in tables are compile-time constants covered by
    /// `builtin_tables_compile`, so a failure here is a programming error.
    pub fn builtin() -> Arc<Catalog> {
        BUILTIN
            .get_or_init(|| {
                Arc::new(
                    CatalogBuilder::default()
                        .build()
                        .expect("built-in pattern tables must compile"),
                )
            })
            .clone()
    }

    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn strategies(&self) -> &PatternSet<StrategyKind> {
        &self.strategies
    }

    pub fn assets(&self) -> &PatternSet<AssetKind> {
        &self.assets
    }

    pub fn risks(&self) -> &PatternSet<RiskLevel> {
        &self.risks
    }

    pub fn terms(&self) -> &TermMap {
        &self.terms
    }
}

/// Layers extra rules and substitutions over the built-in tables.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    strategy_extra: Vec<(StrategyKind, Vec<String>)>,
    asset_extra: Vec<(AssetKind, Vec<String>)>,
    risk_extra: Vec<(RiskLevel, Vec<String>)>,
    term_extra: Vec<(String, String)>,
}

impl CatalogBuilder {
    pub fn strategy_patterns<I, S>(mut self, kind: StrategyKind, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategy_extra.push((kind, patterns.into_iter().map(Into::into).collect()));
        self
    }

    pub fn asset_patterns<I, S>(mut self, kind: AssetKind, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.asset_extra.push((kind, patterns.into_iter().map(Into::into).collect()));
        self
    }

    pub fn risk_patterns<I, S>(mut self, kind: RiskLevel, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.risk_extra.push((kind, patterns.into_iter().map(Into::into).collect()));
        self
    }

    /// Add or override a term substitution.
    pub fn term(mut self, generic: impl Into<String>, specific: impl Into<String>) -> Self {
        self.term_extra.push((generic.into(), specific.into()));
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut strategies = PatternSet::compile("strategy", tables::STRATEGY_PATTERNS)?;
        for (kind, patterns) in &self.strategy_extra {
            strategies.extend(*kind, patterns.iter().map(String::as_str))?;
        }

        let mut assets = PatternSet::compile("asset", tables::ASSET_PATTERNS)?;
        for (kind, patterns) in &self.asset_extra {
            assets.extend(*kind, patterns.iter().map(String::as_str))?;
        }

        let mut risks = PatternSet::compile("risk", tables::RISK_PATTERNS)?;
        for (kind, patterns) in &self.risk_extra {
            risks.extend(*kind, patterns.iter().map(String::as_str))?;
        }

        let mut pairs: Vec<(String, String)> = tables::TERM_SUBSTITUTIONS
            .iter()
            .map(|(g, s)| (g.to_string(), s.to_string()))
            .collect();
        pairs.extend(self.term_extra);
        let terms = TermMap::compile(&pairs)?;

        Ok(Catalog { strategies, assets, risks, terms })
    }
}
