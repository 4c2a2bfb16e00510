//! Maps vendor-dependent raw column names onto canonical columns.
//!
//! Matching rules live in one static table. Each canonical target is tried in
//! table order against the raw columns not yet claimed:
//!
//!   1. exact name, ignoring ASCII case
//!   2. case/whitespace-insensitive prefix
//!   3. substring of a known alias token (ticker, statistic code)
//!   4. name led by the canonical label ("Gold Close", "Rate US")
//!
//! The first raw column (in input order) matching the earliest stage wins.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::core::error::PipelineError;
use crate::models::CanonicalName;

#[derive(Debug, Clone)]
pub struct MatchRule {
    pub target: CanonicalName,
    pub exact: &'static [&'static str],
    /// Stored already lower-cased with whitespace removed
    pub prefixes: &'static [&'static str],
    /// Lower-cased tokens searched as substrings
    pub aliases: &'static [&'static str],
}

macro_rules! rule {
    ($target:expr, [$($exact:expr),*], [$($prefix:expr),*], [$($alias:expr),*]) => {
        MatchRule {
            target: $target,
            exact: &[$($exact),*],
            prefixes: &[$($prefix),*],
            aliases: &[$($alias),*],
        }
    };
}

// Prefixes must not swallow sibling columns: "m2" would claim "M2_D",
// "cpi" would claim "CPI_YoY".
static MATCH_RULES: Lazy<Vec<MatchRule>> = Lazy::new(|| {
    use CanonicalName::*;
    vec![
        rule!(FX, ["FX"], ["usdkrw", "usd/krw", "환율"], ["731y001", "krw=x"]),
        rule!(Gold, ["Gold"], ["gold_usd", "goldusd"], ["gc=f", "xauusd"]),
        rule!(GoldKRX, ["KRX_GOLD"], ["krx_gold", "krxgold", "금현물"], []),
        rule!(GoldKRWPerGram, ["Gold_KRWg"], ["gold_krw", "goldkrw"], []),
        rule!(EquityIndexKR, ["KODEX200"], ["kodex200"], ["069500"]),
        rule!(EquityIndexUS, ["SP500"], ["sp500", "s&p500"], ["^gspc"]),
        rule!(MoneySupplyKR, ["M2"], ["m2_level"], ["060y002", "101y004"]),
        rule!(MoneySupplyKRDaily, ["M2_D"], ["m2_d", "m2daily"], []),
        rule!(MoneySupplyYoY, ["M2_YoY"], ["m2_yoy", "m2yoy"], []),
        rule!(PolicyRateKR, ["Rate"], ["baserate", "base_rate", "기준금리"], ["722y001"]),
        rule!(PolicyRateUS, ["Rate_US"], ["fedfunds", "fed_funds"], ["effr"]),
        rule!(Bond10KR, ["Bond10"], ["ktb10", "kr10y"], ["817y002"]),
        rule!(Bond10US, ["Bond10_US"], ["ust10", "us10y"], ["dgs10", "^tnx"]),
        rule!(CPI, ["CPI"], ["소비자물가"], ["901y010"]),
        rule!(CoreCPI, ["CoreCPI"], ["corecpi", "core_cpi"], []),
        rule!(CpiYoY, ["CPI_YoY"], ["cpi_yoy", "cpiyoy"], []),
        rule!(RealRate, ["real_rate"], ["realrate", "real_rate"], []),
        rule!(YieldSpreadKR, ["Spread_KR"], ["spread_kr"], []),
        rule!(YieldSpreadUS, ["Spread_US"], ["spread_us"], []),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MatchStage {
    Exact,
    Prefix,
    Alias,
    Label,
}

fn squash(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lower-cased with each whitespace character as '_': "Rate US" -> "rate_us".
fn label_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

impl MatchRule {
    /// Earliest stage at which `raw` matches this rule.
    pub fn matches(&self, raw: &str) -> Option<MatchStage> {
        self.matches_listed(raw)
            .or_else(|| self.claims_label(raw).then_some(MatchStage::Label))
    }

    /// Exact, prefix and alias stages: the names listed in the table.
    fn matches_listed(&self, raw: &str) -> Option<MatchStage> {
        if self.exact.iter().any(|e| e.eq_ignore_ascii_case(raw)) {
            return Some(MatchStage::Exact);
        }
        let squashed = squash(raw);
        if self.prefixes.iter().any(|p| squashed.starts_with(p)) {
            return Some(MatchStage::Prefix);
        }
        let lowered = raw.to_lowercase();
        if self.aliases.iter().any(|a| lowered.contains(a)) {
            return Some(MatchStage::Alias);
        }
        None
    }

    /// `raw` starts with this target's label. Yields to any other rule that
    /// lists the name, and to a longer label with the same lead, so "M2_D"
    /// and "Rate US" never land on `M2` or `Rate`.
    fn claims_label(&self, raw: &str) -> bool {
        let key = label_key(raw);
        let own = label_key(self.target.label());
        if !key.starts_with(&own) {
            return false;
        }

        !MATCH_RULES.iter().filter(|other| other.target != self.target).any(|other| {
            let label = label_key(other.target.label());
            other.matches_listed(raw).is_some() || (label.len() > own.len() && key.starts_with(&label))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
    /// raw column name -> canonical column
    pub mapping: BTreeMap<String, CanonicalName>,
    /// Raw columns that lost a first-match tie, for data-quality review
    #[serde(serialize_with = "serialize_messages")]
    pub ambiguities: Vec<PipelineError>,
    pub unmatched: Vec<String>,
}

fn serialize_messages<S: serde::Serializer>(errors: &[PipelineError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}

impl Reconciliation {
    pub fn canonical_for(&self, raw: &str) -> Option<CanonicalName> {
        self.mapping.get(raw).copied()
    }
}

pub fn match_rules() -> &'static [MatchRule] {
    &MATCH_RULES
}

/// Rename mapping for the given raw columns. Targets with no match are absent.
pub fn reconcile<S: AsRef<str>>(raw_columns: &[S]) -> BTreeMap<String, CanonicalName> {
    reconcile_detailed(raw_columns).mapping
}

pub fn reconcile_detailed<S: AsRef<str>>(raw_columns: &[S]) -> Reconciliation {
    let mut unclaimed: Vec<&str> = raw_columns.iter().map(|s| s.as_ref()).collect();
    let mut result = Reconciliation::default();

    for rule in MATCH_RULES.iter() {
        let candidates: Vec<(usize, MatchStage)> = unclaimed
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| rule.matches(raw).map(|stage| (i, stage)))
            .collect();

        // min_by_key returns the first minimum, preserving input order on ties
        let Some(&(winner_idx, stage)) = candidates.iter().min_by_key(|(_, stage)| *stage) else {
            continue;
        };

        let others: Vec<String> = candidates
            .iter()
            .filter(|(i, _)| *i != winner_idx)
            .map(|(i, _)| unclaimed[*i].to_string())
            .collect();

        let claimed = unclaimed.remove(winner_idx).to_string();
        debug!(raw = %claimed, canonical = %rule.target, ?stage, "column reconciled");

        if !others.is_empty() {
            let err = PipelineError::AmbiguousColumn {
                canonical: rule.target,
                claimed: claimed.clone(),
                others,
            };
            warn!(error = %err, "ambiguous raw columns, first match kept");
            result.ambiguities.push(err);
        }

        result.mapping.insert(claimed, rule.target);
    }

    result.unmatched = unclaimed.iter().map(|s| s.to_string()).collect();
    result
}
