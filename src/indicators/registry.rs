use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

use crate::core::config::PipelineConfig;
use crate::indicators::currency::GoldKrwPerGram;
use crate::indicators::money_supply::DailyMoneySupply;
use crate::indicators::moving_average::MovingAverage;
use crate::indicators::real_rate::RealRate;
use crate::indicators::yield_spread::YieldSpread;
use crate::indicators::yoy::YearOverYear;
use crate::indicators::DerivationRule;
use crate::models::{CanonicalName, FillPolicy, Frequency, Unit};

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Origin {
    /// Delivered by the fetch layer
    Source,
    /// Produced by a derivation rule (may also arrive pre-computed)
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Currency,     // 환율
    Commodities,  // 원자재
    Equities,     // 주식
    Liquidity,    // 유동성
    Rates,        // 금리
    Inflation,    // 물가
}

// ============================================================================
// METADATA STRUCT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ColumnMetadata {
    pub name: CanonicalName,
    pub display_name: String,
    pub origin: Origin,
    pub category: Category,
    pub unit: Unit,
    /// Native frequency expected from upstream (Daily for derived daily columns)
    pub frequency: Frequency,
    pub fill_policy: FillPolicy,
    pub description: String,
    /// Internal/calculation-only columns stay out of the toggle list
    pub hidden_by_default: bool,
    pub selected_by_default: bool,
}

// Helper macro to reduce boilerplate
macro_rules! col {
    // Pattern with 10 arguments (explicit visibility)
    ($name:expr, $display:expr, $origin:expr, $cat:expr, $unit:expr, $freq:expr, $fill:expr, $desc:expr, $hidden:expr, $selected:expr) => {
        ColumnMetadata {
            name: $name,
            display_name: $display.to_string(),
            origin: $origin,
            category: $cat,
            unit: $unit,
            frequency: $freq,
            fill_policy: $fill,
            description: $desc.to_string(),
            hidden_by_default: $hidden,
            selected_by_default: $selected,
        }
    };
    // Pattern with 8 arguments (visible, not preselected)
    ($name:expr, $display:expr, $origin:expr, $cat:expr, $unit:expr, $freq:expr, $fill:expr, $desc:expr) => {
        col!($name, $display, $origin, $cat, $unit, $freq, $fill, $desc, false, false)
    };
}

// ============================================================================
// STATIC COLUMN REGISTRY (Lazy initialization, O(1) lookup)
// ============================================================================

static COLUMNS: Lazy<Vec<ColumnMetadata>> = Lazy::new(|| {
    use CanonicalName::*;
    use FillPolicy::*;
    use Frequency::*;

    vec![
        // =====================================================================
        // 환율 / 원자재
        // =====================================================================
        col!(FX, "USD/KRW", Origin::Source, Category::Currency, Unit::KrwPerUsd, Daily, StepHold,
             "Won per dollar exchange rate (ECOS 731Y001)", true, false),
        col!(Gold, "Gold (USD/oz)", Origin::Source, Category::Commodities, Unit::Usd, Daily, StepHold,
             "International gold price per troy ounce"),
        col!(GoldKRX, "KRX Gold (1g)", Origin::Source, Category::Commodities, Unit::Krw, Daily, StepHold,
             "KRX spot gold closing price per gram"),
        col!(GoldKRWPerGram, "Gold (KRW/g)", Origin::Derived, Category::Commodities, Unit::Krw, Daily, StepHold,
             "Gold x FX / 31.1035 (troy ounce to gram)"),

        // =====================================================================
        // 주식
        // =====================================================================
        col!(EquityIndexKR, "KODEX 200", Origin::Source, Category::Equities, Unit::Krw, Daily, StepHold,
             "KODEX 200 ETF adjusted close (069500.KS)", false, true),
        col!(EquityIndexUS, "S&P 500", Origin::Source, Category::Equities, Unit::Index, Daily, StepHold,
             "S&P 500 index level"),

        // =====================================================================
        // 유동성
        // =====================================================================
        col!(MoneySupplyKR, "M2", Origin::Source, Category::Liquidity, Unit::KrwBillions, Monthly, StepHold,
             "Korean broad money M2 (ECOS 060Y002), as reported"),
        col!(MoneySupplyKRDaily, "M2 (daily)", Origin::Derived, Category::Liquidity, Unit::KrwBillions, Daily, LinearInterpolate,
             "M2 linearly interpolated between monthly prints", false, true),
        col!(MoneySupplyYoY, "M2 YoY", Origin::Derived, Category::Liquidity, Unit::Percent, Monthly, StepHold,
             "M2 year-over-year change on month-end values"),

        // =====================================================================
        // 금리
        // =====================================================================
        col!(PolicyRateKR, "BOK Base Rate", Origin::Source, Category::Rates, Unit::Percent, Monthly, StepHold,
             "Bank of Korea base rate (ECOS 722Y001)", true, false),
        col!(PolicyRateUS, "Fed Funds Rate", Origin::Source, Category::Rates, Unit::Percent, Monthly, StepHold,
             "US policy rate"),
        col!(Bond10KR, "KTB 10Y", Origin::Source, Category::Rates, Unit::Percent, Daily, StepHold,
             "Korea Treasury Bond 10Y yield", true, false),
        col!(Bond10US, "UST 10Y", Origin::Source, Category::Rates, Unit::Percent, Daily, StepHold,
             "US Treasury 10Y yield"),
        col!(RealRate, "Real Rate", Origin::Derived, Category::Rates, Unit::Percent, Monthly, StepHold,
             "Base rate minus CPI YoY (month-end)"),
        col!(YieldSpreadKR, "KR 10Y - Base Rate", Origin::Derived, Category::Rates, Unit::Percent, Daily, StepHold,
             "KTB 10Y minus base rate, 5-day smoothed"),
        col!(YieldSpreadUS, "US 10Y - Fed Funds", Origin::Derived, Category::Rates, Unit::Percent, Daily, StepHold,
             "UST 10Y minus fed funds, 5-day smoothed"),

        // =====================================================================
        // 물가
        // =====================================================================
        col!(CPI, "CPI", Origin::Source, Category::Inflation, Unit::Index, Monthly, StepHold,
             "Consumer price index (ECOS 901Y010)"),
        col!(CoreCPI, "Core CPI", Origin::Source, Category::Inflation, Unit::Index, Monthly, StepHold,
             "CPI excluding food and energy"),
        col!(CpiYoY, "CPI YoY", Origin::Derived, Category::Inflation, Unit::Percent, Monthly, StepHold,
             "CPI year-over-year change on month-end values"),
    ]
});

/// HashMap for O(1) name -> index lookup
static COLUMN_MAP: Lazy<HashMap<CanonicalName, usize>> = Lazy::new(|| {
    COLUMNS
        .iter()
        .enumerate()
        .map(|(idx, col)| (col.name, idx))
        .collect()
});

// ============================================================================
// REGISTRY STRUCT & IMPL
// ============================================================================

pub struct Registry;

impl Registry {
    pub fn get_all_columns() -> &'static Vec<ColumnMetadata> {
        &COLUMNS
    }

    pub fn get_by_category(category: Category) -> Vec<ColumnMetadata> {
        COLUMNS
            .iter()
            .filter(|c| c.category == category)
            .cloned()
            .collect()
    }

    /// O(1) lookup by canonical name
    pub fn get_metadata(name: CanonicalName) -> Option<&'static ColumnMetadata> {
        COLUMN_MAP.get(&name).and_then(|&idx| COLUMNS.get(idx))
    }

    pub fn fill_policy(name: CanonicalName) -> FillPolicy {
        Self::get_metadata(name)
            .map(|m| m.fill_policy)
            .unwrap_or(FillPolicy::StepHold)
    }

    pub fn unit(name: CanonicalName) -> Option<Unit> {
        Self::get_metadata(name).map(|m| m.unit)
    }

    /// Derivation rules in dependency order: a rule only reads columns
    /// produced by source data or by rules listed before it.
    pub fn get_rules(config: &PipelineConfig) -> Vec<Box<dyn DerivationRule + Send + Sync>> {
        let mut rules: Vec<Box<dyn DerivationRule + Send + Sync>> = vec![
            Box::new(GoldKrwPerGram::new(config.troy_ounce_grams)),
            Box::new(DailyMoneySupply),
            Box::new(YearOverYear::cpi()),
            Box::new(YearOverYear::money_supply()),
            Box::new(RealRate),
            Box::new(YieldSpread::korea(config.spread_smoothing)),
            Box::new(YieldSpread::us(config.spread_smoothing)),
        ];

        for base in &config.ma_targets {
            for &window in &config.ma_windows {
                rules.push(Box::new(MovingAverage::new(*base, window)));
            }
        }

        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_canonical_name_registered() {
        for name in CanonicalName::ALL {
            assert!(Registry::get_metadata(name).is_some(), "{} missing from registry", name);
        }
        assert_eq!(Registry::get_all_columns().len(), CanonicalName::ALL.len());
    }

    #[test]
    fn test_visibility_defaults() {
        let hidden: Vec<_> = Registry::get_all_columns()
            .iter()
            .filter(|c| c.hidden_by_default)
            .map(|c| c.name.label())
            .collect();
        assert_eq!(hidden, vec!["FX", "Rate", "Bond10"]);

        assert_eq!(Registry::fill_policy(CanonicalName::MoneySupplyKRDaily), FillPolicy::LinearInterpolate);
        assert_eq!(Registry::get_by_category(Category::Inflation).len(), 3);
    }

    #[test]
    fn test_rules_include_configured_moving_averages() {
        let config = PipelineConfig::default();
        let rules = Registry::get_rules(&config);
        let expected = 7 + config.ma_targets.len() * config.ma_windows.len();
        assert_eq!(rules.len(), expected);
    }
}
