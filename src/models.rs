use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl DataPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value: Some(value) }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, value: None }
    }
}

/// Native sampling frequency of a source series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// How gaps between observations are filled on the daily calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Level holds until the next observation (policy rate, yields, CPI).
    StepHold,
    /// Straight line between anchors (money supply and other stocks).
    LinearInterpolate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// KRW price (e.g., KODEX200, KRX gold per gram)
    Krw,
    /// USD price (e.g., gold per troy ounce)
    Usd,
    /// KRW per USD
    KrwPerUsd,
    /// Percent (rates, yields, YoY changes)
    Percent,
    /// Raw index level (CPI, S&P 500)
    Index,
    /// Monetary aggregate in KRW billions
    KrwBillions,
}

impl Unit {
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Unit::Krw => format!("₩{}", group_thousands(value, 0)),
            Unit::Usd => format!("${}", group_thousands(value, 2)),
            Unit::KrwPerUsd => format!("{} KRW/USD", group_thousands(value, 2)),
            Unit::Percent => format!("{:.2}%", value),
            Unit::Index => group_thousands(value, 2),
            Unit::KrwBillions => format!("₩{}B", group_thousands(value, 0)),
        }
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// A series as handed over by the fetch layer, before reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSeries {
    pub name: String,
    pub frequency: Frequency,
    pub unit: Option<Unit>,
    pub points: Vec<DataPoint>,
}

impl RawSeries {
    pub fn new(name: impl Into<String>, frequency: Frequency, points: Vec<DataPoint>) -> Self {
        Self {
            name: name.into(),
            frequency,
            unit: None,
            points,
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// Semantic columns recognized regardless of upstream vendor naming.
///
/// Declaration order is the order the reconciler tries targets in, and the
/// order columns appear in the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalName {
    FX,
    Gold,
    GoldKRX,
    GoldKRWPerGram,
    EquityIndexKR,
    EquityIndexUS,
    MoneySupplyKR,
    MoneySupplyKRDaily,
    MoneySupplyYoY,
    PolicyRateKR,
    PolicyRateUS,
    Bond10KR,
    Bond10US,
    CPI,
    CoreCPI,
    CpiYoY,
    RealRate,
    YieldSpreadKR,
    YieldSpreadUS,
}

impl CanonicalName {
    pub const ALL: [CanonicalName; 19] = [
        CanonicalName::FX,
        CanonicalName::Gold,
        CanonicalName::GoldKRX,
        CanonicalName::GoldKRWPerGram,
        CanonicalName::EquityIndexKR,
        CanonicalName::EquityIndexUS,
        CanonicalName::MoneySupplyKR,
        CanonicalName::MoneySupplyKRDaily,
        CanonicalName::MoneySupplyYoY,
        CanonicalName::PolicyRateKR,
        CanonicalName::PolicyRateUS,
        CanonicalName::Bond10KR,
        CanonicalName::Bond10US,
        CanonicalName::CPI,
        CanonicalName::CoreCPI,
        CanonicalName::CpiYoY,
        CanonicalName::RealRate,
        CanonicalName::YieldSpreadKR,
        CanonicalName::YieldSpreadUS,
    ];

    /// Column header used by the persisted table and the chart legend.
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalName::FX => "FX",
            CanonicalName::Gold => "Gold",
            CanonicalName::GoldKRX => "KRX_GOLD",
            CanonicalName::GoldKRWPerGram => "Gold_KRWg",
            CanonicalName::EquityIndexKR => "KODEX200",
            CanonicalName::EquityIndexUS => "SP500",
            CanonicalName::MoneySupplyKR => "M2",
            CanonicalName::MoneySupplyKRDaily => "M2_D",
            CanonicalName::MoneySupplyYoY => "M2_YoY",
            CanonicalName::PolicyRateKR => "Rate",
            CanonicalName::PolicyRateUS => "Rate_US",
            CanonicalName::Bond10KR => "Bond10",
            CanonicalName::Bond10US => "Bond10_US",
            CanonicalName::CPI => "CPI",
            CanonicalName::CoreCPI => "CoreCPI",
            CanonicalName::CpiYoY => "CPI_YoY",
            CanonicalName::RealRate => "real_rate",
            CanonicalName::YieldSpreadKR => "Spread_KR",
            CanonicalName::YieldSpreadUS => "Spread_US",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Key of a panel column: a canonical series or a moving-average overlay of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnId {
    Canonical(CanonicalName),
    MovingAverage(CanonicalName, usize),
}

impl ColumnId {
    pub fn base(&self) -> CanonicalName {
        match self {
            ColumnId::Canonical(name) | ColumnId::MovingAverage(name, _) => *name,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ColumnId::Canonical(name) => name.label().to_string(),
            ColumnId::MovingAverage(name, window) => format!("{}_MA{}", name.label(), window),
        }
    }
}

impl From<CanonicalName> for ColumnId {
    fn from(name: CanonicalName) -> Self {
        ColumnId::Canonical(name)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for name in CanonicalName::ALL {
            assert_eq!(CanonicalName::from_label(name.label()), Some(name));
        }
        assert_eq!(CanonicalName::from_label("KODEX 200"), None);
    }

    #[test]
    fn test_moving_average_label() {
        let id = ColumnId::MovingAverage(CanonicalName::EquityIndexKR, 20);
        assert_eq!(id.label(), "KODEX200_MA20");
        assert_eq!(id.base(), CanonicalName::EquityIndexKR);
    }

    #[test]
    fn test_unit_formatting() {
        assert_eq!(Unit::Krw.format_value(81244.88), "₩81,245");
        assert_eq!(Unit::Percent.format_value(3.5), "3.50%");
        assert_eq!(Unit::Usd.format_value(1900.0), "$1,900.00");
        assert_eq!(Unit::Index.format_value(-1234567.891), "-1,234,567.89");
    }
}
