use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::CanonicalName;

/// What a missing money-supply YoY reading contributes to the macro score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMoneySupply {
    /// Unknown bucket, contributes nothing
    Neutral,
    /// Treat as decelerating (-1), matching the legacy dashboard output
    AssumeSlowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendParams {
    pub short_window: usize,
    pub long_window: usize,
    pub momentum_window: usize,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 120,
            momentum_window: 21, // ~1 month of trading days
        }
    }
}

/// An asset scored by the regime engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub label: String,
    pub column: CanonicalName,
}

impl AssetSpec {
    pub fn new(label: impl Into<String>, column: CanonicalName) -> Self {
        Self { label: label.into(), column }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Panel rows before this date are dropped
    pub analysis_start: Option<NaiveDate>,
    pub ma_windows: Vec<usize>,
    pub ma_targets: Vec<CanonicalName>,
    pub trend: TrendParams,
    pub spread_smoothing: usize,
    pub marker_min_spacing_days: i64,
    pub troy_ounce_grams: f64,
    pub missing_money_supply: MissingMoneySupply,
    pub assets: Vec<AssetSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analysis_start: NaiveDate::from_ymd_opt(2008, 1, 1),
            ma_windows: vec![20, 50, 120],
            ma_targets: vec![CanonicalName::EquityIndexKR, CanonicalName::GoldKRWPerGram],
            trend: TrendParams::default(),
            spread_smoothing: 5,
            marker_min_spacing_days: 30,
            troy_ounce_grams: 31.1035,
            missing_money_supply: MissingMoneySupply::Neutral,
            assets: vec![
                AssetSpec::new("KODEX200", CanonicalName::EquityIndexKR),
                AssetSpec::new("Gold_KRWg", CanonicalName::GoldKRWPerGram),
                AssetSpec::new("SP500", CanonicalName::EquityIndexUS),
            ],
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Loads `.env`, then applies `MACRO_OVERLAY_*` overrides on top of the
    /// defaults (or of the JSON file named by `MACRO_OVERLAY_CONFIG`).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("MACRO_OVERLAY_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(start) = std::env::var("MACRO_OVERLAY_START") {
            config.analysis_start = if start.trim().is_empty() {
                None
            } else {
                Some(
                    NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")
                        .with_context(|| format!("Invalid MACRO_OVERLAY_START '{}'", start))?,
                )
            };
        }

        if let Ok(spacing) = std::env::var("MACRO_OVERLAY_MARKER_SPACING") {
            config.marker_min_spacing_days = spacing
                .trim()
                .parse()
                .with_context(|| format!("Invalid MACRO_OVERLAY_MARKER_SPACING '{}'", spacing))?;
        }

        if let Ok(policy) = std::env::var("MACRO_OVERLAY_MISSING_M2") {
            config.missing_money_supply = match policy.trim() {
                "neutral" => MissingMoneySupply::Neutral,
                "assume_slowing" => MissingMoneySupply::AssumeSlowing,
                other => return Err(anyhow!("Unknown MACRO_OVERLAY_MISSING_M2 '{}'", other)),
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.trend;
        if t.short_window == 0 || t.long_window == 0 || t.momentum_window == 0 {
            return Err(anyhow!("Trend windows must be >= 1"));
        }
        if t.short_window >= t.long_window {
            return Err(anyhow!(
                "Short MA window ({}) must be shorter than long window ({})",
                t.short_window,
                t.long_window
            ));
        }
        if self.ma_windows.iter().any(|&w| w == 0) || self.spread_smoothing == 0 {
            return Err(anyhow!("Rolling windows must be >= 1"));
        }
        if self.troy_ounce_grams <= 0.0 {
            return Err(anyhow!("troy_ounce_grams must be positive"));
        }
        if self.marker_min_spacing_days < 0 {
            return Err(anyhow!("marker_min_spacing_days must be >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis_start, NaiveDate::from_ymd_opt(2008, 1, 1));
        assert_eq!(config.marker_min_spacing_days, 30);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = PipelineConfig::from_json(
            r#"{ "marker_min_spacing_days": 10, "missing_money_supply": "assume_slowing",
                 "assets": [{ "label": "Gold", "column": "GoldKRWPerGram" }] }"#,
        )
        .unwrap();
        assert_eq!(config.marker_min_spacing_days, 10);
        assert_eq!(config.missing_money_supply, MissingMoneySupply::AssumeSlowing);
        assert_eq!(config.assets, vec![AssetSpec::new("Gold", CanonicalName::GoldKRWPerGram)]);
        assert_eq!(config.ma_windows, vec![20, 50, 120]);
    }

    #[test]
    fn test_rejects_inverted_trend_windows() {
        let err = PipelineConfig::from_json(
            r#"{ "trend": { "short_window": 50, "long_window": 20, "momentum_window": 21 } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("shorter"));
    }
}
