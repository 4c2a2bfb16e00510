use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::technicals::trend_with_params;
use crate::core::config::{MissingMoneySupply, PipelineConfig};
use crate::core::error::{PipelineError, Result};
use crate::core::panel::Panel;
use crate::core::window::ViewWindow;
use crate::models::{CanonicalName, ColumnId};

pub const COMPOSITE_MIN: i8 = -3;
pub const COMPOSITE_MAX: i8 = 3;
pub const MACRO_MIN: i8 = -3;
pub const MACRO_MAX: i8 = 3;

// =============================================================================
// MACRO BUCKETS
// =============================================================================

/// Money-supply YoY classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneySupplyBucket {
    Surging,      // > 9%        +2
    Expanding,    // 6% ..= 9%   +1
    Decelerating, // 3% ..< 6%   -1 (둔화)
    Contracting,  // < 3%        -2
    Unknown,
}

impl MoneySupplyBucket {
    /// The +2 boundary is strict: exactly 9.0 is `Expanding`.
    pub fn classify(yoy: Option<f64>) -> Self {
        match yoy {
            Some(v) if v.is_nan() => MoneySupplyBucket::Unknown,
            Some(v) if v > 9.0 => MoneySupplyBucket::Surging,
            Some(v) if v >= 6.0 => MoneySupplyBucket::Expanding,
            Some(v) if v >= 3.0 => MoneySupplyBucket::Decelerating,
            Some(_) => MoneySupplyBucket::Contracting,
            None => MoneySupplyBucket::Unknown,
        }
    }

    pub fn score(&self, missing: MissingMoneySupply) -> Option<i8> {
        match self {
            MoneySupplyBucket::Surging => Some(2),
            MoneySupplyBucket::Expanding => Some(1),
            MoneySupplyBucket::Decelerating => Some(-1),
            MoneySupplyBucket::Contracting => Some(-2),
            MoneySupplyBucket::Unknown => match missing {
                MissingMoneySupply::Neutral => None,
                MissingMoneySupply::AssumeSlowing => Some(-1),
            },
        }
    }
}

/// Smoothed (long yield - policy rate) sign bucket.
pub fn spread_bucket(spread: Option<f64>) -> Option<i8> {
    match spread {
        Some(v) if v > 0.5 => Some(1),
        Some(v) if v < 0.0 => Some(-1),
        Some(v) if v.is_nan() => None,
        Some(_) => Some(0),
        None => None,
    }
}

/// A macro score term: declares its inputs and scores every panel day.
pub trait MacroComponent {
    fn name(&self) -> &str;

    fn required_inputs(&self) -> Vec<ColumnId>;

    /// Only called when every required input is present in the panel.
    fn score(&self, panel: &Panel) -> Vec<Option<i8>>;
}

pub struct MoneySupplyComponent {
    pub missing: MissingMoneySupply,
}

impl MacroComponent for MoneySupplyComponent {
    fn name(&self) -> &str {
        "money_supply_yoy"
    }

    fn required_inputs(&self) -> Vec<ColumnId> {
        vec![CanonicalName::MoneySupplyYoY.into()]
    }

    fn score(&self, panel: &Panel) -> Vec<Option<i8>> {
        // M2_YoY is already forward-filled from month-end values, so each
        // day reads the last known monthly classification.
        panel
            .canonical(CanonicalName::MoneySupplyYoY)
            .map(|values| {
                values
                    .iter()
                    .map(|v| MoneySupplyBucket::classify(*v).score(self.missing))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct YieldSpreadComponent;

impl MacroComponent for YieldSpreadComponent {
    fn name(&self) -> &str {
        "yield_spread_kr"
    }

    fn required_inputs(&self) -> Vec<ColumnId> {
        vec![CanonicalName::YieldSpreadKR.into()]
    }

    fn score(&self, panel: &Panel) -> Vec<Option<i8>> {
        panel
            .canonical(CanonicalName::YieldSpreadKR)
            .map(|values| values.iter().map(|v| spread_bucket(*v)).collect())
            .unwrap_or_default()
    }
}

pub fn macro_components(config: &PipelineConfig) -> Vec<Box<dyn MacroComponent + Send + Sync>> {
    vec![
        Box::new(MoneySupplyComponent {
            missing: config.missing_money_supply,
        }),
        Box::new(YieldSpreadComponent),
    ]
}

// =============================================================================
// OUTPUT TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegimePoint {
    pub date: NaiveDate,
    pub trend: Option<i8>,
    pub macro_score: Option<i8>,
    pub composite: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalChange {
    pub date: NaiveDate,
    pub previous: i8,
    pub new: i8,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetScores {
    pub label: String,
    pub column: CanonicalName,
    pub points: Vec<RegimePoint>,
    pub markers: Vec<SignalChange>,
}

impl AssetScores {
    pub fn latest(&self) -> Option<&RegimePoint> {
        self.points.last()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegimeScoreTable {
    pub window: ViewWindow,
    /// Macro components whose inputs were available
    pub macro_components: Vec<String>,
    pub assets: Vec<AssetScores>,
}

impl RegimeScoreTable {
    pub fn asset(&self, label: &str) -> Option<&AssetScores> {
        self.assets.iter().find(|a| a.label == label)
    }

    pub fn score_at(&self, label: &str, date: NaiveDate) -> Option<i8> {
        let asset = self.asset(label)?;
        asset
            .points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| asset.points[i].composite)
    }

    pub fn latest(&self, label: &str) -> Option<&RegimePoint> {
        self.asset(label).and_then(|a| a.latest())
    }
}

// =============================================================================
// SCORING
// =============================================================================

pub fn clip(value: i32, lo: i8, hi: i8) -> i8 {
    value.clamp(lo as i32, hi as i32) as i8
}

/// Sum of the components present on each day, clipped to the macro range.
pub fn macro_subscore(component_scores: &[Vec<Option<i8>>], len: usize) -> Vec<Option<i8>> {
    (0..len)
        .map(|i| {
            let present: Vec<i32> = component_scores
                .iter()
                .filter_map(|scores| scores.get(i).copied().flatten())
                .map(i32::from)
                .collect();
            if present.is_empty() {
                None
            } else {
                Some(clip(present.iter().sum(), MACRO_MIN, MACRO_MAX))
            }
        })
        .collect()
}

/// `clip(trend + macro, -3, +3)`; absent terms are omitted, not zeroed.
pub fn composite(trend: Option<i8>, macro_score: Option<i8>) -> Option<i8> {
    match (trend, macro_score) {
        (None, None) => None,
        (t, m) => Some(clip(
            i32::from(t.unwrap_or(0)) + i32::from(m.unwrap_or(0)),
            COMPOSITE_MIN,
            COMPOSITE_MAX,
        )),
    }
}

/// One marker per point whose composite differs from the previous point's,
/// dropping changes closer than `min_spacing_days` to the last marker.
///
/// Points need not be consecutive days. A change is measured against the
/// last scored day before it, however far back that is.
pub fn signal_changes(points: &[RegimePoint], min_spacing_days: i64) -> Vec<SignalChange> {
    let mut markers: Vec<SignalChange> = Vec::new();

    for pair in points.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if prev.composite == cur.composite {
            continue;
        }
        if let Some(last) = markers.last() {
            if (cur.date - last.date).num_days() < min_spacing_days {
                debug!(date = %cur.date, last = %last.date, "signal change suppressed");
                continue;
            }
        }
        markers.push(SignalChange {
            date: cur.date,
            previous: prev.composite,
            new: cur.composite,
        });
    }

    markers
}

/// Scores every configured asset over `window`.
///
/// Indicators run over the full panel so moving averages have warm-up
/// history before the window start; only days inside the window are kept.
///
/// Days without any score input produce no point, so a gap never reads as
/// a change to or from neutral.
pub fn score_regimes(panel: &Panel, window: &ViewWindow, config: &PipelineConfig) -> Result<RegimeScoreTable> {
    let view = panel.window(window)?;
    let lo = view
        .index()
        .first()
        .and_then(|d| panel.position(*d))
        .ok_or(PipelineError::EmptyWindow {
            start: window.start(),
            end: window.end(),
        })?;
    let hi = lo + view.len();

    let mut available = Vec::new();
    let mut component_scores = Vec::new();
    for component in macro_components(config) {
        if let Some(missing) = component.required_inputs().into_iter().find(|c| !panel.contains(c)) {
            debug!(component = component.name(), input = %missing, "macro component unavailable");
            continue;
        }
        available.push(component.name().to_string());
        component_scores.push(component.score(panel));
    }
    let macro_scores = macro_subscore(&component_scores, panel.len());

    let mut assets = Vec::new();
    for asset_spec in &config.assets {
        let trend = panel
            .canonical(asset_spec.column)
            .map(|values| trend_with_params(values, &config.trend));

        if trend.is_none() && component_scores.is_empty() {
            debug!(asset = %asset_spec.label, column = %asset_spec.column, "asset has no inputs, excluded");
            continue;
        }

        let points: Vec<RegimePoint> = (lo..hi)
            .filter_map(|i| {
                let t = trend.as_ref().and_then(|scores| scores[i]);
                let m = macro_scores[i];
                composite(t, m).map(|c| RegimePoint {
                    date: panel.index()[i],
                    trend: t,
                    macro_score: m,
                    composite: c,
                })
            })
            .collect();

        let markers = signal_changes(&points, config.marker_min_spacing_days);
        assets.push(AssetScores {
            label: asset_spec.label.clone(),
            column: asset_spec.column,
            points,
            markers,
        });
    }

    info!(
        start = %window.start(),
        end = %window.end(),
        assets = assets.len(),
        components = ?available,
        "regime scores computed"
    );

    Ok(RegimeScoreTable {
        window: *window,
        macro_components: available,
        assets,
    })
}
