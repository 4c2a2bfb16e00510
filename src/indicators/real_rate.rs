use std::collections::BTreeMap;

use super::yoy::{month_end_levels, monthly_yoy};
use super::DerivationRule;
use crate::core::panel::Panel;
use crate::core::timeseries::broadcast_ffill;
use crate::models::{CanonicalName, ColumnId};

/// Base rate minus CPI YoY, both at month-end, held forward daily.
///
/// Inflation is recomputed from the CPI source when there is one, so months
/// before the analysis cutoff count toward the first year.
pub struct RealRate;

impl DerivationRule for RealRate {
    fn slug(&self) -> &str {
        "real_rate"
    }

    fn target(&self) -> ColumnId {
        CanonicalName::RealRate.into()
    }

    fn required_inputs(&self) -> Vec<ColumnId> {
        vec![CanonicalName::PolicyRateKR.into(), CanonicalName::CpiYoY.into()]
    }

    fn calculate(&self, panel: &Panel) -> Vec<Option<f64>> {
        let inflation = match (panel.source(CanonicalName::CpiYoY), panel.source(CanonicalName::CPI)) {
            (None, Some(_)) => monthly_yoy(&month_end_levels(panel, CanonicalName::CPI)),
            _ => month_end_levels(panel, CanonicalName::CpiYoY),
        };
        let inflation: BTreeMap<_, _> = inflation.into_iter().collect();

        let real: Vec<_> = month_end_levels(panel, CanonicalName::PolicyRateKR)
            .into_iter()
            .map(|(date, nominal)| {
                let cpi = inflation.get(&date).copied().flatten();
                let value = match (nominal, cpi) {
                    (Some(n), Some(c)) => Some(n - c),
                    _ => None,
                };
                (date, value)
            })
            .collect();

        broadcast_ffill(&real, panel.index())
    }
}
