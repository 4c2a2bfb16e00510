use super::DerivationRule;
use crate::core::panel::Panel;
use crate::core::timeseries::rolling_mean;
use crate::models::{CanonicalName, ColumnId};

/// Long yield minus policy rate, smoothed with a short rolling mean.
pub struct YieldSpread {
    long_yield: CanonicalName,
    policy_rate: CanonicalName,
    target: CanonicalName,
    smoothing: usize,
}

impl YieldSpread {
    pub fn korea(smoothing: usize) -> Self {
        Self {
            long_yield: CanonicalName::Bond10KR,
            policy_rate: CanonicalName::PolicyRateKR,
            target: CanonicalName::YieldSpreadKR,
            smoothing,
        }
    }

    pub fn us(smoothing: usize) -> Self {
        Self {
            long_yield: CanonicalName::Bond10US,
            policy_rate: CanonicalName::PolicyRateUS,
            target: CanonicalName::YieldSpreadUS,
            smoothing,
        }
    }
}

/// Helper to calculate a smoothed spread between two series (A - B)
pub fn smoothed_spread(a: &[Option<f64>], b: &[Option<f64>], smoothing: usize) -> Vec<Option<f64>> {
    let raw: Vec<Option<f64>> = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(x - y),
            _ => None,
        })
        .collect();

    if smoothing <= 1 {
        raw
    } else {
        rolling_mean(&raw, smoothing)
    }
}

impl DerivationRule for YieldSpread {
    fn slug(&self) -> &str {
        match self.target {
            CanonicalName::YieldSpreadUS => "yield_spread_us",
            _ => "yield_spread_kr",
        }
    }

    fn target(&self) -> ColumnId {
        self.target.into()
    }

    fn required_inputs(&self) -> Vec<ColumnId> {
        vec![self.long_yield.into(), self.policy_rate.into()]
    }

    fn calculate(&self, panel: &Panel) -> Vec<Option<f64>> {
        smoothed_spread(
            panel.canonical(self.long_yield).unwrap_or_default(),
            panel.canonical(self.policy_rate).unwrap_or_default(),
            self.smoothing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_smoothing() {
        let long = vec![Some(3.0), Some(3.2), Some(3.4), Some(3.6), Some(3.8), Some(4.0)];
        let policy = vec![Some(3.0); 6];
        let out = smoothed_spread(&long, &policy, 5);
        assert_eq!(out[3], None);
        assert!((out[4].unwrap() - 0.4).abs() < 1e-9);
        assert!((out[5].unwrap() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_gap_in_either_leg() {
        let out = smoothed_spread(&[Some(3.0), None], &[Some(2.0), Some(2.0)], 1);
        assert_eq!(out, vec![Some(1.0), None]);
    }
}
