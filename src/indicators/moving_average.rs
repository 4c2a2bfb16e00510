use super::DerivationRule;
use crate::core::panel::Panel;
use crate::core::timeseries::rolling_mean;
use crate::models::{CanonicalName, ColumnId};

/// Simple moving average overlay of a canonical column.
pub struct MovingAverage {
    base: CanonicalName,
    window: usize,
    slug: String,
}

impl MovingAverage {
    pub fn new(base: CanonicalName, window: usize) -> Self {
        Self {
            base,
            window,
            slug: format!("{}_ma{}", base.label().to_lowercase(), window),
        }
    }
}

impl DerivationRule for MovingAverage {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn target(&self) -> ColumnId {
        ColumnId::MovingAverage(self.base, self.window)
    }

    fn required_inputs(&self) -> Vec<ColumnId> {
        vec![self.base.into()]
    }

    fn calculate(&self, panel: &Panel) -> Vec<Option<f64>> {
        rolling_mean(panel.canonical(self.base).unwrap_or_default(), self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeseries::daily_calendar;
    use chrono::NaiveDate;

    #[test]
    fn test_moving_average_column() {
        let index = daily_calendar(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        );
        let panel = Panel::new(index)
            .with_column(CanonicalName::EquityIndexKR, vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)]);

        let rule = MovingAverage::new(CanonicalName::EquityIndexKR, 2);
        assert_eq!(rule.slug(), "kodex200_ma2");
        assert_eq!(rule.target().label(), "KODEX200_MA2");
        assert_eq!(rule.calculate(&panel), vec![None, Some(15.0), Some(25.0), Some(35.0)]);
    }
}
