use super::DerivationRule;
use crate::core::panel::Panel;
use crate::models::{CanonicalName, ColumnId};

/// Grams per troy ounce.
pub const TROY_OUNCE_GRAMS: f64 = 31.1035;

/// Dollar gold per ounce converted to won per gram.
pub struct GoldKrwPerGram {
    divisor: f64,
}

impl GoldKrwPerGram {
    pub fn new(divisor: f64) -> Self {
        Self { divisor }
    }
}

impl Default for GoldKrwPerGram {
    fn default() -> Self {
        Self::new(TROY_OUNCE_GRAMS)
    }
}

/// `price * fx / divisor`, missing when either side is missing.
pub fn convert_currency(price: &[Option<f64>], fx: &[Option<f64>], divisor: f64) -> Vec<Option<f64>> {
    price
        .iter()
        .zip(fx.iter())
        .map(|(p, r)| match (p, r) {
            (Some(p), Some(r)) if divisor != 0.0 => Some(p * r / divisor),
            _ => None,
        })
        .collect()
}

impl DerivationRule for GoldKrwPerGram {
    fn slug(&self) -> &str {
        "gold_krw_per_gram"
    }

    fn target(&self) -> ColumnId {
        CanonicalName::GoldKRWPerGram.into()
    }

    fn required_inputs(&self) -> Vec<ColumnId> {
        vec![CanonicalName::Gold.into(), CanonicalName::FX.into()]
    }

    fn calculate(&self, panel: &Panel) -> Vec<Option<f64>> {
        match (panel.canonical(CanonicalName::Gold), panel.canonical(CanonicalName::FX)) {
            (Some(gold), Some(fx)) => convert_currency(gold, fx, self.divisor),
            _ => vec![None; panel.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeseries::daily_calendar;
    use chrono::NaiveDate;

    #[test]
    fn test_gold_krw_per_gram() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let panel = Panel::new(daily_calendar(day, day))
            .with_column(CanonicalName::Gold, vec![Some(1900.0)])
            .with_column(CanonicalName::FX, vec![Some(1330.0)]);

        let result = GoldKrwPerGram::default().calculate(&panel);

        assert_eq!(result.len(), 1);
        // 1900 * 1330 / 31.1035
        assert!((result[0].unwrap() - 81244.876).abs() < 0.1);
    }

    #[test]
    fn test_missing_side_stays_missing() {
        let out = convert_currency(&[Some(1900.0), None], &[None, Some(1330.0)], TROY_OUNCE_GRAMS);
        assert_eq!(out, vec![None, None]);
    }
}
