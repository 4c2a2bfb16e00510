use serde::{Deserialize, Serialize};

use crate::core::config::TrendParams;
use crate::core::timeseries::{pct_change, rolling_mean};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TrendStrength {
    StrongUp,   // +2: MA cross and momentum both up
    WeakUp,     // +1
    Neutral,    //  0
    WeakDown,   // -1
    StrongDown, // -2: both down
}

impl TrendStrength {
    pub fn from_score(score: i8) -> Self {
        match score {
            s if s >= 2 => TrendStrength::StrongUp,
            1 => TrendStrength::WeakUp,
            0 => TrendStrength::Neutral,
            -1 => TrendStrength::WeakDown,
            _ => TrendStrength::StrongDown,
        }
    }
}

/// -1 / 0 / +1. Undefined input counts as 0.
pub fn sign(value: Option<f64>) -> i8 {
    match value {
        Some(v) if v > 0.0 => 1,
        Some(v) if v < 0.0 => -1,
        _ => 0,
    }
}

/// Per-day trend sub-score in [-2, +2]:
/// `sign(MA_short - MA_long) + sign(pct_change(momentum))`.
///
/// Terms without enough history count as 0. Days where the price itself is
/// missing get no score.
pub fn trend_subscore(
    values: &[Option<f64>],
    short_window: usize,
    long_window: usize,
    momentum_window: usize,
) -> Vec<Option<i8>> {
    let ma_short = rolling_mean(values, short_window);
    let ma_long = rolling_mean(values, long_window);
    let momentum = pct_change(values, momentum_window);

    values
        .iter()
        .enumerate()
        .map(|(i, price)| {
            if price.is_none() {
                return None;
            }
            let cross = match (ma_short[i], ma_long[i]) {
                (Some(s), Some(l)) => Some(s - l),
                _ => None,
            };
            Some(sign(cross) + sign(momentum[i]))
        })
        .collect()
}

pub fn trend_with_params(values: &[Option<f64>], params: &TrendParams) -> Vec<Option<i8>> {
    trend_subscore(values, params.short_window, params.long_window, params.momentum_window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, step: f64) -> Vec<Option<f64>> {
        (0..n).map(|i| Some(100.0 + step * i as f64)).collect()
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(Some(0.3)), 1);
        assert_eq!(sign(Some(-2.0)), -1);
        assert_eq!(sign(Some(0.0)), 0);
        assert_eq!(sign(None), 0);
    }

    #[test]
    fn test_rising_series_scores_plus_two() {
        let scores = trend_subscore(&ramp(30, 1.0), 3, 10, 5);
        assert_eq!(scores[29], Some(2));
        // before the long MA is defined only momentum counts
        assert_eq!(scores[6], Some(1));
        // no history at all
        assert_eq!(scores[0], Some(0));
    }

    #[test]
    fn test_falling_series_scores_minus_two() {
        let scores = trend_subscore(&ramp(30, -1.0), 3, 10, 5);
        assert_eq!(scores[29], Some(-2));
        assert_eq!(TrendStrength::from_score(-2), TrendStrength::StrongDown);
    }

    #[test]
    fn test_missing_price_has_no_score() {
        let mut values = ramp(12, 1.0);
        values[0] = None;
        values[11] = None;
        let scores = trend_subscore(&values, 2, 4, 3);
        assert_eq!(scores[0], None);
        assert_eq!(scores[11], None);
        assert!(scores[1..11].iter().all(|s| s.is_some_and(|v| (-2..=2).contains(&v))));
    }

    #[test]
    fn test_flat_tail_scores_neutral() {
        // series that stopped updating and is held at its last level
        let mut values: Vec<Option<f64>> = (0..400)
            .map(|i| Some(35000.0 + 1200.0 * (i as f64 * 0.21).sin() + 3.7 * i as f64))
            .collect();
        values.extend(std::iter::repeat(Some(35987.61)).take(300));

        let scores = trend_subscore(&values, 20, 120, 21);
        assert!(scores[400 + 120..].iter().all(|s| *s == Some(0)));
    }
}
