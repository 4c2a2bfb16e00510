use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::PipelineError;
use crate::core::timeseries::TimeSeries;
use crate::models::DataPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Values as-is
    #[default]
    Raw,
    /// (x - min) / (max - min) over the series passed in
    MinMax,
}

/// Min and max of the present values, if any.
pub fn value_range(series: &TimeSeries) -> Option<(f64, f64)> {
    series
        .points()
        .iter()
        .filter_map(|dp| dp.value)
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Scales a series independently of any other.
///
/// MinMax uses the min/max of exactly the points passed in, so callers pass
/// the windowed slice. A constant or all-missing series comes back as zeros
/// over the same dates.
pub fn scale(series: &TimeSeries, mode: ScaleMode) -> TimeSeries {
    match mode {
        ScaleMode::Raw => series.clone(),
        ScaleMode::MinMax => min_max(series),
    }
}

fn min_max(series: &TimeSeries) -> TimeSeries {
    let range = value_range(series);

    let points: Vec<DataPoint> = match range {
        Some((lo, hi)) if hi > lo => {
            let span = hi - lo;
            series
                .points()
                .iter()
                .map(|dp| DataPoint {
                    date: dp.date,
                    value: dp.value.filter(|v| v.is_finite()).map(|v| (v - lo) / span),
                })
                .collect()
        }
        _ => {
            let err = PipelineError::DegenerateRange {
                column: series.name.clone(),
                value: range.map_or(f64::NAN, |(lo, _)| lo),
            };
            debug!(error = %err, "zero-variance window, scaling to zeros");
            series
                .points()
                .iter()
                .map(|dp| DataPoint::new(dp.date, 0.0))
                .collect()
        }
    };

    TimeSeries::new(series.name.clone(), series.frequency, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use chrono::NaiveDate;

    fn series(values: &[Option<f64>]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| DataPoint {
                date: start + chrono::Duration::days(i as i64),
                value: *v,
            })
            .collect();
        TimeSeries::new("KODEX200", Frequency::Daily, points)
    }

    #[test]
    fn test_raw_is_identity() {
        let s = series(&[Some(1.0), None, Some(3.0)]);
        assert_eq!(scale(&s, ScaleMode::Raw), s);
    }

    #[test]
    fn test_min_max_maps_extremes() {
        let s = series(&[Some(10.0), Some(15.0), None, Some(20.0)]);
        let out = scale(&s, ScaleMode::MinMax);
        assert_eq!(out.values(), vec![Some(0.0), Some(0.5), None, Some(1.0)]);
    }

    #[test]
    fn test_constant_series_scales_to_zeros() {
        let s = series(&[Some(5.0), Some(5.0), Some(5.0)]);
        let out = scale(&s, ScaleMode::MinMax);
        assert_eq!(out.values(), vec![Some(0.0); 3]);
    }

    #[test]
    fn test_all_missing_scales_to_zeros() {
        let s = series(&[None, None]);
        let out = scale(&s, ScaleMode::MinMax);
        assert_eq!(out.values(), vec![Some(0.0), Some(0.0)]);
        assert_eq!(out.dates(), s.dates());
    }
}
