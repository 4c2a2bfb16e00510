use crate::models::{DataPoint, FillPolicy, Frequency};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

/// Named, date-ordered sequence of optional values.
///
/// Dates are strictly increasing and unique. The constructor sorts its input
/// and keeps the last observation when a date appears more than once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub name: String,
    pub frequency: Frequency,
    points: Vec<DataPoint>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, frequency: Frequency, mut points: Vec<DataPoint>) -> Self {
        let name = name.into();
        points.sort_by_key(|dp| dp.date);

        let before = points.len();
        // dedup_by_key keeps the first of a run; reverse so the latest entry survives
        points.reverse();
        points.dedup_by_key(|dp| dp.date);
        points.reverse();
        if points.len() != before {
            warn!(series = %name, dropped = before - points.len(), "duplicate dates collapsed");
        }

        Self { name, frequency, points }
    }

    pub fn empty(name: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            name: name.into(),
            frequency,
            points: Vec::new(),
        }
    }

    /// Builds a series from an already ordered calendar and matching values.
    pub fn from_parts(
        name: impl Into<String>,
        frequency: Frequency,
        dates: &[NaiveDate],
        values: &[Option<f64>],
    ) -> Self {
        let points = dates
            .iter()
            .zip(values.iter())
            .map(|(date, value)| DataPoint { date: *date, value: *value })
            .collect();
        Self::new(name, frequency, points)
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|dp| dp.date).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|dp| dp.value).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|dp| dp.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|dp| dp.date)
    }

    /// Date of the first non-missing value.
    pub fn first_observed(&self) -> Option<NaiveDate> {
        self.points.iter().find(|dp| dp.value.is_some()).map(|dp| dp.date)
    }

    /// Last non-missing observation.
    pub fn latest(&self) -> Option<DataPoint> {
        self.points.iter().rev().find(|dp| dp.value.is_some()).copied()
    }

    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |dp| dp.date)
            .ok()
            .and_then(|i| self.points[i].value)
    }
}

/// Every calendar day from `first` to `last`, inclusive.
pub fn daily_calendar(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    if first > last {
        return Vec::new();
    }
    first.iter_days().take_while(|d| *d <= last).collect()
}

/// Resamples a series onto a daily calendar spanning its own first/last date.
///
/// `native` is only logged. The fill policy alone decides how gaps between
/// observations are filled, whatever the input frequency.
pub fn normalize(series: &TimeSeries, native: Frequency, policy: FillPolicy) -> TimeSeries {
    normalize_as(series, native, policy, &series.name)
}

/// Same as [`normalize`] but names the output.
///
/// An empty input yields an empty daily series carrying `name`.
pub fn normalize_as(
    series: &TimeSeries,
    native: Frequency,
    policy: FillPolicy,
    name: &str,
) -> TimeSeries {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        debug!(series = %series.name, "normalizing empty series");
        return TimeSeries::empty(name, Frequency::Daily);
    };

    debug!(series = %series.name, ?native, ?policy, %first, %last, "normalizing to daily");

    let calendar = daily_calendar(first, last);
    let values = match policy {
        FillPolicy::StepHold => step_hold(series.points(), &calendar),
        FillPolicy::LinearInterpolate => interpolate(series.points(), &calendar),
    };

    TimeSeries::from_parts(name, Frequency::Daily, &calendar, &values)
}

/// Value at each index date = most recent known value at or before it.
/// Dates before the first observation stay missing.
pub fn step_hold(points: &[DataPoint], index: &[NaiveDate]) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(index.len());
    let mut last_val: Option<f64> = None;
    let mut iter = points.iter().peekable();

    for date in index {
        // Advance until we pass the current date
        while let Some(dp) = iter.peek() {
            if dp.date <= *date {
                if dp.value.is_some() {
                    last_val = dp.value;
                }
                iter.next();
            } else {
                break;
            }
        }
        result.push(last_val);
    }

    result
}

/// Linear interpolation between known anchors. No extrapolation on either side.
pub fn interpolate(points: &[DataPoint], index: &[NaiveDate]) -> Vec<Option<f64>> {
    let anchors: Vec<(NaiveDate, f64)> = points
        .iter()
        .filter_map(|dp| dp.value.map(|v| (dp.date, v)))
        .collect();

    let mut result = Vec::with_capacity(index.len());
    let mut seg = 0usize;

    for date in index {
        while seg + 1 < anchors.len() && anchors[seg + 1].0 <= *date {
            seg += 1;
        }

        let value = match (anchors.get(seg), anchors.get(seg + 1)) {
            (Some(&(d0, v0)), _) if d0 == *date => Some(v0),
            (Some(&(d0, v0)), Some(&(d1, v1))) if d0 < *date && *date < d1 => {
                let span = (d1 - d0).num_days() as f64;
                let offset = (*date - d0).num_days() as f64;
                Some(v0 + (v1 - v0) * offset / span)
            }
            _ => None,
        };
        result.push(value);
    }

    result
}

/// Exact-date lookup of a series onto an index; dates absent from the series are missing.
pub fn reindex(series: &TimeSeries, index: &[NaiveDate]) -> Vec<Option<f64>> {
    index.iter().map(|date| series.value_at(*date)).collect()
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// Month-end resample: one entry per calendar month between the first and
/// last index date, holding the last non-missing value observed that month.
pub fn resample_month_end(index: &[NaiveDate], values: &[Option<f64>]) -> Vec<(NaiveDate, Option<f64>)> {
    let (Some(first), Some(last)) = (index.first(), index.last()) else {
        return Vec::new();
    };

    let mut months: Vec<(NaiveDate, Option<f64>)> = Vec::new();
    let mut cursor = month_end(*first);
    let last_month = month_end(*last);
    while cursor <= last_month {
        months.push((cursor, None));
        cursor = match cursor.succ_opt() {
            Some(next) => month_end(next),
            None => break,
        };
    }

    let mut slot = 0usize;
    for (date, value) in index.iter().zip(values.iter()) {
        while slot < months.len() && months[slot].0 < *date {
            slot += 1;
        }
        if let (Some(v), Some(entry)) = (value, months.get_mut(slot)) {
            entry.1 = Some(*v);
        }
    }

    months
}

/// Broadcasts dated values onto a daily index, carrying the latest known
/// value forward. Index dates before the first known value stay missing.
pub fn broadcast_ffill(dated: &[(NaiveDate, Option<f64>)], index: &[NaiveDate]) -> Vec<Option<f64>> {
    let points: Vec<DataPoint> = dated
        .iter()
        .map(|(date, value)| DataPoint { date: *date, value: *value })
        .collect();
    step_hold(&points, index)
}

/// Fractional change versus `periods` positions earlier.
pub fn pct_change(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if periods == 0 || i < periods {
                return None;
            }
            match (values[i - periods], values[i]) {
                (Some(prev), Some(cur)) if prev != 0.0 => Some(cur / prev - 1.0),
                _ => None,
            }
        })
        .collect()
}

/// Simple rolling mean. A window containing a missing value is undefined.
///
/// Each window is summed fresh, as deviations from its newest value, so a
/// window of identical values returns that value exactly.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return result;
    }

    for end in (window - 1)..values.len() {
        let Some(anchor) = values[end] else {
            continue;
        };
        let deviation: Option<f64> = values[end + 1 - window..=end]
            .iter()
            .rev()
            .map(|v| v.map(|x| x - anchor))
            .sum();
        result[end] = deviation.map(|dev| anchor + dev / window as f64);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_new_sorts_and_keeps_latest_duplicate() {
        let s = TimeSeries::new(
            "FX",
            Frequency::Daily,
            vec![
                DataPoint::new(d(2024, 1, 3), 3.0),
                DataPoint::new(d(2024, 1, 1), 1.0),
                DataPoint::new(d(2024, 1, 3), 4.0),
            ],
        );
        assert_eq!(s.dates(), vec![d(2024, 1, 1), d(2024, 1, 3)]);
        assert_eq!(s.value_at(d(2024, 1, 3)), Some(4.0));
    }

    #[test]
    fn test_step_hold_fills_forward_only() {
        let s = TimeSeries::new(
            "Rate",
            Frequency::Monthly,
            vec![
                DataPoint::missing(d(2024, 1, 1)),
                DataPoint::new(d(2024, 1, 3), 3.5),
                DataPoint::new(d(2024, 1, 6), 3.25),
            ],
        );
        let out = normalize(&s, Frequency::Monthly, FillPolicy::StepHold);
        assert_eq!(out.len(), 6);
        assert_eq!(out.value_at(d(2024, 1, 1)), None);
        assert_eq!(out.value_at(d(2024, 1, 2)), None);
        assert_eq!(out.value_at(d(2024, 1, 5)), Some(3.5));
        assert_eq!(out.value_at(d(2024, 1, 6)), Some(3.25));
        assert_eq!(out.frequency, Frequency::Daily);
    }

    #[test]
    fn test_linear_interpolation_between_anchors() {
        let s = TimeSeries::new(
            "M2",
            Frequency::Monthly,
            vec![DataPoint::new(d(2024, 1, 1), 100.0), DataPoint::new(d(2024, 1, 11), 200.0)],
        );
        let out = normalize(&s, Frequency::Monthly, FillPolicy::LinearInterpolate);
        assert_eq!(out.len(), 11);
        assert_eq!(out.value_at(d(2024, 1, 6)), Some(150.0));
        assert_eq!(out.value_at(d(2024, 1, 11)), Some(200.0));
    }

    #[test]
    fn test_linear_does_not_extrapolate() {
        let s = TimeSeries::new(
            "M2",
            Frequency::Monthly,
            vec![
                DataPoint::new(d(2024, 1, 1), 100.0),
                DataPoint::new(d(2024, 1, 3), 120.0),
                DataPoint::missing(d(2024, 1, 5)),
            ],
        );
        let out = normalize(&s, Frequency::Monthly, FillPolicy::LinearInterpolate);
        assert_eq!(out.value_at(d(2024, 1, 2)), Some(110.0));
        assert_eq!(out.value_at(d(2024, 1, 4)), None);
        assert_eq!(out.value_at(d(2024, 1, 5)), None);
    }

    #[test]
    fn test_empty_series_keeps_name_and_daily_type() {
        let s = TimeSeries::empty("M2", Frequency::Monthly);
        let out = normalize_as(&s, Frequency::Monthly, FillPolicy::LinearInterpolate, "M2_D");
        assert!(out.is_empty());
        assert_eq!(out.name, "M2_D");
        assert_eq!(out.frequency, Frequency::Daily);
        assert_eq!(out.first_date(), None);
    }

    #[test]
    fn test_month_end_resample_takes_last_observation() {
        let index = daily_calendar(d(2024, 1, 30), d(2024, 3, 2));
        let mut values = vec![None; index.len()];
        values[0] = Some(1.0); // Jan 30
        values[1] = Some(2.0); // Jan 31
        values[5] = Some(5.0); // Feb 4
        let months = resample_month_end(&index, &values);
        assert_eq!(
            months,
            vec![(d(2024, 1, 31), Some(2.0)), (d(2024, 2, 29), Some(5.0)), (d(2024, 3, 31), None)]
        );
    }

    #[test]
    fn test_broadcast_holds_until_next_month_end() {
        let monthly = vec![(d(2024, 1, 31), Some(1.0)), (d(2024, 2, 29), Some(2.0))];
        let index = daily_calendar(d(2024, 1, 30), d(2024, 3, 1));
        let out = broadcast_ffill(&monthly, &index);
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(1.0));
        assert_eq!(out[29], Some(1.0)); // Feb 28
        assert_eq!(out[30], Some(2.0)); // Feb 29
    }

    #[test]
    fn test_pct_change_and_rolling_mean() {
        let values = vec![Some(100.0), Some(110.0), None, Some(121.0)];
        let pct = pct_change(&values, 1);
        assert_eq!(pct[0], None);
        assert!((pct[1].unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(pct[2], None);
        assert_eq!(pct[3], None);

        let ma = rolling_mean(&[Some(1.0), Some(2.0), Some(3.0), None, Some(5.0)], 2);
        assert_eq!(ma, vec![None, Some(1.5), Some(2.5), None, None]);
    }

    #[test]
    fn test_rolling_mean_exact_on_flat_tail() {
        let mut values: Vec<Option<f64>> = (0..400).map(|i| Some(30000.0 + 997.3 * (i as f64 * 0.37).sin())).collect();
        values.extend(std::iter::repeat(Some(35987.61)).take(300));

        let short = rolling_mean(&values, 20);
        let long = rolling_mean(&values, 120);
        assert_eq!(short[699], Some(35987.61));
        assert_eq!(long[699], Some(35987.61));
        assert_eq!(long[400 + 119], Some(35987.61));
    }

    #[test]
    fn test_weekly_normalize_holds_between_prints() {
        let weekly = TimeSeries::new(
            "KTB10",
            Frequency::Weekly,
            vec![DataPoint::new(d(2024, 1, 1), 3.6), DataPoint::new(d(2024, 1, 8), 3.7)],
        );
        let out = normalize(&weekly, Frequency::Weekly, FillPolicy::StepHold);
        assert_eq!(out.frequency, Frequency::Daily);
        assert_eq!(out.len(), 8);
        assert_eq!(out.value_at(d(2024, 1, 7)), Some(3.6));
        assert_eq!(out.value_at(d(2024, 1, 8)), Some(3.7));

        let interpolated = normalize(&weekly, Frequency::Weekly, FillPolicy::LinearInterpolate);
        assert!((interpolated.value_at(d(2024, 1, 4)).unwrap() - (3.6 + 0.3 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_month_end_december() {
        assert_eq!(month_end(d(2023, 12, 5)), d(2023, 12, 31));
        assert_eq!(month_end(d(2024, 2, 1)), d(2024, 2, 29));
    }
}
