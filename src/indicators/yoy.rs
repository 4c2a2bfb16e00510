use super::DerivationRule;
use crate::core::panel::Panel;
use crate::core::timeseries::{broadcast_ffill, daily_calendar, pct_change, resample_month_end, step_hold};
use crate::models::{CanonicalName, ColumnId};
use chrono::NaiveDate;

/// Year-over-year percent change on month-end values, held forward daily.
pub struct YearOverYear {
    source: CanonicalName,
    target: CanonicalName,
    slug: &'static str,
}

impl YearOverYear {
    pub fn cpi() -> Self {
        Self {
            source: CanonicalName::CPI,
            target: CanonicalName::CpiYoY,
            slug: "cpi_yoy",
        }
    }

    pub fn money_supply() -> Self {
        Self {
            source: CanonicalName::MoneySupplyKR,
            target: CanonicalName::MoneySupplyYoY,
            slug: "money_supply_yoy",
        }
    }
}

/// Month-end levels of `name` over its whole native history.
///
/// The aligned column starts at the analysis cutoff, so the source series is
/// preferred; months before the panel feed the first year of changes. The
/// months run on to the panel end with the last level held. Panels built
/// without sources fall back to the aligned column.
pub fn month_end_levels(panel: &Panel, name: CanonicalName) -> Vec<(NaiveDate, Option<f64>)> {
    match panel.source(name).and_then(|s| s.first_date().map(|first| (s, first))) {
        Some((source, first)) => {
            let last = source.last_date().into_iter().chain(panel.end_date()).max().unwrap_or(first);
            let calendar = daily_calendar(first, last);
            resample_month_end(&calendar, &step_hold(source.points(), &calendar))
        }
        None => resample_month_end(panel.index(), panel.canonical(name).unwrap_or_default()),
    }
}

/// `pct_change(12) * 100` over month-end levels, keyed by month-end date.
///
/// Broadcast onto the daily index, a month's value is visible from its
/// month-end date on.
pub fn monthly_yoy(levels: &[(NaiveDate, Option<f64>)]) -> Vec<(NaiveDate, Option<f64>)> {
    let month_values: Vec<Option<f64>> = levels.iter().map(|(_, v)| *v).collect();
    levels
        .iter()
        .zip(pct_change(&month_values, 12))
        .map(|((date, _), change)| (*date, change.map(|c| c * 100.0)))
        .collect()
}

impl DerivationRule for YearOverYear {
    fn slug(&self) -> &str {
        self.slug
    }

    fn target(&self) -> ColumnId {
        self.target.into()
    }

    fn required_inputs(&self) -> Vec<ColumnId> {
        vec![self.source.into()]
    }

    fn calculate(&self, panel: &Panel) -> Vec<Option<f64>> {
        broadcast_ffill(&monthly_yoy(&month_end_levels(panel, self.source)), panel.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeseries::{month_end, TimeSeries};
    use crate::models::{DataPoint, Frequency};
    use chrono::Datelike;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_yoy_after_twelve_months() {
        // CPI rises 0.5 per month from 100.0 starting Jan 2022
        let index = daily_calendar(d(2022, 1, 1), d(2023, 3, 31));
        let values: Vec<Option<f64>> = index
            .iter()
            .map(|date| {
                let months = (date.year() - 2022) * 12 + date.month0() as i32;
                Some(100.0 + 0.5 * months as f64)
            })
            .collect();

        let panel = Panel::new(index.clone()).with_column(CanonicalName::CPI, values);
        let yoy = YearOverYear::cpi().calculate(&panel);
        let at = |date| yoy[panel.position(date).unwrap()];

        // no value until the first month-end with 12 months of history
        assert_eq!(at(d(2022, 12, 31)), None);
        assert_eq!(at(d(2023, 1, 30)), None);

        // Jan 2023: 106.0 vs 100.0
        assert!((at(d(2023, 1, 31)).unwrap() - 6.0).abs() < 1e-9);
        // held until the next month-end
        assert!((at(d(2023, 2, 27)).unwrap() - 6.0).abs() < 1e-9);
        let feb = 106.5 / 100.5 * 100.0 - 100.0;
        assert!((at(month_end(d(2023, 2, 1))).unwrap() - feb).abs() < 1e-9);
    }

    #[test]
    fn test_history_before_panel_start_feeds_first_year() {
        // M2 prints from Jan 2006, panel cut at 2008-01-01
        let points: Vec<DataPoint> = (0..48)
            .map(|i| {
                let date = month_end(d(2006 + i / 12, (i % 12) as u32 + 1, 1));
                DataPoint::new(date, 1000.0 * 1.01f64.powi(i))
            })
            .collect();
        let source = TimeSeries::new("M2", Frequency::Monthly, points);

        let index = daily_calendar(d(2008, 1, 1), d(2009, 12, 31));
        let panel = Panel::new(index.clone())
            .with_column(CanonicalName::MoneySupplyKR, vec![Some(1.0); index.len()])
            .with_source(source, CanonicalName::MoneySupplyKR);

        let yoy = YearOverYear::money_supply().calculate(&panel);
        let at = |date| yoy[panel.position(date).unwrap()];
        let expected = (1.01f64.powi(12) - 1.0) * 100.0;

        // Dec 2007 value carries into the first panel day
        assert!((at(d(2008, 1, 1)).unwrap() - expected).abs() < 1e-9);
        assert!((at(d(2008, 6, 30)).unwrap() - expected).abs() < 1e-9);
        assert!((at(d(2009, 12, 31)).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_levels_held_past_last_print() {
        let source = TimeSeries::new(
            "CPI",
            Frequency::Monthly,
            vec![DataPoint::new(d(2024, 1, 31), 100.0), DataPoint::new(d(2024, 2, 29), 101.0)],
        );
        let index = daily_calendar(d(2024, 1, 1), d(2024, 4, 10));
        let panel = Panel::new(index).with_source(source, CanonicalName::CPI);

        let levels = month_end_levels(&panel, CanonicalName::CPI);
        assert_eq!(
            levels,
            vec![
                (d(2024, 1, 31), Some(100.0)),
                (d(2024, 2, 29), Some(101.0)),
                (d(2024, 3, 31), Some(101.0)),
                (d(2024, 4, 30), Some(101.0)),
            ]
        );
    }
}
