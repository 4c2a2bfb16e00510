use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::core::timeseries::{daily_calendar, normalize, reindex, step_hold, TimeSeries};
use crate::indicators::registry::Registry;
use crate::models::{CanonicalName, ColumnId, FillPolicy, Frequency};

/// Canonical columns aligned on one shared daily index.
///
/// Missing values stay explicit. The reconciled source series are kept next
/// to the aligned columns because some derivations need the native
/// observation dates (anchors), which forward-filling erases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    index: Vec<NaiveDate>,
    columns: BTreeMap<ColumnId, Vec<Option<f64>>>,
    sources: BTreeMap<CanonicalName, TimeSeries>,
}

impl Panel {
    /// Empty panel over a fixed daily index.
    pub fn new(index: Vec<NaiveDate>) -> Self {
        Self {
            index,
            columns: BTreeMap::new(),
            sources: BTreeMap::new(),
        }
    }

    /// Normalizes each source series to daily with its registered fill
    /// policy and aligns all of them on the union calendar.
    ///
    /// Step-valued columns hold their last level to the end of the panel;
    /// interpolated columns stop at their last anchor. Rows before
    /// `start_cutoff` are dropped after normalization, so step values
    /// observed earlier still carry into the first kept day.
    pub fn from_sources(sources: BTreeMap<CanonicalName, TimeSeries>, start_cutoff: Option<NaiveDate>) -> Self {
        let first = sources.values().filter_map(|s| s.first_date()).min();
        let last = sources.values().filter_map(|s| s.last_date()).max();

        let index = match (first, last) {
            (Some(first), Some(last)) => {
                let first = start_cutoff.map_or(first, |cutoff| first.max(cutoff));
                daily_calendar(first, last)
            }
            _ => Vec::new(),
        };

        let mut panel = Self::new(index);
        for (name, series) in &sources {
            let policy = Registry::fill_policy(*name);
            let daily = normalize(series, series.frequency, policy);
            if daily.is_empty() {
                debug!(column = %name, "source series is empty");
            }
            let values = match policy {
                FillPolicy::StepHold => step_hold(daily.points(), &panel.index),
                FillPolicy::LinearInterpolate => reindex(&daily, &panel.index),
            };
            panel.columns.insert(ColumnId::Canonical(*name), values);
        }
        panel.sources = sources;

        info!(
            rows = panel.index.len(),
            columns = panel.columns.len(),
            start = ?panel.start_date(),
            end = ?panel.end_date(),
            "panel aligned"
        );
        panel
    }

    /// Adds a column, builder style. Mismatched lengths are rejected.
    pub fn with_column(mut self, id: impl Into<ColumnId>, values: Vec<Option<f64>>) -> Self {
        self.insert_column(id.into(), values);
        self
    }

    pub fn with_source(mut self, series: TimeSeries, name: CanonicalName) -> Self {
        self.sources.insert(name, series);
        self
    }

    /// Returns false (and leaves the panel untouched) when `values` does not
    /// span the panel index.
    pub fn insert_column(&mut self, id: ColumnId, values: Vec<Option<f64>>) -> bool {
        if values.len() != self.index.len() {
            warn!(column = %id, expected = self.index.len(), got = values.len(), "column length mismatch, ignored");
            return false;
        }
        self.columns.insert(id, values);
        true
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.index.first().copied()
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.index.last().copied()
    }

    pub fn contains(&self, id: &ColumnId) -> bool {
        self.columns.contains_key(id)
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &ColumnId> {
        self.columns.keys()
    }

    pub fn column(&self, id: &ColumnId) -> Option<&[Option<f64>]> {
        self.columns.get(id).map(|v| v.as_slice())
    }

    pub fn canonical(&self, name: CanonicalName) -> Option<&[Option<f64>]> {
        self.column(&ColumnId::Canonical(name))
    }

    /// Column as a standalone daily series named by its label.
    pub fn series(&self, id: &ColumnId) -> Option<TimeSeries> {
        self.columns
            .get(id)
            .map(|values| TimeSeries::from_parts(id.label(), Frequency::Daily, &self.index, values))
    }

    /// Reconciled source series before normalization.
    pub fn source(&self, name: CanonicalName) -> Option<&TimeSeries> {
        self.sources.get(&name)
    }

    /// Position of `date` in the index.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.index.binary_search(&date).ok()
    }

    pub(crate) fn columns(&self) -> &BTreeMap<ColumnId, Vec<Option<f64>>> {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataPoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_sources_share_one_daily_index() {
        let mut sources = BTreeMap::new();
        sources.insert(
            CanonicalName::PolicyRateKR,
            TimeSeries::new("Rate", Frequency::Monthly, vec![DataPoint::new(d(2024, 1, 1), 3.5), DataPoint::new(d(2024, 2, 1), 3.25)]),
        );
        sources.insert(
            CanonicalName::FX,
            TimeSeries::new("FX", Frequency::Daily, vec![DataPoint::new(d(2024, 1, 10), 1330.0), DataPoint::new(d(2024, 2, 5), 1340.0)]),
        );

        let panel = Panel::from_sources(sources, None);
        assert_eq!(panel.start_date(), Some(d(2024, 1, 1)));
        assert_eq!(panel.end_date(), Some(d(2024, 2, 5)));

        let fx = panel.canonical(CanonicalName::FX).unwrap();
        let rate = panel.canonical(CanonicalName::PolicyRateKR).unwrap();
        assert_eq!(fx.len(), panel.len());
        assert_eq!(rate.len(), panel.len());

        // FX has no value before its own first observation
        assert_eq!(fx[0], None);
        assert_eq!(fx[panel.position(d(2024, 1, 20)).unwrap()], Some(1330.0));
        // Step-valued rate holds its last level to the panel end
        assert_eq!(rate[panel.position(d(2024, 1, 31)).unwrap()], Some(3.5));
        assert_eq!(rate[panel.position(d(2024, 2, 5)).unwrap()], Some(3.25));
    }

    #[test]
    fn test_cutoff_keeps_carried_value() {
        let mut sources = BTreeMap::new();
        sources.insert(
            CanonicalName::PolicyRateKR,
            TimeSeries::new("Rate", Frequency::Monthly, vec![DataPoint::new(d(2007, 12, 1), 5.0), DataPoint::new(d(2008, 1, 10), 5.0)]),
        );
        let panel = Panel::from_sources(sources, Some(d(2008, 1, 1)));
        assert_eq!(panel.start_date(), Some(d(2008, 1, 1)));
        assert_eq!(panel.canonical(CanonicalName::PolicyRateKR).unwrap()[0], Some(5.0));
        assert!(panel.source(CanonicalName::PolicyRateKR).is_some());
    }

    #[test]
    fn test_mismatched_column_rejected() {
        let mut panel = Panel::new(daily_calendar(d(2024, 1, 1), d(2024, 1, 3)));
        assert!(!panel.insert_column(CanonicalName::FX.into(), vec![Some(1.0)]));
        assert!(!panel.contains(&CanonicalName::FX.into()));
    }

    #[test]
    fn test_empty_sources_give_empty_panel() {
        let panel = Panel::from_sources(BTreeMap::new(), None);
        assert!(panel.is_empty());
    }
}
