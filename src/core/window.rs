use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::analysis::scaling::{scale, ScaleMode};
use crate::core::error::{PipelineError, Result};
use crate::core::panel::Panel;
use crate::core::timeseries::TimeSeries;
use crate::indicators::registry::Registry;
use crate::models::{ColumnId, Frequency, Unit};

/// Caller-selected date range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ViewWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PipelineError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering the whole panel, if it has any rows.
    pub fn full(panel: &Panel) -> Option<Self> {
        Some(Self {
            start: panel.start_date()?,
            end: panel.end_date()?,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Panel {
    /// Read-only slice of the panel. A window that does not intersect the
    /// index is reported as `EmptyWindow`.
    pub fn window(&self, window: &ViewWindow) -> Result<PanelView> {
        let lo = self.index().partition_point(|d| *d < window.start());
        let hi = self.index().partition_point(|d| *d <= window.end());

        if lo >= hi {
            debug!(start = %window.start(), end = %window.end(), "window does not intersect panel");
            return Err(PipelineError::EmptyWindow {
                start: window.start(),
                end: window.end(),
            });
        }

        let columns = self
            .columns()
            .iter()
            .map(|(id, values)| (*id, values[lo..hi].to_vec()))
            .collect();

        Ok(PanelView {
            window: *window,
            index: self.index()[lo..hi].to_vec(),
            columns,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotItem {
    pub column: String,
    pub date: NaiveDate,
    pub value: f64,
    pub unit: Option<Unit>,
    pub formatted: String,
}

/// Windowed copy of the panel handed to the chart layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    window: ViewWindow,
    index: Vec<NaiveDate>,
    columns: BTreeMap<ColumnId, Vec<Option<f64>>>,
}

impl PanelView {
    pub fn window(&self) -> &ViewWindow {
        &self.window
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Always false: an empty slice is reported as `EmptyWindow` instead.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &ColumnId> {
        self.columns.keys()
    }

    pub fn series(&self, id: &ColumnId) -> Option<TimeSeries> {
        self.columns
            .get(id)
            .map(|values| TimeSeries::from_parts(id.label(), Frequency::Daily, &self.index, values))
    }

    /// Column scaled against this window only.
    pub fn scaled(&self, id: &ColumnId, mode: ScaleMode) -> Option<TimeSeries> {
        self.series(id).map(|s| scale(&s, mode))
    }

    /// Every requested column that exists, scaled independently.
    pub fn scaled_columns(&self, ids: &[ColumnId], mode: ScaleMode) -> Vec<TimeSeries> {
        ids.iter().filter_map(|id| self.scaled(id, mode)).collect()
    }

    /// Columns offered in the toggle list (calculation-only columns excluded).
    pub fn selectable_columns(&self) -> Vec<ColumnId> {
        self.columns
            .keys()
            .filter(|id| match id {
                ColumnId::Canonical(name) => !Registry::get_metadata(*name).is_some_and(|m| m.hidden_by_default),
                ColumnId::MovingAverage(..) => true,
            })
            .copied()
            .collect()
    }

    /// Columns switched on when the view first opens.
    pub fn default_selection(&self) -> Vec<ColumnId> {
        self.columns
            .keys()
            .filter(|id| match id {
                ColumnId::Canonical(name) => Registry::get_metadata(*name).is_some_and(|m| m.selected_by_default),
                ColumnId::MovingAverage(..) => false,
            })
            .copied()
            .collect()
    }

    /// Last non-missing value of each requested column within the window.
    pub fn snapshot(&self, ids: &[ColumnId]) -> Vec<SnapshotItem> {
        ids.iter()
            .filter_map(|id| {
                let values = self.columns.get(id)?;
                let (pos, value) = values
                    .iter()
                    .enumerate()
                    .rev()
                    .find_map(|(i, v)| v.map(|v| (i, v)))?;
                let unit = Registry::unit(id.base());
                let formatted = match unit {
                    Some(u) => u.format_value(value),
                    None => format!("{:.2}", value),
                };
                Some(SnapshotItem {
                    column: id.label(),
                    date: self.index[pos],
                    value,
                    unit,
                    formatted,
                })
            })
            .collect()
    }

    /// First day of each month that falls inside the view, for vertical
    /// guide lines on the chart.
    pub fn monthly_guides(&self) -> Vec<NaiveDate> {
        let (Some(first), Some(last)) = (self.index.first(), self.index.last()) else {
            return Vec::new();
        };
        month_starts(*first, *last)
    }
}

/// Month-start dates within `[start, end]`.
pub fn month_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut guides = Vec::new();
    let mut cursor = if start.day() == 1 {
        Some(start)
    } else {
        next_month_start(start)
    };

    while let Some(date) = cursor {
        if date > end {
            break;
        }
        guides.push(date);
        cursor = next_month_start(date);
    }
    guides
}

fn next_month_start(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}
