use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::analysis::regime::{score_regimes, RegimeScoreTable};
use crate::core::config::PipelineConfig;
use crate::core::error::Result;
use crate::core::panel::Panel;
use crate::core::reconcile::{reconcile_detailed, Reconciliation};
use crate::core::timeseries::TimeSeries;
use crate::core::window::{PanelView, ViewWindow};
use crate::indicators::derive_all;
use crate::indicators::registry::Registry;
use crate::models::{CanonicalName, RawSeries};

/// Reconciled, aligned and derived panel, ready for windowing and scoring.
///
/// Built once per data load. Every query after `build` is read-only.
#[derive(Debug, Clone)]
pub struct MacroPipeline {
    config: PipelineConfig,
    reconciliation: Reconciliation,
    panel: Panel,
}

impl MacroPipeline {
    /// 1. Reconcile raw names  2. Align on one daily index  3. Derive
    pub fn build(raw: Vec<RawSeries>, config: PipelineConfig) -> Self {
        let names: Vec<&str> = raw.iter().map(|s| s.name.as_str()).collect();
        let reconciliation = reconcile_detailed(&names);

        let mut sources: BTreeMap<CanonicalName, TimeSeries> = BTreeMap::new();
        for series in raw {
            let Some(canonical) = reconciliation.canonical_for(&series.name) else {
                continue;
            };

            if let (Some(declared), Some(expected)) = (series.unit, Registry::unit(canonical)) {
                if declared != expected {
                    warn!(
                        raw = %series.name,
                        column = %canonical,
                        ?declared,
                        ?expected,
                        "unit differs from registry, values used as-is"
                    );
                }
            }

            sources.insert(
                canonical,
                TimeSeries::new(canonical.label(), series.frequency, series.points),
            );
        }

        if !reconciliation.unmatched.is_empty() {
            info!(unmatched = ?reconciliation.unmatched, "raw columns without a canonical match");
        }

        let aligned = Panel::from_sources(sources, config.analysis_start);
        let panel = derive_all(&aligned, &Registry::get_rules(&config));

        info!(rows = panel.len(), columns = panel.column_ids().count(), "pipeline ready");

        Self {
            config,
            reconciliation,
            panel,
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn reconciliation(&self) -> &Reconciliation {
        &self.reconciliation
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn full_window(&self) -> Option<ViewWindow> {
        ViewWindow::full(&self.panel)
    }

    pub fn window(&self, start: chrono::NaiveDate, end: chrono::NaiveDate) -> Result<PanelView> {
        self.panel.window(&ViewWindow::new(start, end)?)
    }

    pub fn scores(&self, window: &ViewWindow) -> Result<RegimeScoreTable> {
        score_regimes(&self.panel, window, &self.config)
    }
}
