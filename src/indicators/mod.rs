use tracing::{debug, info};

use crate::core::error::PipelineError;
use crate::core::panel::Panel;
use crate::models::ColumnId;

pub mod currency;
pub mod money_supply;
pub mod moving_average;
pub mod real_rate;
pub mod registry;
pub mod yield_spread;
pub mod yoy;

pub trait DerivationRule {
    /// Returns the unique slug (e.g., "gold_krw_per_gram")
    fn slug(&self) -> &str;

    /// Returns the column this rule writes
    fn target(&self) -> ColumnId;

    /// Returns the panel columns required for calculation
    fn required_inputs(&self) -> Vec<ColumnId>;

    /// Calculate the target column. Only called when every required input
    /// is present; the result must span the panel index.
    fn calculate(&self, panel: &Panel) -> Vec<Option<f64>>;
}

/// Runs each rule whose inputs are present and whose target is absent.
///
/// Works on a private copy of the panel. Rules run in the given order, so a
/// rule may read the output of an earlier one. Running this again over its
/// own output adds nothing.
pub fn derive_all(panel: &Panel, rules: &[Box<dyn DerivationRule + Send + Sync>]) -> Panel {
    let mut derived = panel.clone();
    let mut added = Vec::new();

    for rule in rules {
        let target = rule.target();
        if derived.contains(&target) {
            debug!(rule = rule.slug(), column = %target, "target already present, skipping");
            continue;
        }

        if let Some(input) = rule.required_inputs().into_iter().find(|c| !derived.contains(c)) {
            let err = PipelineError::MissingInput { target, input };
            debug!(rule = rule.slug(), error = %err, "derivation skipped");
            continue;
        }

        let values = rule.calculate(&derived);
        if derived.insert_column(target, values) {
            added.push(target.label());
        }
    }

    info!(added = ?added, "derived columns computed");
    derived
}
