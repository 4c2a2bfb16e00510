use super::DerivationRule;
use crate::core::panel::Panel;
use crate::core::timeseries::interpolate;
use crate::models::{CanonicalName, ColumnId, DataPoint};

/// Daily M2 by linear interpolation between the monthly prints.
///
/// Reads the native observations kept on the panel; the aligned `M2` column
/// is forward-filled and would turn the interpolation into a staircase.
pub struct DailyMoneySupply;

impl DerivationRule for DailyMoneySupply {
    fn slug(&self) -> &str {
        "money_supply_daily"
    }

    fn target(&self) -> ColumnId {
        CanonicalName::MoneySupplyKRDaily.into()
    }

    fn required_inputs(&self) -> Vec<ColumnId> {
        vec![CanonicalName::MoneySupplyKR.into()]
    }

    fn calculate(&self, panel: &Panel) -> Vec<Option<f64>> {
        let anchors: Vec<DataPoint> = match panel.source(CanonicalName::MoneySupplyKR) {
            Some(source) => source.points().to_vec(),
            None => {
                // Panel built without sources: use the points where the level changes
                let values = panel.canonical(CanonicalName::MoneySupplyKR).unwrap_or_default();
                panel
                    .index()
                    .iter()
                    .zip(values.iter())
                    .enumerate()
                    .filter(|(i, (_, v))| v.is_some() && (*i == 0 || values[*i - 1] != **v))
                    .map(|(_, (date, v))| DataPoint { date: *date, value: *v })
                    .collect()
            }
        };

        interpolate(&anchors, panel.index())
    }
}
