pub mod analysis;
pub mod core;
pub mod indicators;
pub mod models;

pub use crate::analysis::regime::{RegimePoint, RegimeScoreTable, SignalChange};
pub use crate::analysis::scaling::ScaleMode;
pub use crate::core::config::PipelineConfig;
pub use crate::core::error::{PipelineError, Result};
pub use crate::core::orchestrator::MacroPipeline;
pub use crate::core::panel::Panel;
pub use crate::core::window::{PanelView, ViewWindow};
pub use crate::models::{CanonicalName, ColumnId, DataPoint, Frequency, RawSeries};
