use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{CanonicalName, ColumnId};

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure modes of the pipeline.
///
/// Only `EmptyWindow` and `InvalidWindow` are ever returned to callers. The
/// other variants describe features that degrade to "unavailable" and are
/// emitted through `tracing` or collected in reports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("missing input {input} for {target}")]
    MissingInput { target: ColumnId, input: ColumnId },

    #[error("degenerate range for {column}: min == max ({value})")]
    DegenerateRange { column: String, value: f64 },

    #[error("no data between {start} and {end}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },

    #[error("invalid window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("ambiguous column for {canonical}: claimed '{claimed}', also matched {others:?}")]
    AmbiguousColumn {
        canonical: CanonicalName,
        claimed: String,
        others: Vec<String>,
    },
}

impl PipelineError {
    /// Soft errors are recovered locally and never abort a computation.
    pub fn is_soft(&self) -> bool {
        !matches!(
            self,
            PipelineError::EmptyWindow { .. } | PipelineError::InvalidWindow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_classification() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(!PipelineError::EmptyWindow { start: d, end: d }.is_soft());
        assert!(PipelineError::DegenerateRange { column: "FX".into(), value: 5.0 }.is_soft());
        let err = PipelineError::MissingInput {
            target: CanonicalName::RealRate.into(),
            input: CanonicalName::CPI.into(),
        };
        assert!(err.is_soft());
        assert_eq!(err.to_string(), "missing input CPI for real_rate");
    }
}
