pub mod config;
pub mod error;
pub mod orchestrator;
pub mod panel;
pub mod reconcile;
pub mod timeseries;
pub mod window;
