//! trkana Simulation & Runner
//!
//! Drives the track analysis end to end without a detector:
//! - **Oracle**: seeded generator of reconstructed events (tracks crossing the
//!   reference planes, calorimeter matches, CRV coincidences)
//! - **Scenarios**: generator presets that stress one stage of the selection
//! - **Runner**: source -> processor -> standard histograms -> cut flow
//! - **Exporter**: JSON output of histograms, ntuple and diagnostics
//!
//! # Usage
//!
//! ```ignore
//! use trkana_core::AnalysisConfig;
//! use trkana_sim::{AnalysisRunner, Scenario};
//!
//! let config = AnalysisConfig::new(700.0, 5)?;
//! let result = AnalysisRunner::new(config)
//!     .with_seed(42)
//!     .with_events(10_000)
//!     .run(Scenario::Nominal)?;
//! println!("{}", result.report);
//! ```

mod exporter;
mod oracle;
mod runner;
pub mod scenarios;

pub use exporter::{write_events_jsonl, RunExport, RunSummary};
pub use oracle::{Oracle, OracleConfig, OracleSource};
pub use runner::{AnalysisRunner, RunResult};
pub use scenarios::Scenario;
