//! trkana Core - Tracker Reference-Plane Track Analysis
//!
//! For every fitted track of an event this library decides whether the track
//! enters the analysis and, if so, what it contributes:
//! 1. **Selection**: convergence, exactly one crossing per reference plane,
//!    fiducial time cut on the mid plane
//! 2. **Features**: time/momentum at front, mid and back, CRV timing deltas,
//!    calorimeter E/p
//! 3. **Processing**: forwarding everything to a metric sink, with a bounded
//!    intersection printout for the leading selected tracks

pub mod booking;
pub mod config;
pub mod geometry;
pub mod processor;
pub mod report;
pub mod selection;

// Re-export key types for convenience
pub use config::AnalysisConfig;
pub use geometry::{ReferenceGeometry, ReferenceSurface};
pub use processor::{process, DiagnosticCounter, EventProcessor};
pub use report::CutFlowReport;
pub use selection::{evaluate, FeatureBundle, SkipClassification, SurfaceCrossing, TrackOutcome};
