//! JSON exporters for run results and generated events.
//!
//! Run exports carry the booked histograms, the ntuple and the diagnostic
//! printout so they can be plotted outside of Rust.

use crate::runner::RunResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use trkana_core::{AnalysisConfig, CutFlowReport};
use trkana_env::{Histogram, Ntuple, RawEvent};

/// Complete export of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct RunExport {
    /// Scenario name or input file
    pub label: String,

    /// Seed used, if events were generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    pub config: AnalysisConfig,

    pub events: u64,

    pub report: CutFlowReport,

    pub histograms: Vec<Histogram>,

    pub ntuples: Vec<Ntuple>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl RunExport {
    /// Builds an export from a finished run.
    pub fn from_result(result: &RunResult) -> Self {
        Self {
            label: result.label.clone(),
            seed: result.seed,
            config: result.config,
            events: result.events,
            report: result.report.clone(),
            histograms: result.sink.histograms.values().cloned().collect(),
            ntuples: result.sink.ntuples.values().cloned().collect(),
            diagnostics: result.sink.diagnostics.clone(),
        }
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Summary line per run for `--json` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub events: u64,
    pub tracks: u64,
    pub selected: u64,
    pub not_converged: u64,
    pub ambiguous_surface_crossing: u64,
    pub fiducial_time_cut_failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_e_over_p: Option<f64>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn from_result(result: &RunResult) -> Self {
        use trkana_core::SkipClassification::*;
        let report = &result.report;
        Self {
            label: result.label.clone(),
            seed: result.seed,
            events: result.events,
            tracks: report.tracks,
            selected: report.selected,
            not_converged: report.skipped(NotConverged),
            ambiguous_surface_crossing: report.skipped(AmbiguousSurfaceCrossing),
            fiducial_time_cut_failed: report.skipped(FiducialTimeCutFailed),
            mean_e_over_p: report.mean_e_over_p,
            elapsed_secs: result.elapsed_secs,
        }
    }
}

/// Writes events as JSON lines, readable by `JsonLinesSource`.
pub fn write_events_jsonl(path: &str, events: &[RawEvent]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}
