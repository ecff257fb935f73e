//! Cut-flow Report - end-of-run summary built from the standard histograms.

use crate::booking::names;
use crate::selection::SkipClassification;
use serde::Serialize;
use trkana_env::HistogramSink;

/// Tracks dropped at one stage of the selection.
#[derive(Debug, Clone, Serialize)]
pub struct CutStage {
    pub classification: SkipClassification,
    pub skipped: u64,
}

/// Summary of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct CutFlowReport {
    /// Events seen (entries of the per-event track multiplicity)
    pub events: u64,
    /// Tracks evaluated: skipped plus selected
    pub tracks: u64,
    /// Skipped tracks per classification, in pipeline order
    pub stages: Vec<CutStage>,
    /// Selected tracks (ntuple rows)
    pub selected: u64,
    /// Selected tracks with a calorimeter cluster
    pub with_calo: u64,
    /// Mean E/p over in-range entries, absent if no track had a cluster
    pub mean_e_over_p: Option<f64>,
    /// Mean mid-plane momentum of selected tracks (in-range entries)
    pub mean_momentum: Option<f64>,
    /// RMS of the mid-plane momentum of selected tracks (in-range entries)
    pub rms_momentum: Option<f64>,
    /// CRV coincidence clusters, summed over events with fewer than 10
    pub crv_clusters: f64,
    /// Diagnostic lines printed
    pub diagnostic_lines: usize,
}

impl CutFlowReport {
    /// Builds the report from a sink holding the standard bookings.
    ///
    /// Containers that were not booked count as empty.
    pub fn from_sink(sink: &HistogramSink) -> Self {
        let entries = |name: &str| sink.histogram(name).map(|h| h.entries).unwrap_or(0);

        let stages: Vec<CutStage> = SkipClassification::ALL
            .iter()
            .map(|c| CutStage {
                classification: *c,
                skipped: sink
                    .histogram(names::N_SKIP)
                    .map(|h| h.bin_content(c.code() as usize))
                    .unwrap_or(0),
            })
            .collect();

        let selected = sink
            .ntuple(names::NTUPLE)
            .map(|nt| nt.rows.len() as u64)
            .unwrap_or(0);

        let with_calo = sink
            .histogram(names::HAS_CALO)
            .map(|h| h.bin_content(1))
            .unwrap_or(0);

        let filled = |name: &str| sink.histogram(name).filter(|h| h.in_range() > 0);

        let crv_clusters = sink
            .histogram(names::N_CRV_CC)
            .map(|h| h.sum())
            .unwrap_or(0.0);

        Self {
            events: entries(names::N_TRACKS),
            tracks: stages.iter().map(|s| s.skipped).sum::<u64>() + selected,
            stages,
            selected,
            with_calo,
            mean_e_over_p: filled(names::E_OVER_P).map(|h| h.mean()),
            mean_momentum: filled(names::P).map(|h| h.mean()),
            rms_momentum: filled(names::P).map(|h| h.rms()),
            crv_clusters,
            diagnostic_lines: sink.diagnostics.len(),
        }
    }

    /// Fraction of evaluated tracks that were selected.
    pub fn acceptance(&self) -> f64 {
        if self.tracks > 0 {
            self.selected as f64 / self.tracks as f64
        } else {
            0.0
        }
    }

    /// Skipped count for one classification.
    pub fn skipped(&self, classification: SkipClassification) -> u64 {
        self.stages
            .iter()
            .find(|s| s.classification == classification)
            .map(|s| s.skipped)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for CutFlowReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cut flow")?;
        writeln!(f, "─────────────────────────────────────────────")?;
        writeln!(f, "  Events:                     {:>10}", self.events)?;
        writeln!(f, "  Tracks:                     {:>10}", self.tracks)?;
        for stage in &self.stages {
            writeln!(f, "  - {:<26}  {:>10}", stage.classification.name(), stage.skipped)?;
        }
        writeln!(
            f,
            "  Selected:                   {:>10}  ({:.1}%)",
            self.selected,
            self.acceptance() * 100.0
        )?;
        writeln!(f, "  With calo cluster:          {:>10}", self.with_calo)?;
        if let Some(eop) = self.mean_e_over_p {
            writeln!(f, "  Mean E/p:                   {:>10.3}", eop)?;
        }
        if let (Some(p), Some(rms)) = (self.mean_momentum, self.rms_momentum) {
            writeln!(f, "  Mean p (mid):               {:>10.2} MeV/c", p)?;
            writeln!(f, "  RMS p (mid):                {:>10.2} MeV/c", rms)?;
        }
        writeln!(f, "  CRV coincidence clusters:   {:>10}", self.crv_clusters)?;
        write!(f, "  Diagnostic lines:           {:>10}", self.diagnostic_lines)
    }
}
