//! Analysis runner - pushes events from a source through the processor into
//! the standard histograms.

use crate::oracle::{Oracle, OracleSource};
use crate::scenarios::Scenario;

use std::time::Instant;
use tracing::{debug, info, warn};
use trkana_core::booking::{standard_histograms, standard_ntuples};
use trkana_core::{AnalysisConfig, CutFlowReport, EventProcessor};
use trkana_env::{AnalysisError, EventSource, HistogramSink};

/// Results from one analysis run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Label of the input (scenario name or input file)
    pub label: String,

    /// Seed used, if events were generated
    pub seed: Option<u64>,

    /// Configuration the run was processed with
    pub config: AnalysisConfig,

    /// Events processed
    pub events: u64,

    /// Cut flow summary
    pub report: CutFlowReport,

    /// Filled histograms, ntuple and diagnostics
    pub sink: HistogramSink,

    /// Wall-clock processing time in seconds
    pub elapsed_secs: f64,
}

/// Runs the analysis over generated or supplied events.
pub struct AnalysisRunner {
    /// Analysis configuration
    config: AnalysisConfig,

    /// Generator seed
    seed: u64,

    /// Number of events to generate
    events: u64,

    /// Run number stamped on generated events
    run_number: u32,
}

impl AnalysisRunner {
    /// Creates a new runner.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            seed: 42,
            events: 1000,
            run_number: 1,
        }
    }

    /// Sets the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of generated events.
    pub fn with_events(mut self, events: u64) -> Self {
        self.events = events;
        self
    }

    /// Sets the run number.
    pub fn with_run_number(mut self, run: u32) -> Self {
        self.run_number = run;
        self
    }

    /// Generates events for `scenario` and analyses them.
    pub fn run(&self, scenario: Scenario) -> Result<RunResult, AnalysisError> {
        info!(
            "Starting scenario: {} (seed={}, events={})",
            scenario.name(),
            self.seed,
            self.events
        );
        debug!("  {}", scenario.description());

        let oracle = Oracle::with_config(self.seed, scenario.oracle_config()).with_run(self.run_number);
        let mut source = OracleSource::new(oracle, self.events);

        let mut result = self.run_source(&mut source, scenario.name())?;
        result.seed = Some(self.seed);
        Ok(result)
    }

    /// Analyses every event `source` yields.
    ///
    /// A source error aborts the run and is returned as is.
    pub fn run_source<Src: EventSource + ?Sized>(
        &self,
        source: &mut Src,
        label: &str,
    ) -> Result<RunResult, AnalysisError> {
        let mut sink = HistogramSink::with_bookings(&standard_histograms(), &standard_ntuples());
        let mut processor = EventProcessor::new(self.config);

        let start = Instant::now();
        let events = processor.run(source, &mut sink)?;
        let elapsed_secs = start.elapsed().as_secs_f64();

        if !sink.unbooked.is_empty() {
            warn!("Observations for unbooked names: {:?}", sink.unbooked);
        }

        let report = CutFlowReport::from_sink(&sink);
        info!(
            "{}: {} events, {} tracks, {} selected ({:.1}%)",
            label,
            events,
            report.tracks,
            report.selected,
            report.acceptance() * 100.0
        );

        Ok(RunResult {
            label: label.to_string(),
            seed: None,
            config: self.config,
            events,
            report,
            sink,
            elapsed_secs,
        })
    }
}
