//! Event Processor - drives the selection over every track of an event and
//! forwards the results to a metric sink.

use crate::booking::names;
use crate::config::AnalysisConfig;
use crate::selection::{evaluate, FeatureBundle, TrackOutcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trkana_env::{AnalysisError, Event, EventId, EventSource, MetricSink, Track};

/// Number of selected tracks seen so far in the run.
///
/// Limits diagnostic printout to the leading selected tracks. The value only
/// ever grows and is never reset during a run. It is passed in and returned
/// by [`process`] rather than hidden in the processor, so a caller that
/// processes events concurrently has to decide how to share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DiagnosticCounter(pub u64);

impl DiagnosticCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// One diagnostic line describing a single intersection.
pub fn format_intersection_line(
    event: &EventId,
    track_number: usize,
    intersection: &trkana_env::Intersection,
) -> String {
    format!(
        " Intersection:  Event: {}  Track number: {}  Surface ID: {}  Time: {}  Momentum: {}",
        event, track_number, intersection.surface_id, intersection.time, intersection.momentum
    )
}

fn emit_bundle<S: MetricSink + ?Sized>(sink: &mut S, bundle: &FeatureBundle) {
    // Time relative to CRV coincidence clusters
    for dt in &bundle.coincidence_deltas {
        sink.observe(names::DT_CRV, *dt);
    }

    if let Some(e_over_p) = bundle.energy_over_momentum {
        sink.observe(names::E_OVER_P, e_over_p);
    }

    // Global properties of the track
    sink.observe(names::N_DOF, bundle.degrees_of_freedom as f64);
    sink.observe(names::HAS_CALO, if bundle.has_calo_cluster { 1.0 } else { 0.0 });

    // Mid-point of the tracker
    sink.observe(names::T0, bundle.mid.time);
    sink.observe(names::P, bundle.mid.momentum);
    sink.observe(names::P_ERR, bundle.mid.momentum_error);

    sink.observe_tuple(names::NTUPLE, bundle.ntuple_row());
}

fn log_intersections<S: MetricSink + ?Sized>(
    sink: &mut S,
    event: &EventId,
    track_number: usize,
    track: &Track,
) {
    for intersection in &track.intersections {
        sink.log(&format_intersection_line(event, track_number, intersection));
    }
}

/// Processes one event.
///
/// Emits the per-event multiplicities, then evaluates every track in order.
/// Skipped tracks fill the cut tree; selected tracks fill the feature
/// observations and, while `counter` is below `max_diagnostic_events`, print
/// all of their intersections.
///
/// # Returns
/// The counter advanced by the number of selected tracks in this event.
pub fn process<S: MetricSink + ?Sized>(
    event: &Event,
    config: &AnalysisConfig,
    sink: &mut S,
    mut counter: DiagnosticCounter,
) -> DiagnosticCounter {
    sink.observe(names::N_TRACKS, event.tracks.len() as f64);
    sink.observe(names::N_CRV_CC, event.coincidence_clusters.len() as f64);

    for (track_number, track) in event.tracks.iter().enumerate() {
        match evaluate(track, &event.coincidence_clusters, config.fiducial_time_min) {
            TrackOutcome::Skipped(classification) => {
                debug!("{} track {}: skipped ({})", event.id, track_number, classification);
                sink.observe(names::N_SKIP, classification.code() as f64);
            }
            TrackOutcome::Accepted(bundle) => {
                emit_bundle(sink, &bundle);

                if counter.0 < config.max_diagnostic_events {
                    log_intersections(sink, &event.id, track_number, track);
                }
                counter.0 += 1;
            }
        }
    }

    counter
}

/// Owns the configuration and the diagnostic counter for one run.
#[derive(Debug, Clone)]
pub struct EventProcessor {
    config: AnalysisConfig,
    counter: DiagnosticCounter,
    events_processed: u64,
}

impl EventProcessor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            counter: DiagnosticCounter::new(),
            events_processed: 0,
        }
    }

    /// Selected tracks so far.
    pub fn counter(&self) -> DiagnosticCounter {
        self.counter
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Processes one event, carrying the counter over from previous events.
    pub fn process_event<S: MetricSink + ?Sized>(&mut self, event: &Event, sink: &mut S) {
        self.counter = process(event, &self.config, sink, self.counter);
        self.events_processed += 1;
    }

    /// Drains `source` into `sink`.
    ///
    /// Stops at the first source error and returns it; events already
    /// processed stay in the sink.
    ///
    /// # Returns
    /// Number of events processed by this call.
    pub fn run<Src, S>(&mut self, source: &mut Src, sink: &mut S) -> Result<u64, AnalysisError>
    where
        Src: EventSource + ?Sized,
        S: MetricSink + ?Sized,
    {
        let start = self.events_processed;
        while let Some(event) = source.next_event()? {
            self.process_event(&event, sink);
        }
        let processed = self.events_processed - start;
        info!(
            "Processed {} events ({} selected tracks so far)",
            processed,
            self.counter.value()
        );
        Ok(processed)
    }
}
