//! trkana Environment Abstraction Layer
//!
//! This crate holds everything the track analysis core talks to but does not
//! own: the event data model, the source events come from and the sink
//! observations go to.
//!
//! # Core Concept
//!
//! The core is a pure function of its inputs. All I/O sits behind two traits:
//! - `EventSource` - yields events in their original order
//! - `MetricSink` - accepts scalars, 9-tuples and diagnostic lines
//!
//! Swapping a JSON file for a simulated generator, or histograms for a
//! recorder in tests, never touches the core.
//!
//! # Example
//!
//! ```ignore
//! use trkana_env::{EventSource, HistogramSink, JsonLinesSource, MetricSink};
//!
//! let mut source = JsonLinesSource::open("events.jsonl")?;
//! let mut sink = HistogramSink::new();
//! while let Some(event) = source.next_event()? {
//!     sink.observe("hNTracks", event.tracks.len() as f64);
//! }
//! ```

mod error;
mod histogram_impl;
mod sink;
mod source;
mod types;

pub use error::AnalysisError;
pub use histogram_impl::{Histogram, HistogramBooking, HistogramSink, Ntuple, NtupleBooking};
pub use sink::{MetricSink, RecordingSink, SinkRecord};
pub use source::{EventSource, JsonLinesSource, VecSource};
pub use types::{
    CaloCluster, CoincidenceCluster, Event, EventId, Intersection, RawEvent, RawTrack, SurfaceId,
    Track,
};
