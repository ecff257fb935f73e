//! Event source abstraction: where the analysis gets its events from.

use crate::error::AnalysisError;
use crate::types::{Event, RawEvent};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Supplier of events, one at a time, in their original order.
///
/// # Implementations
///
/// - **Files**: `JsonLinesSource` - one `RawEvent` JSON object per line
/// - **Memory**: `VecSource` - a pre-built list of events
/// - **Simulation**: the generator in `trkana_sim`
///
/// # Returns
/// * `Ok(Some(event))` - the next event
/// * `Ok(None)` - the stream is exhausted
/// * `Err(_)` - the stream is broken or produced a malformed event; the caller
///   must stop, there is no retry
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<Event>, AnalysisError>;
}

/// Source over events already held in memory.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    events: VecDeque<Event>,
}

impl VecSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Number of events not yet handed out.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for VecSource {
    fn next_event(&mut self) -> Result<Option<Event>, AnalysisError> {
        Ok(self.events.pop_front())
    }
}

/// Source reading one `RawEvent` per line of JSON.
///
/// Blank lines are skipped. Calorimeter references are resolved while
/// reading, so a dangling reference surfaces as `MalformedEvent` right away.
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    line_number: usize,
    buf: String,
}

impl JsonLinesSource<BufReader<File>> {
    /// Opens a JSON-lines event file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    fn next_event(&mut self) -> Result<Option<Event>, AnalysisError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let raw: RawEvent = serde_json::from_str(line).map_err(|e| {
                AnalysisError::Serialization(format!("line {}: {}", self.line_number, e))
            })?;
            return Event::try_from(raw).map(Some);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventId;
    use std::io::Cursor;

    const TWO_EVENTS: &str = r#"
{"id":{"run":1,"subrun":0,"event":1},"tracks":[{"intersections":[{"surface_id":1,"time":500.0,"momentum":104.0,"momentum_error":0.2}],"fit_converged":true,"degrees_of_freedom":30,"calo_cluster_index":0}],"calo_clusters":[{"energy_deposit":90.0}],"coincidence_clusters":[{"start_time":490.0}]}

{"id":{"run":1,"subrun":0,"event":2}}
"#;

    #[test]
    fn test_json_lines_source_reads_in_order() {
        let mut source = JsonLinesSource::new(Cursor::new(TWO_EVENTS));

        let first = source.next_event().unwrap().unwrap();
        assert_eq!(first.id, EventId::new(1, 0, 1));
        assert_eq!(first.tracks.len(), 1);
        assert!(first.tracks[0].has_calo_cluster());

        let second = source.next_event().unwrap().unwrap();
        assert_eq!(second.id, EventId::new(1, 0, 2));
        assert!(second.tracks.is_empty());
        assert!(second.coincidence_clusters.is_empty());

        assert!(source.next_event().unwrap().is_none());
    }

    #[test]
    fn test_json_lines_source_reports_bad_line() {
        let mut source = JsonLinesSource::new(Cursor::new("{\"id\": 7}\n"));
        match source.next_event() {
            Err(AnalysisError::Serialization(msg)) => assert!(msg.starts_with("line 1")),
            other => panic!("expected Serialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_json_lines_source_surfaces_malformed_event() {
        let line = r#"{"id":{"run":2,"subrun":0,"event":9},"tracks":[{"fit_converged":true,"degrees_of_freedom":5,"calo_cluster_index":4}]}"#;
        let mut source = JsonLinesSource::new(Cursor::new(line));
        assert!(matches!(
            source.next_event(),
            Err(AnalysisError::MalformedEvent { .. })
        ));
    }

    #[test]
    fn test_vec_source_drains() {
        let mut source = VecSource::new(vec![Event::default(), Event::default()]);
        assert_eq!(source.remaining(), 2);
        assert!(source.next_event().unwrap().is_some());
        assert!(source.next_event().unwrap().is_some());
        assert!(source.next_event().unwrap().is_none());
    }
}
