//! In-memory implementation of MetricSink using fixed-binning histograms.

use crate::sink::MetricSink;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Booking parameters for a 1D histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBooking {
    pub name: String,
    pub title: String,
    pub bins: usize,
    pub low: f64,
    pub high: f64,
}

impl HistogramBooking {
    pub fn new(name: &str, title: &str, bins: usize, low: f64, high: f64) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            bins,
            low,
            high,
        }
    }
}

/// Booking parameters for a 9-column ntuple.
///
/// `columns` uses the colon-separated form, e.g. `"t_f:p_f:perr_f:..."`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NtupleBooking {
    pub name: String,
    pub title: String,
    pub columns: String,
}

impl NtupleBooking {
    pub fn new(name: &str, title: &str, columns: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            columns: columns.to_string(),
        }
    }
}

// =============================================================================
// HISTOGRAM
// =============================================================================

/// Fixed-binning 1D histogram with under/overflow and running moments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    pub name: String,
    pub title: String,
    pub low: f64,
    pub high: f64,
    /// In-range bin counts, `bins` entries
    pub counts: Vec<u64>,
    pub underflow: u64,
    pub overflow: u64,
    /// Total fills, including under/overflow
    pub entries: u64,
    /// Sum and sum of squares of in-range fills (for mean/RMS)
    sum: f64,
    sum_sq: f64,
}

impl Histogram {
    pub fn new(booking: &HistogramBooking) -> Self {
        Self {
            name: booking.name.clone(),
            title: booking.title.clone(),
            low: booking.low,
            high: booking.high,
            counts: vec![0; booking.bins.max(1)],
            underflow: 0,
            overflow: 0,
            entries: 0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Number of in-range bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Width of one bin.
    pub fn bin_width(&self) -> f64 {
        (self.high - self.low) / self.bins() as f64
    }

    /// Adds one entry. Bins are half-open `[lo, hi)`; `high` itself overflows.
    pub fn fill(&mut self, value: f64) {
        self.entries += 1;

        if value.is_nan() || value < self.low {
            self.underflow += 1;
            return;
        }
        if value >= self.high {
            self.overflow += 1;
            return;
        }

        let idx = ((value - self.low) / self.bin_width()) as usize;
        // Rounding right below `high` can land one past the end
        let idx = idx.min(self.bins() - 1);
        self.counts[idx] += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    /// Count in bin `idx` (0-based, in-range bins only).
    pub fn bin_content(&self, idx: usize) -> u64 {
        self.counts.get(idx).copied().unwrap_or(0)
    }

    /// Number of in-range entries.
    pub fn in_range(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Sum of in-range entries.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of in-range entries (0 if empty).
    pub fn mean(&self) -> f64 {
        let n = self.in_range();
        if n > 0 {
            self.sum / n as f64
        } else {
            0.0
        }
    }

    /// Standard deviation of in-range entries (0 if empty).
    pub fn rms(&self) -> f64 {
        let n = self.in_range();
        if n == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / n as f64 - mean * mean).max(0.0).sqrt()
    }
}

// =============================================================================
// NTUPLE
// =============================================================================

/// Table of 9-column rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ntuple {
    pub name: String,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<[f64; 9]>,
}

impl Ntuple {
    pub fn new(booking: &NtupleBooking) -> Self {
        Self {
            name: booking.name.clone(),
            title: booking.title.clone(),
            columns: booking.columns.split(':').map(str::to_string).collect(),
            rows: Vec::new(),
        }
    }
}

// =============================================================================
// SINK
// =============================================================================

/// Metric sink that accumulates into booked histograms and ntuples.
///
/// Observations for names that were never booked are counted in
/// `unbooked` rather than silently creating new containers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistogramSink {
    pub histograms: BTreeMap<String, Histogram>,
    pub ntuples: BTreeMap<String, Ntuple>,
    /// Diagnostic lines received through `log`, in order
    pub diagnostics: Vec<String>,
    /// Observation counts per unbooked name
    pub unbooked: BTreeMap<String, u64>,
}

impl HistogramSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink with all given containers booked.
    pub fn with_bookings(histograms: &[HistogramBooking], ntuples: &[NtupleBooking]) -> Self {
        let mut sink = Self::new();
        for booking in histograms {
            sink.book_histogram(booking);
        }
        for booking in ntuples {
            sink.book_ntuple(booking);
        }
        sink
    }

    /// Books a histogram, replacing any existing one with the same name.
    pub fn book_histogram(&mut self, booking: &HistogramBooking) {
        self.histograms
            .insert(booking.name.clone(), Histogram::new(booking));
    }

    /// Books an ntuple, replacing any existing one with the same name.
    pub fn book_ntuple(&mut self, booking: &NtupleBooking) {
        self.ntuples.insert(booking.name.clone(), Ntuple::new(booking));
    }

    pub fn histogram(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name)
    }

    pub fn ntuple(&self, name: &str) -> Option<&Ntuple> {
        self.ntuples.get(name)
    }

    fn record_unbooked(&mut self, name: &str) {
        let count = self.unbooked.entry(name.to_string()).or_insert(0);
        if *count == 0 {
            debug!("Observation for unbooked name '{}' dropped", name);
        }
        *count += 1;
    }
}

impl MetricSink for HistogramSink {
    fn observe(&mut self, name: &str, value: f64) {
        match self.histograms.get_mut(name) {
            Some(h) => h.fill(value),
            None => self.record_unbooked(name),
        }
    }

    fn observe_tuple(&mut self, name: &str, values: [f64; 9]) {
        match self.ntuples.get_mut(name) {
            Some(nt) => nt.rows.push(values),
            None => self.record_unbooked(name),
        }
    }

    fn log(&mut self, text: &str) {
        info!(target: "trkana::diagnostic", "{}", text);
        self.diagnostics.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn booking() -> HistogramBooking {
        HistogramBooking::new("h", "test", 10, 0.0, 10.0)
    }

    #[test]
    fn test_histogram_binning() {
        let mut h = Histogram::new(&booking());
        h.fill(0.0);
        h.fill(0.99);
        h.fill(5.5);
        h.fill(9.999);

        assert_eq!(h.bin_content(0), 2);
        assert_eq!(h.bin_content(5), 1);
        assert_eq!(h.bin_content(9), 1);
        assert_eq!(h.entries, 4);
        assert_eq!(h.underflow + h.overflow, 0);
    }

    #[test]
    fn test_histogram_under_and_overflow() {
        let mut h = Histogram::new(&booking());
        h.fill(-0.1);
        h.fill(10.0);
        h.fill(1e9);
        h.fill(f64::NAN);

        assert_eq!(h.underflow, 2);
        assert_eq!(h.overflow, 2);
        assert_eq!(h.in_range(), 0);
        assert_eq!(h.entries, 4);
        assert_eq!(h.mean(), 0.0);
    }

    #[test]
    fn test_histogram_moments() {
        let mut h = Histogram::new(&booking());
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            h.fill(v);
        }
        assert_relative_eq!(h.mean(), 5.0);
        assert_relative_eq!(h.rms(), 2.0);
    }

    #[test]
    fn test_sink_routes_by_name() {
        let mut sink = HistogramSink::with_bookings(
            &[booking()],
            &[NtupleBooking::new("nt", "tuple", "a:b:c:d:e:f:g:h:i")],
        );

        sink.observe("h", 3.0);
        sink.observe("missing", 1.0);
        sink.observe("missing", 2.0);
        sink.observe_tuple("nt", [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        sink.log(" Intersection: test");

        assert_eq!(sink.histogram("h").unwrap().entries, 1);
        assert_eq!(sink.unbooked.get("missing"), Some(&2));
        assert_eq!(sink.ntuple("nt").unwrap().rows.len(), 1);
        assert_eq!(sink.ntuple("nt").unwrap().rows[0][4], 5.0);
        assert_eq!(sink.diagnostics, vec![" Intersection: test".to_string()]);
    }
}
