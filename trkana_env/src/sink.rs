//! Metric sink abstraction: where the analysis sends its observations.

/// Destination for everything the analysis measures.
///
/// # Implementations
///
/// - **Production**: `HistogramSink` - fixed-binning histograms and ntuples
/// - **Testing**: `RecordingSink` - keeps every call in order
///
/// None of the methods report failure back to the caller; a sink that
/// cannot store an observation deals with it on its own terms.
pub trait MetricSink {
    /// Accumulates one scalar observation under `name`.
    fn observe(&mut self, name: &str, value: f64);

    /// Records one row of a 9-column tuple under `name`.
    fn observe_tuple(&mut self, name: &str, values: [f64; 9]);

    /// Emits one line of diagnostic text.
    fn log(&mut self, text: &str);
}

impl<S: MetricSink + ?Sized> MetricSink for &mut S {
    fn observe(&mut self, name: &str, value: f64) {
        (**self).observe(name, value);
    }

    fn observe_tuple(&mut self, name: &str, values: [f64; 9]) {
        (**self).observe_tuple(name, values);
    }

    fn log(&mut self, text: &str) {
        (**self).log(text);
    }
}

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkRecord {
    Scalar { name: String, value: f64 },
    Tuple { name: String, values: [f64; 9] },
    Log(String),
}

/// Sink that remembers every call verbatim.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub records: Vec<SinkRecord>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all scalar values observed under `name`, in order.
    pub fn scalars(&self, name: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| match r {
                SinkRecord::Scalar { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Returns all tuples observed under `name`, in order.
    pub fn tuples(&self, name: &str) -> Vec<[f64; 9]> {
        self.records
            .iter()
            .filter_map(|r| match r {
                SinkRecord::Tuple { name: n, values } if n == name => Some(*values),
                _ => None,
            })
            .collect()
    }

    /// Returns all diagnostic lines, in order.
    pub fn logs(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match r {
                SinkRecord::Log(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl MetricSink for RecordingSink {
    fn observe(&mut self, name: &str, value: f64) {
        self.records.push(SinkRecord::Scalar {
            name: name.to_string(),
            value,
        });
    }

    fn observe_tuple(&mut self, name: &str, values: [f64; 9]) {
        self.records.push(SinkRecord::Tuple {
            name: name.to_string(),
            values,
        });
    }

    fn log(&mut self, text: &str) {
        self.records.push(SinkRecord::Log(text.to_string()));
    }
}
