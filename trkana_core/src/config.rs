//! Run-time configuration of the analysis.
//!
//! Both values are required; the analysis defines no defaults for them.
//! The loader accepts the long names as well as the short forms used by
//! existing job configurations (`tmin`, `maxPrint`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trkana_env::AnalysisError;

/// Parameters the event processor needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Lower bound on the mid-plane crossing time (ns, inclusive)
    #[serde(alias = "tmin")]
    pub fiducial_time_min: f64,
    /// Number of leading selected tracks whose intersections are printed
    #[serde(alias = "maxPrint")]
    pub max_diagnostic_events: u64,
}

impl AnalysisConfig {
    /// Creates a validated configuration.
    pub fn new(fiducial_time_min: f64, max_diagnostic_events: u64) -> Result<Self, AnalysisError> {
        if !fiducial_time_min.is_finite() {
            return Err(AnalysisError::configuration(format!(
                "fiducial_time_min must be finite, got {}",
                fiducial_time_min
            )));
        }
        Ok(Self {
            fiducial_time_min,
            max_diagnostic_events,
        })
    }

    /// Parses a configuration from a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, AnalysisError> {
        let parsed: Self = serde_json::from_str(text)
            .map_err(|e| AnalysisError::configuration(format!("invalid configuration: {}", e)))?;
        Self::new(parsed.fiducial_time_min, parsed.max_diagnostic_events)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Applies command-line overrides on top of a loaded configuration.
    pub fn with_overrides(
        self,
        fiducial_time_min: Option<f64>,
        max_diagnostic_events: Option<u64>,
    ) -> Result<Self, AnalysisError> {
        Self::new(
            fiducial_time_min.unwrap_or(self.fiducial_time_min),
            max_diagnostic_events.unwrap_or(self.max_diagnostic_events),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_error(result: Result<AnalysisConfig, AnalysisError>) -> String {
        match result {
            Err(AnalysisError::Configuration(msg)) => msg,
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_long_names() {
        let config =
            AnalysisConfig::from_json_str(r#"{"fiducial_time_min": 700.0, "max_diagnostic_events": 5}"#)
                .unwrap();
        assert_eq!(config.fiducial_time_min, 700.0);
        assert_eq!(config.max_diagnostic_events, 5);
    }

    #[test]
    fn test_parse_short_names() {
        let config = AnalysisConfig::from_json_str(r#"{"tmin": 500, "maxPrint": 10}"#).unwrap();
        assert_eq!(config.fiducial_time_min, 500.0);
        assert_eq!(config.max_diagnostic_events, 10);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let msg = config_error(AnalysisConfig::from_json_str(r#"{"tmin": 500}"#));
        assert!(msg.contains("max_diagnostic_events"));

        let msg = config_error(AnalysisConfig::from_json_str(r#"{"maxPrint": 3}"#));
        assert!(msg.contains("fiducial_time_min"));
    }

    #[test]
    fn test_non_numeric_value_is_rejected() {
        let msg = config_error(AnalysisConfig::from_json_str(
            r#"{"tmin": "early", "maxPrint": 3}"#,
        ));
        assert!(msg.contains("expected f64"));

        let msg = config_error(AnalysisConfig::from_json_str(r#"{"tmin": 1.0, "maxPrint": 2.5}"#));
        assert!(msg.contains("expected u64"));

        let msg = config_error(AnalysisConfig::from_json_str(r#"{"tmin": 1.0, "maxPrint": -1}"#));
        assert!(msg.contains("expected u64"));

        let msg = config_error(AnalysisConfig::from_json_str(r#"{"tmin": 700, "maxPrint": 5.0}"#));
        assert!(msg.contains("expected u64"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        config_error(AnalysisConfig::from_json_str("\"tmin\""));
        config_error(AnalysisConfig::from_json_str("not json"));
    }

    #[test]
    fn test_overrides() {
        let config = AnalysisConfig::new(500.0, 3).unwrap();
        let config = config.with_overrides(Some(650.0), None).unwrap();
        assert_eq!(config.fiducial_time_min, 650.0);
        assert_eq!(config.max_diagnostic_events, 3);

        config_error(config.with_overrides(Some(f64::NAN), None));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AnalysisConfig::load("/nonexistent/trkana.json");
        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }
}
