//! Generator presets for exercising different parts of the selection.

use crate::oracle::OracleConfig;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Default generator settings
    Nominal,

    /// One track in four reflects in the magnetic mirror
    Reflections,

    /// No CRV coincidence clusters at all
    NoCrv,

    /// Beam flash era: most tracks arrive before the fiducial window
    EarlyBeam,
}

impl Scenario {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<Scenario> {
        vec![
            Scenario::Nominal,
            Scenario::Reflections,
            Scenario::NoCrv,
            Scenario::EarlyBeam,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Nominal => "nominal",
            Scenario::Reflections => "reflections",
            Scenario::NoCrv => "no_crv",
            Scenario::EarlyBeam => "early_beam",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Nominal => "Conversion-like electrons with default pathology rates",
            Scenario::Reflections => "25% of tracks cross the front plane twice",
            Scenario::NoCrv => "No CRV coincidences: every delta list is empty",
            Scenario::EarlyBeam => "Mid-plane times spread over 0-900 ns",
        }
    }

    /// Generator settings for this scenario.
    pub fn oracle_config(&self) -> OracleConfig {
        let base = OracleConfig::default();
        match self {
            Scenario::Nominal => base,
            Scenario::Reflections => OracleConfig {
                reflection_rate: 0.25,
                ..base
            },
            Scenario::NoCrv => OracleConfig {
                mean_crv_clusters: 0.0,
                ..base
            },
            Scenario::EarlyBeam => OracleConfig {
                time_window: (0.0, 900.0),
                ..base
            },
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nominal" | "default" => Ok(Scenario::Nominal),
            "reflections" | "reflect" => Ok(Scenario::Reflections),
            "no_crv" | "nocrv" => Ok(Scenario::NoCrv),
            "early_beam" | "earlybeam" | "early" => Ok(Scenario::EarlyBeam),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names_parse_back() {
        for scenario in Scenario::all() {
            assert_eq!(scenario.name().parse::<Scenario>(), Ok(scenario));
        }
        assert!("split_brain".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_no_crv_disables_clusters() {
        assert_eq!(Scenario::NoCrv.oracle_config().mean_crv_clusters, 0.0);
    }
}
