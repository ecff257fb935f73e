//! Event data model shared by sources, the analysis core and sinks.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Identifier of a surface a track may cross.
///
/// The three tracker reference planes have fixed ids; any other id (calorimeter
/// disks, stopping target, ...) is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(pub i32);

impl SurfaceId {
    /// Plane at the upstream face of the tracker.
    pub const TT_FRONT: SurfaceId = SurfaceId(0);
    /// Plane at the middle of the tracker.
    pub const TT_MID: SurfaceId = SurfaceId(1);
    /// Plane at the downstream face of the tracker.
    pub const TT_BACK: SurfaceId = SurfaceId(2);
    /// Front face of the first calorimeter disk.
    pub const CALO_0: SurfaceId = SurfaceId(10);
    /// Front face of the second calorimeter disk.
    pub const CALO_1: SurfaceId = SurfaceId(11);
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where and with what kinematics a track crossed a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub surface_id: SurfaceId,
    /// Crossing time (ns)
    pub time: f64,
    /// Momentum magnitude at the crossing (MeV/c)
    pub momentum: f64,
    /// Fit uncertainty on the momentum (MeV/c)
    pub momentum_error: f64,
}

impl Intersection {
    pub fn new(surface_id: SurfaceId, time: f64, momentum: f64, momentum_error: f64) -> Self {
        Self {
            surface_id,
            time,
            momentum,
            momentum_error,
        }
    }
}

/// Energy deposit reconstructed in the calorimeter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaloCluster {
    /// Deposited energy (MeV)
    pub energy_deposit: f64,
}

/// Timing cluster from the cosmic ray veto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoincidenceCluster {
    /// Start time of the coincidence (ns)
    pub start_time: f64,
}

/// A fitted track with its surface crossings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// All recorded crossings, in reconstruction order.
    pub intersections: Vec<Intersection>,
    /// True if the final Kalman fit converged.
    pub fit_converged: bool,
    pub degrees_of_freedom: u32,
    /// Associated calorimeter cluster, if the track was matched to one.
    pub calo_cluster: Option<CaloCluster>,
}

impl Track {
    /// Returns true if the track is associated with a calorimeter cluster.
    pub fn has_calo_cluster(&self) -> bool {
        self.calo_cluster.is_some()
    }

    /// Returns the crossings of one surface, in order.
    pub fn intersections_at(&self, surface: SurfaceId) -> impl Iterator<Item = &Intersection> {
        self.intersections
            .iter()
            .filter(move |i| i.surface_id == surface)
    }
}

/// Run / subrun / event triple identifying one collision event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EventId {
    pub run: u32,
    pub subrun: u32,
    pub event: u32,
}

impl EventId {
    pub fn new(run: u32, subrun: u32, event: u32) -> Self {
        Self { run, subrun, event }
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run: {} subRun: {} event: {}", self.run, self.subrun, self.event)
    }
}

/// Everything the analysis sees of one event.
///
/// Lives only for the duration of processing; nothing is retained afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub id: EventId,
    pub tracks: Vec<Track>,
    pub coincidence_clusters: Vec<CoincidenceCluster>,
}

// ============================================================================
// RAW (SERIALIZED) FORM
// ============================================================================

/// Track as stored on disk: the calorimeter cluster is referenced by index
/// into the event's cluster list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    #[serde(default)]
    pub intersections: Vec<Intersection>,
    pub fit_converged: bool,
    pub degrees_of_freedom: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calo_cluster_index: Option<usize>,
}

/// Event as stored on disk (one JSON object per line).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: EventId,
    #[serde(default)]
    pub tracks: Vec<RawTrack>,
    #[serde(default)]
    pub calo_clusters: Vec<CaloCluster>,
    #[serde(default)]
    pub coincidence_clusters: Vec<CoincidenceCluster>,
}

impl TryFrom<RawEvent> for Event {
    type Error = AnalysisError;

    /// Resolves calorimeter references; a dangling index is a malformed event.
    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let id = raw.id;
        let calo_clusters = raw.calo_clusters;

        let tracks = raw
            .tracks
            .into_iter()
            .enumerate()
            .map(|(ordinal, t)| {
                let calo_cluster = match t.calo_cluster_index {
                    Some(idx) => Some(*calo_clusters.get(idx).ok_or_else(|| {
                        AnalysisError::malformed(
                            id,
                            format!(
                                "track {} references calo cluster {} but the event has {}",
                                ordinal,
                                idx,
                                calo_clusters.len()
                            ),
                        )
                    })?),
                    None => None,
                };
                Ok(Track {
                    intersections: t.intersections,
                    fit_converged: t.fit_converged,
                    degrees_of_freedom: t.degrees_of_freedom,
                    calo_cluster,
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        Ok(Event {
            id,
            tracks,
            coincidence_clusters: raw.coincidence_clusters,
        })
    }
}
