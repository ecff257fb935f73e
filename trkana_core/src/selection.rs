//! The "SELECTION" Engine - Per-Track Filter & Feature Extraction
//!
//! Decides, for one fitted track, whether it enters the analysis and if so
//! which quantities it contributes. The pipeline runs in a fixed order and
//! stops at the first failing check:
//! 1. Convergence (Kalman fit converged)
//! 2. Surface selection (exactly one crossing of front, mid and back)
//! 3. Fiducial time cut (on the mid crossing)
//! 4. CRV timing deltas (front crossing vs. every coincidence cluster)
//! 5. Calorimeter E/p (only if a cluster is associated)
//!
//! Every step is a pure function of its inputs; `evaluate` has no side
//! effects and gives identical results for identical inputs.

use crate::geometry::ReferenceSurface;
use serde::{Deserialize, Serialize};
use trkana_env::{CoincidenceCluster, Intersection, Track};

// ============================================================================
// OUTCOMES
// ============================================================================

/// Why a track was dropped, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkipClassification {
    /// Final fit did not converge
    NotConverged,
    /// Zero or several crossings of at least one reference plane
    AmbiguousSurfaceCrossing,
    /// Mid-plane crossing earlier than the fiducial window
    FiducialTimeCutFailed,
}

impl SkipClassification {
    /// All classifications in pipeline order.
    pub const ALL: [SkipClassification; 3] = [
        SkipClassification::NotConverged,
        SkipClassification::AmbiguousSurfaceCrossing,
        SkipClassification::FiducialTimeCutFailed,
    ];

    /// Bin of the cut-tree histogram this classification is counted in.
    pub fn code(&self) -> u8 {
        match self {
            SkipClassification::NotConverged => 0,
            SkipClassification::AmbiguousSurfaceCrossing => 1,
            SkipClassification::FiducialTimeCutFailed => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SkipClassification::NotConverged => "not_converged",
            SkipClassification::AmbiguousSurfaceCrossing => "ambiguous_surface_crossing",
            SkipClassification::FiducialTimeCutFailed => "fiducial_time_cut_failed",
        }
    }
}

impl std::fmt::Display for SkipClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Time, momentum and momentum error at one reference plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCrossing {
    pub time: f64,
    pub momentum: f64,
    pub momentum_error: f64,
}

impl From<&Intersection> for SurfaceCrossing {
    fn from(i: &Intersection) -> Self {
        Self {
            time: i.time,
            momentum: i.momentum,
            momentum_error: i.momentum_error,
        }
    }
}

/// The single crossing of each reference plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCrossings {
    pub front: SurfaceCrossing,
    pub mid: SurfaceCrossing,
    pub back: SurfaceCrossing,
}

/// Everything a selected track contributes to the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBundle {
    pub degrees_of_freedom: u32,
    pub has_calo_cluster: bool,
    pub front: SurfaceCrossing,
    pub mid: SurfaceCrossing,
    pub back: SurfaceCrossing,
    /// Calorimeter energy over back-plane momentum. Absent, not zero, when
    /// the track has no calorimeter cluster.
    pub energy_over_momentum: Option<f64>,
    /// Front crossing time minus each coincidence start time, in cluster order
    pub coincidence_deltas: Vec<f64>,
}

impl FeatureBundle {
    /// Ntuple row: `t_f:p_f:perr_f:t_m:p_m:perr_m:t_b:p_b:perr_b`.
    pub fn ntuple_row(&self) -> [f64; 9] {
        [
            self.front.time,
            self.front.momentum,
            self.front.momentum_error,
            self.mid.time,
            self.mid.momentum,
            self.mid.momentum_error,
            self.back.time,
            self.back.momentum,
            self.back.momentum_error,
        ]
    }
}

/// Result of evaluating one track: dropped with a reason, or selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackOutcome {
    Skipped(SkipClassification),
    Accepted(FeatureBundle),
}

impl TrackOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TrackOutcome::Accepted(_))
    }

    pub fn skip(&self) -> Option<SkipClassification> {
        match self {
            TrackOutcome::Skipped(c) => Some(*c),
            TrackOutcome::Accepted(_) => None,
        }
    }

    pub fn bundle(&self) -> Option<&FeatureBundle> {
        match self {
            TrackOutcome::Accepted(b) => Some(b),
            TrackOutcome::Skipped(_) => None,
        }
    }
}

// ============================================================================
// PIPELINE STEPS
// ============================================================================

/// Step 1: the final fit must have converged.
pub fn check_convergence(track: &Track) -> Result<(), SkipClassification> {
    if track.fit_converged {
        Ok(())
    } else {
        Err(SkipClassification::NotConverged)
    }
}

/// The crossing of `surface`, if the track crossed it exactly once.
fn single_crossing(track: &Track, surface: ReferenceSurface) -> Option<SurfaceCrossing> {
    let mut crossings = track.intersections_at(surface.surface_id());
    let first = crossings.next()?;
    match crossings.next() {
        Some(_) => None,
        None => Some(first.into()),
    }
}

/// Step 2: exactly one crossing of each reference plane.
///
/// Tracks that reflect in the magnetic mirror can cross a plane twice. They
/// are rejected here rather than disambiguated; this is a simplification for
/// the downstream code, not a physics cut.
pub fn select_reference_crossings(track: &Track) -> Result<ReferenceCrossings, SkipClassification> {
    let front = single_crossing(track, ReferenceSurface::Front);
    let mid = single_crossing(track, ReferenceSurface::Mid);
    let back = single_crossing(track, ReferenceSurface::Back);

    match (front, mid, back) {
        (Some(front), Some(mid), Some(back)) => Ok(ReferenceCrossings { front, mid, back }),
        _ => Err(SkipClassification::AmbiguousSurfaceCrossing),
    }
}

/// Step 3: mid-plane time must be at or after `fiducial_time_min`.
///
/// A NaN time is not at or after anything and fails the cut.
pub fn apply_fiducial_cut(
    crossings: &ReferenceCrossings,
    fiducial_time_min: f64,
) -> Result<(), SkipClassification> {
    if crossings.mid.time >= fiducial_time_min {
        Ok(())
    } else {
        Err(SkipClassification::FiducialTimeCutFailed)
    }
}

/// Step 4: front crossing time relative to every coincidence cluster.
pub fn coincidence_deltas(front: &SurfaceCrossing, clusters: &[CoincidenceCluster]) -> Vec<f64> {
    clusters
        .iter()
        .map(|cc| front.time - cc.start_time)
        .collect()
}

/// Step 5: calorimeter E/p at the back plane, if a cluster is associated.
pub fn energy_over_momentum(track: &Track, back: &SurfaceCrossing) -> Option<f64> {
    track
        .calo_cluster
        .map(|cluster| cluster.energy_deposit / back.momentum)
}

fn extract(
    track: &Track,
    coincidence_clusters: &[CoincidenceCluster],
    fiducial_time_min: f64,
) -> Result<FeatureBundle, SkipClassification> {
    check_convergence(track)?;
    let crossings = select_reference_crossings(track)?;
    apply_fiducial_cut(&crossings, fiducial_time_min)?;

    Ok(FeatureBundle {
        degrees_of_freedom: track.degrees_of_freedom,
        has_calo_cluster: track.has_calo_cluster(),
        front: crossings.front,
        mid: crossings.mid,
        back: crossings.back,
        energy_over_momentum: energy_over_momentum(track, &crossings.back),
        coincidence_deltas: coincidence_deltas(&crossings.front, coincidence_clusters),
    })
}

/// Runs the full selection pipeline on one track.
///
/// # Arguments
/// * `track` - the fitted track
/// * `coincidence_clusters` - all CRV coincidence clusters of the event
/// * `fiducial_time_min` - lower bound on the mid-plane crossing time (inclusive)
pub fn evaluate(
    track: &Track,
    coincidence_clusters: &[CoincidenceCluster],
    fiducial_time_min: f64,
) -> TrackOutcome {
    match extract(track, coincidence_clusters, fiducial_time_min) {
        Ok(bundle) => TrackOutcome::Accepted(bundle),
        Err(classification) => TrackOutcome::Skipped(classification),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use trkana_env::{CaloCluster, SurfaceId};

    fn crossing(surface: SurfaceId, time: f64, momentum: f64) -> Intersection {
        Intersection::new(surface, time, momentum, 0.25)
    }

    /// Track with one crossing per plane: front at 495, mid at 500, back at 505 ns.
    fn good_track() -> Track {
        Track {
            intersections: vec![
                crossing(SurfaceId::TT_FRONT, 495.0, 104.8),
                crossing(SurfaceId::TT_MID, 500.0, 104.5),
                crossing(SurfaceId::TT_BACK, 505.0, 104.2),
            ],
            fit_converged: true,
            degrees_of_freedom: 32,
            calo_cluster: None,
        }
    }

    fn crv(start_time: f64) -> CoincidenceCluster {
        CoincidenceCluster { start_time }
    }

    #[test]
    fn test_reference_scenario() {
        let outcome = evaluate(&good_track(), &[crv(490.0)], 100.0);

        let bundle = outcome.bundle().expect("track should be accepted");
        assert_eq!(bundle.coincidence_deltas, vec![5.0]);
        assert_eq!(bundle.energy_over_momentum, None);
        assert!(!bundle.has_calo_cluster);
        assert_eq!(bundle.degrees_of_freedom, 32);
        assert_eq!(
            bundle.mid,
            SurfaceCrossing {
                time: 500.0,
                momentum: 104.5,
                momentum_error: 0.25
            }
        );
    }

    #[test]
    fn test_fiducial_cut_rejects_early_track() {
        let outcome = evaluate(&good_track(), &[crv(490.0)], 600.0);
        assert_eq!(outcome, TrackOutcome::Skipped(SkipClassification::FiducialTimeCutFailed));
    }

    #[test]
    fn test_fiducial_boundary_is_inclusive() {
        assert!(evaluate(&good_track(), &[], 500.0).is_accepted());
        assert_eq!(
            evaluate(&good_track(), &[], 500.0 + 1e-9).skip(),
            Some(SkipClassification::FiducialTimeCutFailed)
        );
    }

    #[test]
    fn test_nan_mid_time_fails_fiducial_cut() {
        let mut track = good_track();
        track.intersections[1] = crossing(SurfaceId::TT_MID, f64::NAN, 104.5);
        assert_eq!(
            evaluate(&track, &[], 100.0).skip(),
            Some(SkipClassification::FiducialTimeCutFailed)
        );
    }

    #[test]
    fn test_reflected_track_is_ambiguous() {
        let mut track = good_track();
        track.intersections.push(crossing(SurfaceId::TT_FRONT, 560.0, 103.0));
        assert_eq!(
            evaluate(&track, &[crv(490.0)], 0.0).skip(),
            Some(SkipClassification::AmbiguousSurfaceCrossing)
        );
    }

    #[test]
    fn test_missing_plane_is_ambiguous() {
        let mut track = good_track();
        track.intersections.retain(|i| i.surface_id != SurfaceId::TT_BACK);
        assert_eq!(
            evaluate(&track, &[], 0.0).skip(),
            Some(SkipClassification::AmbiguousSurfaceCrossing)
        );
    }

    #[test]
    fn test_non_reference_surfaces_are_ignored() {
        let mut track = good_track();
        track.intersections.push(crossing(SurfaceId::CALO_0, 510.0, 103.9));
        track.intersections.push(crossing(SurfaceId::CALO_1, 512.0, 103.8));
        assert!(evaluate(&track, &[], 0.0).is_accepted());
    }

    #[test]
    fn test_not_converged_wins_over_later_checks() {
        // Also ambiguous and early, but convergence is checked first
        let track = Track {
            intersections: vec![crossing(SurfaceId::TT_MID, 10.0, 100.0)],
            fit_converged: false,
            degrees_of_freedom: 0,
            calo_cluster: None,
        };
        assert_eq!(
            evaluate(&track, &[], 700.0).skip(),
            Some(SkipClassification::NotConverged)
        );
    }

    #[test]
    fn test_ambiguous_wins_over_fiducial() {
        let mut track = good_track();
        track.intersections.push(crossing(SurfaceId::TT_MID, 520.0, 104.0));
        assert_eq!(
            evaluate(&track, &[], 10_000.0).skip(),
            Some(SkipClassification::AmbiguousSurfaceCrossing)
        );
    }

    #[test]
    fn test_energy_over_momentum_uses_back_plane() {
        let mut track = good_track();
        track.calo_cluster = Some(CaloCluster { energy_deposit: 93.78 });

        let outcome = evaluate(&track, &[], 0.0);
        let bundle = outcome.bundle().unwrap();
        assert!(bundle.has_calo_cluster);
        assert_relative_eq!(bundle.energy_over_momentum.unwrap(), 93.78 / 104.2);
    }

    #[test]
    fn test_deltas_preserve_cluster_order() {
        let outcome = evaluate(&good_track(), &[crv(500.0), crv(-5.0), crv(495.0)], 0.0);
        assert_eq!(outcome.bundle().unwrap().coincidence_deltas, vec![-5.0, 500.0, 0.0]);
    }

    #[test]
    fn test_ntuple_row_layout() {
        let outcome = evaluate(&good_track(), &[], 0.0);
        assert_eq!(
            outcome.bundle().unwrap().ntuple_row(),
            [495.0, 104.8, 0.25, 500.0, 104.5, 0.25, 505.0, 104.2, 0.25]
        );
    }

    #[test]
    fn test_skip_codes_follow_pipeline_order() {
        let codes: Vec<u8> = SkipClassification::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec![0, 1, 2]);
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    fn arb_intersection() -> impl Strategy<Value = Intersection> {
        (0i32..4, 0.0f64..2000.0, 50.0f64..150.0, 0.0f64..2.0)
            .prop_map(|(id, t, p, perr)| Intersection::new(SurfaceId(id), t, p, perr))
    }

    fn arb_track() -> impl Strategy<Value = Track> {
        (
            prop::collection::vec(arb_intersection(), 0..8),
            any::<bool>(),
            0u32..100,
            prop::option::of(0.0f64..150.0),
        )
            .prop_map(|(intersections, fit_converged, degrees_of_freedom, energy)| Track {
                intersections,
                fit_converged,
                degrees_of_freedom,
                calo_cluster: energy.map(|energy_deposit| CaloCluster { energy_deposit }),
            })
    }

    fn arb_clusters() -> impl Strategy<Value = Vec<CoincidenceCluster>> {
        prop::collection::vec((-500.0f64..2000.0).prop_map(crv), 0..5)
    }

    fn multiplicity(track: &Track, surface: SurfaceId) -> usize {
        track.intersections_at(surface).count()
    }

    proptest! {
        #[test]
        fn prop_unconverged_always_not_converged(
            mut track in arb_track(),
            clusters in arb_clusters(),
            tmin in 0.0f64..2000.0,
        ) {
            track.fit_converged = false;
            prop_assert_eq!(
                evaluate(&track, &clusters, tmin),
                TrackOutcome::Skipped(SkipClassification::NotConverged)
            );
        }

        #[test]
        fn prop_multiplicity_other_than_one_is_ambiguous(
            mut track in arb_track(),
            clusters in arb_clusters(),
            tmin in 0.0f64..2000.0,
        ) {
            track.fit_converged = true;
            let all_single = [SurfaceId::TT_FRONT, SurfaceId::TT_MID, SurfaceId::TT_BACK]
                .iter()
                .all(|s| multiplicity(&track, *s) == 1);
            let outcome = evaluate(&track, &clusters, tmin);
            if !all_single {
                prop_assert_eq!(outcome, TrackOutcome::Skipped(SkipClassification::AmbiguousSurfaceCrossing));
            } else {
                prop_assert_ne!(outcome.skip(), Some(SkipClassification::AmbiguousSurfaceCrossing));
            }
        }

        #[test]
        fn prop_accepted_bundle_is_consistent(
            track in arb_track(),
            clusters in arb_clusters(),
            tmin in 0.0f64..2000.0,
        ) {
            if let TrackOutcome::Accepted(bundle) = evaluate(&track, &clusters, tmin) {
                prop_assert!(bundle.mid.time >= tmin);
                prop_assert_eq!(bundle.coincidence_deltas.len(), clusters.len());
                prop_assert_eq!(bundle.energy_over_momentum.is_some(), track.has_calo_cluster());
                prop_assert_eq!(bundle.has_calo_cluster, track.has_calo_cluster());
            }
        }

        #[test]
        fn prop_no_clusters_no_deltas(track in arb_track(), tmin in 0.0f64..2000.0) {
            if let Some(bundle) = evaluate(&track, &[], tmin).bundle() {
                prop_assert!(bundle.coincidence_deltas.is_empty());
            }
        }

        #[test]
        fn prop_evaluate_is_idempotent(
            track in arb_track(),
            clusters in arb_clusters(),
            tmin in 0.0f64..2000.0,
        ) {
            let first = evaluate(&track, &clusters, tmin);
            let second = evaluate(&track, &clusters, tmin);
            match (&first, &second) {
                (TrackOutcome::Accepted(a), TrackOutcome::Accepted(b)) => {
                    let bits = |v: [f64; 9]| v.map(f64::to_bits);
                    prop_assert_eq!(bits(a.ntuple_row()), bits(b.ntuple_row()));
                    prop_assert_eq!(
                        a.coincidence_deltas.iter().map(|d| d.to_bits()).collect::<Vec<_>>(),
                        b.coincidence_deltas.iter().map(|d| d.to_bits()).collect::<Vec<_>>()
                    );
                    prop_assert_eq!(
                        a.energy_over_momentum.map(f64::to_bits),
                        b.energy_over_momentum.map(f64::to_bits)
                    );
                }
                _ => prop_assert_eq!(first, second),
            }
        }
    }
}
