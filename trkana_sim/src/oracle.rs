//! Ground truth oracle for simulation.
//!
//! The Oracle plays the role of reconstruction: it invents electrons that
//! traverse the tracker and writes down what a fit would have produced.
//! - Helical flight along z at a fixed pitch (crossing times per plane)
//! - Momentum loss between planes and smeared fit errors
//! - The pathologies the selection has to deal with (unconverged fits,
//!   reflections in the magnetic mirror, tracks leaving the tracker early)
//! - Calorimeter matches and CRV coincidence clusters

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use serde::{Deserialize, Serialize};
use trkana_core::{ReferenceGeometry, ReferenceSurface};
use trkana_env::{
    AnalysisError, CaloCluster, CoincidenceCluster, Event, EventId, EventSource, Intersection,
    RawEvent, RawTrack, SurfaceId,
};

/// Speed of light (mm/ns)
const C_MM_PER_NS: f64 = 299.792458;

/// Electron mass (MeV/c²)
const ELECTRON_MASS: f64 = 0.511;

/// Distance from the back plane to the first calorimeter disk (mm)
const CALO_OFFSET_Z: f64 = 350.0;

/// Knobs of the event generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Mean number of tracks per event (Poisson)
    pub mean_tracks: f64,

    /// Mean number of CRV coincidence clusters per event (Poisson)
    pub mean_crv_clusters: f64,

    /// Mid-plane crossing time window (ns)
    pub time_window: (f64, f64),

    /// Momentum at the front plane (MeV/c), mean and spread
    pub momentum_mean: f64,
    pub momentum_spread: f64,

    /// Momentum lost between consecutive planes (MeV/c)
    pub energy_loss_per_plane: f64,

    /// Typical momentum fit error (MeV/c)
    pub momentum_error: f64,

    /// Pitch angle range (rad, from the z axis)
    pub pitch_range: (f64, f64),

    /// Probability that the final fit did not converge
    pub unconverged_rate: f64,

    /// Probability that the track reflected and crossed the front plane twice
    pub reflection_rate: f64,

    /// Probability that the track left the tracker before the back plane
    pub miss_back_rate: f64,

    /// Probability that the track is matched to a calorimeter cluster
    pub calo_match_rate: f64,

    /// Reference plane positions
    pub geometry: ReferenceGeometry,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            mean_tracks: 1.5,
            mean_crv_clusters: 0.5,
            time_window: (400.0, 1700.0),
            momentum_mean: 104.97, // Conversion electron endpoint
            momentum_spread: 0.8,
            energy_loss_per_plane: 0.3,
            momentum_error: 0.2,
            pitch_range: (0.8, 1.0), // ~45° to ~57°
            unconverged_rate: 0.05,
            reflection_rate: 0.05,
            miss_back_rate: 0.03,
            calo_match_rate: 0.7,
            geometry: ReferenceGeometry::default(),
        }
    }
}

/// The Oracle - generates reconstructed events deterministically from a seed.
pub struct Oracle {
    rng: ChaCha8Rng,
    config: OracleConfig,
    run: u32,
    next_event: u32,
}

impl Oracle {
    /// Creates a new Oracle with default generator settings.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, OracleConfig::default())
    }

    pub fn with_config(seed: u64, config: OracleConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            run: 1,
            next_event: 1,
        }
    }

    /// Sets the run number stamped on generated events.
    pub fn with_run(mut self, run: u32) -> Self {
        self.run = run;
        self
    }

    fn gaussian(&mut self, mean: f64, sigma: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + sigma * z
    }

    fn poisson(&mut self, mean: f64) -> usize {
        if mean <= 0.0 {
            return 0;
        }
        match Poisson::new(mean) {
            Ok(dist) => {
                let k: f64 = dist.sample(&mut self.rng);
                k as usize
            }
            Err(_) => 0,
        }
    }

    fn uniform(&mut self, range: (f64, f64)) -> f64 {
        if range.1 > range.0 {
            self.rng.gen_range(range.0..range.1)
        } else {
            range.0
        }
    }

    /// Generates one track plus, if matched, its calorimeter cluster.
    fn generate_track(&mut self) -> (RawTrack, Option<CaloCluster>) {
        let geom = self.config.geometry;

        // Initial momentum vector at the front plane
        let p_front = self.gaussian(self.config.momentum_mean, self.config.momentum_spread);
        let pitch = self.uniform(self.config.pitch_range);
        let phi = self.uniform((0.0, std::f64::consts::TAU));
        let direction = Vector3::new(pitch.sin() * phi.cos(), pitch.sin() * phi.sin(), pitch.cos());
        let momentum = direction * p_front;

        let energy = (momentum.norm_squared() + ELECTRON_MASS * ELECTRON_MASS).sqrt();
        let v_z = C_MM_PER_NS * momentum.z / energy;

        let t_mid = self.uniform(self.config.time_window);
        let time_at = |z: f64| t_mid + (z - geom.z_mid) / v_z;

        let mut intersections = Vec::with_capacity(5);
        let mut p = p_front;
        for surface in ReferenceSurface::ALL {
            let perr = self
                .gaussian(self.config.momentum_error, 0.2 * self.config.momentum_error)
                .abs();
            intersections.push(Intersection::new(
                surface.surface_id(),
                time_at(geom.z(surface)),
                p,
                perr,
            ));
            p -= self.config.energy_loss_per_plane;
        }

        // Reflection: the track first travelled upstream through the front plane
        if self.rng.gen_bool(self.config.reflection_rate.clamp(0.0, 1.0)) {
            let delay = self.uniform((20.0, 60.0));
            let first = intersections[0];
            intersections.insert(
                0,
                Intersection::new(
                    SurfaceId::TT_FRONT,
                    first.time - delay,
                    first.momentum + self.config.energy_loss_per_plane,
                    first.momentum_error,
                ),
            );
        }

        let missed_back = self.rng.gen_bool(self.config.miss_back_rate.clamp(0.0, 1.0));
        if missed_back {
            intersections.retain(|i| i.surface_id != SurfaceId::TT_BACK);
        }

        let calo = if !missed_back && self.rng.gen_bool(self.config.calo_match_rate.clamp(0.0, 1.0)) {
            let z_calo = geom.z_back + CALO_OFFSET_Z;
            let p_calo = p_front - 3.0 * self.config.energy_loss_per_plane;
            intersections.push(Intersection::new(
                SurfaceId::CALO_0,
                time_at(z_calo),
                p_calo,
                self.config.momentum_error,
            ));
            let response = self.gaussian(0.93, 0.05).max(0.0);
            Some(CaloCluster {
                energy_deposit: p_calo * response,
            })
        } else {
            None
        };

        let fit_converged = !self.rng.gen_bool(self.config.unconverged_rate.clamp(0.0, 1.0));
        let degrees_of_freedom = self.rng.gen_range(15..60);

        (
            RawTrack {
                intersections,
                fit_converged,
                degrees_of_freedom,
                calo_cluster_index: None,
            },
            calo,
        )
    }

    /// Generates the next event in serialized form.
    pub fn generate_raw(&mut self) -> RawEvent {
        let id = EventId::new(self.run, 0, self.next_event);
        self.next_event += 1;

        let n_tracks = self.poisson(self.config.mean_tracks);
        let mut tracks = Vec::with_capacity(n_tracks);
        let mut calo_clusters = Vec::new();
        for _ in 0..n_tracks {
            let (mut track, calo) = self.generate_track();
            if let Some(cluster) = calo {
                track.calo_cluster_index = Some(calo_clusters.len());
                calo_clusters.push(cluster);
            }
            tracks.push(track);
        }

        let n_crv = self.poisson(self.config.mean_crv_clusters);
        let coincidence_clusters = (0..n_crv)
            .map(|_| CoincidenceCluster {
                start_time: self.uniform((0.0, self.config.time_window.1)),
            })
            .collect();

        RawEvent {
            id,
            tracks,
            calo_clusters,
            coincidence_clusters,
        }
    }

    /// Generates the next event with calorimeter references resolved.
    pub fn generate_event(&mut self) -> Result<Event, AnalysisError> {
        Event::try_from(self.generate_raw())
    }
}

/// Event source yielding a fixed number of generated events.
pub struct OracleSource {
    oracle: Oracle,
    remaining: u64,
}

impl OracleSource {
    pub fn new(oracle: Oracle, events: u64) -> Self {
        Self {
            oracle,
            remaining: events,
        }
    }
}

impl EventSource for OracleSource {
    fn next_event(&mut self) -> Result<Option<Event>, AnalysisError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        self.oracle.generate_event().map(Some)
    }
}
