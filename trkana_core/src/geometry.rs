//! Tracker reference surfaces.
//!
//! Three planes perpendicular to the z axis, at the front, middle and back of
//! the tracker, serve as common comparison points across tracks.

use serde::{Deserialize, Serialize};
use trkana_env::SurfaceId;

/// One of the three fixed reference planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceSurface {
    Front,
    Mid,
    Back,
}

impl ReferenceSurface {
    /// All reference surfaces in upstream-to-downstream order.
    pub const ALL: [ReferenceSurface; 3] = [
        ReferenceSurface::Front,
        ReferenceSurface::Mid,
        ReferenceSurface::Back,
    ];

    /// Surface id used in intersection records.
    pub fn surface_id(&self) -> SurfaceId {
        match self {
            ReferenceSurface::Front => SurfaceId::TT_FRONT,
            ReferenceSurface::Mid => SurfaceId::TT_MID,
            ReferenceSurface::Back => SurfaceId::TT_BACK,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReferenceSurface::Front => "front",
            ReferenceSurface::Mid => "mid",
            ReferenceSurface::Back => "back",
        }
    }
}

impl std::fmt::Display for ReferenceSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Longitudinal positions of the reference planes (mm, tracker frame).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceGeometry {
    pub z_front: f64,
    pub z_mid: f64,
    pub z_back: f64,
}

impl Default for ReferenceGeometry {
    fn default() -> Self {
        Self {
            z_front: -1500.0,
            z_mid: 0.0,
            z_back: 1500.0,
        }
    }
}

impl ReferenceGeometry {
    /// z position of one reference plane.
    pub fn z(&self, surface: ReferenceSurface) -> f64 {
        match surface {
            ReferenceSurface::Front => self.z_front,
            ReferenceSurface::Mid => self.z_mid,
            ReferenceSurface::Back => self.z_back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_ids() {
        let ids: Vec<SurfaceId> = ReferenceSurface::ALL.iter().map(|s| s.surface_id()).collect();
        assert_eq!(ids, vec![SurfaceId::TT_FRONT, SurfaceId::TT_MID, SurfaceId::TT_BACK]);
        assert!(!ids.contains(&SurfaceId::CALO_0));
    }

    #[test]
    fn test_default_geometry_is_ordered() {
        let geom = ReferenceGeometry::default();
        assert!(geom.z(ReferenceSurface::Front) < geom.z(ReferenceSurface::Mid));
        assert!(geom.z(ReferenceSurface::Mid) < geom.z(ReferenceSurface::Back));
    }
}
