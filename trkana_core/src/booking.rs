//! Observation names and the standard histogram/ntuple bookings.

use trkana_env::{HistogramBooking, NtupleBooking};

/// Names under which the event processor reports its observations.
pub mod names {
    /// Tracks per event
    pub const N_TRACKS: &str = "hNTracks";
    /// Degrees of freedom of the fit
    pub const N_DOF: &str = "hnDOF";
    /// 1 if the track has a calorimeter cluster, else 0
    pub const HAS_CALO: &str = "hHasCalo";
    /// Mid-plane crossing time
    pub const T0: &str = "ht0";
    /// Mid-plane momentum
    pub const P: &str = "hp";
    /// Mid-plane momentum error
    pub const P_ERR: &str = "hpErr";
    /// Cut tree: bin = skip classification code
    pub const N_SKIP: &str = "hnSkip";
    /// Calorimeter E/p
    pub const E_OVER_P: &str = "heOverP";
    /// CRV coincidence clusters per event
    pub const N_CRV_CC: &str = "hnCrvCC";
    /// Front crossing time minus CRV coincidence start time
    pub const DT_CRV: &str = "hdTnCrv";
    /// Time, momentum and error at front, mid and back planes
    pub const NTUPLE: &str = "ntup";
}

/// Column layout of the intersection ntuple.
pub const NTUPLE_COLUMNS: &str = "t_f:p_f:perr_f:t_m:p_m:perr_m:t_b:p_b:perr_b";

/// Binning for every scalar observation the processor emits.
pub fn standard_histograms() -> Vec<HistogramBooking> {
    use names::*;
    vec![
        HistogramBooking::new(N_TRACKS, "Number of tracks per event.", 10, 0.0, 10.0),
        HistogramBooking::new(N_DOF, "Number of degrees of freedom in fit.", 100, 0.0, 100.0),
        HistogramBooking::new(HAS_CALO, "Number of calorimeter hits.", 2, 0.0, 2.0),
        HistogramBooking::new(T0, "Track time at mid-point of Tracker ;(ns)", 100, 0.0, 2000.0),
        HistogramBooking::new(P, "Track momentum at mid-point of tracker;( MeV/c)", 100, 70.0, 120.0),
        HistogramBooking::new(
            P_ERR,
            "Error on track momentum at mid-point of tracker;( MeV/c)",
            100,
            0.0,
            2.0,
        ),
        HistogramBooking::new(N_SKIP, "Cut tree for skipped tracks", 3, 0.0, 3.0),
        HistogramBooking::new(E_OVER_P, "E/p for tracks with a matched Calo Cluster", 150, 0.0, 1.5),
        HistogramBooking::new(N_CRV_CC, "Number of CRV Coincidence clusters", 10, 0.0, 10.0),
        HistogramBooking::new(
            DT_CRV,
            "delta(T) track-CRV Coincidence cluster;(ns)",
            200,
            -2000.0,
            2000.0,
        ),
    ]
}

/// The intersection ntuple.
pub fn standard_ntuples() -> Vec<NtupleBooking> {
    vec![NtupleBooking::new(names::NTUPLE, "Intersection ntuple", NTUPLE_COLUMNS)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_bookings_have_unique_names() {
        let mut histo_names: Vec<_> = standard_histograms().into_iter().map(|b| b.name).collect();
        let total = histo_names.len();
        histo_names.sort();
        histo_names.dedup();
        assert_eq!(histo_names.len(), total);
        assert_eq!(total, 10);
    }

    #[test]
    fn test_ntuple_has_nine_columns() {
        assert_eq!(NTUPLE_COLUMNS.split(':').count(), 9);
    }
}
