//! Ionospheric combinations and mapping
use crate::constants::{
    EARTH_RADIUS_KM, GAMMA_L1L2, IONO_SHELL_HEIGHT_KM, L2_WAVELENGTH,
};

/// Ionospheric obliquity (mapping) function Mpp for a thin shell model.
/// Maps slant TEC to vertical TEC at the pierce point.
/// - elevation: satellite elevation [°]
pub fn mapping_function(elevation: f64) -> f64 {
    let cos_e = elevation.to_radians().cos();
    let ratio = EARTH_RADIUS_KM * cos_e / (EARTH_RADIUS_KM + IONO_SHELL_HEIGHT_KM);
    1.0 / (1.0 - ratio.powi(2)).sqrt()
}

/// Geometry-free combination of both carriers [m].
/// Cancels geometry and clocks, leaves the ionospheric delay.
/// - l1_meters: L1 carrier phase [m]
/// - l2_cycles: L2 carrier phase [cycles]
pub fn geometry_free(l1_meters: f64, l2_cycles: f64) -> f64 {
    (l1_meters - l2_cycles * L2_WAVELENGTH) / (1.0 - GAMMA_L1L2)
}

/// VTEC rate [TECU/s] from a slant TEC rate [m/s] at given obliquity
pub fn vtec_rate(dstec: f64, mpp: f64) -> f64 {
    1000.0 * dstec / mpp
}

/// Instantaneous Along Arc TEC Rate, from the VTEC rate
pub fn instantaneous_aatr(vtec_rate: f64, mpp: f64) -> f64 {
    vtec_rate / mpp
}
