//! GNSS signal constants
use nyx_space::cosmic::SPEED_OF_LIGHT;

/// L1 carrier frequency [Hz]
pub const L1_FREQUENCY: f64 = 1575.42E6;

/// L2 carrier frequency [Hz]
pub const L2_FREQUENCY: f64 = 1227.60E6;

/// L1 carrier wavelength [m]
pub const L1_WAVELENGTH: f64 = SPEED_OF_LIGHT / L1_FREQUENCY;

/// L2 carrier wavelength [m]
pub const L2_WAVELENGTH: f64 = SPEED_OF_LIGHT / L2_FREQUENCY;

/// γ = (f1/f2)², scales the L1/L2 ionospheric delay ratio
pub const GAMMA_L1L2: f64 = (L1_FREQUENCY / L2_FREQUENCY) * (L1_FREQUENCY / L2_FREQUENCY);

/// Mean Earth radius [km], used by the thin-shell obliquity model
pub const EARTH_RADIUS_KM: f64 = 6378.1363;

/// Height of the ionospheric thin shell [km]
pub const IONO_SHELL_HEIGHT_KM: f64 = 350.0;
