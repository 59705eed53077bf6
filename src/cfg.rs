//! Preprocessor configuration
use hifitime::Duration;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Configuration Error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("channel caps must be non zero")]
    NullChannelCap,
    #[error("sampling rate must be strictly positive")]
    InvalidSamplingRate,
    #[error("smoothing window must be strictly positive")]
    InvalidHatchTime,
    #[error("gap threshold must be strictly positive")]
    InvalidGapThreshold,
    #[error("convergence fraction must lie in (0, 1]")]
    InvalidConvergenceFraction,
    #[error("invalid {0} threshold")]
    InvalidThreshold(&'static str),
}

/// A quality gate: one rejection criterion that can be
/// enabled or disabled, with its associated threshold.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Gate {
    /// true if this criterion participates in the validation
    pub enabled: bool,
    /// threshold the related quantity is compared against
    pub threshold: f64,
}

impl Gate {
    /// Builds an active gate with given threshold
    pub fn new(threshold: f64) -> Self {
        Self {
            enabled: true,
            threshold,
        }
    }
    /// Builds an inactive gate
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Receiver description
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Receiver {
    /// Elevation mask angle [°]: satellites below are not processed
    pub mask_angle: f64,
}

impl Default for Receiver {
    fn default() -> Self {
        Self {
            mask_angle: default_mask_angle(),
        }
    }
}

fn default_mask_angle() -> f64 {
    5.0
}

fn default_channels() -> usize {
    12
}

fn default_sampling_rate() -> Duration {
    Duration::from_seconds(1.0)
}

fn default_hatch_time() -> Duration {
    Duration::from_seconds(100.0)
}

fn default_hatch_state_f() -> f64 {
    // reject the first 6 minutes' share of the nominal window
    0.6
}

fn default_hatch_gap_th() -> Duration {
    Duration::from_seconds(10.0)
}

fn default_min_cnr() -> Gate {
    Gate::new(20.0)
}

fn default_max_psr() -> Gate {
    Gate::new(30.0E6)
}

fn default_min_ncs() -> Gate {
    Gate::new(10.0)
}

fn default_max_phase_rate() -> Gate {
    Gate::new(952.0)
}

fn default_max_phase_rate_step() -> Gate {
    Gate::new(10.0)
}

fn default_max_code_rate() -> Gate {
    Gate::new(952.0)
}

fn default_max_code_rate_step() -> Gate {
    Gate::new(10.0)
}

fn default_elev_noise_th() -> f64 {
    20.0
}

/// Preprocessing configuration: channel capacity, smoothing
/// parametrization and one [Gate] per rejection criterion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Receiver channels allocated to GPS
    #[cfg_attr(feature = "serde", serde(default = "default_channels"))]
    pub nchannels_gps: usize,
    /// Receiver channels allocated to Galileo
    #[cfg_attr(feature = "serde", serde(default = "default_channels"))]
    pub nchannels_gal: usize,
    /// Nominal epoch spacing. Assumed on the very first
    /// appearance of a satellite, when no previous epoch exists.
    #[cfg_attr(feature = "serde", serde(default = "default_sampling_rate"))]
    pub sampling_rate: Duration,
    /// Hatch filter nominal smoothing window
    #[cfg_attr(feature = "serde", serde(default = "default_hatch_time"))]
    pub hatch_time: Duration,
    /// Fraction of the smoothing window after which
    /// the filter is declared converged
    #[cfg_attr(feature = "serde", serde(default = "default_hatch_state_f"))]
    pub hatch_state_f: f64,
    /// Inter epoch gap above which the smoother must restart
    #[cfg_attr(feature = "serde", serde(default = "default_hatch_gap_th"))]
    pub hatch_gap_th: Duration,
    /// Minimum C/N0 [dB-Hz]
    #[cfg_attr(feature = "serde", serde(default = "default_min_cnr"))]
    pub min_cnr: Gate,
    /// Maximum admissible pseudo range [m]
    #[cfg_attr(feature = "serde", serde(default = "default_max_psr"))]
    pub max_psr_outrng: Gate,
    /// Cycle slip residual threshold [cycles]
    #[cfg_attr(feature = "serde", serde(default = "default_min_ncs"))]
    pub min_ncs_th: Gate,
    /// Maximum carrier phase rate [m/s]
    #[cfg_attr(feature = "serde", serde(default = "default_max_phase_rate"))]
    pub max_phase_rate: Gate,
    /// Maximum carrier phase rate step [m/s²]
    #[cfg_attr(feature = "serde", serde(default = "default_max_phase_rate_step"))]
    pub max_phase_rate_step: Gate,
    /// Maximum smoothed code rate [m/s]
    #[cfg_attr(feature = "serde", serde(default = "default_max_code_rate"))]
    pub max_code_rate: Gate,
    /// Maximum smoothed code rate step [m/s²]
    #[cfg_attr(feature = "serde", serde(default = "default_max_code_rate_step"))]
    pub max_code_rate_step: Gate,
    /// Low elevation noise threshold [°], reserved
    #[cfg_attr(feature = "serde", serde(default = "default_elev_noise_th"))]
    pub elev_noise_th: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nchannels_gps: default_channels(),
            nchannels_gal: default_channels(),
            sampling_rate: default_sampling_rate(),
            hatch_time: default_hatch_time(),
            hatch_state_f: default_hatch_state_f(),
            hatch_gap_th: default_hatch_gap_th(),
            min_cnr: default_min_cnr(),
            max_psr_outrng: default_max_psr(),
            min_ncs_th: default_min_ncs(),
            max_phase_rate: default_max_phase_rate(),
            max_phase_rate_step: default_max_phase_rate_step(),
            max_code_rate: default_max_code_rate(),
            max_code_rate_step: default_max_code_rate_step(),
            elev_noise_th: default_elev_noise_th(),
        }
    }
}

impl Config {
    /// Verifies this configuration is sane.
    /// Structural faults are reported here, once,
    /// never in the middle of an epoch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nchannels_gps == 0 || self.nchannels_gal == 0 {
            return Err(ConfigError::NullChannelCap);
        }
        if self.sampling_rate.to_seconds() <= 0.0 {
            return Err(ConfigError::InvalidSamplingRate);
        }
        if self.hatch_time.to_seconds() <= 0.0 {
            return Err(ConfigError::InvalidHatchTime);
        }
        if self.hatch_gap_th.to_seconds() <= 0.0 {
            return Err(ConfigError::InvalidGapThreshold);
        }
        if self.hatch_state_f <= 0.0 || self.hatch_state_f > 1.0 {
            return Err(ConfigError::InvalidConvergenceFraction);
        }
        for (gate, name) in [
            (&self.min_cnr, "min C/N0"),
            (&self.max_psr_outrng, "max pseudo range"),
            (&self.min_ncs_th, "cycle slip"),
            (&self.max_phase_rate, "phase rate"),
            (&self.max_phase_rate_step, "phase rate step"),
            (&self.max_code_rate, "code rate"),
            (&self.max_code_rate_step, "code rate step"),
        ] {
            if gate.enabled && (!gate.threshold.is_finite() || gate.threshold < 0.0) {
                return Err(ConfigError::InvalidThreshold(name));
            }
        }
        Ok(())
    }
}
