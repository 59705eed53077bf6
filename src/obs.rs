//! Raw and preprocessed observations
use gnss::prelude::{Constellation, SV};
use thiserror::Error;

use crate::constants::L1_WAVELENGTH;

/// Observation record parsing error
#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("observation record is {0} fields short")]
    IncompleteRecord(usize),
    #[error("unknown constellation tag \"{0}\"")]
    UnknownConstellation(String),
    #[error("invalid {0} field")]
    InvalidField(&'static str),
}

/// Why a measurement was rejected this epoch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RejectionCause {
    /// Measurement is valid
    #[default]
    None = 0,
    /// Dropped by the GPS channel cap
    GpsChannelCap = 1,
    /// Dropped by the Galileo channel cap
    GalChannelCap = 2,
    /// Below the receiver elevation mask
    MaskAngle = 3,
    /// C/N0 under the minimum
    MinCnr = 4,
    /// Three consecutive cycle slip verdicts
    CycleSlip = 5,
    /// Inter epoch gap exceeded the threshold
    DataGap = 6,
    /// Pseudo range out of range
    PsrOutOfRange = 7,
    /// Carrier phase rate over the threshold
    MaxPhaseRate = 8,
    /// Carrier phase rate step over the threshold
    MaxPhaseRateStep = 9,
    /// Smoothed code rate over the threshold
    MaxCodeRate = 10,
    /// Smoothed code rate step over the threshold
    MaxCodeRateStep = 11,
}

impl std::fmt::Display for RejectionCause {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::None => write!(fmt, "valid"),
            Self::GpsChannelCap => write!(fmt, "gps channels exhausted"),
            Self::GalChannelCap => write!(fmt, "galileo channels exhausted"),
            Self::MaskAngle => write!(fmt, "below mask angle"),
            Self::MinCnr => write!(fmt, "low C/N0"),
            Self::CycleSlip => write!(fmt, "cycle slip"),
            Self::DataGap => write!(fmt, "data gap"),
            Self::PsrOutOfRange => write!(fmt, "pseudo range out of range"),
            Self::MaxPhaseRate => write!(fmt, "phase rate"),
            Self::MaxPhaseRateStep => write!(fmt, "phase rate step"),
            Self::MaxCodeRate => write!(fmt, "code rate"),
            Self::MaxCodeRateStep => write!(fmt, "code rate step"),
        }
    }
}

/// One raw dual frequency observation: one satellite, one epoch
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RawObs {
    /// Observed SV
    pub sv: SV,
    /// Second of day [s]
    pub sod: f64,
    /// Day of year
    pub doy: u16,
    /// Elevation [°]
    pub elevation: f64,
    /// Azimuth [°]
    pub azimuth: f64,
    /// C1 pseudo range [m]
    pub c1: f64,
    /// L1 carrier phase [cycles]
    pub l1: f64,
    /// L1 C/N0 [dB-Hz]
    pub s1: f64,
    /// P2 pseudo range [m]
    pub p2: f64,
    /// L2 carrier phase [cycles]
    pub l2: f64,
    /// L2 C/N0 [dB-Hz]
    pub s2: f64,
}

/*
 * Positional indices of the observation record fields.
 * This layout is stable: readers upstream produce it as is.
 */
const CONST: usize = 0;
const PRN: usize = 1;
const SOD: usize = 2;
const DOY: usize = 3;
const ELEV: usize = 4;
const AZIM: usize = 5;
const C1: usize = 6;
const L1: usize = 7;
const S1: usize = 8;
const P2: usize = 9;
const L2: usize = 10;
const S2: usize = 11;

const RECORD_LEN: usize = 12;

impl RawObs {
    /// Parses one observation from its positional fields:
    /// CONST, PRN, SOD, DOY, ELEV, AZIM, C1, L1, S1, P2, L2, S2.
    pub fn from_fields(fields: &[&str]) -> Result<Self, ParsingError> {
        if fields.len() < RECORD_LEN {
            return Err(ParsingError::IncompleteRecord(RECORD_LEN - fields.len()));
        }
        let constellation = match fields[CONST] {
            "G" => Constellation::GPS,
            "E" => Constellation::Galileo,
            other => {
                return Err(ParsingError::UnknownConstellation(other.to_string()));
            },
        };
        let prn = fields[PRN]
            .trim()
            .parse::<u8>()
            .map_err(|_| ParsingError::InvalidField("prn"))?;
        let float = |idx: usize, name: &'static str| -> Result<f64, ParsingError> {
            fields[idx]
                .trim()
                .parse::<f64>()
                .map_err(|_| ParsingError::InvalidField(name))
        };
        Ok(Self {
            sv: SV { constellation, prn },
            sod: float(SOD, "sod")?,
            doy: fields[DOY]
                .trim()
                .parse::<u16>()
                .map_err(|_| ParsingError::InvalidField("doy"))?,
            elevation: float(ELEV, "elevation")?,
            azimuth: float(AZIM, "azimuth")?,
            c1: float(C1, "c1")?,
            l1: float(L1, "l1")?,
            s1: float(S1, "s1")?,
            p2: float(P2, "p2")?,
            l2: float(L2, "l2")?,
            s2: float(S2, "s2")?,
        })
    }
}

/// Preprocessed observation: one satellite, one epoch.
/// Carries the raw measurements, the validation outcome,
/// the smoothed code and the derived ionospheric quantities.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PreproObs {
    /// Observed SV
    pub sv: SV,
    /// Second of day [s]
    pub sod: f64,
    /// Day of year
    pub doy: u16,
    /// Elevation [°]
    pub elevation: f64,
    /// Azimuth [°]
    pub azimuth: f64,
    /// C1 pseudo range [m]
    pub c1: f64,
    /// L1 carrier phase [cycles]
    pub l1: f64,
    /// L1 carrier phase [m]
    pub l1_meters: f64,
    /// L1 C/N0 [dB-Hz]
    pub s1: f64,
    /// P2 pseudo range [m]
    pub p2: f64,
    /// L2 carrier phase [cycles]
    pub l2: f64,
    /// L2 C/N0 [dB-Hz]
    pub s2: f64,
    /// Carrier smoothed C1 [m]
    pub smooth_c1: f64,
    /// Geometry-free combination [m]
    pub geom_free: f64,
    /// Geometry-free combination at the previous epoch [m]
    pub geom_free_prev: f64,
    /// L1 measurement validity
    pub valid_l1: bool,
    /// Rejection verdict for this epoch
    pub rejection_cause: RejectionCause,
    /// true once the smoothing filter has converged
    pub status: bool,
    /// Smoothed code rate [m/s]
    pub range_rate_l1: f64,
    /// Smoothed code rate step [m/s²]
    pub range_rate_step_l1: f64,
    /// Carrier phase rate [m/s]
    pub phase_rate_l1: f64,
    /// Carrier phase rate step [m/s²]
    pub phase_rate_step_l1: f64,
    /// Vertical TEC rate [TECU/s]
    pub vtec_rate: f64,
    /// Instantaneous Along Arc TEC Rate
    pub iaatr: f64,
    /// Ionospheric obliquity at this elevation
    pub mpp: f64,
}

impl PreproObs {
    /// Builds the output record from a raw observation,
    /// initially valid, everything else at defaults.
    pub(crate) fn from_raw(raw: &RawObs) -> Self {
        Self {
            sv: raw.sv,
            sod: raw.sod,
            doy: raw.doy,
            elevation: raw.elevation,
            azimuth: raw.azimuth,
            c1: raw.c1,
            l1: raw.l1,
            l1_meters: raw.l1 * L1_WAVELENGTH,
            s1: raw.s1,
            p2: raw.p2,
            l2: raw.l2,
            s2: raw.s2,
            valid_l1: true,
            ..Default::default()
        }
    }
    /// Invalidates this measurement. The first cause wins:
    /// calling twice is a logic error upstream.
    pub(crate) fn reject(&mut self, cause: RejectionCause) {
        debug_assert!(self.rejection_cause == RejectionCause::None);
        self.valid_l1 = false;
        self.rejection_cause = cause;
    }
}
