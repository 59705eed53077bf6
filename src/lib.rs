//! GNSS measurement preprocessing.
//!
//! Per-epoch cleaning, validation and carrier smoothing of raw dual
//! frequency observations, plus derived ionospheric gradient
//! indicators (VTEC rate, instantaneous AATR). Feed the
//! [prelude::Preprocessor] one epoch at a time; it flags rejected
//! measurements instead of dropping them and carries each satellite's
//! filter state across epochs.

extern crate gnss_rs as gnss;

// private modules
mod cfg;
mod cs;
mod iono;
mod obs;
mod prepro;
mod state;

pub mod constants;

// pub export
pub use prepro::Error;

// prelude
pub mod prelude {
    pub use crate::cfg::{Config, ConfigError, Gate, Receiver};
    pub use crate::cs::detect_cycle_slip;
    pub use crate::iono::{geometry_free, instantaneous_aatr, mapping_function, vtec_rate};
    pub use crate::obs::{ParsingError, PreproObs, RawObs, RejectionCause};
    pub use crate::prepro::Preprocessor;
    pub use crate::state::{CsBuffer, PhaseHistory, SatState};
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::Duration;
}
