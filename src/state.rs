//! Per satellite carry-over state
use crate::obs::{PreproObs, RejectionCause};

/// Shift register of the last three accepted carrier phase
/// samples and their epochs, index 0 being the most recent.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PhaseHistory {
    /// L1 carrier phase [cycles]
    pub l1: [f64; 3],
    /// Second of day of each sample [s]
    pub t: [f64; 3],
}

impl PhaseHistory {
    /// true once three samples were accumulated
    pub fn complete(&self) -> bool {
        self.t.iter().all(|t| *t != 0.0)
    }
    /// Shifts a new accepted sample in, discarding the oldest
    pub(crate) fn shift(&mut self, l1: f64, sod: f64) {
        self.l1 = [l1, self.l1[0], self.l1[1]];
        self.t = [sod, self.t[0], self.t[1]];
    }
    /// Restarts the history from a single sample
    pub(crate) fn reset(&mut self, l1: f64, sod: f64) {
        self.l1 = [l1, 0.0, 0.0];
        self.t = [sod, 0.0, 0.0];
    }
}

/// Sliding window of the last three cycle slip verdicts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CsBuffer {
    flags: [u8; 3],
}

impl CsBuffer {
    /// Pushes the latest verdict, discarding the oldest
    pub(crate) fn push(&mut self, slip: bool) {
        self.flags.rotate_left(1);
        self.flags[2] = slip as u8;
    }
    /// Number of raised verdicts in the window (0..=3)
    pub fn sum(&self) -> u8 {
        self.flags.iter().sum()
    }
    /// Window length, fixed
    pub fn len(&self) -> usize {
        self.flags.len()
    }
    pub(crate) fn reset(&mut self) {
        self.flags = [0; 3];
    }
}

/// Everything one satellite carries from one epoch to the next:
/// detector histories, smoother state and previous valid values.
/// Created zeroed the first time a satellite shows up and kept
/// for the whole receiver session.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SatState {
    /// Carrier phase history feeding the cycle slip detector
    pub phase_history: PhaseHistory,
    /// L1 carrier phase [m] at the last epoch
    pub prev_l1: f64,
    /// Smoothed C1 [m] at the last epoch
    pub prev_smooth_c1: f64,
    /// Smoothed code rate [m/s] at the last monitored epoch
    pub prev_range_rate_l1: f64,
    /// Carrier phase rate [m/s] at the last monitored epoch
    pub prev_phase_rate_l1: f64,
    /// Last geometry-free combination [m]
    pub prev_geom_free: f64,
    /// Epoch of the last geometry-free combination [s]
    pub prev_geom_free_epoch: f64,
    /// Second of day of the last valid measurement
    pub prev_epoch: f64,
    /// Last rejection verdict
    pub prev_rej: RejectionCause,
    /// Last three cycle slip verdicts
    pub cs_buff: CsBuffer,
    /// Continuous smoothing time accumulated since the last reset [s]
    pub ksmooth: f64,
    /// Smoother restart request, honored at the next epoch
    pub reset_hatch_filter: bool,
}

impl SatState {
    /// Keeps the rate references used by the step monitors.
    /// Only called for epochs that passed all rate monitors,
    /// so outliers never become the next reference.
    pub(crate) fn update_rates(&mut self, rec: &PreproObs) {
        self.prev_phase_rate_l1 = rec.phase_rate_l1;
        self.prev_range_rate_l1 = rec.range_rate_l1;
    }
    /// Keeps the geometry-free reference for the next epoch.
    /// Only called when the combination was formed this epoch.
    pub(crate) fn update_geom_free(&mut self, rec: &PreproObs) {
        self.prev_geom_free = rec.geom_free;
        self.prev_geom_free_epoch = rec.sod;
    }
    /// End of epoch bookkeeping. Runs for every satellite of the
    /// epoch, rejected or not.
    /// - rec: this epoch's outcome
    /// - hatch_reset: the smoother restarted this epoch
    /// - ksmooth: accumulated smoothing time, when the smoother ran
    pub(crate) fn update(&mut self, rec: &PreproObs, hatch_reset: bool, ksmooth: Option<f64>) {
        self.prev_rej = rec.rejection_cause;
        // a controlled reset restarts the gap arithmetic too
        if rec.rejection_cause == RejectionCause::None || hatch_reset {
            self.prev_epoch = rec.sod;
        }
        if rec.rejection_cause == RejectionCause::None {
            self.phase_history.shift(rec.l1, rec.sod);
        }
        if hatch_reset {
            self.phase_history.reset(rec.l1, rec.sod);
            self.cs_buff.reset();
        }
        self.prev_l1 = rec.l1_meters;
        self.prev_smooth_c1 = rec.smooth_c1;
        if let Some(ksmooth) = ksmooth {
            self.ksmooth = ksmooth;
        }
    }
}
