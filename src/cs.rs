//! Carrier phase cycle slip detection
use crate::state::PhaseHistory;

/// Third order time difference (TOD) cycle slip test on L1.
/// The current carrier phase is compared against its third order
/// Lagrange extrapolation from the last three accepted samples;
/// a residual spike betrays a slip.
///
/// Returns false while fewer than three samples are available.
///
/// - l1: current carrier phase [cycles]
/// - sod: current epoch [s]
/// - history: last three accepted (phase, epoch) samples
/// - threshold: residual threshold [cycles]
pub fn detect_cycle_slip(l1: f64, sod: f64, history: &PhaseHistory, threshold: f64) -> bool {
    if !history.complete() {
        return false;
    }

    let tau1 = sod - history.t[0];
    let tau2 = history.t[0] - history.t[1];
    let tau3 = history.t[1] - history.t[2];

    // extrapolation factors
    let r1 = (tau1 + tau2) * (tau1 + tau2 + tau3) / (tau2 * (tau2 + tau3));
    let r2 = -tau1 * (tau1 + tau2 + tau3) / (tau2 * tau3);
    let r3 = tau1 * (tau1 + tau2) / ((tau2 + tau3) * tau3);

    let residual = l1 - r1 * history.l1[0] - r2 * history.l1[1] - r3 * history.l1[2];
    residual.abs() > threshold
}

#[cfg(test)]
mod test {
    use super::*;
    fn history(l1: [f64; 3], t: [f64; 3]) -> PhaseHistory {
        PhaseHistory { l1, t }
    }
    #[test]
    fn incomplete_history_never_fires() {
        let hist = history([3.0E8, 2.0E8, 0.0], [3.0, 2.0, 0.0]);
        assert!(!detect_cycle_slip(4.0E8, 4.0, &hist, 0.0));
        let hist = history([3.0E8, 0.0, 0.0], [3.0, 0.0, 0.0]);
        assert!(!detect_cycle_slip(4.0E8, 4.0, &hist, 0.0));
        assert!(!detect_cycle_slip(4.0E8, 4.0, &PhaseHistory::default(), 0.0));
    }
    #[test]
    fn steady_phase_ramp_passes() {
        // perfectly linear phase: the third order residual is null
        let hist = history([1.0E8 + 3000.0, 1.0E8 + 2000.0, 1.0E8 + 1000.0], [3.0, 2.0, 1.0]);
        assert!(!detect_cycle_slip(1.0E8 + 4000.0, 4.0, &hist, 1.0));
    }
    #[test]
    fn quadratic_phase_passes() {
        // third order differences also null a quadratic in t
        let phase = |t: f64| 5.0 * t * t + 3.0 * t + 7.0;
        let hist = history([phase(3.0), phase(2.0), phase(1.0)], [3.0, 2.0, 1.0]);
        assert!(!detect_cycle_slip(phase(4.0), 4.0, &hist, 1E-6));
    }
    #[test]
    fn jump_detected() {
        let hist = history([1.0E8 + 3000.0, 1.0E8 + 2000.0, 1.0E8 + 1000.0], [3.0, 2.0, 1.0]);
        assert!(detect_cycle_slip(1.0E8 + 4000.0 + 10_000.0, 4.0, &hist, 50.0));
    }
    #[test]
    fn uneven_sampling_supported() {
        // linear ramp observed at irregular intervals still extrapolates exactly
        let phase = |t: f64| 1000.0 * t;
        let hist = history([phase(7.0), phase(4.0), phase(3.0)], [7.0, 4.0, 3.0]);
        assert!(!detect_cycle_slip(phase(9.0), 9.0, &hist, 1E-6));
    }
}
