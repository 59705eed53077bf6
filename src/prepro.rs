//! Measurement preprocessor
use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use gnss::prelude::{Constellation, SV};

use crate::{
    cfg::{Config, ConfigError, Receiver},
    cs::detect_cycle_slip,
    iono,
    obs::{PreproObs, RawObs, RejectionCause},
    state::SatState,
};

/// A satellite last rejected for this cause was out of visibility:
/// the gap observed on its return is a re-acquisition, not a data gap.
pub(crate) const VISIBILITY_REJECTION: RejectionCause = RejectionCause::MaskAngle;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Measurement preprocessor: one instance per receiver.
/// Feed it one epoch of raw observations at a time, it returns the
/// cleaned, validated and smoothed records and carries each satellite's
/// filter state over to the next epoch.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    /// Preprocessor parametrization
    pub cfg: Config,
    /// Receiver description
    pub rcvr: Receiver,
    /// Per satellite carry-over, created on first sight,
    /// kept for the whole session
    states: HashMap<SV, SatState>,
}

impl Preprocessor {
    /// Builds a new preprocessor from a verified configuration.
    /// Structural configuration faults are reported here, never
    /// once the epoch stream has started.
    pub fn new(cfg: Config, rcvr: Receiver) -> Result<Self, Error> {
        cfg.validate()?;

        /*
         * print some infos on latched config
         */
        if !cfg.min_cnr.enabled {
            warn!("C/N0 screening is disabled");
        }
        if !cfg.max_psr_outrng.enabled {
            warn!("pseudo range screening is disabled");
        }
        if !cfg.min_ncs_th.enabled {
            warn!("cycle slip detection is disabled");
        }

        Ok(Self {
            cfg,
            rcvr,
            states: HashMap::new(),
        })
    }

    /// Processes one epoch of raw observations, in input order.
    /// Returns one record per input satellite (never fewer): rejected
    /// measurements are flagged, not dropped. The internal carry-over
    /// is updated in place for the next call.
    pub fn run_epoch(&mut self, observations: &[RawObs]) -> Vec<PreproObs> {
        let mut output: Vec<PreproObs> = observations
            .iter()
            .map(|raw| {
                let state = self.states.entry(raw.sv).or_default();
                let mut rec = PreproObs::from_raw(raw);
                rec.geom_free_prev = state.prev_geom_free;
                rec.mpp = iono::mapping_function(raw.elevation);
                rec
            })
            .collect();

        if let Some(rec) = output.first() {
            debug!("sod {:.1}: {} sv observed", rec.sod, output.len());
        }

        self.channel_admission(&mut output);

        for rec in output.iter_mut() {
            let state = self.states.get_mut(&rec.sv).unwrap(); // infaillible, entries created above
            Self::process(&self.cfg, &self.rcvr, rec, state);
        }

        output
    }

    /// Read-only access to one satellite's carry-over
    pub fn state(&self, sv: SV) -> Option<&SatState> {
        self.states.get(&sv)
    }

    /*
     * Enforces the per constellation channel caps, dropping the
     * surplus satellites with the lowest elevations first.
     */
    fn channel_admission(&self, pool: &mut [PreproObs]) {
        self.constellation_admission(
            pool,
            Constellation::GPS,
            self.cfg.nchannels_gps,
            RejectionCause::GpsChannelCap,
        );
        self.constellation_admission(
            pool,
            Constellation::Galileo,
            self.cfg.nchannels_gal,
            RejectionCause::GalChannelCap,
        );
    }

    fn constellation_admission(
        &self,
        pool: &mut [PreproObs],
        constellation: Constellation,
        nchannels: usize,
        cause: RejectionCause,
    ) {
        let mut active: Vec<(f64, u8)> = pool
            .iter()
            .filter(|rec| rec.valid_l1 && rec.sv.constellation == constellation)
            .map(|rec| (rec.elevation, rec.sv.prn))
            .collect();
        if active.len() <= nchannels {
            return;
        }
        // lowest elevations go first, ties broken by ascending PRN
        active.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let surplus = active.len() - nchannels;
        for (elevation, prn) in &active[..surplus] {
            let sv = SV {
                constellation,
                prn: *prn,
            };
            debug!("{} dropped at {:.2}°: {}", sv, elevation, cause);
            if let Some(rec) = pool.iter_mut().find(|rec| rec.sv == sv) {
                rec.reject(cause);
            }
        }
    }

    /*
     * Runs the full per satellite pipeline for one epoch:
     * quality gates, gap detection, cycle slip policy, Hatch
     * smoothing, rate monitors, iono combination, then the
     * carry-over update (which runs on every path out).
     */
    fn process(cfg: &Config, rcvr: &Receiver, rec: &mut PreproObs, state: &mut SatState) {
        if !rec.valid_l1 {
            // dropped by channel admission
            state.update(rec, false, None);
            return;
        }

        let sv = rec.sv;

        // elevation mask
        if rec.elevation < rcvr.mask_angle {
            debug!("{} below elevation mask ({:.2}°)", sv, rec.elevation);
            rec.reject(RejectionCause::MaskAngle);
            state.update(rec, false, None);
            return;
        }

        // C/N0
        if cfg.min_cnr.enabled && rec.s1 < cfg.min_cnr.threshold {
            debug!("{} low C/N0 ({:.1} dB-Hz)", sv, rec.s1);
            rec.reject(RejectionCause::MinCnr);
            state.update(rec, false, None);
            return;
        }

        // pseudo range magnitude
        if cfg.max_psr_outrng.enabled && rec.c1 > cfg.max_psr_outrng.threshold {
            debug!("{} pseudo range out of range ({:.0} m)", sv, rec.c1);
            rec.reject(RejectionCause::PsrOutOfRange);
            state.update(rec, false, None);
            return;
        }

        // inter epoch gap. A satellite seen for the very first time
        // is assumed one nominal interval away.
        let first_appearance = state.prev_epoch == 0.0;
        let mut delta_t = rec.sod - state.prev_epoch;
        if first_appearance {
            delta_t = cfg.sampling_rate.to_seconds();
        }

        let mut hatch_reset = false;
        if delta_t > cfg.hatch_gap_th.to_seconds() {
            hatch_reset = true;
            if state.prev_rej == VISIBILITY_REJECTION {
                debug!("{} re-acquired after visibility outage", sv);
            } else {
                debug!("{} data gap ({:.0} s)", sv, delta_t);
                rec.reject(RejectionCause::DataGap);
            }
        }

        // cycle slips. One verdict holds the measurement out,
        // three in a row confirm the slip and break the arc.
        if cfg.min_ncs_th.enabled && !hatch_reset {
            let slip = detect_cycle_slip(
                rec.l1,
                rec.sod,
                &state.phase_history,
                cfg.min_ncs_th.threshold,
            );
            state.cs_buff.push(slip);
            if slip {
                debug!("{} cycle slip verdict ({}/3)", sv, state.cs_buff.sum());
                rec.reject(RejectionCause::CycleSlip);
                if state.cs_buff.sum() == 3 {
                    hatch_reset = true;
                } else {
                    state.update(rec, false, None);
                    return;
                }
            }
        }

        // restart requested by a previous epoch
        if state.reset_hatch_filter {
            hatch_reset = true;
            state.reset_hatch_filter = false;
        }

        // Hatch filter: code smoothed against the carrier, converging
        // over the configured window
        let ksmooth;
        if hatch_reset {
            ksmooth = 0.0;
            rec.smooth_c1 = rec.c1;
        } else {
            ksmooth = state.ksmooth + delta_t;
            let alpha = delta_t / ksmooth.min(cfg.hatch_time.to_seconds());
            // previous smoothed code, propagated by the carrier delta
            let predicted = state.prev_smooth_c1 + (rec.l1_meters - state.prev_l1);
            rec.smooth_c1 = alpha * rec.c1 + (1.0 - alpha) * predicted;
        }

        // rate monitors. Any excess breaks the smoothing continuity:
        // the measurement is held out and a restart is latched.
        // A first appearance has no rate reference yet.
        if !hatch_reset && !first_appearance {
            if cfg.max_phase_rate.enabled {
                rec.phase_rate_l1 = (rec.l1_meters - state.prev_l1) / delta_t;
                if rec.phase_rate_l1.abs() > cfg.max_phase_rate.threshold {
                    debug!("{} phase rate ({:.1} m/s)", sv, rec.phase_rate_l1);
                    rec.reject(RejectionCause::MaxPhaseRate);
                    state.reset_hatch_filter = true;
                    state.update(rec, false, Some(ksmooth));
                    return;
                }
            }
            if cfg.max_phase_rate_step.enabled && state.prev_phase_rate_l1 != 0.0 {
                rec.phase_rate_step_l1 =
                    (rec.phase_rate_l1 - state.prev_phase_rate_l1) / delta_t;
                if rec.phase_rate_step_l1.abs() > cfg.max_phase_rate_step.threshold {
                    debug!("{} phase rate step ({:.1} m/s²)", sv, rec.phase_rate_step_l1);
                    rec.reject(RejectionCause::MaxPhaseRateStep);
                    state.reset_hatch_filter = true;
                    state.update(rec, false, Some(ksmooth));
                    return;
                }
            }
            if cfg.max_code_rate.enabled {
                rec.range_rate_l1 = (rec.smooth_c1 - state.prev_smooth_c1) / delta_t;
                if rec.range_rate_l1.abs() > cfg.max_code_rate.threshold {
                    debug!("{} code rate ({:.1} m/s)", sv, rec.range_rate_l1);
                    rec.reject(RejectionCause::MaxCodeRate);
                    state.reset_hatch_filter = true;
                    state.update(rec, false, Some(ksmooth));
                    return;
                }
            }
            if cfg.max_code_rate_step.enabled && state.prev_range_rate_l1 != 0.0 {
                rec.range_rate_step_l1 =
                    (rec.range_rate_l1 - state.prev_range_rate_l1) / delta_t;
                if rec.range_rate_step_l1.abs() > cfg.max_code_rate_step.threshold {
                    debug!("{} code rate step ({:.1} m/s²)", sv, rec.range_rate_step_l1);
                    rec.reject(RejectionCause::MaxCodeRateStep);
                    state.reset_hatch_filter = true;
                    state.update(rec, false, Some(ksmooth));
                    return;
                }
            }
        }

        // smoothing status: converged once past the configured
        // share of the nominal window
        rec.status = ksmooth > cfg.hatch_state_f * cfg.hatch_time.to_seconds() && rec.valid_l1;

        // the rate references only ever come from monitored epochs
        state.update_rates(rec);

        // geometry free combination and ionospheric gradients
        if rec.valid_l1 && rec.l2 > 0.0 {
            rec.geom_free = iono::geometry_free(rec.l1_meters, rec.l2);
            if !hatch_reset && state.prev_geom_free_epoch > 0.0 {
                let delta_t_geom = rec.sod - state.prev_geom_free_epoch;
                let dstec = (rec.geom_free - rec.geom_free_prev) / delta_t_geom;
                rec.vtec_rate = iono::vtec_rate(dstec, rec.mpp);
                rec.iaatr = iono::instantaneous_aatr(rec.vtec_rate, rec.mpp);
            }
            state.update_geom_free(rec);
        }

        state.update(rec, hatch_reset, Some(ksmooth));
    }
}
