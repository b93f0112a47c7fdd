/*
    upfg, Unified Powered Flight Guidance for ascent vehicles
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::GuidanceMemory;
use crate::cosmic::VehicleState;
use crate::dynamics::propulsion::{Stage, ThrustMode};
use crate::errors::{GuidanceError, InsufficientPerformanceSnafu, InvalidStageSpecSnafu};
use crate::linalg::Vector3;
use serde::{Deserialize, Serialize};
use snafu::ensure;

/// A stage as flown during the remaining burn.
#[derive(Copy, Clone, Debug)]
struct BurnArc {
    mode: ThrustMode,
    exhaust_velocity_m_s: f64,
    acceleration_m_s2: f64,
    /// Characteristic time τ = v_e / a
    tau_s: f64,
    max_burn_time_s: f64,
}

impl BurnArc {
    /// Builds the arc of the stage at `index`. The first stage is the active one: its acceleration
    /// uses the navigated mass and its burn time excludes what it already burned.
    fn new(
        stage: &Stage,
        index: usize,
        state: &VehicleState,
        memory: &GuidanceMemory,
    ) -> Result<Self, GuidanceError> {
        if stage.mode == ThrustMode::Coast {
            return Ok(Self {
                mode: ThrustMode::Coast,
                exhaust_velocity_m_s: 0.0,
                acceleration_m_s2: 0.0,
                tau_s: 0.0,
                max_burn_time_s: stage.max_burn_time_s(),
            });
        }

        let exhaust_velocity_m_s = stage.performance().exhaust_velocity_m_s;
        let (acceleration_m_s2, max_burn_time_s) = if index == 0 {
            let remaining_s = stage.max_burn_time_s() - memory.burn_time_s;
            ensure!(
                remaining_s >= 0.0,
                InvalidStageSpecSnafu {
                    stage: index,
                    reason: format!(
                        "active stage already burned {:.3} s out of {:.3} s",
                        memory.burn_time_s,
                        stage.max_burn_time_s()
                    )
                }
            );
            (stage.acceleration_m_s2(state.mass_kg), remaining_s)
        } else {
            (
                stage.acceleration_m_s2(stage.total_mass_kg),
                stage.max_burn_time_s(),
            )
        };
        let tau_s = exhaust_velocity_m_s / acceleration_m_s2;

        if stage.mode == ThrustMode::ConstantThrust {
            ensure!(
                tau_s > max_burn_time_s,
                InvalidStageSpecSnafu {
                    stage: index,
                    reason: format!(
                        "characteristic time ({tau_s:.3} s) must exceed the burn time ({max_burn_time_s:.3} s)"
                    )
                }
            );
        }

        Ok(Self {
            mode: stage.mode,
            exhaust_velocity_m_s,
            acceleration_m_s2,
            tau_s,
            max_burn_time_s,
        })
    }

    /// Velocity increment of a full burn, in m/s
    fn capacity_m_s(&self) -> f64 {
        match self.mode {
            ThrustMode::ConstantThrust => {
                self.exhaust_velocity_m_s
                    * (self.tau_s / (self.tau_s - self.max_burn_time_s)).ln()
            }
            ThrustMode::ConstantAcceleration => self.acceleration_m_s2 * self.max_burn_time_s,
            ThrustMode::Coast => 0.0,
        }
    }

    /// Burn time needed to deliver `delta_v_m_s`
    fn burn_time_s(&self, delta_v_m_s: f64) -> f64 {
        match self.mode {
            ThrustMode::ConstantThrust => {
                self.tau_s * (1.0 - (-delta_v_m_s / self.exhaust_velocity_m_s).exp())
            }
            ThrustMode::ConstantAcceleration => delta_v_m_s / self.acceleration_m_s2,
            ThrustMode::Coast => self.max_burn_time_s,
        }
    }

    /// Returns the J, S, Q and P integrals of this arc alone, for a burn starting at `t0_s`.
    fn moments(&self, delta_v_m_s: f64, burn_time_s: f64, t0_s: f64) -> (f64, f64, f64, f64) {
        let (li, tb) = (delta_v_m_s, burn_time_s);
        match self.mode {
            ThrustMode::ConstantThrust => {
                let (tu, ve) = (self.tau_s, self.exhaust_velocity_m_s);
                let ji = tu * li - ve * tb;
                let si = -ji + tb * li;
                let qi = si * (tu + t0_s) - 0.5 * ve * tb.powi(2);
                let pi = qi * (tu + t0_s) - 0.5 * ve * tb.powi(2) * (tb / 3.0 + t0_s);
                (ji, si, qi, pi)
            }
            ThrustMode::ConstantAcceleration => {
                let tgoi = t0_s + tb;
                let ji = 0.5 * li * tb;
                let si = ji;
                let qi = si * (tb / 3.0 + t0_s);
                let pi = si / 6.0 * (tgoi.powi(2) + 2.0 * tgoi * t0_s + 3.0 * t0_s.powi(2));
                (ji, si, qi, pi)
            }
            ThrustMode::Coast => (0.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Burn integrals of the remaining ascent, i.e. the thrust integrals L, J, S, Q, H and P over the
/// stages actually needed to deliver the velocity to go.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BurnIntegrals {
    /// Number of stages (from the active one) needed for this burn
    pub stages_used: usize,
    /// Velocity to go, corrected for the velocity sensed since the last cycle, in m/s
    pub vgo_m_s: Vector3<f64>,
    /// Velocity increment of each used stage, in m/s
    pub delta_v_m_s: Vec<f64>,
    /// Burn time of each used stage, in seconds
    pub burn_times_s: Vec<f64>,
    /// Time to go until the end of each used stage, in seconds
    pub cumulative_tgo_s: Vec<f64>,
    /// Total time to go, in seconds
    pub tgo_s: f64,
    /// Total velocity integral, equal to |vgo|
    pub l: f64,
    pub j: f64,
    pub s: f64,
    pub q: f64,
    pub h: f64,
    pub p: f64,
}

impl BurnIntegrals {
    /// Distributes the velocity to go over the remaining `stages` and integrates the thrust
    /// acceleration over the resulting burn.
    ///
    /// Every stage is validated before any computation. Trailing stages which are not needed to
    /// reach the velocity to go are dropped. If even the full stack cannot deliver it, this fails
    /// with `InsufficientPerformance`.
    pub fn solve(
        stages: &[Stage],
        state: &VehicleState,
        memory: &GuidanceMemory,
    ) -> Result<Self, GuidanceError> {
        for (i, stage) in stages.iter().enumerate() {
            stage.validate(i)?;
        }
        ensure!(
            !stages.is_empty(),
            InvalidStageSpecSnafu {
                stage: 0_usize,
                reason: "no stage left to guide"
            }
        );

        let arcs = stages
            .iter()
            .enumerate()
            .map(|(i, stage)| BurnArc::new(stage, i, state, memory))
            .collect::<Result<Vec<_>, _>>()?;

        // Velocity gained since the last cycle was already delivered
        let vgo = memory.vgo_m_s - (state.velocity_m_s - memory.velocity_m_s);
        let vgo_norm = vgo.norm();

        let capacities: Vec<f64> = arcs.iter().map(BurnArc::capacity_m_s).collect();

        let mut n = arcs.len();
        'dropping: loop {
            let mut partial_m_s = 0.0;
            for capacity in &capacities[..n - 1] {
                partial_m_s += capacity;
                if partial_m_s > vgo_norm {
                    n -= 1;
                    debug!(
                        "|vgo| = {vgo_norm:.3} m/s reached before the last stage, planning with {n} stage(s)"
                    );
                    continue 'dropping;
                }
            }
            break;
        }

        let prior_m_s: f64 = capacities[..n - 1].iter().sum();
        let required_m_s = vgo_norm - prior_m_s;
        if required_m_s > capacities[n - 1] {
            let available_m_s = prior_m_s + capacities[n - 1];
            warn!(
                "insufficient performance: {vgo_norm:.3} m/s to go, {available_m_s:.3} m/s available"
            );
            return InsufficientPerformanceSnafu {
                required_m_s: vgo_norm,
                available_m_s,
            }
            .fail();
        }

        let mut delta_v_m_s = capacities[..n - 1].to_vec();
        delta_v_m_s.push(required_m_s);

        let burn_times_s: Vec<f64> = arcs[..n]
            .iter()
            .zip(&delta_v_m_s)
            .map(|(arc, dv)| arc.burn_time_s(*dv))
            .collect();

        let (mut l, mut j, mut s, mut q, mut h, mut p) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let mut cumulative_tgo_s = Vec::with_capacity(n);
        let mut t0_s = 0.0;
        for (i, arc) in arcs[..n].iter().enumerate() {
            let (li, tb) = (delta_v_m_s[i], burn_times_s[i]);
            let tgoi = t0_s + tb;
            let (mut ji, mut si, mut qi, mut pi) = arc.moments(li, tb, t0_s);
            // Shift this arc's integrals by the stages burned before it
            ji += li * t0_s;
            si += l * tb;
            qi += j * tb;
            pi += h * tb;

            l += li;
            j += ji;
            s += si;
            q += qi;
            p += pi;
            h = j * tgoi - q;

            cumulative_tgo_s.push(tgoi);
            t0_s = tgoi;
        }

        Ok(Self {
            stages_used: n,
            vgo_m_s: vgo,
            delta_v_m_s,
            burn_times_s,
            cumulative_tgo_s,
            tgo_s: t0_s,
            l,
            j,
            s,
            q,
            h,
            p,
        })
    }
}
