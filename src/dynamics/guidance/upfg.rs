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

use super::steering::{pitch_yaw_deg, predict_gravity, solve_steering};
use super::{
    BurnIntegrals, ConvergenceMonitor, GuidanceMemory, GuidanceOutput, GuidanceSettings,
    TargetState, AGREEING_CYCLES,
};
use crate::cosmic::VehicleState;
use crate::dynamics::propulsion::Stage;
use crate::errors::{GuidanceError, NonConvergenceSnafu};
use crate::linalg::Vector3;
use crate::utils::{project_on_plane, unit_of};
use std::fmt;

/// Unified Powered Flight Guidance.
///
/// Each call to `guide` is one guidance cycle: a pure function of the remaining stages, the target,
/// the navigated state and the memory returned by the previous cycle. Nothing is cached between
/// calls, so a failed cycle leaves the caller's memory untouched.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Upfg {
    pub settings: GuidanceSettings,
}

impl Upfg {
    pub fn new(settings: GuidanceSettings) -> Self {
        Self { settings }
    }

    /// Runs one guidance cycle.
    ///
    /// `stages` are the remaining stages, the first one being the active one. Returns the thrust
    /// command and the memory to provide to the next cycle.
    pub fn guide(
        &self,
        stages: &[Stage],
        target: &TargetState,
        state: &VehicleState,
        memory: &GuidanceMemory,
    ) -> Result<(GuidanceOutput, GuidanceMemory), GuidanceError> {
        let dt_s = state.time_s - memory.time_s;

        let integrals = BurnIntegrals::solve(stages, state, memory)?;
        let tgo_s = integrals.tgo_s;
        let steering = solve_steering(&integrals, target, state, memory)?;
        let gravity = predict_gravity(
            &steering,
            state,
            tgo_s,
            memory.cser.and_then(|cser| cser.seed()),
            self.settings.mu_m3_s2,
            &self.settings.cser,
        )?;

        // Predicted cutoff position, brought back into the target plane
        let rp = state.radius_m
            + state.velocity_m_s * tgo_s
            + gravity.rgrav_m
            + steering.rthrust_m;
        let rd = unit_of(
            &project_on_plane(&rp, &target.normal)?,
            "predicted cutoff position",
        )? * target.radius_m;
        let vd = target.desired_velocity(&rd)?;
        let vgo = vd - state.velocity_m_s - gravity.vgrav_m_s + steering.vbias_m_s;

        let (pitch_deg, yaw_deg) = pitch_yaw_deg(&steering.direction, &state.radius_m)?;

        debug!(
            "T+{:.3} s: {} stage(s), tgo = {tgo_s:.3} s, |vgo| = {:.3} m/s, pitch = {pitch_deg:.3} deg, yaw = {yaw_deg:.3} deg",
            state.time_s,
            integrals.stages_used,
            vgo.norm()
        );

        let output = GuidanceOutput {
            direction: steering.direction,
            pitch_deg,
            yaw_deg,
            pitch_rate_deg_s: 0.0,
            yaw_rate_deg_s: 0.0,
            tgo_s,
        };

        let next = GuidanceMemory {
            cser: Some(gravity.cser),
            rbias_m: steering.rbias_m,
            rd_m: rd,
            rgrav_m: gravity.rgrav_m,
            burn_time_s: memory.burn_time_s + dt_s,
            time_s: state.time_s,
            tgo_s,
            velocity_m_s: state.velocity_m_s,
            vgo_m_s: vgo,
        };

        Ok((output, next))
    }

    /// Iterates guidance on frozen telemetry until the time to go settles, e.g. before liftoff or
    /// before enabling closed loop guidance.
    ///
    /// A solution is accepted once `AGREEING_CYCLES` successive cycles agree with their predecessor
    /// on the time to go (within the convergence criterion) and on the thrust direction (within the
    /// good solution criterion). Fails with `NonConvergence` otherwise after `max_cycles` cycles.
    pub fn converge(
        &self,
        stages: &[Stage],
        target: &TargetState,
        state: &VehicleState,
        memory: &GuidanceMemory,
        max_cycles: usize,
    ) -> Result<(GuidanceOutput, GuidanceMemory), GuidanceError> {
        let monitor = ConvergenceMonitor::from(&self.settings);
        let mut memory = *memory;
        let mut direction: Option<Vector3<f64>> = None;
        let mut agreeing = 0;
        let mut last_step_s = f64::NAN;

        for cycle in 1..=max_cycles {
            let (output, next) = self.guide(stages, target, state, &memory)?;
            last_step_s = next.tgo_s - memory.tgo_s;
            let agrees = match direction {
                Some(previous) => {
                    monitor.cycles_agree((&memory, &previous), (&next, &output.direction))?
                }
                None => false,
            };
            agreeing = if agrees { agreeing + 1 } else { 0 };
            if agreeing >= AGREEING_CYCLES {
                info!(
                    "guidance converged after {cycle} cycle(s): tgo = {:.3} s",
                    next.tgo_s
                );
                return Ok((output, next));
            }
            direction = Some(output.direction);
            memory = next;
        }

        warn!("guidance did not converge after {max_cycles} cycle(s): last tgo step {last_step_s:.3} s");
        NonConvergenceSnafu {
            iterations: max_cycles,
            last_step: last_step_s,
        }
        .fail()
    }
}

impl fmt::Display for Upfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UPFG (mu = {:e} m^3/s^2, CSER {}, convergence within {} s)",
            self.settings.mu_m3_s2, self.settings.cser, self.settings.convergence_criterion_s
        )
    }
}
