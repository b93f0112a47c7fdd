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

use super::{GuidanceMemory, GuidanceSettings};
use crate::errors::GuidanceError;
use crate::linalg::Vector3;
use crate::utils::angle_between;

/// Successive agreeing cycles required before a pre-flight solution is accepted
pub const AGREEING_CYCLES: usize = 2;

/// Decides whether successive guidance cycles agree with each other.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConvergenceMonitor {
    pub criterion_s: f64,
    pub good_solution_deg: f64,
}

impl ConvergenceMonitor {
    pub fn new(settings: &GuidanceSettings) -> Self {
        Self {
            criterion_s: settings.convergence_criterion_s,
            good_solution_deg: settings.good_solution_criterion_deg,
        }
    }

    /// Returns whether the time to go of `next` matches the one predicted by `previous`, once the
    /// time elapsed between both cycles is accounted for.
    pub fn tgo_converged(&self, previous: &GuidanceMemory, next: &GuidanceMemory) -> bool {
        let expected_tgo_s = previous.tgo_s - (next.time_s - previous.time_s);
        (next.tgo_s - expected_tgo_s).abs() < self.criterion_s
    }

    /// Returns whether two successive thrust directions are close enough for the new one to be trusted.
    pub fn is_good_solution(
        &self,
        previous: &Vector3<f64>,
        next: &Vector3<f64>,
    ) -> Result<bool, GuidanceError> {
        Ok(angle_between(previous, next)?.to_degrees() < self.good_solution_deg)
    }

    /// Returns whether a cycle agrees with the one before it, both on the time to go and on the
    /// thrust direction.
    pub fn cycles_agree(
        &self,
        previous: (&GuidanceMemory, &Vector3<f64>),
        next: (&GuidanceMemory, &Vector3<f64>),
    ) -> Result<bool, GuidanceError> {
        Ok(self.tgo_converged(previous.0, next.0) && self.is_good_solution(previous.1, next.1)?)
    }
}

impl From<&GuidanceSettings> for ConvergenceMonitor {
    fn from(settings: &GuidanceSettings) -> Self {
        Self::new(settings)
    }
}
