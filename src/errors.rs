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

use snafu::prelude::*;

/// Every failure of a single guidance cycle or a single conic extrapolation.
///
/// None of these are retried internally: on error, the caller keeps the previous
/// `GuidanceMemory` untouched and calls again with fresh telemetry.
#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GuidanceError {
    /// A zero, NaN or infinite vector was normalized
    #[snafu(display("cannot normalize {action}: vector norm is {norm}"))]
    DegenerateVector { action: &'static str, norm: f64 },
    /// The universal anomaly root-finder did not reach its tolerance
    #[snafu(display(
        "conic extrapolation did not converge after {iterations} iterations (last step {last_step:e})"
    ))]
    NonConvergence { iterations: usize, last_step: f64 },
    /// Even the full remaining stage stack cannot provide the velocity to go
    #[snafu(display(
        "remaining stages provide {available_m_s:.3} m/s but {required_m_s:.3} m/s is required"
    ))]
    InsufficientPerformance {
        required_m_s: f64,
        available_m_s: f64,
    },
    #[snafu(display("stage #{stage} is invalid: {reason}"))]
    InvalidStageSpec { stage: usize, reason: String },
}
