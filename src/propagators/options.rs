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

use serde::{Deserialize, Serialize};
use std::fmt;
use typed_builder::TypedBuilder;

/// Default tolerance on the dimensionless Newton step of the universal anomaly
pub const CSER_TOLERANCE: f64 = 5e-9;
/// Default hard ceiling on the Newton-Raphson iterations
pub const CSER_MAX_ITERATIONS: usize = 100;

/// CserOptions stores the root-finder options of the conic state extrapolator.
///
/// The tolerance applies to the dimensionless step |f/f'|, i.e. after scaling lengths by |r0| and
/// speeds by the local circular speed. The iteration ceiling bounds the worst case latency of a
/// guidance cycle: when it is hit, the extrapolation fails with `NonConvergence`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct CserOptions {
    #[builder(default = CSER_TOLERANCE)]
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[builder(default = CSER_MAX_ITERATIONS)]
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_tolerance() -> f64 {
    CSER_TOLERANCE
}

fn default_max_iterations() -> usize {
    CSER_MAX_ITERATIONS
}

impl Default for CserOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CserOptions {
    /// Initializes options with the provided tolerance and the default iteration ceiling
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self::builder().tolerance(tolerance).build()
    }
}

impl fmt::Display for CserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tol: {:e}, max iterations: {}",
            self.tolerance, self.max_iterations
        )
    }
}
