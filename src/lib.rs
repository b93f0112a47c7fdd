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

/*! # upfg

Closed loop ascent guidance of multi-stage launch vehicles with Unified Powered Flight Guidance,
and the universal variable Conic State Extrapolation Routine (CSER) it relies on.

Once per guidance cycle, `Upfg::guide` consumes the remaining stages, the insertion target, the
navigated vehicle state and the memory returned by the previous cycle, and returns the commanded
thrust direction and time to go, along with the memory for the next cycle.
*/

/// Provides the universal variable conic propagator.
pub mod propagators;

/// Provides the vehicle stage model and the guidance law.
pub mod dynamics;

/// Provides the central body and the navigated vehicle state.
pub mod cosmic;

/// Vector utilities shared by the propagator and guidance.
pub mod utils;

mod errors;
/// Guidance will never panic and functions which may fail will return an error.
pub use self::errors::GuidanceError;

/// Loading and dumping of YAML configurations.
pub mod io;

/// Mission design: from a target orbit to the guidance target and the launch azimuth.
pub mod md;

#[macro_use]
extern crate log;
extern crate nalgebra as na;

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::cosmic::{CelestialBody, VehicleState, EARTH};
pub use self::dynamics::{GuidanceMemory, GuidanceOutput, GuidanceSettings, Stage, TargetState, Upfg};
