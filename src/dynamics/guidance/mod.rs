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

use crate::cosmic::{VehicleState, EARTH_GM_M3_S2};
use crate::errors::GuidanceError;
use crate::io::ConfigRepr;
use crate::linalg::Vector3;
use crate::propagators::{ConicSolution, CserOptions};
use crate::utils::{rodrigues, unit_of};
use serde::{Deserialize, Serialize};
use std::fmt;
use typed_builder::TypedBuilder;

mod convergence;
pub use convergence::{ConvergenceMonitor, AGREEING_CYCLES};

pub mod integrals;
pub use integrals::BurnIntegrals;

pub mod steering;
pub use steering::SteeringSolution;

mod upfg;
pub use upfg::Upfg;

/// Angle by which the first desired position is placed downrange of the current position
pub const INITIAL_DOWNRANGE_DEG: f64 = 20.0;

/// Orbit insertion state targeted by guidance, fixed for the whole closed loop.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    /// Flight path angle at insertion, positive above the local horizontal, in degrees
    pub flight_path_angle_deg: f64,
    /// Unit normal of the target plane, opposite to the target orbit's angular momentum
    pub normal: Vector3<f64>,
    /// Insertion radius, in meters
    pub radius_m: f64,
    /// Insertion speed, in m/s
    pub velocity_m_s: f64,
}

impl TargetState {
    pub fn new(
        flight_path_angle_deg: f64,
        normal: Vector3<f64>,
        radius_m: f64,
        velocity_m_s: f64,
    ) -> Self {
        Self {
            flight_path_angle_deg,
            normal,
            radius_m,
            velocity_m_s,
        }
    }

    /// Desired insertion velocity when inserting at `rd`, the desired position.
    ///
    /// The velocity lies in the target plane, at the target flight path angle above the horizontal.
    pub fn desired_velocity(&self, rd: &Vector3<f64>) -> Result<Vector3<f64>, GuidanceError> {
        let ix = unit_of(rd, "desired position")?;
        let normal = unit_of(&self.normal, "target plane normal")?;
        let iz = ix.cross(&normal);
        let (sin_fpa, cos_fpa) = self.flight_path_angle_deg.to_radians().sin_cos();
        Ok((ix * sin_fpa + iz * cos_fpa) * self.velocity_m_s)
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insertion at {:.3} km, {:.3} m/s, fpa = {:.4} deg, normal = [{:.6}, {:.6}, {:.6}]",
            self.radius_m * 1e-3,
            self.velocity_m_s,
            self.flight_path_angle_deg,
            self.normal.x,
            self.normal.y,
            self.normal.z
        )
    }
}

/// Everything guidance carries from one cycle to the next.
///
/// A new memory is returned by every successful guidance cycle; the previous one is never modified.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuidanceMemory {
    /// Last coast extrapolation, its anomaly seeds the next one
    pub cser: Option<ConicSolution>,
    /// Position bias, in meters
    pub rbias_m: Vector3<f64>,
    /// Desired insertion position, in meters
    pub rd_m: Vector3<f64>,
    /// Position change due to gravity over the remaining burn, in meters
    pub rgrav_m: Vector3<f64>,
    /// Time spent burning the active stage, in seconds
    pub burn_time_s: f64,
    /// Time since liftoff of the last cycle, in seconds
    pub time_s: f64,
    /// Time to go of the last cycle, in seconds
    pub tgo_s: f64,
    /// Inertial velocity at the last cycle, in m/s
    pub velocity_m_s: Vector3<f64>,
    /// Velocity to go, in m/s
    pub vgo_m_s: Vector3<f64>,
}

impl GuidanceMemory {
    /// Seeds the memory of the very first guidance cycle.
    ///
    /// The desired position is placed 20 degrees downrange of the current position, in the target
    /// plane, and the velocity to go aims at the target speed there. The gravity term starts at
    /// half of the current gravity acceleration.
    pub fn initialize(
        target: &TargetState,
        state: &VehicleState,
        mu_m3_s2: f64,
    ) -> Result<Self, GuidanceError> {
        let r = state.radius_m;
        let rmag = r.norm();
        let rd = unit_of(
            &rodrigues(&r, &-target.normal, INITIAL_DOWNRANGE_DEG.to_radians())?,
            "initial desired position",
        )? * target.radius_m;
        let downrange = unit_of(&(-target.normal).cross(&rd), "initial downrange direction")?;
        let vgo = downrange * target.velocity_m_s - state.velocity_m_s;

        Ok(Self {
            cser: None,
            rbias_m: Vector3::zeros(),
            rd_m: rd,
            rgrav_m: -r * (0.5 * mu_m3_s2 / rmag.powi(3)),
            burn_time_s: 0.0,
            time_s: state.time_s,
            tgo_s: 0.0,
            velocity_m_s: state.velocity_m_s,
            vgo_m_s: vgo,
        })
    }

    /// Returns a copy of this memory for the first cycle after staging: the next stage has not burned yet.
    pub fn with_burn_time_reset(&self) -> Self {
        Self {
            burn_time_s: 0.0,
            ..*self
        }
    }
}

impl fmt::Display for GuidanceMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T+{:.3} s\ttgo = {:.3} s\t|vgo| = {:.3} m/s\tburned {:.3} s",
            self.time_s,
            self.tgo_s,
            self.vgo_m_s.norm(),
            self.burn_time_s
        )
    }
}

/// Output of one guidance cycle, fed to attitude control.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuidanceOutput {
    /// Commanded inertial thrust unit vector
    pub direction: Vector3<f64>,
    /// Angle between the thrust direction and the local vertical, in degrees
    pub pitch_deg: f64,
    /// Angle between the horizontal thrust component and local east, positive towards north, in degrees
    pub yaw_deg: f64,
    /// Always zero: rates are left to the attitude controller
    pub pitch_rate_deg_s: f64,
    /// Always zero: rates are left to the attitude controller
    pub yaw_rate_deg_s: f64,
    /// Time to go until cutoff, in seconds
    pub tgo_s: f64,
}

impl fmt::Display for GuidanceOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pitch = {:.3} deg\tyaw = {:.3} deg\ttgo = {:.3} s",
            self.pitch_deg, self.yaw_deg, self.tgo_s
        )
    }
}

/// Settings of the guidance loop.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct GuidanceSettings {
    /// Gravitational parameter of the central body, in m^3/s^2
    #[builder(default = EARTH_GM_M3_S2)]
    pub mu_m3_s2: f64,
    /// Options of the coast extrapolation used to estimate gravity losses
    #[builder(default)]
    #[serde(default)]
    pub cser: CserOptions,
    /// Maximum error on the time to go prediction between two cycles to consider guidance converged, in seconds
    #[builder(default = 0.1)]
    #[serde(default = "default_convergence_criterion")]
    pub convergence_criterion_s: f64,
    /// Maximum angle between two consecutive thrust directions for a solution to be trusted, in degrees
    #[builder(default = 15.0)]
    #[serde(default = "default_good_solution_criterion")]
    pub good_solution_criterion_deg: f64,
}

fn default_convergence_criterion() -> f64 {
    0.1
}

fn default_good_solution_criterion() -> f64 {
    15.0
}

impl Default for GuidanceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for GuidanceSettings {}
impl ConfigRepr for TargetState {}
