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

use super::{BurnIntegrals, GuidanceMemory, TargetState};
use crate::cosmic::VehicleState;
use crate::errors::GuidanceError;
use crate::linalg::Vector3;
use crate::propagators::{propagate_with, ConicSolution, CserOptions};
use crate::utils::{angle_between, project_on_plane, unit_of};
use serde::{Deserialize, Serialize};

/// Thrust direction and thrust integrals of the current guidance cycle.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteeringSolution {
    /// Nominal thrust direction, along the velocity to go
    pub lambda: Vector3<f64>,
    /// Rate of the nominal thrust direction, in 1/s
    pub lambda_dot: Vector3<f64>,
    /// Commanded thrust unit vector
    pub direction: Vector3<f64>,
    /// Angle between the commanded and the nominal directions, in radians
    pub phi_rad: f64,
    pub phi_dot_rad_s: f64,
    /// Velocity gained from thrust along the commanded profile, in m/s
    pub vthrust_m_s: Vector3<f64>,
    /// Position gained from thrust along the commanded profile, in meters
    pub rthrust_m: Vector3<f64>,
    pub vbias_m_s: Vector3<f64>,
    pub rbias_m: Vector3<f64>,
    /// Gravity term rescaled to the current time to go, in meters
    pub rgrav_m: Vector3<f64>,
}

/// Position change due to gravity, rescaled quadratically from the last time to go to the new one.
pub fn scaled_gravity(integrals: &BurnIntegrals, memory: &GuidanceMemory) -> Vector3<f64> {
    if memory.tgo_s > 0.0 {
        memory.rgrav_m * (integrals.tgo_s / memory.tgo_s).powi(2)
    } else {
        memory.rgrav_m
    }
}

/// Position to go, before bias: the desired position minus where the vehicle would be at cutoff
/// without thrust.
///
/// The cutoff position is free downrange: that component is chosen so that the position to go
/// projects onto the nominal thrust direction as the thrust integral S.
pub fn position_to_go(
    integrals: &BurnIntegrals,
    target: &TargetState,
    state: &VehicleState,
    memory: &GuidanceMemory,
) -> Result<Vector3<f64>, GuidanceError> {
    let lambda = unit_of(&integrals.vgo_m_s, "velocity to go")?;
    let rgrav = scaled_gravity(integrals, memory);
    let rgo = memory.rd_m
        - (state.radius_m + state.velocity_m_s * integrals.tgo_s + rgrav);
    let iz = unit_of(&memory.rd_m.cross(&target.normal), "downrange direction")?;
    let rgo_xy = rgo - iz * iz.dot(&rgo);
    let rgo_z = (integrals.s - lambda.dot(&rgo_xy)) / lambda.dot(&iz);
    Ok(rgo_xy + iz * rgo_z)
}

/// Solves the commanded thrust direction and the thrust integrals along it.
pub fn solve_steering(
    integrals: &BurnIntegrals,
    target: &TargetState,
    state: &VehicleState,
    memory: &GuidanceMemory,
) -> Result<SteeringSolution, GuidanceError> {
    let (l, j, s, q, h, p) = (
        integrals.l,
        integrals.j,
        integrals.s,
        integrals.q,
        integrals.h,
        integrals.p,
    );
    let lambda = unit_of(&integrals.vgo_m_s, "velocity to go")?;
    let rgo = position_to_go(integrals, target, state, memory)? + memory.rbias_m;

    let lambda_de = q - s * j / l;
    let lambda_dot = (rgo - lambda * s) / lambda_de;
    let direction = unit_of(&(lambda - lambda_dot * (j / l)), "thrust direction")?;
    let phi = angle_between(&direction, &lambda)?;
    let phi_dot = -phi * l / j;

    // No turning: the lateral terms vanish
    let lateral = if lambda_dot == Vector3::zeros() {
        Vector3::zeros()
    } else {
        unit_of(&lambda_dot, "thrust turning direction")?
    };

    let vthrust = lambda
        * (l - 0.5 * l * phi.powi(2) - j * phi * phi_dot - 0.5 * h * phi_dot.powi(2))
        - lateral * (l * phi + j * phi_dot);
    let rthrust = lambda
        * (s - 0.5 * s * phi.powi(2) - q * phi * phi_dot - 0.5 * p * phi_dot.powi(2))
        - lateral * (s * phi + q * phi_dot);

    Ok(SteeringSolution {
        lambda,
        lambda_dot,
        direction,
        phi_rad: phi,
        phi_dot_rad_s: phi_dot,
        vthrust_m_s: vthrust,
        rthrust_m: rthrust,
        vbias_m_s: integrals.vgo_m_s - vthrust,
        rbias_m: rgo - rthrust,
        rgrav_m: scaled_gravity(integrals, memory),
    })
}

/// Gravity effects over the remaining burn, from a coast extrapolation of the thrust-corrected state.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GravityPrediction {
    pub cser: ConicSolution,
    pub rgrav_m: Vector3<f64>,
    pub vgrav_m_s: Vector3<f64>,
}

/// Predicts the gravity terms by coasting for `tgo_s` from a state offset by the thrust integrals,
/// warm started from the previous anomaly.
pub fn predict_gravity(
    steering: &SteeringSolution,
    state: &VehicleState,
    tgo_s: f64,
    seed: Option<f64>,
    mu_m3_s2: f64,
    opts: &CserOptions,
) -> Result<GravityPrediction, GuidanceError> {
    let rc1 = state.radius_m - steering.rthrust_m * 0.1 - steering.vthrust_m_s * (tgo_s / 30.0);
    let vc1 = state.velocity_m_s + steering.rthrust_m * (1.2 / tgo_s) - steering.vthrust_m_s * 0.1;
    let cser = propagate_with(rc1, vc1, tgo_s, mu_m3_s2, seed, opts)?;
    Ok(GravityPrediction {
        cser,
        rgrav_m: cser.radius_m - rc1 - vc1 * tgo_s,
        vgrav_m_s: cser.velocity_m_s - vc1,
    })
}

/// Returns the pitch from the local vertical and the yaw from local east (positive north), in degrees.
///
/// The yaw of a vertical direction is zero.
pub fn pitch_yaw_deg(
    direction: &Vector3<f64>,
    radius_m: &Vector3<f64>,
) -> Result<(f64, f64), GuidanceError> {
    let up = unit_of(radius_m, "local vertical")?;
    let east = unit_of(&Vector3::z().cross(&up), "local east")?;
    let pitch = angle_between(direction, &up)?.to_degrees();

    let in_plane = project_on_plane(direction, &up)?;
    if in_plane == Vector3::zeros() {
        return Ok((pitch, 0.0));
    }
    let yaw = angle_between(&in_plane, &east)?.to_degrees();
    if in_plane.dot(&up.cross(&east)) < 0.0 {
        Ok((pitch, -yaw))
    } else {
        Ok((pitch, yaw))
    }
}
