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

use crate::linalg::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Navigated state of the vehicle, sampled by telemetry once per guidance cycle.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Time since liftoff, in seconds
    pub time_s: f64,
    /// Current total mass, in kg
    pub mass_kg: f64,
    /// Inertial position, in meters
    pub radius_m: Vector3<f64>,
    /// Inertial velocity, in m/s
    pub velocity_m_s: Vector3<f64>,
}

impl VehicleState {
    pub fn new(
        time_s: f64,
        mass_kg: f64,
        radius_m: Vector3<f64>,
        velocity_m_s: Vector3<f64>,
    ) -> Self {
        Self {
            time_s,
            mass_kg,
            radius_m,
            velocity_m_s,
        }
    }

    /// Returns the radial (vertical) speed in m/s
    pub fn radial_speed_m_s(&self) -> f64 {
        let rmag = self.radius_m.norm();
        if rmag > 0.0 {
            self.radius_m.dot(&self.velocity_m_s) / rmag
        } else {
            0.0
        }
    }

    /// Returns the specific orbital energy in m^2/s^2
    pub fn energy_m2_s2(&self, mu_m3_s2: f64) -> f64 {
        0.5 * self.velocity_m_s.norm_squared() - mu_m3_s2 / self.radius_m.norm()
    }
}

#[allow(clippy::format_in_format_args)]
impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(3);
        write!(
            f,
            "T+{} s\tmass = {} kg\t|r| = {} km\t|v| = {} m/s",
            format!("{:.*}", prec, self.time_s),
            format!("{:.*}", prec, self.mass_kg),
            format!("{:.*}", prec, self.radius_m.norm() * 1e-3),
            format!("{:.*}", prec, self.velocity_m_s.norm()),
        )
    }
}

#[allow(clippy::format_in_format_args)]
impl fmt::LowerExp for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(6);
        write!(
            f,
            "T+{} s\tmass = {} kg\tr = [{}, {}, {}] m\tv = [{}, {}, {}] m/s",
            format!("{:.*e}", prec, self.time_s),
            format!("{:.*e}", prec, self.mass_kg),
            format!("{:.*e}", prec, self.radius_m.x),
            format!("{:.*e}", prec, self.radius_m.y),
            format!("{:.*e}", prec, self.radius_m.z),
            format!("{:.*e}", prec, self.velocity_m_s.x),
            format!("{:.*e}", prec, self.velocity_m_s.y),
            format!("{:.*e}", prec, self.velocity_m_s.z),
        )
    }
}
