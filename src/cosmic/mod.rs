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
use std::f64::consts::TAU;

// Re-Export the vehicle state
mod vehicle;
pub use self::vehicle::VehicleState;

/// From NIST special publication 330, 2008 edition, in meters per second squared
pub const STD_GRAVITY: f64 = 9.80665;

/// Earth gravitational parameter (EGM96 / WGS84), in m^3/s^2
pub const EARTH_GM_M3_S2: f64 = 3.986_004_418e14;

/// The central body the vehicle ascends from.
///
/// The inertial frame is centered on this body with +Z along its rotation axis.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    /// Gravitational parameter, in m^3/s^2
    pub mu_m3_s2: f64,
    /// Equatorial radius, in meters
    pub equatorial_radius_m: f64,
    /// Sidereal rotation period, in seconds
    pub rotation_period_s: f64,
}

impl CelestialBody {
    /// Surface rotation speed at the provided latitude, in m/s
    pub fn surface_speed_m_s(&self, latitude_deg: f64) -> f64 {
        TAU * self.equatorial_radius_m / self.rotation_period_s * latitude_deg.to_radians().cos()
    }

    /// Circular orbit speed at the provided radius, in m/s
    pub fn circular_speed_m_s(&self, radius_m: f64) -> f64 {
        (self.mu_m3_s2 / radius_m).sqrt()
    }
}

/// Earth, WGS84 equatorial radius and sidereal day
pub const EARTH: CelestialBody = CelestialBody {
    mu_m3_s2: EARTH_GM_M3_S2,
    equatorial_radius_m: 6_378_137.0,
    rotation_period_s: 86_164.0905,
};
