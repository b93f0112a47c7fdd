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

use crate::cosmic::CelestialBody;
use crate::dynamics::guidance::TargetState;
use crate::io::ConfigRepr;
use crate::linalg::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the launch crosses the target plane going north or going south.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchDirection {
    #[default]
    North,
    South,
}

/// Target orbit of an ascent, as planned by the mission designer.
///
/// Altitudes are above the equatorial radius of the central body.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub periapsis_km: f64,
    pub apoapsis_km: f64,
    /// Insertion altitude, defaults to the periapsis
    #[serde(default)]
    pub altitude_km: Option<f64>,
    pub inclination_deg: f64,
    /// Longitude of the ascending node
    pub lan_deg: f64,
    #[serde(default)]
    pub direction: LaunchDirection,
}

impl Mission {
    /// Initializes a mission inserting at periapsis, launching north.
    pub fn new(periapsis_km: f64, apoapsis_km: f64, inclination_deg: f64, lan_deg: f64) -> Self {
        Self {
            periapsis_km,
            apoapsis_km,
            altitude_km: None,
            inclination_deg,
            lan_deg,
            direction: LaunchDirection::North,
        }
    }

    /// Returns a copy of this mission with an insertion altitude within [periapsis; apoapsis]
    /// (the periapsis otherwise), an inclination within (-180; 180) and a node within (0; 360] degrees.
    pub fn normalized(&self) -> Self {
        let altitude_km = match self.altitude_km {
            Some(alt) if alt >= self.periapsis_km && alt <= self.apoapsis_km => alt,
            _ => self.periapsis_km,
        };

        let mut inclination_deg = self.inclination_deg % 360.0;
        if inclination_deg <= -180.0 {
            inclination_deg += 360.0;
        } else if inclination_deg >= 180.0 {
            inclination_deg -= 360.0;
        }

        let mut lan_deg = self.lan_deg % 360.0;
        if lan_deg <= 0.0 {
            lan_deg += 360.0;
        }

        Self {
            altitude_km: Some(altitude_km),
            inclination_deg,
            lan_deg,
            ..*self
        }
    }

    /// Insertion altitude, in km
    pub fn insertion_altitude_km(&self) -> f64 {
        self.normalized().altitude_km.unwrap_or(self.periapsis_km)
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} x {:.1} km, inc = {:.3} deg, lan = {:.3} deg, insertion at {:.1} km ({:?})",
            self.periapsis_km,
            self.apoapsis_km,
            self.inclination_deg,
            self.lan_deg,
            self.insertion_altitude_km(),
            self.direction
        )
    }
}

impl ConfigRepr for Mission {}

/// Returns the unit normal of the target plane, opposite to the angular momentum of an orbit of
/// the provided inclination and longitude of the ascending node.
pub fn target_normal(inclination_deg: f64, lan_deg: f64) -> Vector3<f64> {
    let (sin_i, cos_i) = inclination_deg.to_radians().sin_cos();
    let (sin_lan, cos_lan) = lan_deg.to_radians().sin_cos();
    -Vector3::new(sin_i * sin_lan, -sin_i * cos_lan, cos_i)
}

impl TargetState {
    /// Builds the insertion target of the provided mission about `body`.
    ///
    /// The speed follows from the vis-viva equation and the flight path angle from the conservation
    /// of angular momentum between the periapsis and the insertion point.
    pub fn from_mission(mission: &Mission, body: &CelestialBody) -> Self {
        let mission = mission.normalized();
        let pe_m = mission.periapsis_km * 1e3 + body.equatorial_radius_m;
        let ap_m = mission.apoapsis_km * 1e3 + body.equatorial_radius_m;
        let radius_m = mission.insertion_altitude_km() * 1e3 + body.equatorial_radius_m;
        let sma_m = 0.5 * (pe_m + ap_m);

        let vpe_m_s = (body.mu_m3_s2 * (2.0 / pe_m - 1.0 / sma_m)).sqrt();
        let velocity_m_s = (body.mu_m3_s2 * (2.0 / radius_m - 1.0 / sma_m)).sqrt();
        let cos_fpa = (pe_m * vpe_m_s / (velocity_m_s * radius_m)).clamp(-1.0, 1.0);

        Self {
            flight_path_angle_deg: cos_fpa.acos().to_degrees(),
            normal: target_normal(mission.inclination_deg, mission.lan_deg),
            radius_m,
            velocity_m_s,
        }
    }
}

/// Returns the launch azimuth from the site latitude, in degrees from north.
///
/// The inertial azimuth which reaches the target inclination is corrected for the rotation speed of
/// the surface. When the site latitude exceeds the inclination, the launch is due east (inertially).
pub fn launch_azimuth_deg(
    mission: &Mission,
    target: &TargetState,
    latitude_deg: f64,
    body: &CelestialBody,
) -> f64 {
    let mission = mission.normalized();
    let b_inertial = (mission.inclination_deg.to_radians().cos() / latitude_deg.to_radians().cos())
        .clamp(-1.0, 1.0)
        .asin();

    let v_orbit = target.velocity_m_s * target.flight_path_angle_deg.to_radians().cos();
    let v_body = body.surface_speed_m_s(latitude_deg);
    let v_rot_x = v_orbit * b_inertial.sin() - v_body;
    let v_rot_y = v_orbit * b_inertial.cos();
    let azimuth_deg = v_rot_y.atan2(v_rot_x).to_degrees();

    match mission.direction {
        LaunchDirection::North => 90.0 - azimuth_deg,
        LaunchDirection::South => 90.0 + azimuth_deg,
    }
}
