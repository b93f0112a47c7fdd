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

use crate::errors::{DegenerateVectorSnafu, GuidanceError};
use crate::linalg::Vector3;
use snafu::ensure;

/// Returns the unit vector of `v`.
///
/// Fails with `DegenerateVector` if the norm is zero, NaN or infinite: no default direction is ever substituted.
pub fn unit(v: &Vector3<f64>) -> Result<Vector3<f64>, GuidanceError> {
    unit_of(v, "vector")
}

/// Same as `unit` but names what was being normalized in the error.
pub(crate) fn unit_of(v: &Vector3<f64>, action: &'static str) -> Result<Vector3<f64>, GuidanceError> {
    let norm = v.norm();
    ensure!(
        norm.is_finite() && norm > 0.0,
        DegenerateVectorSnafu { action, norm }
    );
    Ok(v / norm)
}

/// Returns the angle between two vectors, in radians.
///
/// Identical vectors return exactly zero. Otherwise this is the arc cosine of the dot product of
/// the unit vectors, clamped to [-1; 1] to absorb round-off.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> Result<f64, GuidanceError> {
    if a == b {
        return Ok(0.0);
    }
    let cos_angle = unit_of(a, "first vector of angle")?.dot(&unit_of(b, "second vector of angle")?);
    Ok(cos_angle.clamp(-1.0, 1.0).acos())
}

/// Projects `v` onto the plane orthogonal to `normal`.
pub fn project_on_plane(
    v: &Vector3<f64>,
    normal: &Vector3<f64>,
) -> Result<Vector3<f64>, GuidanceError> {
    let n_hat = unit_of(normal, "plane normal")?;
    Ok(v - n_hat * v.dot(&n_hat))
}

/// Rotates `v` about `axis` by `angle_rad` (right hand rule), using the Rodrigues formula.
pub fn rodrigues(
    v: &Vector3<f64>,
    axis: &Vector3<f64>,
    angle_rad: f64,
) -> Result<Vector3<f64>, GuidanceError> {
    let k = unit_of(axis, "rotation axis")?;
    let (sin_a, cos_a) = angle_rad.sin_cos();
    Ok(v * cos_a + k.cross(v) * sin_a + k * k.dot(v) * (1.0 - cos_a))
}
