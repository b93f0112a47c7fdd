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

use super::CserOptions;
use crate::errors::{DegenerateVectorSnafu, GuidanceError, NonConvergenceSnafu};
use crate::linalg::Vector3;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// Below this |z|, the Stumpff functions are evaluated with their Taylor series
pub const STUMPFF_SERIES_BAND: f64 = 1e-4;

/// Above this value of |x|·sqrt(-α), the linear starting guess is replaced by the asymptotic one
pub const HYPERBOLIC_GUESS_LIMIT: f64 = 50.0;

/// Result of a conic state extrapolation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConicSolution {
    /// Propagated inertial position, in meters
    pub radius_m: Vector3<f64>,
    /// Propagated inertial velocity, in m/s
    pub velocity_m_s: Vector3<f64>,
    /// Converged dimensionless universal anomaly, reusable as the seed of the next call
    pub anomaly: f64,
    /// Number of Newton-Raphson iterations needed
    pub iterations: usize,
}

impl ConicSolution {
    /// Returns the anomaly as a warm start seed, or None if this solution carries no information.
    pub fn seed(&self) -> Option<f64> {
        if self.anomaly != 0.0 && self.anomaly.is_finite() {
            Some(self.anomaly)
        } else {
            None
        }
    }
}

impl fmt::Display for ConicSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "|r| = {:.3} km\t|v| = {:.3} m/s\tx = {:.9} ({} iterations)",
            self.radius_m.norm() * 1e-3,
            self.velocity_m_s.norm(),
            self.anomaly,
            self.iterations
        )
    }
}

/// Returns the Stumpff-like functions (S(z), C(z)) of the universal variable formulation.
///
/// Three branches: Taylor series for |z| < 1e-4, trigonometric for the elliptical regime (z > 0) and
/// hyperbolic for z < 0.
pub fn stumpff(z: f64) -> (f64, f64) {
    if z.abs() < STUMPFF_SERIES_BAND {
        stumpff_series(z)
    } else if z > 0.0 {
        stumpff_elliptic(z)
    } else {
        stumpff_hyperbolic(z)
    }
}

fn stumpff_series(z: f64) -> (f64, f64) {
    (
        (1.0 - z * (0.05 - z / 840.0)) / 6.0,
        0.5 - z * (1.0 - z / 30.0) / 24.0,
    )
}

fn stumpff_elliptic(z: f64) -> (f64, f64) {
    let sqrt_z = z.sqrt();
    let (sin_z, cos_z) = sqrt_z.sin_cos();
    ((sqrt_z - sin_z) / (sqrt_z * z), (1.0 - cos_z) / z)
}

fn stumpff_hyperbolic(z: f64) -> (f64, f64) {
    let az = -z;
    let sqrt_z = az.sqrt();
    (
        (sqrt_z.sinh() - sqrt_z) / (sqrt_z * az),
        (sqrt_z.cosh() - 1.0) / az,
    )
}

/// Starting guess of the universal anomaly, in units where |r0| = mu = 1.
///
/// `dt·|α|` unless the arc is hyperbolic and long enough for that guess to overflow the hyperbolic
/// functions, in which case the logarithmic asymptote of the hyperbola is used.
fn cold_start(dts: f64, alpha: f64, rvr0s: f64) -> f64 {
    let linear = dts * alpha.abs();
    if alpha >= 0.0 || linear.abs() * (-alpha).sqrt() < HYPERBOLIC_GUESS_LIMIT {
        return linear;
    }
    let sma_root = (-1.0 / alpha).sqrt();
    let sign = dts.signum();
    let log_arg = -2.0 * alpha * dts / (rvr0s + sign * sma_root * (1.0 - alpha));
    let guess = sign * sma_root * log_arg.ln();
    if guess.is_finite() {
        guess
    } else {
        linear
    }
}

/// Propagates a two-body state by `dt_s` seconds with the default root-finder options.
///
/// See `propagate_with` for details.
pub fn propagate(
    r0: Vector3<f64>,
    v0: Vector3<f64>,
    dt_s: f64,
    mu_m3_s2: f64,
    seed: Option<f64>,
) -> Result<ConicSolution, GuidanceError> {
    propagate_with(r0, v0, dt_s, mu_m3_s2, seed, &CserOptions::default())
}

/// Conic State Extrapolation Routine: propagates position `r0` and velocity `v0` by `dt_s` seconds
/// (possibly negative) under pure two-body motion about a body of gravitational parameter `mu_m3_s2`.
///
/// The problem is nondimensionalized with |r0| as the length scale and the circular speed at |r0|
/// as the speed scale, and the universal Kepler equation is solved for the universal anomaly by
/// Newton-Raphson, from `seed` if provided or from `dt·|α|` otherwise (a logarithmic guess on long
/// hyperbolic arcs). This is valid for any conic.
pub fn propagate_with(
    r0: Vector3<f64>,
    v0: Vector3<f64>,
    dt_s: f64,
    mu_m3_s2: f64,
    seed: Option<f64>,
    opts: &CserOptions,
) -> Result<ConicSolution, GuidanceError> {
    let r_scale = r0.norm();
    ensure!(
        r_scale.is_finite() && r_scale > 0.0,
        DegenerateVectorSnafu {
            action: "initial position of conic extrapolation",
            norm: r_scale
        }
    );

    if dt_s == 0.0 {
        return Ok(ConicSolution {
            radius_m: r0,
            velocity_m_s: v0,
            anomaly: 0.0,
            iterations: 0,
        });
    }

    let v_scale = (mu_m3_s2 / r_scale).sqrt();
    let r0s = r0 / r_scale;
    let v0s = v0 / v_scale;
    let dts = dt_s * v_scale / r_scale;
    let v2s = v0.norm_squared() * r_scale / mu_m3_s2;
    // Inverse of the semi-major axis, in units of 1/|r0|
    let alpha = 2.0 - v2s;
    let armd1 = v2s - 1.0;
    let rvr0s = r0.dot(&v0) / (mu_m3_s2 * r_scale).sqrt();

    let mut x = match seed {
        Some(x0) if x0 != 0.0 && x0.is_finite() => x0,
        _ => cold_start(dts, alpha, rvr0s),
    };

    let mut iterations = 0;
    loop {
        let x2 = x * x;
        let z = alpha * x2;
        let (s_z, c_z) = stumpff(z);
        let x2_cz = x2 * c_z;

        let f = x + rvr0s * x2_cz + armd1 * x * x2 * s_z - dts;
        // Derivative of the universal Kepler equation is the dimensionless radius
        let df = x * rvr0s * (1.0 - z * s_z) + armd1 * x2_cz + 1.0;
        let ratio = f / df;
        iterations += 1;

        ensure!(
            ratio.is_finite(),
            NonConvergenceSnafu {
                iterations,
                last_step: ratio
            }
        );

        x -= ratio;

        if ratio.abs() <= opts.tolerance {
            break;
        } else if iterations >= opts.max_iterations {
            warn!(
                "CSER failed to converge after {iterations} iterations: dt = {dt_s} s, step = {ratio:e}"
            );
            return NonConvergenceSnafu {
                iterations,
                last_step: ratio,
            }
            .fail();
        }
    }

    trace!("CSER converged in {iterations} iterations: x = {x}");

    let x2 = x * x;
    let z = alpha * x2;
    let (s_z, c_z) = stumpff(z);
    let x2_cz = x2 * c_z;

    // Lagrange coefficients
    let lf = 1.0 - x2_cz;
    let lg = dts - x2 * x * s_z;
    let r1 = r0s * lf + v0s * lg;
    let ir1 = 1.0 / r1.norm();
    let lf_dot = ir1 * x * (z * s_z - 1.0);
    let lg_dot = 1.0 - x2_cz * ir1;
    let v1 = r0s * lf_dot + v0s * lg_dot;

    Ok(ConicSolution {
        radius_m: r1 * r_scale,
        velocity_m_s: v1 * v_scale,
        anomaly: x,
        iterations,
    })
}
