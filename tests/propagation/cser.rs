extern crate rand;
extern crate rand_pcg;

use approx::assert_abs_diff_eq;
use rand::Rng;
use rand_pcg::Pcg64Mcg;
use rstest::*;
use std::f64::consts::TAU;
use upfg::cosmic::EARTH_GM_M3_S2;
use upfg::linalg::Vector3;
use upfg::propagators::{propagate, propagate_with, CserHistory, CserOptions};
use upfg::GuidanceError;

use crate::init_logger;

#[fixture]
fn mu() -> f64 {
    EARTH_GM_M3_S2
}

#[rstest]
fn circular_orbit_period(mu: f64) {
    init_logger();
    for r in [6_778_137.0_f64, 26_560e3, 42_164e3] {
        let r0 = Vector3::new(r, 0.0, 0.0);
        let v0 = Vector3::new(0.0, (mu / r).sqrt(), 0.0);
        let period = TAU * (r.powi(3) / mu).sqrt();

        let sol = propagate(r0, v0, period, mu, None).unwrap();
        println!("[circular_orbit_period] {sol}");
        assert_abs_diff_eq!((sol.radius_m - r0).norm(), 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!((sol.velocity_m_s - v0).norm(), 0.0, epsilon = 1e-6);

        // Half a period later, on the other side
        let sol = propagate(r0, v0, 0.5 * period, mu, None).unwrap();
        assert_abs_diff_eq!((sol.radius_m + r0).norm(), 0.0, epsilon = 1e-3);
    }
}

#[rstest]
fn elliptical_orbit_period(mu: f64) {
    init_logger();
    let r0: Vector3<f64> = Vector3::new(7_000e3, 0.0, 0.0);
    let v0: Vector3<f64> = Vector3::new(300.0, 8_000.0, 500.0);
    let sma = 1.0 / (2.0 / r0.norm() - v0.norm_squared() / mu);
    let period = TAU * (sma.powi(3) / mu).sqrt();

    let sol = propagate(r0, v0, period, mu, None).unwrap();
    assert_abs_diff_eq!((sol.radius_m - r0).norm(), 0.0, epsilon = 1e-2);
    assert_abs_diff_eq!((sol.velocity_m_s - v0).norm(), 0.0, epsilon = 1e-5);

    // Energy and angular momentum are conserved mid-arc
    let sol = propagate(r0, v0, 0.37 * period, mu, None).unwrap();
    let energy = |r: &Vector3<f64>, v: &Vector3<f64>| 0.5 * v.norm_squared() - mu / r.norm();
    assert_abs_diff_eq!(
        energy(&sol.radius_m, &sol.velocity_m_s),
        energy(&r0, &v0),
        epsilon = 1e-4
    );
    let h0 = r0.cross(&v0);
    let h1 = sol.radius_m.cross(&sol.velocity_m_s);
    assert!((h1 - h0).norm() / h0.norm() < 1e-10);
}

#[rstest]
fn time_reversal_round_trip(mu: f64) {
    init_logger();
    let mut rng = Pcg64Mcg::new(0x2545_f491_4f6c_dd1d);

    for _ in 0..200 {
        let r: f64 = rng.gen_range(6_600e3..45_000e3);
        let theta: f64 = rng.gen_range(0.0..TAU);
        let dec = rng.gen_range(-1.2..1.2_f64);
        let r0 = Vector3::new(
            r * dec.cos() * theta.cos(),
            r * dec.cos() * theta.sin(),
            r * dec.sin(),
        );
        // Elliptical to hyperbolic, in a random direction off the radius
        let speed = (mu / r).sqrt() * rng.gen_range(0.6..1.8);
        let dir: Vector3<f64> = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let tangent = (dir - r0 * (dir.dot(&r0) / r0.norm_squared())).normalize();
        let flight_path = rng.gen_range(-0.3..0.3_f64);
        let v0 = (tangent * flight_path.cos() + r0.normalize() * flight_path.sin()) * speed;
        let dt: f64 = rng.gen_range(-1_500.0..1_500.0);

        let fwd = propagate(r0, v0, dt, mu, None).unwrap();
        let back = propagate(fwd.radius_m, fwd.velocity_m_s, -dt, mu, None).unwrap();

        let r_err = (back.radius_m - r0).norm() / r0.norm();
        let v_err = (back.velocity_m_s - v0).norm() / v0.norm();
        assert!(
            r_err < 1e-8 && v_err < 1e-8,
            "round trip of {dt:.3} s failed: r error {r_err:e}, v error {v_err:e}"
        );
    }
}

#[rstest]
fn hyperbolic_escape(mu: f64) {
    init_logger();
    let r0: Vector3<f64> = Vector3::new(7_000e3, 0.0, 0.0);
    let v_escape = (2.0 * mu / r0.norm()).sqrt();
    let v0 = Vector3::new(0.0, 1.2 * v_escape, 0.0);
    let sol = propagate(r0, v0, 3_600.0, mu, None).unwrap();
    assert!(sol.anomaly > 0.0);
    assert!(sol.radius_m.norm() > 3.0 * r0.norm());
    let energy = 0.5 * sol.velocity_m_s.norm_squared() - mu / sol.radius_m.norm();
    let energy0 = 0.5 * v0.norm_squared() - mu / r0.norm();
    assert_abs_diff_eq!(energy, energy0, epsilon = 1e-3);
}

#[rstest]
fn long_hyperbolic_arc(mu: f64) {
    init_logger();
    // Over eleven days on a fast departure: the linear starting guess would overflow
    let r0: Vector3<f64> = Vector3::new(7_000e3, 0.0, 0.0);
    let v0: Vector3<f64> = Vector3::new(0.0, 20e3, 0.0);
    let dt = 1e6;
    let sol = propagate(r0, v0, dt, mu, None).unwrap();
    println!("[long_hyperbolic_arc] {sol}");
    assert!(sol.anomaly > 0.0);

    // Asymptotic coast at the hyperbolic excess speed
    let v_inf = (v0.norm_squared() - 2.0 * mu / r0.norm()).sqrt();
    let r = sol.radius_m.norm();
    assert!(r > 0.9 * v_inf * dt && r < 1.1 * v_inf * dt);

    let energy = |r: &Vector3<f64>, v: &Vector3<f64>| 0.5 * v.norm_squared() - mu / r.norm();
    let energy0 = energy(&r0, &v0);
    assert!((energy(&sol.radius_m, &sol.velocity_m_s) - energy0).abs() / energy0 < 1e-6);
    let h0 = r0.cross(&v0);
    let h1 = sol.radius_m.cross(&sol.velocity_m_s);
    assert!((h1 - h0).norm() / h0.norm() < 1e-6);
}

#[rstest]
fn warm_start(mu: f64) {
    init_logger();
    let r0 = Vector3::new(6_700e3, 100e3, 0.0);
    let v0 = Vector3::new(50.0, 7_600.0, 100.0);

    let cold = propagate(r0, v0, 600.0, mu, None).unwrap();
    let warm = propagate(r0, v0, 600.0, mu, cold.seed()).unwrap();
    assert!(warm.iterations <= cold.iterations);
    assert!((warm.radius_m - cold.radius_m).norm() < 1e-6);
    assert!((warm.anomaly - cold.anomaly).abs() < 1e-8);

    // A zero seed carries no information and is ignored
    let zero = propagate(r0, v0, 600.0, mu, Some(0.0)).unwrap();
    assert_eq!(zero, cold);

    let mut history = CserHistory::with_capacity(4);
    for step in 1..=6 {
        let seed = history.latest().and_then(|sol| sol.seed());
        history.push(propagate(r0, v0, 100.0 * f64::from(step), mu, seed).unwrap());
    }
    assert_eq!(history.len(), 4);
    assert!(history.iter().all(|sol| sol.iterations > 0));
}

#[rstest]
fn tight_options(mu: f64) {
    let opts = CserOptions::builder()
        .tolerance(1e-14)
        .max_iterations(3)
        .build();
    let r0 = Vector3::new(7_000e3, 0.0, 0.0);
    let v0 = Vector3::new(1_000.0, 9_000.0, 0.0);
    match propagate_with(r0, v0, 20_000.0, mu, None, &opts) {
        Err(GuidanceError::NonConvergence { iterations, .. }) => assert_eq!(iterations, 3),
        other => panic!("expected non convergence, got {other:?}"),
    }
}
