use approx::assert_abs_diff_eq;
use rstest::*;
use std::path::PathBuf;
use upfg::dynamics::propulsion::{ThrustMode, Vehicle};
use upfg::io::ConfigRepr;
use upfg::linalg::Vector3;
use upfg::md::{launch_azimuth_deg, target_normal, LaunchDirection, Mission};
use upfg::{GuidanceMemory, GuidanceSettings, TargetState, Upfg, VehicleState, EARTH};

use crate::{init_logger, test_upper_stage};

#[fixture]
fn data_dir() -> PathBuf {
    PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or(".".to_string())).join("data")
}

#[rstest]
fn load_configurations(data_dir: PathBuf) {
    init_logger();
    let mission = Mission::load(data_dir.join("mission.yaml")).unwrap();
    assert_eq!(mission.altitude_km, Some(250.0));
    assert_eq!(mission.direction, LaunchDirection::North);

    let vehicle = Vehicle::load(data_dir.join("vehicle.yaml")).unwrap();
    vehicle.validate().unwrap();
    assert_eq!(vehicle.stages[1].mode, ThrustMode::ConstantAcceleration);
    assert_eq!(vehicle.stages[1].min_throttle_fraction(), 0.4);

    let settings = GuidanceSettings::load(data_dir.join("settings.yaml")).unwrap();
    assert_eq!(settings, GuidanceSettings::default());

    assert!(Mission::load(data_dir.join("does_not_exist.yaml")).is_err());
}

#[rstest]
fn inclined_insertion(data_dir: PathBuf) {
    init_logger();
    let mission = Mission::load(data_dir.join("mission.yaml")).unwrap();
    let target = TargetState::from_mission(&mission, &EARTH);
    println!("[inclined_insertion] {target}");
    assert_abs_diff_eq!(target.radius_m, EARTH.equatorial_radius_m + 250e3, epsilon = 1e-6);
    assert!(target.flight_path_angle_deg > 0.0 && target.flight_path_angle_deg < 1.0);
    assert!((target.normal - target_normal(51.6, 0.0)).norm() < 1e-15);

    // Ascending node on +X: the orbit plane contains X and the heading there is 51.6 deg north of east
    let prograde = -target.normal.cross(&Vector3::x());
    assert_abs_diff_eq!(prograde.z.atan2(prograde.y).to_degrees(), 51.6, epsilon = 1e-9);

    let state = VehicleState::new(
        0.0,
        20_000.0,
        Vector3::new(EARTH.equatorial_radius_m + 185e3, 0.0, 0.0),
        prograde * 5_000.0 + Vector3::new(100.0, 0.0, 0.0),
    );
    let upfg = Upfg::default();
    let memory = GuidanceMemory::initialize(&target, &state, upfg.settings.mu_m3_s2).unwrap();
    let (output, next) = upfg
        .converge(&[test_upper_stage()], &target, &state, &memory, 50)
        .unwrap();
    println!("[inclined_insertion] {output}");
    // In plane guidance: the heading is the orbit's
    assert_abs_diff_eq!(output.yaw_deg, 51.6, epsilon = 1e-6);
    assert!(next.rd_m.dot(&target.normal).abs() < 1e-6);
}

#[test]
fn launch_site_azimuth() {
    let mission = Mission::new(200.0, 200.0, 51.6, 0.0);
    let target = TargetState::from_mission(&mission, &EARTH);
    // From 28.5 deg north: the inertial azimuth is about 45 deg, surface rotation lowers it
    let az = launch_azimuth_deg(&mission, &target, 28.5, &EARTH);
    println!("[launch_site_azimuth] {az:.3} deg");
    assert!(az > 40.0 && az < 45.0);

    // A site above the target inclination launches due east inertially
    let az = launch_azimuth_deg(&mission, &target, 60.0, &EARTH);
    assert_abs_diff_eq!(az, 90.0, epsilon = 1e-9);
}
