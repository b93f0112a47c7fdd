use approx::assert_abs_diff_eq;
use rstest::*;
use upfg::cosmic::STD_GRAVITY;
use upfg::dynamics::guidance::steering::position_to_go;
use upfg::dynamics::guidance::{BurnIntegrals, ConvergenceMonitor, AGREEING_CYCLES};
use upfg::dynamics::propulsion::{Engine, Stage};
use upfg::io::ConfigRepr;
use upfg::linalg::Vector3;
use upfg::utils::angle_between;
use upfg::{
    GuidanceError, GuidanceMemory, GuidanceSettings, TargetState, Upfg, VehicleState, EARTH,
};

use crate::{init_logger, test_target, test_upper_stage, test_vehicle_state};

#[fixture]
fn guidance() -> Upfg {
    Upfg::new(GuidanceSettings::default())
}

#[fixture]
fn target() -> TargetState {
    test_target()
}

#[fixture]
fn state() -> VehicleState {
    test_vehicle_state()
}

#[fixture]
fn memory(target: TargetState, state: VehicleState) -> GuidanceMemory {
    GuidanceMemory::initialize(&target, &state, EARTH.mu_m3_s2).unwrap()
}

#[rstest]
fn guide_is_pure(guidance: Upfg, target: TargetState, state: VehicleState, memory: GuidanceMemory) {
    init_logger();
    let stages = [test_upper_stage()];
    let first = guidance.guide(&stages, &target, &state, &memory).unwrap();
    let second = guidance.guide(&stages, &target, &state, &memory).unwrap();
    assert_eq!(first, second);

    let (output, next) = first;
    println!("[guide_is_pure] {output}\n{next}");
    assert_eq!(output.pitch_rate_deg_s, 0.0);
    assert_eq!(output.yaw_rate_deg_s, 0.0);
    assert!(output.tgo_s > 0.0);
    assert_abs_diff_eq!(output.direction.norm(), 1.0, epsilon = 1e-12);
    assert_eq!(next.tgo_s, output.tgo_s);
    assert_eq!(next.time_s, state.time_s);
    assert_eq!(next.velocity_m_s, state.velocity_m_s);
    assert!(next.cser.is_some());
    // The new desired position is at the target radius, in the target plane
    assert_abs_diff_eq!(next.rd_m.norm(), target.radius_m, epsilon = 1e-6);
    assert_abs_diff_eq!(next.rd_m.z, 0.0, epsilon = 1e-6);
}

#[rstest]
fn equatorial_ascent_has_no_yaw(
    guidance: Upfg,
    target: TargetState,
    state: VehicleState,
    memory: GuidanceMemory,
) {
    init_logger();
    let (output, _) = guidance
        .converge(&[test_upper_stage()], &target, &state, &memory, 50)
        .unwrap();
    assert_abs_diff_eq!(output.yaw_deg, 0.0, epsilon = 1e-5);
    // Climbing, mostly horizontally
    assert!(output.pitch_deg > 45.0 && output.pitch_deg < 90.0);
}

#[rstest]
fn stage_dropping(guidance: Upfg, target: TargetState, memory: GuidanceMemory) {
    init_logger();
    // The first stage alone provides about 1.4 km/s, short of the velocity to go
    let first = Stage::new(vec![Engine::new(400e3, 320.0)], 60_000.0, 22_000.0);
    let stages = [first, test_upper_stage(), test_upper_stage()];
    let state = VehicleState {
        mass_kg: 60_000.0,
        ..test_vehicle_state()
    };
    let integrals = BurnIntegrals::solve(&stages, &state, &memory).unwrap();
    assert_eq!(integrals.stages_used, 2);
    assert!(integrals.delta_v_m_s[0] < integrals.vgo_m_s.norm());

    let three = guidance.guide(&stages, &target, &state, &memory).unwrap();
    let two = guidance.guide(&stages[..2], &target, &state, &memory).unwrap();
    assert_eq!(three, two);
}

#[rstest]
fn steering_without_target_offset(target: TargetState, state: VehicleState, memory: GuidanceMemory) {
    init_logger();
    let stage = test_upper_stage();
    let integrals = BurnIntegrals::solve(&[stage.clone()], &state, &memory).unwrap();
    let lambda = integrals.vgo_m_s.normalize();

    // Bias the position to go exactly onto the nominal thrust profile
    let rgo = position_to_go(&integrals, &target, &state, &memory).unwrap();
    let memory = GuidanceMemory {
        rbias_m: lambda * integrals.s - rgo,
        ..memory
    };

    let (output, _) = Upfg::default()
        .guide(&[stage.clone()], &target, &state, &memory)
        .unwrap();
    assert!(angle_between(&output.direction, &lambda).unwrap() < 1e-7);

    // Closed form burn time of a single constant thrust stage
    let ve = 350.0 * STD_GRAVITY;
    let tau = stage.characteristic_time_s(state.mass_kg);
    let expected = tau * (1.0 - (-integrals.vgo_m_s.norm() / ve).exp());
    assert_abs_diff_eq!(output.tgo_s, expected, epsilon = 1e-9);
    let dv = ve * (tau / (tau - expected)).ln();
    assert_abs_diff_eq!(dv, integrals.vgo_m_s.norm(), epsilon = 1e-6);
}

#[rstest]
fn invalid_stage_is_reported_first(
    guidance: Upfg,
    target: TargetState,
    state: VehicleState,
    memory: GuidanceMemory,
) {
    let mut broken = test_upper_stage();
    broken.prop_mass_kg = broken.total_mass_kg;
    // Even with nothing left to gain
    let memory = GuidanceMemory {
        vgo_m_s: Vector3::zeros(),
        ..memory
    };
    let err = guidance
        .guide(&[test_upper_stage(), broken], &target, &state, &memory)
        .unwrap_err();
    assert!(matches!(err, GuidanceError::InvalidStageSpec { stage: 1, .. }));
}

#[rstest]
fn insufficient_performance(target: TargetState, memory: GuidanceMemory) {
    init_logger();
    // Small kick stage
    let kick = Stage::new(vec![Engine::new(20e3, 300.0)], 2_000.0, 500.0);
    let state = VehicleState {
        mass_kg: 2_000.0,
        ..test_vehicle_state()
    };
    let err = Upfg::default()
        .guide(&[kick], &target, &state, &memory)
        .unwrap_err();
    match err {
        GuidanceError::InsufficientPerformance {
            required_m_s,
            available_m_s,
        } => {
            assert!(required_m_s > available_m_s);
            assert_abs_diff_eq!(
                available_m_s,
                300.0 * STD_GRAVITY * (2_000.0_f64 / 1_500.0).ln(),
                epsilon = 1e-6
            );
        }
        other => panic!("expected insufficient performance, got {other:?}"),
    }
}

#[rstest]
fn preflight_convergence(
    guidance: Upfg,
    target: TargetState,
    state: VehicleState,
    memory: GuidanceMemory,
) {
    init_logger();
    let stages = [test_upper_stage()];
    let (output, converged) = guidance.converge(&stages, &target, &state, &memory, 50).unwrap();
    println!("[preflight_convergence] {output}");

    // Further cycles on the same telemetry keep agreeing with the converged one
    let monitor = ConvergenceMonitor::new(&guidance.settings);
    let (mut previous_output, mut previous) = (output, converged);
    for _ in 0..2 {
        let (next_output, next) = guidance.guide(&stages, &target, &state, &previous).unwrap();
        assert!(monitor.tgo_converged(&previous, &next));
        assert!(monitor
            .cycles_agree(
                (&previous, &previous_output.direction),
                (&next, &next_output.direction)
            )
            .unwrap());
        (previous_output, previous) = (next_output, next);
    }

    // The seeded memory has no time to go and the first cycle has no direction to compare with:
    // a single agreeing cycle is not enough
    for max_cycles in [1, AGREEING_CYCLES] {
        let err = guidance
            .converge(&stages, &target, &state, &memory, max_cycles)
            .unwrap_err();
        assert!(matches!(
            err,
            GuidanceError::NonConvergence { iterations, .. } if iterations == max_cycles
        ));
    }
}

#[test]
fn settings_from_yaml() {
    let settings = GuidanceSettings::loads(
        r#"
mu_m3_s2: 398600441800000.0
cser:
  tolerance: 1.0e-10
convergence_criterion_s: 0.05
"#,
    )
    .unwrap();
    assert_eq!(settings.cser.tolerance, 1e-10);
    assert_eq!(settings.cser.max_iterations, 100);
    assert_eq!(settings.convergence_criterion_s, 0.05);
    assert_eq!(settings.good_solution_criterion_deg, 15.0);
}
