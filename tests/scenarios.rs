use std::f64::consts::FRAC_1_SQRT_2;
use std::ops::ControlFlow;

use anyhow::Result;
use bloch_sim::{
    assert_approx_eq, assert_state_eq, CircuitEngine, CircuitStatus, Config, EngineState, Gate,
    MeasurementSampler, Outcome, Preset, QubitState, Session,
};

fn session(seed: u64) -> Session {
    Session::from_config(&Config {
        seed: Some(seed),
        ..Config::default()
    })
}

#[test]
fn test_hadamard_creates_even_superposition() {
    let mut session = session(1);
    session.apply_gate(Gate::H);

    let state = session.state();
    assert_approx_eq!(0.7071, state.alpha(), 1e-4);
    assert_approx_eq!(0.7071, state.beta(), 1e-4);

    let snapshot = session.snapshot();
    assert_approx_eq!(50.0, 100.0 * snapshot.prob0, 1e-6);
    assert_approx_eq!(50.0, 100.0 * snapshot.prob1, 1e-6);
}

#[test]
fn test_h_then_x_differs_from_x_then_h() {
    let mut hx = QubitState::zero_state();
    hx.apply(Gate::H);
    hx.apply(Gate::X);
    assert_approx_eq!(FRAC_1_SQRT_2, hx.alpha());
    assert_approx_eq!(FRAC_1_SQRT_2, hx.beta());

    let mut xh = QubitState::zero_state();
    xh.apply(Gate::X);
    xh.apply(Gate::H);
    assert_approx_eq!(FRAC_1_SQRT_2, xh.alpha());
    assert_approx_eq!(-FRAC_1_SQRT_2, xh.beta());
}

#[test]
fn test_circuit_h_h_returns_to_zero() {
    let mut session = session(2);
    session.set_preset(Preset::One);
    session.append(Gate::H);
    session.append(Gate::H);

    let status = session.play_all(|_| ControlFlow::Continue(()));

    assert_eq!(CircuitStatus::Completed { steps: 2 }, status);
    assert_state_eq!(QubitState::zero_state(), *session.state());
}

#[test]
fn test_step_once_wraps_on_third_call() {
    let mut engine = CircuitEngine::from_gates([Gate::X, Gate::H]);
    let mut qstate = QubitState::zero_state();

    engine.step_once(&mut qstate);
    engine.step_once(&mut qstate);
    assert_eq!(2, engine.cursor());
    assert_eq!(EngineState::Idle, engine.state());

    let status = engine.step_once(&mut qstate);
    assert_eq!(
        CircuitStatus::Stepped {
            index: 0,
            restarted: true,
            at_end: false
        },
        status
    );
    assert_state_eq!(QubitState::one_state(), qstate);
}

#[test]
fn test_abort_mid_playback() {
    let mut session = session(3);
    for gate in [Gate::H, Gate::S, Gate::H, Gate::X] {
        session.append(gate);
    }

    let mut after_second = None;
    let status = session.play_all(|event| {
        if event.index == 1 {
            after_second = Some(event.state);
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    assert_eq!(CircuitStatus::Aborted { completed: 2 }, status);
    assert_eq!(EngineState::Idle, session.circuit().state());
    assert_eq!(after_second, Some(*session.state()));
    assert_approx_eq!(90.0, session.state().phi());
}

#[test]
fn test_empty_circuit_reports_without_touching_state() {
    let mut session = session(4);
    session.set_preset(Preset::Plus);
    let before = *session.state();

    assert_eq!(CircuitStatus::NothingToRun, session.start_playback());
    assert_eq!(CircuitStatus::NothingToRun, session.step_once());
    assert_eq!(before, *session.state());
    assert_eq!(Some("Circuit is empty!".to_string()), session.snapshot().status);
}

#[test]
fn test_batch_converges_at_fixed_seed() {
    let mut sampler = MeasurementSampler::seeded(10_000);
    let state = QubitState::from_spherical(90.0, 0.0);

    let n = 10_000;
    let counts = sampler.measure_batch(&state, n);
    assert!((counts.count0 as f64 / n as f64 - 0.5).abs() < 0.1);

    let stats = sampler.statistics();
    assert_eq!(n, stats.total);
    assert!(stats.deviation.is_some_and(|d| d < 0.1));
}

#[test]
fn test_biased_batch_tracks_born_rule() {
    let mut sampler = MeasurementSampler::seeded(77);
    // P(0) = cos²(30°) = 0.75
    let state = QubitState::from_spherical(60.0, 0.0);

    let counts = sampler.measure_batch(&state, 20_000);
    assert!((counts.zero_rate() - 0.75).abs() < 0.02);
}

#[test]
fn test_measurement_collapse_is_irreversible() {
    let mut session = session(5);
    session.set_preset(Preset::Plus);

    let first = session.measure_once();
    let collapsed = *session.state();
    assert_eq!(first.outcome.basis_state(), collapsed);

    for _ in 0..50 {
        assert_eq!(first.outcome, session.measure_once().outcome);
    }
    let last = session.snapshot().last_measurement;
    assert!(last.is_some_and(|record| record.outcome == first.outcome));
    assert_eq!(51, session.snapshot().statistics.total);
}

#[test]
fn test_basis_measurements() {
    let mut session = session(6);
    for _ in 0..20 {
        session.set_preset(Preset::Zero);
        let measurement = session.measure_once();
        assert_eq!(Outcome::Zero, measurement.outcome);
        assert_approx_eq!(1.0, measurement.probability);

        session.set_preset(Preset::One);
        assert_eq!(Outcome::One, session.measure_once().outcome);
    }
}

#[test]
fn test_session_from_config_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("bloch-sim-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "radius": 100.0, "center_x": 0.0, "center_y": 0.0 }"#)?;

    let config = Config::from_path(&path)?;
    std::fs::remove_file(&path)?;

    let mut session = Session::from_config(&config);
    session.set_spherical(180.0, 0.0);
    let snapshot = session.snapshot();
    assert_approx_eq!(0.0, snapshot.screen.x, 1e-9);
    assert_approx_eq!(100.0, snapshot.screen.y, 1e-9);
    Ok(())
}
