use std::ops::ControlFlow;

use log::debug;
use nalgebra::{Point2, Vector3};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::bloch::BlochProjector;
use crate::circuit::{CircuitEngine, CircuitStatus, EngineState, GateStep, StepEvent, Template};
use crate::config::Config;
use crate::gates::Gate;
use crate::measurement::{BatchCounts, Measurement, MeasurementRecord, MeasurementSampler, Statistics};
use crate::qstate::{Preset, QubitState};
use crate::transition::Transition;

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub alpha: f64,
    pub beta: f64,
    pub theta: f64,
    pub phi: f64,
    pub prob0: f64,
    pub prob1: f64,
    pub equation: String,
    pub bloch: Vector3<f64>,
    pub screen: Point2<f64>,
    pub last_measurement: Option<MeasurementRecord>,
    pub statistics: Statistics,
    pub steps: Vec<GateStep>,
    pub cursor: usize,
    pub engine: EngineState,
    pub status: Option<String>,
}

/// One lesson's simulator: a qubit, its circuit and its measurement log.
pub struct Session<R = StdRng> {
    qstate: QubitState,
    circuit: CircuitEngine,
    sampler: MeasurementSampler<R>,
    projector: BlochProjector,
    transition_frames: usize,
    status: Option<CircuitStatus>,
}

impl Session<StdRng> {
    pub fn from_config(config: &Config) -> Self {
        let mut session = Session::new(
            config.projector(),
            MeasurementSampler::from_seed_option(config.seed),
        );
        session.transition_frames = config.transition_frames;
        session
    }
}

impl Default for Session<StdRng> {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl<R: Rng> Session<R> {
    pub fn new(projector: BlochProjector, sampler: MeasurementSampler<R>) -> Self {
        Self {
            qstate: QubitState::zero_state(),
            circuit: CircuitEngine::new(),
            sampler,
            projector,
            transition_frames: crate::transition::DEFAULT_FRAMES,
            status: None,
        }
    }

    pub fn state(&self) -> &QubitState {
        &self.qstate
    }

    pub fn circuit(&self) -> &CircuitEngine {
        &self.circuit
    }

    pub fn sampler(&self) -> &MeasurementSampler<R> {
        &self.sampler
    }

    pub fn projector(&self) -> &BlochProjector {
        &self.projector
    }

    pub fn status(&self) -> Option<CircuitStatus> {
        self.status
    }

    /// Applies `gate` and returns the animation the renderer should play.
    pub fn apply_gate(&mut self, gate: Gate) -> Transition {
        let transition = Transition::for_gate(&self.qstate, gate, self.transition_frames);
        self.qstate = *transition.target();
        transition
    }

    pub fn set_preset(&mut self, preset: Preset) {
        self.qstate.set_preset(preset);
    }

    pub fn set_spherical(&mut self, theta: f64, phi: f64) {
        self.qstate.set_spherical(theta, phi);
    }

    pub fn set_custom(&mut self, alpha: f64, phi: f64) {
        self.qstate.set_custom(alpha, phi);
    }

    /// Aborts any playback and returns the qubit to |0>.
    pub fn reset(&mut self) {
        if self.circuit.abort() {
            self.status = Some(CircuitStatus::Aborted {
                completed: self.circuit.cursor(),
            });
        }
        self.qstate.reset();
    }

    pub fn measure_once(&mut self) -> Measurement {
        self.sampler.measure_once(&mut self.qstate)
    }

    pub fn measure_batch(&mut self, n: usize) -> BatchCounts {
        self.sampler.measure_batch(&self.qstate, n)
    }

    pub fn clear_statistics(&mut self) {
        self.sampler.clear_statistics();
    }

    pub fn append(&mut self, gate: Gate) -> usize {
        self.circuit.append(gate)
    }

    pub fn remove(&mut self, index: usize) -> Option<GateStep> {
        self.circuit.remove(index)
    }

    pub fn clear_circuit(&mut self) {
        self.circuit.clear();
        self.status = None;
    }

    pub fn load_template(&mut self, template: Template) {
        self.circuit.load_template(template, self.sampler.rng_mut());
    }

    pub fn play_all<F>(&mut self, observer: F) -> CircuitStatus
    where
        F: FnMut(&StepEvent) -> ControlFlow<()>,
    {
        let status = self.circuit.play_all(&mut self.qstate, observer);
        self.status = Some(status);
        status
    }

    pub fn start_playback(&mut self) -> CircuitStatus {
        let status = self.circuit.start_playback(&mut self.qstate);
        self.status = Some(status);
        status
    }

    /// Advances a running playback by one step, for frame-driven callers.
    pub fn tick(&mut self) -> Option<StepEvent> {
        let event = self.circuit.tick(&mut self.qstate);
        if event.is_some() && self.circuit.state() == EngineState::Idle {
            self.status = Some(CircuitStatus::Completed {
                steps: self.circuit.len(),
            });
        }
        event
    }

    pub fn step_once(&mut self) -> CircuitStatus {
        let status = self.circuit.step_once(&mut self.qstate);
        self.status = Some(status);
        status
    }

    pub fn snapshot(&self) -> Snapshot {
        let (prob0, prob1) = self.qstate.probabilities();
        let projection = self.projector.project_state(&self.qstate);
        Snapshot {
            alpha: self.qstate.alpha(),
            beta: self.qstate.beta(),
            theta: self.qstate.theta(),
            phi: self.qstate.phi(),
            prob0,
            prob1,
            equation: self.qstate.to_string(),
            bloch: projection.vector,
            screen: projection.screen,
            last_measurement: self.sampler.last_record().copied(),
            statistics: self.sampler.statistics(),
            steps: self.circuit.steps().to_vec(),
            cursor: self.circuit.cursor(),
            engine: self.circuit.state(),
            status: self.status.map(|status| status.to_string()),
        }
    }

    /// Hands the current snapshot to a render callback.
    pub fn render<F, T>(&self, render: F) -> T
    where
        F: FnOnce(&Snapshot) -> T,
    {
        let snapshot = self.snapshot();
        debug!("rendering {}", snapshot.equation);
        render(&snapshot)
    }
}
