use std::fmt::Display;
use std::ops::ControlFlow;
use std::str::FromStr;

use anyhow::Result;
use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use crate::gates::Gate;
use crate::qstate::QubitState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GateStep {
    pub gate: Gate,
    /// Display name only.
    pub label: String,
}

impl GateStep {
    pub fn new(gate: Gate) -> Self {
        Self {
            gate,
            label: gate.symbol().to_string(),
        }
    }

    pub fn labeled(gate: Gate, label: impl Into<String>) -> Self {
        Self {
            gate,
            label: label.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    Stepping,
}

/// Non-fatal report returned by every playback operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CircuitStatus {
    NothingToRun,
    Started {
        steps: usize,
    },
    Completed {
        steps: usize,
    },
    Aborted {
        completed: usize,
    },
    Stepped {
        index: usize,
        restarted: bool,
        at_end: bool,
    },
}

impl Display for CircuitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitStatus::NothingToRun => write!(f, "Circuit is empty!"),
            CircuitStatus::Started { steps } => write!(f, "Executing circuit of {} gates...", steps),
            CircuitStatus::Completed { .. } => write!(f, "Circuit execution complete!"),
            CircuitStatus::Aborted { completed } => {
                write!(f, "Circuit execution aborted after {} gates", completed)
            }
            CircuitStatus::Stepped { at_end: true, .. } => write!(f, "Reached end of circuit!"),
            CircuitStatus::Stepped { index, .. } => write!(f, "Applied step {}", index + 1),
        }
    }
}

/// Intermediate state handed to playback observers after each step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StepEvent {
    pub index: usize,
    pub gate: Gate,
    pub state: QubitState,
}

/// Ordered list of single-qubit gates with an execution cursor.
#[derive(Clone, Debug, Default)]
pub struct CircuitEngine {
    steps: Vec<GateStep>,
    cursor: usize,
    state: EngineState,
}

impl CircuitEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_gates(gates: impl IntoIterator<Item = Gate>) -> Self {
        let mut engine = Self::new();
        gates.into_iter().for_each(|gate| {
            engine.append(gate);
        });
        engine
    }

    pub fn steps(&self) -> &[GateStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Appends a step and returns its index.
    pub fn append(&mut self, gate: Gate) -> usize {
        self.push(GateStep::new(gate))
    }

    pub fn append_labeled(&mut self, gate: Gate, label: impl Into<String>) -> usize {
        self.push(GateStep::labeled(gate, label))
    }

    fn push(&mut self, step: GateStep) -> usize {
        self.steps.push(step);
        self.steps.len() - 1
    }

    /// Removes the step at `index`, shifting later steps down. The cursor
    /// keeps pointing at the same pending step where possible.
    pub fn remove(&mut self, index: usize) -> Option<GateStep> {
        if index >= self.steps.len() {
            warn!(
                "cannot remove step {}: circuit has {} steps",
                index,
                self.steps.len()
            );
            return None;
        }

        let step = self.steps.remove(index);
        if index < self.cursor {
            self.cursor -= 1;
        }
        self.cursor = self.cursor.min(self.steps.len());
        Some(step)
    }

    /// Empties the circuit. The qubit state is left to the caller.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.cursor = 0;
        self.state = EngineState::Idle;
    }

    pub fn load_template<R: Rng>(&mut self, template: Template, rng: &mut R) {
        self.clear();
        template.gates(rng).into_iter().for_each(|gate| {
            self.append(gate);
        });
        info!("loaded {} circuit template", template);
    }

    /// Resets `qstate` to |0> and arms full playback; steps are then applied
    /// one per `tick`.
    pub fn start_playback(&mut self, qstate: &mut QubitState) -> CircuitStatus {
        if self.steps.is_empty() {
            warn!("playback requested on an empty circuit");
            return CircuitStatus::NothingToRun;
        }

        qstate.reset();
        self.cursor = 0;
        self.state = EngineState::Running;
        info!("executing circuit of {} gates", self.steps.len());
        CircuitStatus::Started {
            steps: self.steps.len(),
        }
    }

    /// Applies the next step of a running playback. Returns `None` when no
    /// playback is running or the circuit is exhausted.
    pub fn tick(&mut self, qstate: &mut QubitState) -> Option<StepEvent> {
        if self.state != EngineState::Running {
            return None;
        }

        let Some(step) = self.steps.get(self.cursor) else {
            self.state = EngineState::Idle;
            return None;
        };

        let event = apply_step(self.cursor, step.gate, qstate);
        self.cursor += 1;
        if self.cursor >= self.steps.len() {
            self.state = EngineState::Idle;
            info!("circuit execution complete");
        }
        Some(event)
    }

    /// Stops any playback at the current step boundary. The qubit keeps the
    /// state of the last completed step.
    pub fn abort(&mut self) -> bool {
        if self.state == EngineState::Idle {
            return false;
        }
        info!("circuit playback aborted at step {}", self.cursor);
        self.state = EngineState::Idle;
        true
    }

    /// Runs the whole circuit from |0>, handing every intermediate state to
    /// `observer`. Returning `ControlFlow::Break` aborts before the next step.
    pub fn play_all<F>(&mut self, qstate: &mut QubitState, mut observer: F) -> CircuitStatus
    where
        F: FnMut(&StepEvent) -> ControlFlow<()>,
    {
        if let CircuitStatus::NothingToRun = self.start_playback(qstate) {
            return CircuitStatus::NothingToRun;
        }

        let mut completed = 0;
        while let Some(event) = self.tick(qstate) {
            completed += 1;
            // A break after the final step has nothing left to abort.
            if observer(&event).is_break() && self.abort() {
                return CircuitStatus::Aborted { completed };
            }
        }
        CircuitStatus::Completed { steps: completed }
    }

    pub fn run(&mut self, qstate: &mut QubitState) -> CircuitStatus {
        self.play_all(qstate, |_| ControlFlow::Continue(()))
    }

    /// Applies the step under the cursor and advances it. A call made with the
    /// cursor at the end restarts from |0> at step 0.
    pub fn step_once(&mut self, qstate: &mut QubitState) -> CircuitStatus {
        if self.steps.is_empty() {
            warn!("step requested on an empty circuit");
            return CircuitStatus::NothingToRun;
        }

        if self.state == EngineState::Running {
            self.abort();
        }

        let restarted = self.cursor >= self.steps.len();
        if restarted {
            self.cursor = 0;
            qstate.reset();
        }

        let index = self.cursor;
        apply_step(index, self.steps[index].gate, qstate);
        self.cursor += 1;

        let at_end = self.cursor >= self.steps.len();
        self.state = if at_end {
            EngineState::Idle
        } else {
            EngineState::Stepping
        };

        CircuitStatus::Stepped {
            index,
            restarted,
            at_end,
        }
    }
}

fn apply_step(index: usize, gate: Gate, qstate: &mut QubitState) -> StepEvent {
    qstate.apply(gate);
    StepEvent {
        index,
        gate,
        state: *qstate,
    }
}

/// Ready-made circuits offered by the gate lesson.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// H then X. A single qubit cannot hold a Bell pair; this only mimics the
    /// preparation sequence.
    Bell,
    Superposition,
    Flip,
    Random,
}

pub const RANDOM_TEMPLATE_LEN: usize = 3;

impl Template {
    pub fn gates<R: Rng>(self, rng: &mut R) -> Vec<Gate> {
        match self {
            Template::Bell => vec![Gate::H, Gate::X],
            Template::Superposition => vec![Gate::H],
            Template::Flip => vec![Gate::X],
            Template::Random => {
                const POOL: [Gate; 4] = [Gate::H, Gate::X, Gate::Y, Gate::Z];
                (0..RANDOM_TEMPLATE_LEN)
                    .map(|_| POOL[rng.random_range(0..POOL.len())])
                    .collect()
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Template::Bell => "bell",
            Template::Superposition => "superposition",
            Template::Flip => "flip",
            Template::Random => "random",
        }
    }
}

impl FromStr for Template {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let template = match s.trim().to_ascii_lowercase().as_str() {
            "bell" => Template::Bell,
            "superposition" => Template::Superposition,
            "flip" => Template::Flip,
            "random" => Template::Random,
            other => return Err(anyhow::anyhow!("Unknown circuit template: {}", other)),
        };
        Ok(template)
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
