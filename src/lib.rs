pub mod bloch;
pub mod circuit;
pub mod config;
pub mod gates;
pub mod measurement;
pub mod qstate;
pub mod session;
pub mod transition;

#[doc(hidden)]
pub mod test_util;

use num_complex::Complex;

pub use bloch::{BlochProjector, Projection};
pub use circuit::{CircuitEngine, CircuitStatus, EngineState, GateStep, StepEvent, Template};
pub use config::Config;
pub use gates::Gate;
pub use measurement::{BatchCounts, MeasurementSampler, Outcome, Statistics};
pub use qstate::{Preset, QubitState};
pub use session::{Session, Snapshot};
pub use transition::Transition;

pub type Amplitude = Complex<f64>;
