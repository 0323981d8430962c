use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::Result;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::qstate::QubitState;

pub fn h_matrix() -> Matrix2<f64> {
    Matrix2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2, FRAC_1_SQRT_2, -FRAC_1_SQRT_2)
}

pub fn x_matrix() -> Matrix2<f64> {
    Matrix2::new(0.0, 1.0, 1.0, 0.0)
}

/// Real stand-in for Pauli-Y: `alpha' = beta`, `beta' = -alpha`.
pub fn y_matrix() -> Matrix2<f64> {
    Matrix2::new(0.0, 1.0, -1.0, 0.0)
}

pub fn z_matrix() -> Matrix2<f64> {
    Matrix2::new(1.0, 0.0, 0.0, -1.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    H,
    X,
    Y,
    Z,
    S,
    T,
}

/// Result of a gate acting on a state, before it is committed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateOutput {
    pub alpha: f64,
    pub beta: f64,
    /// Degrees added to `phi`.
    pub phi_delta: f64,
}

/// Descriptive text shown next to a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GateInfo {
    pub name: &'static str,
    pub function: &'static str,
    pub effect: &'static str,
    pub matrix: &'static str,
}

impl Gate {
    pub const ALL: [Gate; 6] = [Gate::H, Gate::X, Gate::Y, Gate::Z, Gate::S, Gate::T];

    /// Matrix acting on the real amplitude vector `(alpha, beta)`.
    /// The phase gates leave the amplitudes alone.
    pub fn matrix(self) -> Matrix2<f64> {
        match self {
            Gate::H => h_matrix(),
            Gate::X => x_matrix(),
            Gate::Y => y_matrix(),
            Gate::Z => z_matrix(),
            Gate::S | Gate::T => Matrix2::identity(),
        }
    }

    pub fn phi_delta(self) -> f64 {
        match self {
            Gate::S => 90.0,
            Gate::T => 45.0,
            _ => 0.0,
        }
    }

    pub fn transform(self, state: &QubitState) -> GateOutput {
        let amplitudes = self.matrix() * Vector2::new(state.alpha(), state.beta());
        GateOutput {
            alpha: amplitudes[0],
            beta: amplitudes[1],
            phi_delta: self.phi_delta(),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Gate::H => "H",
            Gate::X => "X",
            Gate::Y => "Y",
            Gate::Z => "Z",
            Gate::S => "S",
            Gate::T => "T",
        }
    }

    pub fn info(self) -> GateInfo {
        match self {
            Gate::H => GateInfo {
                name: "HADAMARD GATE (H)",
                function: "Creates superposition",
                effect: "|0⟩ → (|0⟩ + |1⟩)/√2",
                matrix: "H = 1/√2 × [1 1; 1 -1]",
            },
            Gate::X => GateInfo {
                name: "PAULI-X GATE (X)",
                function: "Quantum NOT gate",
                effect: "|0⟩ → |1⟩, |1⟩ → |0⟩",
                matrix: "X = [0 1; 1 0]",
            },
            Gate::Y => GateInfo {
                name: "PAULI-Y GATE (Y)",
                function: "Rotates around Y-axis",
                effect: "|0⟩ → i|1⟩, |1⟩ → -i|0⟩",
                matrix: "Y = [0 -i; i 0]",
            },
            Gate::Z => GateInfo {
                name: "PAULI-Z GATE (Z)",
                function: "Phase flip",
                effect: "|0⟩ → |0⟩, |1⟩ → -|1⟩",
                matrix: "Z = [1 0; 0 -1]",
            },
            Gate::S => GateInfo {
                name: "S GATE (PHASE)",
                function: "Quarter phase rotation",
                effect: "|0⟩ → |0⟩, |1⟩ → i|1⟩",
                matrix: "S = [1 0; 0 i]",
            },
            Gate::T => GateInfo {
                name: "T GATE (π/8)",
                function: "Eighth phase rotation",
                effect: "|0⟩ → |0⟩, |1⟩ → e^(iπ/4)|1⟩",
                matrix: "T = [1 0; 0 e^(iπ/4)]",
            },
        }
    }
}

impl FromStr for Gate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let gate = match s.trim().to_ascii_lowercase().as_str() {
            "h" => Gate::H,
            "x" => Gate::X,
            "y" => Gate::Y,
            "z" => Gate::Z,
            "s" => Gate::S,
            "t" => Gate::T,
            other => return Err(anyhow::anyhow!("Unknown gate: {}", other)),
        };
        Ok(gate)
    }
}

impl Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, assert_state_eq};

    #[test]
    fn test_hadamard_on_zero() {
        let mut state = QubitState::zero_state();
        state.apply(Gate::H);

        assert_approx_eq!(FRAC_1_SQRT_2, state.alpha());
        assert_approx_eq!(FRAC_1_SQRT_2, state.beta());
        assert_approx_eq!(90.0, state.theta(), 1e-9);
    }

    #[test]
    fn test_x_swaps_amplitudes() {
        let mut state = QubitState::from_amplitudes(0.6, 0.8);
        state.apply(Gate::X);

        assert_approx_eq!(0.8, state.alpha());
        assert_approx_eq!(0.6, state.beta());
    }

    #[test]
    fn test_y_real_approximation() {
        let mut state = QubitState::from_amplitudes(0.6, 0.8);
        state.apply(Gate::Y);

        assert_approx_eq!(0.8, state.alpha());
        assert_approx_eq!(-0.6, state.beta());
    }

    #[test]
    fn test_z_flips_beta_sign() {
        let mut state = QubitState::from_amplitudes(0.6, 0.8);
        state.apply(Gate::Z);

        assert_approx_eq!(0.6, state.alpha());
        assert_approx_eq!(-0.8, state.beta());
        assert_approx_eq!(0.0, state.phi());
    }

    #[test]
    fn test_phase_gates_only_move_phi() {
        let mut state = QubitState::from_spherical(90.0, 300.0);
        let (alpha, beta) = (state.alpha(), state.beta());

        state.apply(Gate::S);
        assert_approx_eq!(30.0, state.phi(), 1e-9);
        state.apply(Gate::T);
        assert_approx_eq!(75.0, state.phi(), 1e-9);

        assert_approx_eq!(alpha, state.alpha());
        assert_approx_eq!(beta, state.beta());
    }

    #[test]
    fn test_involutions() {
        let original = QubitState::from_amplitudes(0.6, 0.8);

        for gate in [Gate::H, Gate::X, Gate::Z] {
            let mut state = original;
            state.apply(gate);
            state.apply(gate);
            assert_state_eq!(original, state);
        }
    }

    #[test]
    fn test_phase_gate_cycles() {
        let original = QubitState::from_spherical(60.0, 10.0);

        let mut state = original;
        (0..4).for_each(|_| state.apply(Gate::S));
        assert_state_eq!(original, state);

        let mut state = original;
        (0..8).for_each(|_| state.apply(Gate::T));
        assert_state_eq!(original, state);
    }

    #[test]
    fn test_sequential_order_matters() {
        let mut hx = QubitState::zero_state();
        hx.apply(Gate::H);
        hx.apply(Gate::X);

        let mut xh = QubitState::zero_state();
        xh.apply(Gate::X);
        xh.apply(Gate::H);

        // H then X on |0> stays at |+>, X then H lands on |->.
        assert_approx_eq!(FRAC_1_SQRT_2, hx.beta());
        assert_approx_eq!(-FRAC_1_SQRT_2, xh.beta());
    }

    #[test]
    fn test_gate_from_str() -> Result<()> {
        assert_eq!(Gate::H, "h".parse()?);
        assert_eq!(Gate::T, " T ".parse()?);
        assert!("cnot".parse::<Gate>().is_err());
        Ok(())
    }

    #[test]
    fn test_gate_info() {
        assert_eq!("HADAMARD GATE (H)", Gate::H.info().name);
        for gate in Gate::ALL {
            assert!(gate.info().name.contains(gate.symbol()));
        }
    }
}
