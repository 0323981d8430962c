use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::Result;
use log::{debug, warn};
use num_complex::Complex;
use serde::Serialize;

use crate::gates::Gate;
use crate::Amplitude;

/// Largest drift of `alpha² + beta²` away from 1 that is tolerated silently.
pub const NORM_TOLERANCE: f64 = 1e-6;

/// Amplitudes below this magnitude are printed as `0` in the state equation.
const DISPLAY_EPSILON: f64 = 1e-3;

/// Single qubit in the simplified real-amplitude model.
///
/// The state is `alpha|0> + beta e^{i phi}|1>` with real `alpha` and `beta`.
/// Gates act on the real coefficients and on the phase angle independently,
/// so this is an approximation of a true complex state vector. Angles are
/// kept in degrees: `theta` in `[0, 180]`, `phi` in `[0, 360)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct QubitState {
    alpha: f64,
    beta: f64,
    theta: f64,
    phi: f64,
}

impl Default for QubitState {
    fn default() -> Self {
        Self::zero_state()
    }
}

impl QubitState {
    pub fn zero_state() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
            theta: 0.0,
            phi: 0.0,
        }
    }

    pub fn one_state() -> Self {
        Self {
            alpha: 0.0,
            beta: 1.0,
            theta: 180.0,
            phi: 0.0,
        }
    }

    /// Builds a state from raw amplitudes, renormalizing them if needed.
    pub fn from_amplitudes(alpha: f64, beta: f64) -> Self {
        let mut state = Self::zero_state();
        state.set_amplitudes(alpha, beta);
        state
    }

    pub fn from_spherical(theta: f64, phi: f64) -> Self {
        let mut state = Self::zero_state();
        state.set_spherical(theta, phi);
        state
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Stores new amplitudes and recomputes `theta`. `phi` is left untouched.
    pub fn set_amplitudes(&mut self, alpha: f64, beta: f64) {
        self.alpha = alpha;
        self.beta = beta;
        self.renormalize();
        self.theta = theta_from_alpha(self.alpha);
    }

    pub fn set_amplitudes_with_phase(&mut self, alpha: f64, beta: f64, phi: f64) {
        self.set_amplitudes(alpha, beta);
        self.phi = wrap_phi(phi);
    }

    /// Sets the Bloch angles directly, clamping `theta` into `[0, 180]` and
    /// wrapping `phi` into `[0, 360)`.
    pub fn set_spherical(&mut self, theta: f64, phi: f64) {
        self.theta = clamp_theta(theta);
        self.phi = wrap_phi(phi);

        let half = self.theta.to_radians() / 2.0;
        self.alpha = half.cos();
        self.beta = half.sin();
    }

    /// Mirrors the amplitude slider: `alpha` in `[0, 1]` and
    /// `beta = sqrt(1 - alpha²)`.
    pub fn set_custom(&mut self, alpha: f64, phi: f64) {
        let alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let beta = (1.0 - alpha * alpha).max(0.0).sqrt();
        self.set_amplitudes_with_phase(alpha, beta, phi);
    }

    /// Replaces the state with a named preset. `Preset::Custom` keeps the
    /// current state.
    pub fn set_preset(&mut self, preset: Preset) {
        if let Some(state) = preset.state() {
            *self = state;
        }
    }

    /// Born-rule probabilities `(P(0), P(1))`.
    pub fn probabilities(&self) -> (f64, f64) {
        (self.alpha * self.alpha, self.beta * self.beta)
    }

    pub fn reset(&mut self) {
        *self = Self::zero_state();
    }

    pub fn apply(&mut self, gate: Gate) {
        let output = gate.transform(self);
        self.set_amplitudes(output.alpha, output.beta);
        self.phi = wrap_phi(self.phi + output.phi_delta);
        debug!(
            "applied {} gate: alpha={:.6} beta={:.6} theta={:.3} phi={:.3}",
            gate.symbol(),
            self.alpha,
            self.beta,
            self.theta,
            self.phi
        );
    }

    /// Complex view `(alpha, beta e^{i phi})` for display.
    pub fn amplitudes(&self) -> (Amplitude, Amplitude) {
        (
            Complex::new(self.alpha, 0.0),
            Complex::from_polar(self.beta, self.phi.to_radians()),
        )
    }

    pub fn is_normalized(&self) -> bool {
        (self.alpha * self.alpha + self.beta * self.beta - 1.0).abs() <= NORM_TOLERANCE
    }

    fn renormalize(&mut self) {
        let norm = self.alpha.hypot(self.beta);

        if !norm.is_finite() || norm == 0.0 {
            warn!(
                "cannot renormalize amplitudes ({}, {}), falling back to |0>",
                self.alpha, self.beta
            );
            self.alpha = 1.0;
            self.beta = 0.0;
            return;
        }

        if (norm - 1.0).abs() > NORM_TOLERANCE {
            debug!("renormalizing amplitudes, norm = {}", norm);
        }

        self.alpha /= norm;
        self.beta /= norm;
    }
}

/// `theta = 2 acos(|alpha|)` in degrees, which keeps the polar angle inside
/// `[0, 180]` for negative `alpha` as well.
fn theta_from_alpha(alpha: f64) -> f64 {
    2.0 * alpha.abs().clamp(0.0, 1.0).acos().to_degrees()
}

pub(crate) fn clamp_theta(theta: f64) -> f64 {
    if !theta.is_finite() {
        debug!("non-finite theta {} replaced with 0", theta);
        return 0.0;
    }
    let clamped = theta.clamp(0.0, 180.0);
    if clamped != theta {
        debug!("theta {} clamped to {}", theta, clamped);
    }
    clamped
}

pub(crate) fn wrap_phi(phi: f64) -> f64 {
    if !phi.is_finite() {
        debug!("non-finite phi {} replaced with 0", phi);
        return 0.0;
    }
    let wrapped = phi.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

impl Display for QubitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if (self.alpha - 1.0).abs() < DISPLAY_EPSILON && self.beta.abs() < DISPLAY_EPSILON {
            return write!(f, "|ψ⟩ = |0⟩");
        }
        if self.alpha.abs() < DISPLAY_EPSILON && (self.beta - 1.0).abs() < DISPLAY_EPSILON {
            return write!(f, "|ψ⟩ = |1⟩");
        }

        // e^(i180°) is folded into the sign of the |1> term
        let mut negative = self.beta < 0.0;
        let mut phi = self.phi;
        if (phi - 180.0).abs() < DISPLAY_EPSILON {
            negative = !negative;
            phi = 0.0;
        }
        let sign = if negative { '-' } else { '+' };

        let alpha = format_amplitude(self.alpha);
        let beta = format_amplitude(self.beta.abs());
        if phi.abs() < DISPLAY_EPSILON {
            write!(f, "|ψ⟩ = {}|0⟩ {} {}|1⟩", alpha, sign, beta)
        } else {
            write!(f, "|ψ⟩ = {}|0⟩ {} {}e^(i{}°)|1⟩", alpha, sign, beta, phi.round())
        }
    }
}

fn format_amplitude(value: f64) -> String {
    if value.abs() < DISPLAY_EPSILON {
        "0".to_string()
    } else {
        format!("{:.3}", value)
    }
}

/// Named starting states offered by the lessons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Zero,
    One,
    Plus,
    Minus,
    PlusI,
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Zero,
        Preset::One,
        Preset::Plus,
        Preset::Minus,
        Preset::PlusI,
        Preset::Custom,
    ];

    /// The state this preset selects, or `None` for `Custom`.
    pub fn state(self) -> Option<QubitState> {
        let state = match self {
            Preset::Zero => QubitState::zero_state(),
            Preset::One => QubitState::one_state(),
            Preset::Plus => QubitState {
                alpha: FRAC_1_SQRT_2,
                beta: FRAC_1_SQRT_2,
                theta: 90.0,
                phi: 0.0,
            },
            // The relative sign lives in phi alone, which also points the
            // Bloch vector at -x.
            Preset::Minus => QubitState {
                alpha: FRAC_1_SQRT_2,
                beta: FRAC_1_SQRT_2,
                theta: 90.0,
                phi: 180.0,
            },
            Preset::PlusI => QubitState {
                alpha: FRAC_1_SQRT_2,
                beta: FRAC_1_SQRT_2,
                theta: 90.0,
                phi: 90.0,
            },
            Preset::Custom => return None,
        };
        Some(state)
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Zero => "zero",
            Preset::One => "one",
            Preset::Plus => "plus",
            Preset::Minus => "minus",
            Preset::PlusI => "plus_i",
            Preset::Custom => "custom",
        }
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let preset = match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Preset::Zero,
            "one" | "1" => Preset::One,
            "plus" | "+" => Preset::Plus,
            "minus" | "-" => Preset::Minus,
            "plus_i" | "i" => Preset::PlusI,
            "custom" => Preset::Custom,
            other => return Err(anyhow::anyhow!("Unknown preset state: {}", other)),
        };
        Ok(preset)
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
