use crate::gates::Gate;
use crate::qstate::QubitState;

pub const DEFAULT_FRAMES: usize = 40;

pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Animated path between a committed state and the state a gate produced.
///
/// Only the amplitudes are interpolated; the phase takes its new value on the
/// first frame. Frames are computed on demand and never touch the committed
/// state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    from: QubitState,
    to: QubitState,
    frames: usize,
}

impl Transition {
    pub fn new(from: QubitState, to: QubitState, frames: usize) -> Self {
        Self {
            from,
            to,
            frames: frames.max(1),
        }
    }

    pub fn for_gate(from: &QubitState, gate: Gate, frames: usize) -> Self {
        let mut to = *from;
        to.apply(gate);
        Self::new(*from, to, frames)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn source(&self) -> &QubitState {
        &self.from
    }

    pub fn target(&self) -> &QubitState {
        &self.to
    }

    /// State shown at frame `index`; frames at or past the end are the target.
    pub fn frame(&self, index: usize) -> QubitState {
        if index >= self.frames {
            return self.to;
        }

        let eased = ease_out_cubic(index as f64 / self.frames as f64);
        let alpha = self.from.alpha() + (self.to.alpha() - self.from.alpha()) * eased;
        let beta = self.from.beta() + (self.to.beta() - self.from.beta()) * eased;

        let mut state = self.to;
        state.set_amplitudes(alpha, beta);
        state
    }

    /// Frames `0..=frames`, ending on the target.
    pub fn iter(&self) -> impl Iterator<Item = QubitState> + '_ {
        (0..=self.frames).map(|index| self.frame(index))
    }
}
