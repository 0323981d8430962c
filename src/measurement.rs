use std::time::SystemTime;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::qstate::QubitState;

/// The deviation metric is only reported once more than this many
/// measurements have been recorded.
pub const MIN_SAMPLES_FOR_DEVIATION: usize = 10;

/// Largest batch the command line accepts. Every draw of a batch is kept in
/// the record log, so memory grows linearly with `n`.
pub const MAX_BATCH_SIZE: usize = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Zero,
    One,
}

impl Outcome {
    pub fn bit(self) -> u8 {
        match self {
            Outcome::Zero => 0,
            Outcome::One => 1,
        }
    }

    /// Basis state the qubit collapses to.
    pub fn basis_state(self) -> QubitState {
        match self {
            Outcome::Zero => QubitState::zero_state(),
            Outcome::One => QubitState::one_state(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Measurement {
    pub outcome: Outcome,
    /// Probability of the realized outcome before collapse.
    pub probability: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub outcome: Outcome,
    pub probability_of_outcome: f64,
    pub timestamp: SystemTime,
}

impl MeasurementRecord {
    /// Pre-measurement `P(0)` recovered from the realized outcome.
    pub fn expected_zero_probability(&self) -> f64 {
        match self.outcome {
            Outcome::Zero => self.probability_of_outcome,
            Outcome::One => 1.0 - self.probability_of_outcome,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub count0: usize,
    pub count1: usize,
}

impl BatchCounts {
    pub fn total(&self) -> usize {
        self.count0 + self.count1
    }

    pub fn zero_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.count0 as f64 / self.total() as f64
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub count0: usize,
    pub count1: usize,
    pub percent0: f64,
    pub percent1: f64,
    /// `|mean expected P(0) - observed zero rate|`, once enough samples exist.
    pub deviation: Option<f64>,
}

/// Draws Born-rule outcomes and keeps the append-only measurement log.
pub struct MeasurementSampler<R = StdRng> {
    rng: R,
    records: Vec<MeasurementRecord>,
}

impl MeasurementSampler<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }
}

impl<R: Rng> MeasurementSampler<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            records: Vec::new(),
        }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Measures `state` and collapses it onto the realized basis state.
    pub fn measure_once(&mut self, state: &mut QubitState) -> Measurement {
        let measurement = sample(&mut self.rng, state);
        self.record(measurement);
        *state = measurement.outcome.basis_state();

        debug!(
            "measured |{}> with probability {:.4}",
            measurement.outcome.bit(),
            measurement.probability
        );
        measurement
    }

    /// `n` independent draws from the pre-measurement distribution. `state`
    /// is not collapsed. Each draw is appended to the record log until
    /// [`clear_statistics`](Self::clear_statistics).
    pub fn measure_batch(&mut self, state: &QubitState, n: usize) -> BatchCounts {
        let mut counts = BatchCounts::default();
        for _ in 0..n {
            let measurement = sample(&mut self.rng, state);
            match measurement.outcome {
                Outcome::Zero => counts.count0 += 1,
                Outcome::One => counts.count1 += 1,
            }
            self.record(measurement);
        }

        info!(
            "batch of {} measurements: {} zeros, {} ones (expected P(0) = {:.4})",
            n,
            counts.count0,
            counts.count1,
            state.probabilities().0
        );
        counts
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn last_record(&self) -> Option<&MeasurementRecord> {
        self.records.last()
    }

    pub fn statistics(&self) -> Statistics {
        let total = self.records.len();
        if total == 0 {
            return Statistics::default();
        }

        let count0 = self
            .records
            .iter()
            .filter(|record| record.outcome == Outcome::Zero)
            .count();
        let count1 = total - count0;

        let deviation = (total > MIN_SAMPLES_FOR_DEVIATION).then(|| {
            let expected = self
                .records
                .iter()
                .map(MeasurementRecord::expected_zero_probability)
                .sum::<f64>()
                / total as f64;
            let observed = count0 as f64 / total as f64;
            (expected - observed).abs()
        });

        Statistics {
            total,
            count0,
            count1,
            percent0: 100.0 * count0 as f64 / total as f64,
            percent1: 100.0 * count1 as f64 / total as f64,
            deviation,
        }
    }

    pub fn clear_statistics(&mut self) {
        self.records.clear();
    }

    fn record(&mut self, measurement: Measurement) {
        self.records.push(MeasurementRecord {
            outcome: measurement.outcome,
            probability_of_outcome: measurement.probability,
            timestamp: SystemTime::now(),
        });
    }
}

/// One Born-rule draw: `|0>` if `r < alpha²` for uniform `r` in `[0, 1)`.
pub fn sample<R: Rng>(rng: &mut R, state: &QubitState) -> Measurement {
    let (prob0, prob1) = state.probabilities();
    let r: f64 = rng.random();
    if r < prob0 {
        Measurement {
            outcome: Outcome::Zero,
            probability: prob0,
        }
    } else {
        Measurement {
            outcome: Outcome::One,
            probability: prob1,
        }
    }
}
