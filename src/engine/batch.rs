//! Parallel batch evaluation and signal tallies

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::{Decision, InferenceEngine, InputValues};
use crate::decision::Signal;
use crate::error::EvalError;

impl InferenceEngine {
    /// Evaluate many rows against this engine in parallel.
    ///
    /// Output order matches input order. A failing row yields its error and
    /// does not affect the other rows.
    pub fn evaluate_batch<I>(&self, rows: &[I]) -> Vec<Result<Decision, EvalError>>
    where
        I: InputValues + Sync,
    {
        let results: Vec<_> = rows
            .par_iter()
            .map(|row| self.evaluate_and_label(row))
            .collect();

        for (row, result) in results.iter().enumerate() {
            if let Err(e) = result {
                warn!(row, code = e.code().code(), "{}", e);
            }
        }
        debug!(rows = rows.len(), "batch evaluated");

        results
    }
}

/// Distribution of signals over many evaluations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalTally {
    pub buy: usize,
    pub hold: usize,
    pub sell: usize,
    /// Rows that produced an error instead of a signal
    pub errors: usize,
}

impl SignalTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &Result<Decision, EvalError>) {
        match result {
            Ok(decision) => self.record_signal(decision.signal),
            Err(_) => self.errors += 1,
        }
    }

    pub fn record_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Buy => self.buy += 1,
            Signal::Hold => self.hold += 1,
            Signal::Sell => self.sell += 1,
        }
    }

    pub fn count(&self, signal: Signal) -> usize {
        match signal {
            Signal::Buy => self.buy,
            Signal::Hold => self.hold,
            Signal::Sell => self.sell,
        }
    }

    /// Rows that produced a signal
    pub fn labelled(&self) -> usize {
        self.buy + self.hold + self.sell
    }

    pub fn total(&self) -> usize {
        self.labelled() + self.errors
    }

    /// Percentage of labelled rows carrying `signal`, 0 when nothing was labelled
    pub fn share(&self, signal: Signal) -> f64 {
        match self.labelled() {
            0 => 0.0,
            n => self.count(signal) as f64 * 100.0 / n as f64,
        }
    }
}

impl<'a> FromIterator<&'a Result<Decision, EvalError>> for SignalTally {
    fn from_iter<T: IntoIterator<Item = &'a Result<Decision, EvalError>>>(iter: T) -> Self {
        let mut tally = SignalTally::new();
        for result in iter {
            tally.record(result);
        }
        tally
    }
}
