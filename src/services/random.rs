//! Random source for the simulated subsystems
//!
//! Prediction, the sensor simulation, seeding and payment rewards all draw
//! from a `RandomSource` so that tests can substitute a deterministic one.

use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Source of random values. Both ends of every range are inclusive.
pub trait RandomSource: Send + Sync {
    /// Integer in `low..=high`
    fn int_in(&self, low: i64, high: i64) -> i64;

    /// Float in `low..=high`
    fn float_in(&self, low: f64, high: f64) -> f64;

    /// True with probability `p`
    fn chance(&self, p: f64) -> bool;

    /// Index in `0..len`; `len` must be non-zero
    fn index(&self, len: usize) -> usize;
}

/// Pick one element of a slice, `None` when empty
pub fn pick<'a, T>(rng: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.index(items.len()))
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Thread-local RNG backed source used in production
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn int_in(&self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }

    fn float_in(&self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }

    fn chance(&self, p: f64) -> bool {
        rand::thread_rng().gen_bool(p.clamp(0.0, 1.0))
    }

    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic source replaying unit values in `[0, 1]`.
///
/// Each draw consumes one value and maps it onto the requested range; the
/// last value repeats once the sequence is exhausted.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl SequenceRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect()),
            last: Mutex::new(0.0),
        }
    }

    /// Always yields the same unit value
    pub fn constant(value: f64) -> Self {
        let source = Self::new(std::iter::empty());
        if let Ok(mut last) = source.last.lock() {
            *last = value.clamp(0.0, 1.0);
        }
        source
    }

    fn next_unit(&self) -> f64 {
        let next = self.values.lock().ok().and_then(|mut q| q.pop_front());
        match self.last.lock() {
            Ok(mut last) => {
                if let Some(v) = next {
                    *last = v;
                }
                *last
            }
            Err(_) => next.unwrap_or(0.0),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn int_in(&self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        let span = (high - low + 1) as f64;
        let offset = (self.next_unit() * span).floor() as i64;
        (low + offset).min(high)
    }

    fn float_in(&self, low: f64, high: f64) -> f64 {
        low + self.next_unit() * (high - low)
    }

    fn chance(&self, p: f64) -> bool {
        self.next_unit() < p
    }

    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let idx = (self.next_unit() * len as f64).floor() as usize;
        idx.min(len - 1)
    }
}
