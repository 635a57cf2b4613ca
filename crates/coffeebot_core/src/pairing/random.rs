//! Pluggable uniform random source.
//!
//! # Responsibility
//! - Abstract the single uniform-[0, 1) draw the pairing engine consumes.
//! - Provide production (`rand`) and scripted (deterministic) sources.
//! - Shuffle and pick through the same abstraction so one source drives a cycle.
//!
//! # Invariants
//! - `next_unit()` returns a value in `[0, 1)` for production sources.
//! - `index_for` never returns an out-of-range index, even for a draw of `1.0`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    /// Returns the next uniform draw.
    fn next_unit(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Unseeded source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible source for a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Scripted source replaying a fixed sequence of draws.
///
/// Once the script runs out, `fallback` is returned for every further draw.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    /// Creates a source that replays `draws`, then repeats `fallback`.
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback,
        }
    }

    /// Number of scripted draws not consumed yet.
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

/// Maps one draw onto an index in `0..len`.
///
/// `len` must be non-zero.
pub fn index_for(draw: f64, len: usize) -> usize {
    debug_assert!(len > 0, "index_for requires a non-empty range");
    let scaled = (draw * len as f64).floor();
    if scaled.is_nan() || scaled < 0.0 {
        return 0;
    }
    (scaled as usize).min(len - 1)
}

/// Picks one element of `items` with a single draw; `None` for an empty slice.
pub fn choose<'a, T, R: RandomSource + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(index_for(rng.next_unit(), items.len()))
}

/// Shuffles `items` in place with Fisher-Yates, one draw per swap.
///
/// Any element may keep its position. This is not a cyclic (Sattolo) shuffle,
/// which would move every element.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for upper in (1..items.len()).rev() {
        let swap_with = index_for(rng.next_unit(), upper + 1);
        items.swap(upper, swap_with);
    }
}
