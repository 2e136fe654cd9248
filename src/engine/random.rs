//! Randomness behind dice and stock swings, kept behind a trait so matches
//! can be replayed from a seed and tests can script exact rolls.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send + Sync {
    /// One fair six-sided die, in `1..=6`.
    fn roll_die(&self) -> u8;

    /// Uniform sample in `[0, 1)`.
    fn unit(&self) -> f64;
}

pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl RandomSource for SeededRandom {
    fn roll_die(&self) -> u8 {
        self.rng.lock().gen_range(1..=6)
    }

    fn unit(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }
}

/// Replays queued die faces, then repeats a fallback face. `unit()` is fixed.
pub struct ScriptedRandom {
    faces: Mutex<VecDeque<u8>>,
    fallback_face: u8,
    unit: f64,
}

impl ScriptedRandom {
    pub fn new(faces: impl IntoIterator<Item = u8>, fallback_face: u8) -> Self {
        Self {
            faces: Mutex::new(faces.into_iter().collect()),
            fallback_face: fallback_face.clamp(1, 6),
            unit: 0.5,
        }
    }

    /// Every die shows `face`.
    pub fn constant(face: u8) -> Self {
        Self::new([], face)
    }

    pub fn with_unit(mut self, unit: f64) -> Self {
        self.unit = unit;
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn roll_die(&self) -> u8 {
        self.faces
            .lock()
            .pop_front()
            .map(|f| f.clamp(1, 6))
            .unwrap_or(self.fallback_face)
    }

    fn unit(&self) -> f64 {
        self.unit
    }
}
