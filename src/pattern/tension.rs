//! Global tension bias applied on top of per-point tension.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::atomic::AtomicF64;

/// Tension offsets shared by every segment of a pattern.
///
/// With `dual` off every segment is biased by `mult`. With `dual` on, rising
/// segments (the envelope opening, y decreasing on screen) use `attack` and
/// all others use `release`. The values are atomics so any thread can read
/// them without locking.
#[derive(Debug, Default)]
pub struct TensionBias {
    mult: AtomicF64,
    attack: AtomicF64,
    release: AtomicF64,
    dual: AtomicBool,
}

impl TensionBias {
    pub fn set(&self, mult: f64, attack: f64, release: f64, dual: bool) {
        self.mult.store(mult);
        self.attack.store(attack);
        self.release.store(release);
        self.dual.store(dual, Ordering::Relaxed);
    }

    pub fn mult(&self) -> f64 {
        self.mult.load()
    }

    pub fn attack(&self) -> f64 {
        self.attack.load()
    }

    pub fn release(&self) -> f64 {
        self.release.load()
    }

    pub fn is_dual(&self) -> bool {
        self.dual.load(Ordering::Relaxed)
    }

    /// Effective bend for a segment from `y1` to `y2` with raw `tension`.
    ///
    /// The bias is subtracted on rising segments and added on falling ones,
    /// so a positive bias makes both attacks and releases snap harder.
    pub fn bend(&self, tension: f64, y1: f64, y2: f64) -> f64 {
        let rising = y1 > y2;
        let bias = if self.is_dual() {
            if rising { self.attack() } else { self.release() }
        } else {
            self.mult()
        };
        if rising { tension - bias } else { tension + bias }
    }
}

impl Clone for TensionBias {
    fn clone(&self) -> Self {
        let copy = Self::default();
        copy.set(self.mult(), self.attack(), self.release(), self.is_dual());
        copy
    }
}
