//! Seeded randomness helpers
//!
//! Every subsystem owns its own `Pcg32` stream derived from the run seed, so
//! adding draws in one subsystem never perturbs another.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Independent stream for one subsystem
pub fn stream(seed: u64, stream: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Uniform in `[lo, hi)`, or `lo` when the range is empty
pub fn uniform(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Uniform in `[-magnitude, magnitude]`
pub fn symmetric(rng: &mut Pcg32, magnitude: f32) -> f32 {
    if magnitude > 0.0 {
        rng.random_range(-magnitude..=magnitude)
    } else {
        0.0
    }
}

/// Stream ids, one per subsystem
pub mod streams {
    pub const PARTICLES: u64 = 1;
    pub const FLAMES: u64 = 2;
    pub const SHATTER: u64 = 3;
    pub const CENTER: u64 = 4;
    pub const OBJECTS: u64 = 5;
    pub const STARS: u64 = 6;
    pub const LEVEL: u64 = 7;
}
