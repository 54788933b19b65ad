//! Seeded 32-bit generator driving every random draw of a run.
//!
//! The stream is a pure function of its 32-bit state: the state advances by a
//! fixed odd increment (so it only repeats after 2^32 draws) and each output
//! is a multiply/xorshift mix of the new state.

use std::f64::consts::PI;

use rand::Rng as _;

const STATE_INCREMENT: u32 = 0x6D2B_79F5;
const OUTPUT_SCALE: f64 = 4_294_967_296.0;
const ENTROPY_SEED_LIMIT: u32 = 1_000_000_000;

#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Falls back to an entropy-drawn seed when none is given.
    pub fn seeded(seed: Option<u32>) -> Self {
        Self::new(seed.unwrap_or_else(entropy_seed))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(STATE_INCREMENT);
        let t = self.state;
        let r = (t ^ (t >> 15))
            .wrapping_mul(t | 1)
            .wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61))
            ^ t;
        r ^ (r >> 14)
    }

    /// Uniform draw in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / OUTPUT_SCALE
    }

    /// Uniform draw in (0, 1); exact zeros are redrawn.
    pub fn next_open_f64(&mut self) -> f64 {
        loop {
            let u = self.next_f64();
            if u != 0.0 {
                return u;
            }
        }
    }

    pub fn standard_normal(&mut self) -> f64 {
        let u = self.next_open_f64();
        let v = self.next_open_f64();
        (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
    }
}

pub fn entropy_seed() -> u32 {
    rand::thread_rng().gen_range(0..ENTROPY_SEED_LIMIT)
}
