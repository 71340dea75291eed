//! Deterministic random stream for creature generation.
//!
//! Every creature derives all of its randomness from one `CreatureRng` seeded with
//! `CreatureSpec::seed`, so the same spec always yields the same creature on every
//! platform. The generator is a plain xorshift32; keep the bit mixing untouched or
//! existing seeds will produce different creatures.

use bevy::prelude::*;
use rand::{Error, RngCore, SeedableRng};
use rand_core::impls;
use std::f32::consts::TAU;

/// State used when the scrambled seed lands on xorshift's zero fixed point.
const ZERO_SEED_STATE: u32 = 0x9E37_79B9;

/// Scale for turning the top 24 bits into a float in [0, 1).
const F32_UNIT: f32 = 1.0 / (1u32 << 24) as f32;

/// Seeded xorshift32 stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureRng {
    state: u32,
}

impl CreatureRng {
    pub fn new(seed: u32) -> Self {
        let state = scramble(seed);
        Self {
            state: if state == 0 { ZERO_SEED_STATE } else { state },
        }
    }

    #[inline]
    fn step(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Next float in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.step() >> 8) as f32 * F32_UNIT
    }

    /// Uniform float in [lo, hi).
    #[inline]
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        ((self.next_f32() * len as f32) as usize).min(len.saturating_sub(1))
    }

    /// Angle in [0, 2π).
    #[inline]
    pub fn angle(&mut self) -> f32 {
        self.next_f32() * TAU
    }

    /// Uniform direction on the unit sphere.
    ///
    /// Draws `u` (cosine of the polar angle) first and the azimuth second.
    pub fn unit_vector(&mut self) -> Vec3 {
        let u = self.next_f32() * 2.0 - 1.0;
        let azimuth = self.angle();
        let ring = (1.0 - u * u).max(0.0).sqrt();
        Vec3::new(azimuth.cos() * ring, u, azimuth.sin() * ring)
    }
}

/// murmur3 finalizer: spreads small consecutive seeds over the whole state space.
fn scramble(seed: u32) -> u32 {
    let mut z = seed.wrapping_add(0x9E37_79B9);
    z = (z ^ (z >> 16)).wrapping_mul(0x85EB_CA6B);
    z = (z ^ (z >> 13)).wrapping_mul(0xC2B2_AE35);
    z ^ (z >> 16)
}

impl RngCore for CreatureRng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for CreatureRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}
