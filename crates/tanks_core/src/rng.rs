//! Deterministic per-actor random numbers.
//!
//! Every AI tank owns its own generator, seeded independently, so one
//! tank's shot timing never shifts another's. There is no global RNG.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Small linear congruential generator.
///
/// Not suitable for anything but gameplay jitter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Derive an independent seed for a child stream (one per spawned actor).
    #[must_use]
    pub const fn derive_seed(base: u64, stream: u64) -> u64 {
        base ^ stream.wrapping_mul(0xBF58_476D_1CE4_E5B9)
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5DEE_CE66D).wrapping_add(11);
        self.state
    }

    /// Next 32 random bits (the high half of the state, the low bits of an
    /// LCG cycle quickly).
    pub fn next_u32(&mut self) -> u32 {
        // Truncation keeps exactly the upper 32 bits.
        #[allow(clippy::cast_possible_truncation)]
        let bits = (self.next() >> 32) as u32;
        bits
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_unit(&mut self) -> Fixed {
        Fixed::from_bits(i64::from(self.next_u32()))
    }

    /// Uniform value in `[min, max)`. Returns `min` for empty ranges.
    pub fn range(&mut self, min: Fixed, max: Fixed) -> Fixed {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_unit()
    }

    /// `value` scaled by a uniform factor in `[1 - spread, 1 + spread)`.
    pub fn jitter(&mut self, value: Fixed, spread: Fixed) -> Fixed {
        let factor = self.range(Fixed::ONE - spread, Fixed::ONE + spread);
        value * factor
    }
}
