//! Utility functions to work with random numbers.

mod primes;
pub use primes::*;

/// The increment of the [SplitMix64] sequence (the golden ratio in fixed point).
///
/// [SplitMix64]: http://prng.di.unimi.it/splitmix64.c
pub const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// A simple implementation of the [SplitMix64] algorithm.
///
/// This is mainly used to turn a 64-bit seed into a sequence of 64-bit numbers to use as
/// the base state for the main random number generator, and as a finalizer for [`Mixer`].
///
/// [SplitMix64]: http://prng.di.unimi.it/splitmix64.c
/// [`Mixer`]: crate::Mixer
#[inline]
pub fn splitmix64(st: u64) -> u64 {
    let mut t = st.wrapping_add(GOLDEN_GAMMA);
    t = (t ^ (t >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    t = (t ^ (t >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    t ^ (t >> 31)
}

/// Converts a `u64` value into a `f64` value in the range `[0.0, 1.0)`.
///
/// Only the 53 most significant bits are used, which is exactly the precision of the mantissa.
#[inline]
pub fn f64_from_u64_01(x: u64) -> f64 {
    (x >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}
