use std::ops::BitXor;

use crate::{FromRng, Rng};

/// Hashes `N` integers into a single well-distributed `u64`.
///
/// The city generator uses a `Mixer<2>` to turn a chunk key into the seed of that chunk's random
/// number generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mixer<const N: usize> {
    /// The initial value used to hash the input numbers.
    pub init: u64,
    /// A bunch of prime numbers used to multiply the
    /// input numbers with.
    pub primes: [u64; N],
}

impl<const N: usize> FromRng for Mixer<N> {
    fn from_rng(rng: &mut impl Rng) -> Self {
        Self {
            init: rng.next_u64(),
            primes: std::array::from_fn(|_| crate::utility::generate_prime(rng)),
        }
    }
}

impl<const N: usize> Mixer<N> {
    /// Mixes the provided input numbers into a single one.
    pub fn mix_u64(&self, input: [u64; N]) -> u64 {
        let mut ret = self.init;
        for (t, p) in input.into_iter().zip(self.primes) {
            ret = ret.rotate_left(5).bitxor(t).wrapping_mul(p);
        }

        // Without a finalizer, inputs that only differ in their last component produce outputs
        // that only differ by a multiple of the last prime.
        crate::utility::splitmix64(ret)
    }

    /// Mixes the provided signed input numbers into a single one.
    #[inline]
    pub fn mix_i32(&self, input: [i32; N]) -> u64 {
        self.mix_u64(input.map(|x| x as u32 as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefaultRng;

    #[test]
    fn deterministic() {
        let m = Mixer::<2>::from_seed::<DefaultRng>(5);
        assert_eq!(m.mix_i32([3, -4]), m.mix_i32([3, -4]));
    }

    #[test]
    fn neighbours_differ() {
        let m = Mixer::<2>::from_seed::<DefaultRng>(5);
        let a = m.mix_i32([0, 0]);
        assert_ne!(a, m.mix_i32([1, 0]));
        assert_ne!(a, m.mix_i32([0, 1]));
        assert_ne!(m.mix_i32([1, 0]), m.mix_i32([0, 1]));
        assert_ne!(m.mix_i32([-1, 0]), m.mix_i32([0, -1]));
    }
}
