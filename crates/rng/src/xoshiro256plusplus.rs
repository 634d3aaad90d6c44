use crate::{utility, Rng};

/// A general-purpose pseudo-random number generator.
///
/// This number generator is based on the [xoshiro256++][source].
///
/// [source]: https://prng.di.unimi.it/xoshiro256plusplus.c
#[derive(Debug, Clone)]
pub struct Xoshiro256PlusPlus {
    s: [u64; 4],
}

impl Rng for Xoshiro256PlusPlus {
    fn from_seed(seed: u64) -> Self {
        // The state must not be all zeroes. SplitMix64 is a bijection and its four inputs are
        // distinct, so at most one of the words can be zero.
        let s = std::array::from_fn(|i| {
            utility::splitmix64(seed.wrapping_add((i as u64).wrapping_mul(utility::GOLDEN_GAMMA)))
        });

        Self { s }
    }

    fn next_u64(&mut self) -> u64 {
        let [a, b, c, d] = &mut self.s;

        let ret = a.wrapping_add(*d).rotate_left(23).wrapping_add(*a);
        let t = *b << 17;

        *c ^= *a;
        *d ^= *b;
        *b ^= *c;
        *a ^= *d;
        *c ^= t;
        *d = d.rotate_left(45);

        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Xoshiro256PlusPlus::from_seed(1234);
        let mut b = Xoshiro256PlusPlus::from_seed(1234);
        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Xoshiro256PlusPlus::from_seed(1);
        let mut b = Xoshiro256PlusPlus::from_seed(2);
        let same = (0..64).filter(|_| a.next_u64() == b.next_u64()).count();
        assert!(same < 4);
    }

    #[test]
    fn zero_seed_is_usable() {
        let mut rng = Xoshiro256PlusPlus::from_seed(0);
        assert!((0..8).any(|_| rng.next_u64() != 0));
    }
}
