//! Utilities to generate prime numbers.

use crate::Rng;

/// The first few prime numbers, used for trial division before the probabilistic test.
const SMALL_PRIMES: [u64; 54] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// The number of rounds of the Miller-Rabin test.
const ROUNDS: usize = 12;

/// Computes `a * b (mod m)`.
#[inline]
fn mulmod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// Computes `base ^ e (mod m)`.
fn powmod(base: u64, mut e: u64, m: u64) -> u64 {
    let mut result = 1;
    let mut base = base % m;
    while e > 0 {
        if e & 1 == 1 {
            result = mulmod(result, base, m);
        }
        e >>= 1;
        base = mulmod(base, base, m);
    }
    result
}

/// Returns whether `n` is likely to be a prime number.
///
/// Uses trial division by small primes followed by a Miller-Rabin test with random witnesses.
pub fn is_prime(n: u64, rng: &mut impl Rng) -> bool {
    if n < 2 {
        return false;
    }

    for &p in SMALL_PRIMES.iter() {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }

    // n - 1 = d * 2^s with d odd.
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;

    'witness: for _ in 0..ROUNDS {
        let a = rng.next_u64() % (n - 3) + 2;
        let mut x = powmod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }

        for _ in 1..s {
            x = mulmod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }

        return false;
    }

    true
}

/// Generates a random prime number.
///
/// # Remarks
///
/// The returned number is only *likely* to be prime, but it is not strictly guaranteed. For all
/// practical purposes, this is good enough.
pub fn generate_prime(rng: &mut impl Rng) -> u64 {
    loop {
        // Only odd candidates with the top bit set.
        let n = rng.next_u64() | (1 << 63) | 1;

        if is_prime(n, rng) {
            return n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefaultRng;

    #[test]
    fn known_values() {
        let mut rng = DefaultRng::from_seed(11);
        for p in [2, 3, 5, 251, 257, 65_537, 2_147_483_647, 18_446_744_073_709_551_557] {
            assert!(is_prime(p, &mut rng), "{p} is prime");
        }
        for c in [0, 1, 4, 255, 65_535, 561, 3_215_031_751, 18_446_744_073_709_551_615] {
            assert!(!is_prime(c, &mut rng), "{c} is composite");
        }
    }

    #[test]
    fn generated_primes_are_odd_and_large() {
        let mut rng = DefaultRng::from_seed(1);
        let p = generate_prime(&mut rng);
        assert_eq!(p & 1, 1);
        assert!(p >= 1 << 63);
    }
}
