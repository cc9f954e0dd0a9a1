//! Ring operations for moduli less than 2^62.

use crate::{Error, Result};
use rand::{
    distributions::{Distribution, Uniform},
    CryptoRng, RngCore,
};

/// Structure encapsulating an odd integer modulus up to 62 bits, with the
/// precomputed constants for Shoup and Montgomery multiplication.
///
/// Montgomery arithmetic uses `R = 2^64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modulus {
    pub(crate) p: u64,
    /// -p^{-1} mod 2^64
    mont_p_inv: u64,
    /// R^2 mod p
    mont_r2: u64,
}

impl Modulus {
    /// Create a modulus from an odd integer of at most 62 bits.
    pub fn new(p: u64) -> Result<Self> {
        if p < 3 || p >> 62 != 0 || p & 1 == 0 {
            Err(Error::InvalidModulus(p))
        } else {
            // Newton iteration: every step doubles the number of correct low
            // bits, starting from 3 since p·p = 1 mod 8 for odd p.
            let mut inv = p;
            for _ in 0..5 {
                inv = inv.wrapping_mul(2u64.wrapping_sub(p.wrapping_mul(inv)));
            }
            debug_assert_eq!(p.wrapping_mul(inv), 1);

            let r = ((1u128 << 64) % (p as u128)) as u64;
            let mont_r2 = ((r as u128 * r as u128) % (p as u128)) as u64;

            Ok(Self {
                p,
                mont_p_inv: inv.wrapping_neg(),
                mont_r2,
            })
        }
    }

    /// Returns the value of the modulus.
    pub const fn modulus(&self) -> u64 {
        self.p
    }

    /// Modular addition of a and b in constant time.
    ///
    /// Aborts if a >= p or b >= p in debug mode.
    pub const fn add(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        Self::reduce1(a + b, self.p)
    }

    /// Modular subtraction of a and b in constant time.
    ///
    /// Aborts if a >= p or b >= p in debug mode.
    pub const fn sub(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        Self::reduce1(a + self.p - b, self.p)
    }

    /// Modular negation in constant time.
    ///
    /// Aborts if a >= p in debug mode.
    pub const fn neg(&self, a: u64) -> u64 {
        debug_assert!(a < self.p);
        Self::reduce1(self.p - a, self.p)
    }

    /// Modular multiplication of a and b.
    pub const fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % (self.p as u128)) as u64
    }

    /// Modular reduction of a.
    pub const fn reduce(&self, a: u64) -> u64 {
        a % self.p
    }

    /// Modular reduction of a signed integer.
    pub const fn reduce_i64(&self, a: i64) -> u64 {
        a.rem_euclid(self.p as i64) as u64
    }

    /// Centered representative of a, in (-p/2, p/2].
    ///
    /// Aborts if a >= p in debug mode.
    pub const fn center(&self, a: u64) -> i64 {
        debug_assert!(a < self.p);
        if a > self.p >> 1 {
            a as i64 - self.p as i64
        } else {
            a as i64
        }
    }

    /// Modular exponentiation.
    pub const fn pow(&self, a: u64, n: u64) -> u64 {
        let mut r = 1 % self.p;
        let mut base = a % self.p;
        let mut n = n;
        while n > 0 {
            if n & 1 == 1 {
                r = self.mul(r, base);
            }
            base = self.mul(base, base);
            n >>= 1;
        }
        r
    }

    /// Modular inverse of a, assuming the modulus is prime.
    ///
    /// Returns None if a = 0 mod p.
    pub const fn inv(&self, a: u64) -> Option<u64> {
        if a % self.p == 0 {
            None
        } else {
            Some(self.pow(a, self.p - 2))
        }
    }

    /// Shoup representation of a value.
    ///
    /// Aborts if a >= p in debug mode.
    pub const fn shoup(&self, a: u64) -> u64 {
        debug_assert!(a < self.p);
        (((a as u128) << 64) / (self.p as u128)) as u64
    }

    /// Shoup representation of a vector.
    pub fn shoup_vec(&self, a: &[u64]) -> Vec<u64> {
        a.iter().map(|ai| self.shoup(*ai)).collect()
    }

    /// Lazy Shoup multiplication of a and b; the output is in [0, 2p).
    ///
    /// Aborts if b >= p or b_shoup != shoup(b) in debug mode.
    pub const fn lazy_mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
        debug_assert!(b < self.p);
        let q = ((a as u128 * b_shoup as u128) >> 64) as u64;
        a.wrapping_mul(b).wrapping_sub(q.wrapping_mul(self.p))
    }

    /// Shoup multiplication of a and b.
    ///
    /// Aborts if b >= p or b_shoup != shoup(b) in debug mode.
    pub const fn mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
        Self::reduce1(self.lazy_mul_shoup(a, b, b_shoup), self.p)
    }

    /// Montgomery reduction: returns x·R^{-1} mod p.
    ///
    /// Aborts if x >= p·R in debug mode.
    pub const fn mont_reduce(&self, x: u128) -> u64 {
        debug_assert!(x < (self.p as u128) << 64);
        let m = (x as u64).wrapping_mul(self.mont_p_inv);
        let t = ((x + (m as u128) * (self.p as u128)) >> 64) as u64;
        Self::reduce1(t, self.p)
    }

    /// Montgomery multiplication: returns a·b·R^{-1} mod p.
    pub const fn mul_mont(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        self.mont_reduce(a as u128 * b as u128)
    }

    /// Conversion into Montgomery form: returns a·R mod p.
    pub const fn to_mont(&self, a: u64) -> u64 {
        self.mul_mont(a, self.mont_r2)
    }

    /// Conversion out of Montgomery form: returns a·R^{-1} mod p.
    pub const fn from_mont(&self, a: u64) -> u64 {
        self.mont_reduce(a as u128)
    }

    /// Digit shift: returns x·2^bits·R^{-1} mod p.
    ///
    /// For x = s·R in Montgomery form, this is s·2^bits in regular form.
    /// Aborts if bits >= 64 or x >= p in debug mode.
    pub const fn power_of_2(&self, x: u64, bits: u32) -> u64 {
        debug_assert!(bits < 64);
        debug_assert!(x < self.p);
        self.mont_reduce((x as u128) << bits)
    }

    /// Conversion of a vector into Montgomery form, in place.
    pub fn to_mont_vec(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|ai| *ai = self.to_mont(*ai));
    }

    /// Conversion of a vector out of Montgomery form, in place.
    pub fn from_mont_vec(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|ai| *ai = self.from_mont(*ai));
    }

    /// Sample a vector of uniformly random values modulo p.
    pub fn random_vec<R: RngCore + CryptoRng>(&self, size: usize, rng: &mut R) -> Vec<u64> {
        let distribution = Uniform::from(0..self.p);
        (0..size).map(|_| distribution.sample(rng)).collect()
    }

    /// Return x mod p in constant time.
    /// Aborts if x >= 2 * p in debug mode.
    pub(crate) const fn reduce1(x: u64, p: u64) -> u64 {
        debug_assert!(p >> 63 == 0);
        debug_assert!(x < 2 * p);

        let (y, borrow) = x.overflowing_sub(p);
        let mask = (borrow as u64).wrapping_neg();
        (x & mask) | (y & !mask)
    }
}
