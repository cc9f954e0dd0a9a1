use crate::zq::Modulus;
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::iter::successors;

/// Negacyclic Number-Theoretic Transform operator for one prime modulus.
///
/// The forward transform outputs the evaluations in bit-reversed order;
/// coefficient-wise products in that domain are products in
/// `Z_p[x]/(x^n + 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttOperator {
    p: Modulus,
    size: usize,
    omegas: Box<[u64]>,
    omegas_shoup: Box<[u64]>,
    zetas_inv: Box<[u64]>,
    zetas_inv_shoup: Box<[u64]>,
    size_inv: u64,
    size_inv_shoup: u64,
}

impl NttOperator {
    /// Create an NTT operator given a modulus for a specific size.
    ///
    /// Aborts if the size is not a power of 2 that is >= 8 in debug mode.
    /// Returns None if the modulus does not support the NTT for this specific
    /// size.
    pub fn new(p: &Modulus, size: usize) -> Option<Self> {
        if !super::supports_ntt(p.p, size) {
            None
        } else {
            let size_inv = p.inv(size as u64)?;

            let omega = Self::primitive_root(size, p)?;
            let omega_inv = p.inv(omega)?;

            let powers = successors(Some(1u64), |n| Some(p.mul(*n, omega)))
                .take(size)
                .collect_vec();
            let powers_inv = successors(Some(omega_inv), |n| Some(p.mul(*n, omega_inv)))
                .take(size)
                .collect_vec();

            let mut omegas = Vec::with_capacity(size);
            let mut zetas_inv = Vec::with_capacity(size);
            for i in 0..size {
                let j = i.reverse_bits() >> (size.leading_zeros() + 1);
                omegas.push(powers[j]);
                zetas_inv.push(powers_inv[j]);
            }

            let omegas_shoup = p.shoup_vec(&omegas);
            let zetas_inv_shoup = p.shoup_vec(&zetas_inv);

            Some(Self {
                p: p.clone(),
                size,
                omegas: omegas.into_boxed_slice(),
                omegas_shoup: omegas_shoup.into_boxed_slice(),
                zetas_inv: zetas_inv.into_boxed_slice(),
                zetas_inv_shoup: zetas_inv_shoup.into_boxed_slice(),
                size_inv,
                size_inv_shoup: p.shoup(size_inv),
            })
        }
    }

    /// Size of the transform.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Compute the forward NTT in place.
    /// Aborts if a is not of the size handled by the operator.
    pub fn forward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.size);

        let mut l = self.size >> 1;
        let mut m = 1;
        let mut k = 1;
        while l > 0 {
            for i in 0..m {
                let omega = self.omegas[k];
                let omega_shoup = self.omegas_shoup[k];
                k += 1;

                let s = 2 * i * l;
                let (left, right) = a[s..s + 2 * l].split_at_mut(l);
                for (x, y) in left.iter_mut().zip(right.iter_mut()) {
                    self.butterfly(x, y, omega, omega_shoup);
                }
            }
            l >>= 1;
            m <<= 1;
        }
    }

    /// Compute the backward NTT in place.
    /// Aborts if a is not of the size handled by the operator.
    pub fn backward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.size);

        let mut k = 0;
        let mut m = self.size >> 1;
        let mut l = 1;
        while m > 0 {
            for i in 0..m {
                let zeta_inv = self.zetas_inv[k];
                let zeta_inv_shoup = self.zetas_inv_shoup[k];
                k += 1;

                let s = 2 * i * l;
                let (left, right) = a[s..s + 2 * l].split_at_mut(l);
                for (x, y) in left.iter_mut().zip(right.iter_mut()) {
                    self.inv_butterfly(x, y, zeta_inv, zeta_inv_shoup);
                }
            }
            l <<= 1;
            m >>= 1;
        }

        a.iter_mut()
            .for_each(|ai| *ai = self.p.mul_shoup(*ai, self.size_inv, self.size_inv_shoup));
    }

    /// NTT Butterfly.
    fn butterfly(&self, x: &mut u64, y: &mut u64, w: u64, w_shoup: u64) {
        debug_assert!(*x < self.p.p);
        debug_assert!(*y < self.p.p);

        let t = self.p.mul_shoup(*y, w, w_shoup);
        *y = self.p.sub(*x, t);
        *x = self.p.add(*x, t);
    }

    /// Inverse NTT butterfly.
    fn inv_butterfly(&self, x: &mut u64, y: &mut u64, z: u64, z_shoup: u64) {
        debug_assert!(*x < self.p.p);
        debug_assert!(*y < self.p.p);

        let t = *x;
        *x = self.p.add(t, *y);
        *y = self.p.mul_shoup(self.p.sub(t, *y), z, z_shoup);
    }

    /// Returns a 2n-th primitive root modulo p.
    ///
    /// Returns None if no root is found, which happens when p is not prime or
    /// n is not a power of 2 that is >= 8.
    fn primitive_root(n: usize, p: &Modulus) -> Option<u64> {
        let lambda = (p.p - 1) / (2 * n as u64);

        let mut rng: ChaCha8Rng = SeedableRng::seed_from_u64(0);
        for _ in 0..100 {
            let mut root = rng.gen_range(0..p.p);
            root = p.pow(root, lambda);
            if Self::is_primitive_root(root, 2 * n, p) {
                return Some(root);
            }
        }

        None
    }

    /// Returns whether a is a n-th primitive root of unity.
    fn is_primitive_root(a: u64, n: usize, p: &Modulus) -> bool {
        debug_assert!(a < p.p);

        // A primitive root of unity is such that x^n = 1 mod p, and x^(n/p) != 1 mod p
        // for all prime p dividing n.
        (p.pow(a, n as u64) == 1) && (p.pow(a, (n / 2) as u64) != 1)
    }
}
