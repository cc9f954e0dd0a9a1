use dbfv_traits::RingArithmetic;
use itertools::{izip, Itertools};
use ndarray::Array2;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{fmt::Debug, sync::Arc};

use super::Poly;
use crate::{ntt::NttOperator, zq::Modulus, Error, Result};

/// Struct that holds the context associated with elements in rq.
#[derive(Clone, PartialEq, Eq)]
pub struct Context {
    /// List of prime moduli
    pub(crate) moduli: Box<[u64]>,
    /// Modulus operators for each prime
    pub(crate) q: Box<[Modulus]>,
    /// NTT operators for each prime
    pub(crate) ops: Box<[NttOperator]>,
    /// Polynomial degree (must be power of 2)
    pub(crate) degree: usize,
    /// Product of the moduli
    modulus: BigUint,
    /// (Q/qi)·[(Q/qi)^{-1}]_qi mod Q, for CRT reconstruction
    garner: Box<[BigUint]>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("moduli", &self.moduli)
            .field("degree", &self.degree)
            .finish()
    }
}

impl Context {
    /// Creates a context from a list of moduli and a polynomial degree.
    ///
    /// Returns an error if the moduli are not distinct primes less than 62
    /// bits which support the NTT of size `degree`.
    pub fn new(moduli: &[u64], degree: usize) -> Result<Self> {
        if !degree.is_power_of_two() || degree < 8 {
            return Err(Error::Default(
                "The degree is not a power of two larger or equal to 8".to_string(),
            ));
        }
        if moduli.is_empty() {
            return Err(Error::Default("At least one modulus is required".to_string()));
        }

        let mut q = Vec::with_capacity(moduli.len());
        let mut ops = Vec::with_capacity(moduli.len());
        for modulus in moduli {
            let qi = Modulus::new(*modulus)?;
            if let Some(op) = NttOperator::new(&qi, degree) {
                q.push(qi);
                ops.push(op);
            } else {
                return Err(Error::Default(
                    "Impossible to construct a Ntt operator".to_string(),
                ));
            }
        }

        let modulus: BigUint = moduli.iter().map(|qi| BigUint::from(*qi)).product();
        let mut garner = Vec::with_capacity(moduli.len());
        for (qi, modulus_i) in izip!(q.iter(), moduli.iter()) {
            let q_hat = &modulus / *modulus_i;
            let q_hat_mod_qi = (&q_hat % *modulus_i).to_u64().unwrap_or_default();
            let q_tilde = qi
                .inv(q_hat_mod_qi)
                .ok_or_else(|| Error::Default("The moduli are not distinct".to_string()))?;
            garner.push((q_hat * q_tilde) % &modulus);
        }

        Ok(Self {
            moduli: moduli.to_owned().into_boxed_slice(),
            q: q.into_boxed_slice(),
            ops: ops.into_boxed_slice(),
            degree,
            modulus,
            garner: garner.into_boxed_slice(),
        })
    }

    /// Creates a context in an `Arc`.
    pub fn new_arc(moduli: &[u64], degree: usize) -> Result<Arc<Self>> {
        Self::new(moduli, degree).map(Arc::new)
    }

    /// Returns the modulus as a BigUint.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Returns a reference to the moduli as Modulus in this context.
    pub fn moduli_operators(&self) -> &[Modulus] {
        &self.q
    }

    /// Create a polynomial in power basis from small signed coefficients.
    ///
    /// Returns [`Error::InvalidContext`] if there are not exactly `degree`
    /// coefficients.
    pub fn poly_from_i64(&self, coefficients: &[i64]) -> Result<Poly> {
        let mut p = self.zero();
        self.lift_i64_into(coefficients, &mut p)?;
        Ok(p)
    }

    /// Create a polynomial in power basis from coefficients modulo the
    /// product of the moduli.
    pub fn poly_from_biguint(&self, coefficients: &[BigUint]) -> Result<Poly> {
        if coefficients.len() != self.degree {
            return Err(Error::InvalidContext);
        }
        let mut p = self.zero();
        for (mut row, qi) in izip!(p.coefficients.outer_iter_mut(), self.moduli.iter()) {
            for (c, x) in izip!(row.iter_mut(), coefficients.iter()) {
                *c = (x % *qi)
                    .to_u64()
                    .ok_or_else(|| Error::Default("Residue does not fit in u64".to_string()))?;
            }
        }
        Ok(p)
    }

    /// CRT reconstruction of the coefficients of a polynomial, in [0, Q).
    pub fn poly_to_biguint(&self, p: &Poly) -> Vec<BigUint> {
        debug_assert_eq!(p.num_moduli(), self.moduli.len());
        (0..self.degree)
            .map(|j| {
                let sum: BigUint = izip!(self.garner.iter(), p.coefficients.outer_iter())
                    .map(|(g, row)| g * row[j])
                    .sum();
                sum % &self.modulus
            })
            .collect_vec()
    }

    /// Sample a uniformly random polynomial. Its distribution is the same in
    /// power basis and in NTT form.
    pub fn poly_random<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Poly {
        let mut p = self.zero();
        for (mut row, qi) in izip!(p.coefficients.outer_iter_mut(), self.q.iter()) {
            for (c, r) in izip!(row.iter_mut(), qi.random_vec(self.degree, rng)) {
                *c = r
            }
        }
        p
    }

    /// Sample a uniformly random polynomial deterministically from a seed.
    pub fn poly_random_from_seed(&self, seed: <ChaCha8Rng as SeedableRng>::Seed) -> Poly {
        let mut rng = ChaCha8Rng::from_seed(seed);
        self.poly_random(&mut rng)
    }

    /// Forward NTT of every residue, in place.
    pub fn ntt_forward(&self, p: &mut Poly) {
        for (i, op) in self.ops.iter().enumerate() {
            op.forward(p.residue_mut(i))
        }
    }

    /// Backward NTT of every residue, in place.
    pub fn ntt_backward(&self, p: &mut Poly) {
        for (i, op) in self.ops.iter().enumerate() {
            op.backward(p.residue_mut(i))
        }
    }

    /// Conversion out of Montgomery form, in place.
    pub fn inv_mform(&self, p: &mut Poly) {
        for (i, qi) in self.q.iter().enumerate() {
            qi.from_mont_vec(p.residue_mut(i))
        }
    }

    /// Write small signed coefficients into every residue of `out`.
    pub(crate) fn lift_i64_into(&self, coefficients: &[i64], out: &mut Poly) -> Result<()> {
        if coefficients.len() != self.degree {
            return Err(Error::InvalidContext);
        }
        for (mut row, qi) in izip!(out.coefficients.outer_iter_mut(), self.q.iter()) {
            for (c, x) in izip!(row.iter_mut(), coefficients.iter()) {
                *c = qi.reduce_i64(*x)
            }
        }
        Ok(())
    }
}

impl RingArithmetic for Context {
    type Element = Poly;

    fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    fn degree(&self) -> usize {
        self.degree
    }

    fn zero(&self) -> Poly {
        Poly {
            coefficients: Array2::zeros((self.moduli.len(), self.degree)),
        }
    }

    fn add(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for (mut o, a, b, qi) in izip!(
            out.coefficients.outer_iter_mut(),
            a.coefficients.outer_iter(),
            b.coefficients.outer_iter(),
            self.q.iter()
        ) {
            izip!(o.iter_mut(), a.iter(), b.iter()).for_each(|(o, a, b)| *o = qi.add(*a, *b));
        }
    }

    fn add_assign(&self, out: &mut Poly, b: &Poly) {
        for (mut o, b, qi) in izip!(
            out.coefficients.outer_iter_mut(),
            b.coefficients.outer_iter(),
            self.q.iter()
        ) {
            izip!(o.iter_mut(), b.iter()).for_each(|(o, b)| *o = qi.add(*o, *b));
        }
    }

    fn sub(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for (mut o, a, b, qi) in izip!(
            out.coefficients.outer_iter_mut(),
            a.coefficients.outer_iter(),
            b.coefficients.outer_iter(),
            self.q.iter()
        ) {
            izip!(o.iter_mut(), a.iter(), b.iter()).for_each(|(o, a, b)| *o = qi.sub(*a, *b));
        }
    }

    fn mul_montgomery(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for (mut o, a, b, qi) in izip!(
            out.coefficients.outer_iter_mut(),
            a.coefficients.outer_iter(),
            b.coefficients.outer_iter(),
            self.q.iter()
        ) {
            izip!(o.iter_mut(), a.iter(), b.iter())
                .for_each(|(o, a, b)| *o = qi.mul_mont(*a, *b));
        }
    }

    fn mul_montgomery_and_add(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for (mut o, a, b, qi) in izip!(
            out.coefficients.outer_iter_mut(),
            a.coefficients.outer_iter(),
            b.coefficients.outer_iter(),
            self.q.iter()
        ) {
            izip!(o.iter_mut(), a.iter(), b.iter())
                .for_each(|(o, a, b)| *o = qi.add(*o, qi.mul_mont(*a, *b)));
        }
    }

    fn mul_montgomery_and_sub(&self, a: &Poly, b: &Poly, out: &mut Poly) {
        for (mut o, a, b, qi) in izip!(
            out.coefficients.outer_iter_mut(),
            a.coefficients.outer_iter(),
            b.coefficients.outer_iter(),
            self.q.iter()
        ) {
            izip!(o.iter_mut(), a.iter(), b.iter())
                .for_each(|(o, a, b)| *o = qi.sub(*o, qi.mul_mont(*a, *b)));
        }
    }

    fn mform(&self, a: &mut Poly) {
        for (i, qi) in self.q.iter().enumerate() {
            qi.to_mont_vec(a.residue_mut(i))
        }
    }

    fn power_of_2(&self, x: u64, bits: u32, modulus_index: usize) -> u64 {
        self.q[modulus_index].power_of_2(x, bits)
    }

    fn add_power_of_2(&self, a: &Poly, bits: u32, modulus_index: usize, out: &mut Poly) {
        let qi = &self.q[modulus_index];
        let a = a.residue(modulus_index);
        izip!(out.residue_mut(modulus_index).iter_mut(), a.iter())
            .for_each(|(o, a)| *o = qi.add(*o, qi.power_of_2(*a, bits)));
    }
}
