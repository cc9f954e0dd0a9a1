#![crate_name = "dbfv_traits"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Capability traits consumed by the collective key generation protocols.
//!
//! The protocols never touch coefficients directly: every arithmetic step
//! goes through a [`RingArithmetic`] provider and every random element comes
//! from a [`PolySampler`]. Both are injected into the protocol engines, so a
//! reference ring, an optimized ring or a deterministic test double can be
//! substituted without changing protocol code.

use rand::{CryptoRng, RngCore};
use std::fmt::Debug;
use zeroize::Zeroize;

/// Arithmetic over a polynomial ring in double-CRT representation.
///
/// Elements hold one residue per modulus of [`RingArithmetic::moduli`], and
/// may carry secret material: they must be erasable with [`Zeroize`].
/// Operations borrow their operands and write into an explicit output; none
/// of them allocate except [`RingArithmetic::zero`].
///
/// The Montgomery operations follow the usual convention: if `a` is in
/// Montgomery form (`a·R`) and `b` is not, their Montgomery product is the
/// regular-form product `a·b`.
pub trait RingArithmetic: Send + Sync {
    /// The ring element type.
    type Element: Clone + Debug + PartialEq + Send + Sync + Zeroize;

    /// The ordered list of CRT moduli.
    fn moduli(&self) -> &[u64];

    /// The polynomial degree.
    fn degree(&self) -> usize;

    /// Allocate a new element with all residues equal to zero.
    fn zero(&self) -> Self::Element;

    /// out = a + b
    fn add(&self, a: &Self::Element, b: &Self::Element, out: &mut Self::Element);

    /// out += b
    fn add_assign(&self, out: &mut Self::Element, b: &Self::Element);

    /// out = a - b
    fn sub(&self, a: &Self::Element, b: &Self::Element, out: &mut Self::Element);

    /// out = a ∘ b, coefficient-wise Montgomery product.
    fn mul_montgomery(&self, a: &Self::Element, b: &Self::Element, out: &mut Self::Element);

    /// out += a ∘ b, coefficient-wise Montgomery product.
    fn mul_montgomery_and_add(
        &self,
        a: &Self::Element,
        b: &Self::Element,
        out: &mut Self::Element,
    );

    /// out -= a ∘ b, coefficient-wise Montgomery product.
    fn mul_montgomery_and_sub(
        &self,
        a: &Self::Element,
        b: &Self::Element,
        out: &mut Self::Element,
    );

    /// Convert an element into Montgomery form, in place.
    fn mform(&self, a: &mut Self::Element);

    /// Digit shift of a single coefficient `x` of the residue modulo the
    /// `modulus_index`-th modulus: Montgomery reduction of `x·2^bits`.
    ///
    /// A Montgomery-form `x = s·R` is therefore mapped to the regular-form
    /// `s·2^bits`. `bits` must be smaller than 64.
    fn power_of_2(&self, x: u64, bits: u32, modulus_index: usize) -> u64;

    /// For every coefficient `j` of the residue modulo the
    /// `modulus_index`-th modulus only, `out[j] += power_of_2(a[j], bits)`.
    /// The other residues of `out` are left untouched.
    fn add_power_of_2(
        &self,
        a: &Self::Element,
        bits: u32,
        modulus_index: usize,
        out: &mut Self::Element,
    );
}

/// Random sampling of ring elements for a given [`RingArithmetic`].
///
/// Randomness is always supplied by the caller, so that a provider holds no
/// mutable state and can be shared between threads.
pub trait PolySampler<R: RingArithmetic + ?Sized>: Send + Sync {
    /// The error returned by fallible sampling.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sample a new element with ternary coefficients: 0 with probability
    /// `1 - p`, and ±1 with probability `p / 2` each. The element is returned
    /// in NTT and Montgomery form.
    ///
    /// Returns an error if `p` is not an acceptable probability.
    fn sample_ternary<G: RngCore + CryptoRng>(
        &self,
        ring: &R,
        p: f64,
        rng: &mut G,
    ) -> Result<R::Element, Self::Error>;

    /// Overwrite `out` with fresh discrete Gaussian noise, in NTT form.
    fn sample_gaussian<G: RngCore + CryptoRng>(
        &self,
        ring: &R,
        out: &mut R::Element,
        rng: &mut G,
    );
}
