//! Polynomials in R_q\[x\] = (ZZ_q1 x ... x ZZ_qn)\[x\] where the qi's are
//! prime moduli in zq.

mod context;
mod sampler;

pub use context::Context;
pub use sampler::Sampler;

use ndarray::{Array2, ArrayView1, ArrayView2};
use zeroize::Zeroize;

/// A polynomial in double-CRT representation: one residue per modulus of the
/// [`Context`] that created it.
///
/// A `Poly` does not record whether its residues are in power basis or NTT
/// form, nor whether they are in Montgomery form; this is the convention of
/// the code that produced it. All arithmetic is provided by the [`Context`]
/// through [`dbfv_traits::RingArithmetic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
    pub(crate) coefficients: Array2<u64>,
}

impl Poly {
    /// Access the polynomial coefficients, one row per modulus.
    pub fn coefficients(&self) -> ArrayView2<'_, u64> {
        self.coefficients.view()
    }

    /// Access the residue modulo the i-th modulus.
    ///
    /// Panics if i is not a valid modulus index.
    pub fn residue(&self, i: usize) -> ArrayView1<'_, u64> {
        self.coefficients.row(i)
    }

    /// Number of residues of the polynomial.
    pub fn num_moduli(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Degree of the polynomial.
    pub fn degree(&self) -> usize {
        self.coefficients.ncols()
    }

    pub(crate) fn residue_mut(&mut self, i: usize) -> &mut [u64] {
        self.coefficients
            .row_mut(i)
            .into_slice()
            .expect("polynomial residues are stored contiguously")
    }
}

impl Zeroize for Poly {
    fn zeroize(&mut self) {
        self.coefficients.iter_mut().for_each(|c| c.zeroize());
    }
}

#[cfg(test)]
mod tests {
    use super::Context;
    use dbfv_traits::RingArithmetic;
    use zeroize::Zeroize;

    #[test]
    fn shape_and_zeroize() {
        let ctx = Context::new(&[1153, 1099511480321], 16).unwrap();
        let mut p = ctx.poly_from_i64(&[1; 16]).unwrap();
        assert_eq!(p.num_moduli(), 2);
        assert_eq!(p.degree(), 16);
        assert!(p.residue(1).iter().all(|c| *c == 1));

        p.zeroize();
        assert_eq!(p, ctx.zero());
    }
}
