use std::{ops::Index, sync::Arc};

use dbfv_math::rq::Poly;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::shares::{Grid, ShareShape};
use crate::RkgParameters;

/// A matrix of polynomials sampled from a random _common reference string_,
/// one per modulus index and decomposition level.
///
/// All the parties of a run must use the same matrix. The polynomials are
/// interpreted in NTT form.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CommonRandomMatrix<E> {
    pub(crate) grid: Grid<E>,
}

impl<E> CommonRandomMatrix<E> {
    /// Build a matrix from elements agreed upon out of band; `f(i, w)` is
    /// the element at modulus index `i` and level `w`.
    pub fn from_fn<F: FnMut(usize, usize) -> E>(shape: ShareShape, f: F) -> Self {
        Self {
            grid: Grid::from_fn(shape, f),
        }
    }

    /// The shape of the matrix.
    pub fn shape(&self) -> ShareShape {
        self.grid.shape()
    }

    /// The element at `(i, w)`, if it exists.
    pub fn get(&self, i: usize, w: usize) -> Option<&E> {
        self.grid.get(i, w)
    }
}

impl<E> Index<(usize, usize)> for CommonRandomMatrix<E> {
    type Output = E;

    fn index(&self, index: (usize, usize)) -> &E {
        &self.grid[index]
    }
}

impl CommonRandomMatrix<Poly> {
    /// Generate a new random matrix.
    pub fn new<R: RngCore + CryptoRng>(par: &Arc<RkgParameters>, rng: &mut R) -> Self {
        let shape = ShareShape::new(par.moduli().len(), par.levels());
        Self::from_fn(shape, |_, _| par.ctx().poly_random(&mut *rng))
    }

    /// Generate a new matrix from a shared deterministic seed.
    pub fn new_deterministic(
        par: &Arc<RkgParameters>,
        seed: <ChaCha8Rng as SeedableRng>::Seed,
    ) -> Self {
        let mut rng = ChaCha8Rng::from_seed(seed);
        Self::new(par, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::CommonRandomMatrix;
    use crate::{rkg::ShareShape, RkgParametersBuilder};
    use rand::thread_rng;
    use std::error::Error;

    #[test]
    fn shape() -> Result<(), Box<dyn Error>> {
        let par = RkgParametersBuilder::new()
            .set_degree(16)
            .set_moduli_sizes(&[55, 55])
            .set_bit_decomposition(20)
            .build_arc()?;
        let crp = CommonRandomMatrix::new(&par, &mut thread_rng());
        assert_eq!(crp.shape(), ShareShape::new(2, 3));
        assert_ne!(crp[(0, 0)], crp[(1, 2)]);
        assert!(crp.get(2, 0).is_none());
        Ok(())
    }

    #[test]
    fn deterministic() {
        let par = crate::RkgParameters::default_arc(2, 16);
        let a = CommonRandomMatrix::new_deterministic(&par, [1u8; 32]);
        let b = CommonRandomMatrix::new_deterministic(&par, [1u8; 32]);
        let c = CommonRandomMatrix::new_deterministic(&par, [2u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn from_fn() {
        let crp = CommonRandomMatrix::from_fn(ShareShape::new(2, 2), |i, w| 10 * i + w);
        assert_eq!(crp[(1, 1)], 11);
        assert_eq!(crp[(0, 1)], 1);
    }
}
