//! Relinearization key produced by the collective key generation.

use std::ops::Index;

use crate::rkg::{Grid, ShareShape};

/// A relinearization key: for every modulus index `i` and decomposition level
/// `w`, a pair `(k0, k1)` such that `k0 + s·k1` is `s²·2^(w·b)` on the residue
/// modulo the i-th modulus, zero on the others, plus a small error.
///
/// Both components are stored in NTT and Montgomery form, ready to be
/// multiplied with decomposed digits in regular form. A key is only ever
/// populated by [`crate::rkg::RkgProtocol::gen_relinearization_key`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RelinearizationKey<E> {
    pub(crate) grid: Grid<[E; 2]>,
}

impl<E> RelinearizationKey<E> {
    /// The shape of the key.
    pub fn shape(&self) -> ShareShape {
        self.grid.shape()
    }

    /// The pair of elements at `(i, w)`, if it exists.
    pub fn get(&self, i: usize, w: usize) -> Option<&[E; 2]> {
        self.grid.get(i, w)
    }

    /// Iterate over the pairs and their `(i, w)` coordinates.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &[E; 2])> {
        self.grid.iter()
    }
}

impl<E> Index<(usize, usize)> for RelinearizationKey<E> {
    type Output = [E; 2];

    fn index(&self, index: (usize, usize)) -> &[E; 2] {
        &self.grid[index]
    }
}
