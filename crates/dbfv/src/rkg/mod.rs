//! Collective relinearization key generation.
//!
//! Each party holds an additive share `s_p` of the secret key `s = Σ s_p`.
//! The parties run three rounds; after each round, the shares of all the
//! parties are aggregated (in any order) and the aggregate is sent back to
//! every party. The final [`crate::RelinearizationKey`] is assembled from the
//! aggregates of the second and third rounds:
//!
//! 1. with a fresh ephemeral key `u_p`, each party computes
//!    `-u_p·a + s_p·g + e`, aggregated into `h = -u·a + s·g + e`;
//! 2. each party computes `(h·s_p + e, s_p·a + e')`, aggregated into
//!    `(h·s + e, s·a + e')`;
//! 3. each party computes `(u_p - s_p)·(s·a + e') + e''`.
//!
//! Here `a` is the [`CommonRandomMatrix`] and `g` the gadget vector: the
//! element at `(i, w)` is `2^(w·b)` on the residue modulo the i-th modulus
//! and zero on the others, where `b` is the number of bits of a digit.

mod crp;
mod protocol;
mod scratch;
mod shares;

pub use crp::CommonRandomMatrix;
pub use protocol::RkgProtocol;
pub use shares::{RoundOneShare, RoundThreeShare, RoundTwoShare, ShareShape};

pub(crate) use shares::Grid;

/// Number of bits of a residue covered by the gadget decomposition.
pub const MAX_DECOMPOSITION_BITS: usize = 60;

/// Number of decomposition levels for digits of `bit_decomposition` bits:
/// `ceil(60 / bit_decomposition)`.
///
/// Panics if `bit_decomposition` is zero.
pub const fn decomposition_levels(bit_decomposition: usize) -> usize {
    assert!(bit_decomposition > 0, "the digit size must be positive");
    MAX_DECOMPOSITION_BITS.div_ceil(bit_decomposition)
}
