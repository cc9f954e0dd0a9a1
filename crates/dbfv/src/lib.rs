#![crate_name = "dbfv"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Collective relinearization key generation for distributed BFV.
//!
//! A set of parties, each holding an additive share of a BFV secret key,
//! jointly produce a relinearization key for the combined secret without
//! reconstructing it. The protocol is secure against semi-honest parties.
//!
//! The protocol engine [`rkg::RkgProtocol`] is generic over the ring
//! arithmetic and the samplers of [`dbfv_traits`]; [`RkgParameters`] builds
//! the reference ring of [`dbfv_math`].
//!
//! ```
//! use dbfv::{rkg::{CommonRandomMatrix, RkgProtocol}, RkgParametersBuilder};
//! use dbfv_traits::PolySampler;
//! use rand::thread_rng;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let par = RkgParametersBuilder::new()
//!     .set_degree(16)
//!     .set_moduli_sizes(&[55, 55])
//!     .set_bit_decomposition(20)
//!     .build_arc()?;
//! let mut rng = thread_rng();
//! let crp = CommonRandomMatrix::new_deterministic(&par, [0u8; 32]);
//! let engine = RkgProtocol::from_parameters(&par);
//!
//! // Two parties with secret key shares s1 and s2.
//! let s1 = par.sampler().sample_ternary(par.ctx().as_ref(), 0.5, &mut rng)?;
//! let s2 = par.sampler().sample_ternary(par.ctx().as_ref(), 0.5, &mut rng)?;
//! let u1 = engine.new_ephemeral_key(0.5, &mut rng)?;
//! let u2 = engine.new_ephemeral_key(0.5, &mut rng)?;
//!
//! let (mut a1, mut a2, mut a3) = engine.allocate_shares();
//! let (mut b1, mut b2, mut b3) = engine.allocate_shares();
//!
//! engine.gen_share_round_one(&u1, &s1, &crp, &mut a1, &mut rng)?;
//! engine.gen_share_round_one(&u2, &s2, &crp, &mut b1, &mut rng)?;
//! engine.accumulate_round_one(&mut a1, &b1)?;
//!
//! engine.gen_share_round_two(&a1, &s1, &crp, &mut a2, &mut rng)?;
//! engine.gen_share_round_two(&a1, &s2, &crp, &mut b2, &mut rng)?;
//! engine.accumulate_round_two(&mut a2, &b2)?;
//!
//! engine.gen_share_round_three(&a2, &u1, &s1, &mut a3, &mut rng)?;
//! engine.gen_share_round_three(&a2, &u2, &s2, &mut b3, &mut rng)?;
//! engine.accumulate_round_three(&mut a3, &b3)?;
//!
//! let mut rlk = engine.allocate_relinearization_key();
//! engine.gen_relinearization_key(&a2, &a3, &mut rlk)?;
//! assert_eq!(rlk.shape(), engine.shape());
//! # Ok(())
//! # }
//! ```

mod errors;
mod keys;
mod parameters;

pub mod rkg;

pub use errors::{Error, ParametersError, Result};
pub use keys::RelinearizationKey;
pub use parameters::{RkgParameters, RkgParametersBuilder};
