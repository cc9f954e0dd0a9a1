#![crate_name = "dbfv_math"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Reference double-CRT ring arithmetic for the dbfv library.
//!
//! This crate implements the [`dbfv_traits::RingArithmetic`] and
//! [`dbfv_traits::PolySampler`] capabilities over `Z_Q[x]/(x^n + 1)` with
//! `Q` a product of NTT-friendly primes.

mod errors;

pub mod ntt;
pub mod rq;
pub mod zq;

pub use errors::{Error, Result};
