#![crate_name = "dbfv_util"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Utilities for the dbfv library.

use itertools::Itertools;
use num_bigint_dig::{prime::probably_prime, BigUint};
use num_traits::ToPrimitive;
use rand::{distributions::Bernoulli, CryptoRng, Rng, RngCore};
use rand_distr::{Distribution, Normal};

/// Returns whether the modulus p is prime; this function is 100% accurate.
pub fn is_prime(p: u64) -> bool {
    probably_prime(&BigUint::from(p), 0)
}

/// Generate a `num_bits`-bit prime, congruent to 1 mod `modulo`, strictly
/// smaller than `upper_bound`. Note that `num_bits` must belong to (10..=62),
/// and upper_bound must be <= 1 << num_bits.
pub fn generate_prime(num_bits: usize, modulo: u64, upper_bound: u64) -> Option<u64> {
    if !(10..=62).contains(&num_bits) || modulo == 0 {
        None
    } else {
        debug_assert!(
            (1u64 << num_bits) >= upper_bound && (1u64 << (num_bits - 1)) < upper_bound
        );
        debug_assert!(modulo % 2 == 0);

        let lower_bound = 1u64 << (num_bits - 1);
        if upper_bound <= modulo {
            return None;
        }

        // Largest candidate = 1 mod `modulo` below `upper_bound`.
        let mut candidate = (upper_bound - 1) - ((upper_bound - 2) % modulo);
        while candidate > lower_bound {
            if is_prime(candidate) {
                return Some(candidate);
            }
            if candidate <= modulo {
                break;
            }
            candidate -= modulo;
        }
        None
    }
}

/// Sample a vector of independent ternary coefficients.
///
/// Each coefficient is 0 with probability `1 - p`, and -1 or 1 with
/// probability `p / 2` each. Returns an error if `p` is not in (0, 1].
pub fn sample_vec_ternary<R: RngCore + CryptoRng>(
    vector_size: usize,
    p: f64,
    rng: &mut R,
) -> Result<Vec<i64>, &'static str> {
    if !(p > 0.0 && p <= 1.0) {
        return Err("The probability p must belong to (0, 1]");
    }
    let non_zero = Bernoulli::new(p).map_err(|_| "The probability p must belong to (0, 1]")?;

    Ok((0..vector_size)
        .map(|_| {
            if non_zero.sample(rng) {
                if rng.gen::<bool>() {
                    1
                } else {
                    -1
                }
            } else {
                0
            }
        })
        .collect_vec())
}

/// Sample one integer from the discrete Gaussian `normal`, rounded to the
/// nearest integer and rejected until its absolute value is at most `bound`.
pub fn sample_normal_bounded<R: RngCore + CryptoRng>(
    normal: &Normal<f64>,
    bound: i64,
    rng: &mut R,
) -> i64 {
    loop {
        let x = normal.sample(rng).round();
        if x.abs() <= bound as f64 {
            return x as i64;
        }
    }
}

/// Sample a vector of independent discrete Gaussian coefficients of standard
/// deviation `sigma`, truncated to `[-bound, bound]`.
///
/// Returns an error if `sigma` is not a positive finite number.
pub fn sample_vec_normal<R: RngCore + CryptoRng>(
    vector_size: usize,
    sigma: f64,
    bound: i64,
    rng: &mut R,
) -> Result<Vec<i64>, &'static str> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err("The standard deviation must be a positive finite number");
    }
    let normal = Normal::new(0.0, sigma).map_err(|_| "Invalid standard deviation")?;
    Ok((0..vector_size)
        .map(|_| sample_normal_bounded(&normal, bound, rng))
        .collect_vec())
}

/// Compute the sample variance of a list of values.
///
/// Panics if the length of value is < 2.
pub fn variance<T: ToPrimitive>(values: &[T]) -> f64 {
    assert!(values.len() > 1);
    let values_f64 = values
        .iter()
        .map(|v| v.to_f64().unwrap_or_default())
        .collect_vec();
    let mean = values_f64.iter().sum::<f64>() / (values_f64.len() as f64);
    values_f64
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / ((values_f64.len() as f64) - 1.0)
}
