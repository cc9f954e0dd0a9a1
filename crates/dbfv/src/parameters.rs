//! Create parameters for the collective relinearization key generation.

use crate::rkg::{decomposition_levels, MAX_DECOMPOSITION_BITS};
use crate::{Error, ParametersError, Result};
use dbfv_math::rq::{Context, Sampler};
use dbfv_util::generate_prime;
use itertools::Itertools;
use std::fmt::Debug;
use std::sync::Arc;

/// Parameters shared by all the parties of a relinearization key generation.
pub struct RkgParameters {
    /// Number of coefficients in a polynomial.
    polynomial_degree: usize,

    /// Vector of coprime moduli q_i for the ciphertext.
    pub(crate) moduli: Box<[u64]>,

    /// Vector of the sizes of the moduli q_i.
    moduli_sizes: Box<[usize]>,

    /// Standard deviation of the error distribution.
    sigma: f64,

    /// Number of bits of each digit of the gadget decomposition.
    bit_decomposition: usize,

    /// Context for the underlying polynomials.
    pub(crate) ctx: Arc<Context>,

    /// Sampler for the secrets and the errors.
    pub(crate) sampler: Sampler,
}

impl Debug for RkgParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RkgParameters")
            .field("polynomial_degree", &self.polynomial_degree)
            .field("moduli", &self.moduli)
            .field("sigma", &self.sigma)
            .field("bit_decomposition", &self.bit_decomposition)
            .finish()
    }
}

impl RkgParameters {
    /// Returns the underlying polynomial degree
    pub const fn degree(&self) -> usize {
        self.polynomial_degree
    }

    /// Returns a reference to the ciphertext moduli
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns a reference to the sizes of the ciphertext moduli
    pub fn moduli_sizes(&self) -> &[usize] {
        &self.moduli_sizes
    }

    /// Returns the standard deviation of the error distribution
    pub const fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Returns the number of bits of each decomposition digit
    pub const fn bit_decomposition(&self) -> usize {
        self.bit_decomposition
    }

    /// Returns the number of decomposition levels
    pub const fn levels(&self) -> usize {
        decomposition_levels(self.bit_decomposition)
    }

    /// Returns the ring context
    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Returns the sampler
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Parameters with `num_moduli` moduli of 55 bits, a polynomial degree
    /// `degree` and the default error distribution and decomposition.
    ///
    /// Panics if the parameters cannot be built.
    pub fn default_arc(num_moduli: usize, degree: usize) -> Arc<Self> {
        if !degree.is_power_of_two() || degree < 8 {
            panic!("Invalid degree");
        }
        match RkgParametersBuilder::new()
            .set_degree(degree)
            .set_moduli_sizes(&vec![55usize; num_moduli])
            .build_arc()
        {
            Ok(par) => par,
            Err(e) => panic!("Invalid default parameters: {e}"),
        }
    }
}

/// Builder for parameters for the collective relinearization key generation.
#[derive(Debug)]
pub struct RkgParametersBuilder {
    degree: usize,
    sigma: f64,
    bit_decomposition: usize,
    ciphertext_moduli: Vec<u64>,
    ciphertext_moduli_sizes: Vec<usize>,
}

impl RkgParametersBuilder {
    /// Creates a new instance of the builder
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            degree: Default::default(),
            sigma: Sampler::DEFAULT_SIGMA,
            bit_decomposition: MAX_DECOMPOSITION_BITS,
            ciphertext_moduli: Default::default(),
            ciphertext_moduli_sizes: Default::default(),
        }
    }

    /// Sets the polynomial degree. Building fails if the degree is not a
    /// power of two larger or equal to 8.
    pub fn set_degree(&mut self, degree: usize) -> &mut Self {
        self.degree = degree;
        self
    }

    /// Sets the sizes of the ciphertext moduli.
    /// Only one of `set_moduli_sizes` and `set_moduli`
    /// can be specified.
    pub fn set_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
        self.ciphertext_moduli_sizes = sizes.to_owned();
        self
    }

    /// Sets the ciphertext moduli to use.
    /// Only one of `set_moduli_sizes` and `set_moduli`
    /// can be specified.
    pub fn set_moduli(&mut self, moduli: &[u64]) -> &mut Self {
        self.ciphertext_moduli = moduli.to_owned();
        self
    }

    /// Sets the standard deviation of the error distribution. Building fails
    /// if it is not a positive finite number.
    pub fn set_sigma(&mut self, sigma: f64) -> &mut Self {
        self.sigma = sigma;
        self
    }

    /// Sets the number of bits of each decomposition digit. Building fails if
    /// it is not between 1 and 60.
    pub fn set_bit_decomposition(&mut self, bit_decomposition: usize) -> &mut Self {
        self.bit_decomposition = bit_decomposition;
        self
    }

    /// Generate ciphertext moduli with the specified sizes
    fn generate_moduli(moduli_sizes: &[usize], degree: usize) -> Result<Vec<u64>> {
        let mut moduli = vec![];
        for size in moduli_sizes {
            if *size > MAX_DECOMPOSITION_BITS || *size < 10 {
                return Err(Error::ParametersError(ParametersError::InvalidModulusSize(
                    *size,
                    10,
                    MAX_DECOMPOSITION_BITS,
                )));
            }

            let mut upper_bound = 1 << size;
            loop {
                if let Some(prime) = generate_prime(*size, 2 * degree as u64, upper_bound) {
                    if !moduli.contains(&prime) {
                        moduli.push(prime);
                        break;
                    } else {
                        upper_bound = prime;
                    }
                } else {
                    return Err(Error::ParametersError(ParametersError::NotEnoughPrimes(
                        *size, degree,
                    )));
                }
            }
        }

        Ok(moduli)
    }

    /// Build a new `RkgParameters` inside an `Arc`.
    pub fn build_arc(&self) -> Result<Arc<RkgParameters>> {
        self.build().map(Arc::new)
    }

    /// Build a new `RkgParameters`.
    pub fn build(&self) -> Result<RkgParameters> {
        // Check that the degree is a power of 2 (and large enough).
        if self.degree < 8 || !self.degree.is_power_of_two() {
            return Err(Error::ParametersError(ParametersError::InvalidDegree(
                self.degree,
            )));
        }

        if self.bit_decomposition == 0 || self.bit_decomposition > MAX_DECOMPOSITION_BITS {
            return Err(Error::ParametersError(
                ParametersError::InvalidBitDecomposition(
                    self.bit_decomposition,
                    MAX_DECOMPOSITION_BITS,
                ),
            ));
        }

        let sampler = Sampler::new(self.sigma)
            .map_err(|e| Error::ParametersError(ParametersError::InvalidSigma(e.to_string())))?;

        // Check that one of `ciphertext_moduli` and `ciphertext_moduli_sizes` is
        // specified.
        if !self.ciphertext_moduli.is_empty() && !self.ciphertext_moduli_sizes.is_empty() {
            return Err(Error::ParametersError(ParametersError::TooManySpecified(
                "Only one of `ciphertext_moduli` and `ciphertext_moduli_sizes` can be specified"
                    .to_string(),
            )));
        } else if self.ciphertext_moduli.is_empty() && self.ciphertext_moduli_sizes.is_empty() {
            return Err(Error::ParametersError(ParametersError::TooFewSpecified(
                "One of `ciphertext_moduli` and `ciphertext_moduli_sizes` must be specified"
                    .to_string(),
            )));
        }

        // Get or generate the moduli
        let mut moduli = self.ciphertext_moduli.clone();
        if !self.ciphertext_moduli_sizes.is_empty() {
            moduli = Self::generate_moduli(&self.ciphertext_moduli_sizes, self.degree)?
        }

        // Recomputes the moduli sizes
        let moduli_sizes = moduli
            .iter()
            .map(|m| 64 - m.leading_zeros() as usize)
            .collect_vec();

        // The decomposition only covers the 60 least significant bits.
        if let Some(size) = moduli_sizes.iter().find(|s| **s > MAX_DECOMPOSITION_BITS) {
            return Err(Error::ParametersError(ParametersError::InvalidModulusSize(
                *size,
                10,
                MAX_DECOMPOSITION_BITS,
            )));
        }

        let ctx = Context::new_arc(&moduli, self.degree)?;

        Ok(RkgParameters {
            polynomial_degree: self.degree,
            moduli: moduli.into_boxed_slice(),
            moduli_sizes: moduli_sizes.into_boxed_slice(),
            sigma: self.sigma,
            bit_decomposition: self.bit_decomposition,
            ctx,
            sampler,
        })
    }
}
