use dbfv_traits::{PolySampler, RingArithmetic};
use dbfv_util::{sample_normal_bounded, sample_vec_ternary};
use itertools::Itertools;
use rand::{CryptoRng, RngCore};
use rand_distr::Normal;

use super::{Context, Poly};
use crate::{Error, Result};

/// Samples secret and noise polynomials over a [`Context`].
///
/// The Gaussian noise has standard deviation `sigma` and is truncated to
/// `[-bound, bound]`.
#[derive(Debug, Clone)]
pub struct Sampler {
    sigma: f64,
    bound: i64,
    normal: Normal<f64>,
}

impl Sampler {
    /// Standard deviation of the error distribution used by default.
    pub const DEFAULT_SIGMA: f64 = 3.19;

    /// Creates a sampler with standard deviation `sigma` and the bound
    /// `floor(6·sigma)`.
    pub fn new(sigma: f64) -> Result<Self> {
        Self::with_bound(sigma, (6.0 * sigma).floor() as i64)
    }

    /// Creates a sampler with an explicit truncation bound.
    pub fn with_bound(sigma: f64, bound: i64) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(Error::InvalidDistribution(format!(
                "Invalid standard deviation {sigma}"
            )));
        }
        if bound < 1 {
            return Err(Error::InvalidDistribution(format!(
                "Invalid truncation bound {bound}"
            )));
        }
        let normal = Normal::new(0.0, sigma)
            .map_err(|e| Error::InvalidDistribution(e.to_string()))?;
        Ok(Self {
            sigma,
            bound,
            normal,
        })
    }

    /// Standard deviation of the error distribution.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Truncation bound of the error distribution.
    pub fn bound(&self) -> i64 {
        self.bound
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIGMA).expect("the default standard deviation is valid")
    }
}

impl PolySampler<Context> for Sampler {
    type Error = Error;

    fn sample_ternary<G: RngCore + CryptoRng>(
        &self,
        ring: &Context,
        p: f64,
        rng: &mut G,
    ) -> Result<Poly> {
        let coefficients = sample_vec_ternary(ring.degree(), p, rng)
            .map_err(|e| Error::InvalidProbability(format!("{p}: {e}")))?;
        let mut out = ring.poly_from_i64(&coefficients)?;
        ring.ntt_forward(&mut out);
        ring.mform(&mut out);
        Ok(out)
    }

    fn sample_gaussian<G: RngCore + CryptoRng>(&self, ring: &Context, out: &mut Poly, rng: &mut G) {
        let coefficients = (0..ring.degree())
            .map(|_| sample_normal_bounded(&self.normal, self.bound, rng))
            .collect_vec();
        for (mut row, qi) in out
            .coefficients
            .outer_iter_mut()
            .zip(ring.moduli_operators().iter())
        {
            row.iter_mut()
                .zip(coefficients.iter())
                .for_each(|(c, x)| *c = qi.reduce_i64(*x));
        }
        ring.ntt_forward(out);
    }
}
