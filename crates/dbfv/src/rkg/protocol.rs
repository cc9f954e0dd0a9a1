use std::{fmt, sync::Arc};

use dbfv_math::rq::{Context, Sampler};
use dbfv_traits::{PolySampler, RingArithmetic};
use itertools::Itertools;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use super::{
    decomposition_levels, scratch::ScratchPool, shares::Grid, CommonRandomMatrix, RoundOneShare,
    RoundThreeShare, RoundTwoShare, ShareShape,
};
use crate::{Error, RelinearizationKey, Result, RkgParameters};

type Seed = <ChaCha20Rng as SeedableRng>::Seed;

/// One party's engine for the collective relinearization key generation.
///
/// The engine is configured once with a ring, a sampler and the number of
/// bits `b` of a decomposition digit, which fixes the number of levels
/// `ceil(60 / b)`. Every round borrows the engine immutably, so an engine can
/// be shared between threads; the slots of a share are processed in
/// parallel.
///
/// Each party keeps its ephemeral key from [`RkgProtocol::new_ephemeral_key`]
/// between the first and the third round. The randomness of a round is drawn
/// from the caller's generator before the parallel section, so a
/// deterministic generator yields deterministic shares.
pub struct RkgProtocol<R: RingArithmetic = Context, S: PolySampler<R> = Sampler> {
    ring: Arc<R>,
    sampler: S,
    bit_decomposition: usize,
    levels: usize,
    scratch: ScratchPool<R::Element>,
}

impl<R: RingArithmetic, S: PolySampler<R>> fmt::Debug for RkgProtocol<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RkgProtocol")
            .field("moduli", &self.ring.moduli())
            .field("degree", &self.ring.degree())
            .field("bit_decomposition", &self.bit_decomposition)
            .field("levels", &self.levels)
            .finish()
    }
}

impl RkgProtocol<Context, Sampler> {
    /// Creates an engine over the context and sampler of the parameters.
    pub fn from_parameters(par: &Arc<RkgParameters>) -> Self {
        Self::new(
            par.ctx().clone(),
            par.sampler().clone(),
            par.bit_decomposition(),
        )
    }
}

impl<R: RingArithmetic, S: PolySampler<R>> RkgProtocol<R, S> {
    /// Creates an engine.
    ///
    /// Panics if `bit_decomposition` is zero.
    pub fn new(ring: Arc<R>, sampler: S, bit_decomposition: usize) -> Self {
        let levels = decomposition_levels(bit_decomposition);
        debug!(
            moduli = ring.moduli().len(),
            degree = ring.degree(),
            bit_decomposition,
            levels,
            "new relinearization key generation engine"
        );
        Self {
            ring,
            sampler,
            bit_decomposition,
            levels,
            scratch: ScratchPool::new(),
        }
    }

    /// The ring of the engine.
    pub fn ring(&self) -> &Arc<R> {
        &self.ring
    }

    /// The sampler of the engine.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Number of bits of a decomposition digit.
    pub const fn bit_decomposition(&self) -> usize {
        self.bit_decomposition
    }

    /// Number of decomposition levels.
    pub const fn levels(&self) -> usize {
        self.levels
    }

    /// Shape of every share, matrix and key of this engine.
    pub fn shape(&self) -> ShareShape {
        ShareShape::new(self.ring.moduli().len(), self.levels)
    }

    /// Allocate zero shares for the three rounds. Every call returns fresh
    /// storage.
    pub fn allocate_shares(
        &self,
    ) -> (
        RoundOneShare<R::Element>,
        RoundTwoShare<R::Element>,
        RoundThreeShare<R::Element>,
    ) {
        let shape = self.shape();
        (
            RoundOneShare {
                grid: Grid::from_fn(shape, |_, _| self.ring.zero()),
            },
            RoundTwoShare {
                grid: Grid::from_fn(shape, |_, _| [self.ring.zero(), self.ring.zero()]),
            },
            RoundThreeShare {
                grid: Grid::from_fn(shape, |_, _| self.ring.zero()),
            },
        )
    }

    /// Allocate a zero key, to be populated by
    /// [`RkgProtocol::gen_relinearization_key`].
    pub fn allocate_relinearization_key(&self) -> RelinearizationKey<R::Element> {
        RelinearizationKey {
            grid: Grid::from_fn(self.shape(), |_, _| [self.ring.zero(), self.ring.zero()]),
        }
    }

    /// Sample an ephemeral key: ternary coefficients, non-zero with
    /// probability `p`, in NTT and Montgomery form.
    ///
    /// The key must be kept private and reused in the third round.
    #[instrument(level = "debug", skip_all, fields(p = p))]
    pub fn new_ephemeral_key<G: RngCore + CryptoRng>(
        &self,
        p: f64,
        rng: &mut G,
    ) -> Result<R::Element> {
        self.sampler
            .sample_ternary(self.ring.as_ref(), p, rng)
            .map_err(|e| Error::SamplingError(e.to_string()))
    }

    /// Generate the round-1 share of a party from its ephemeral key `u` and
    /// its secret key share `sk`, both in NTT and Montgomery form.
    ///
    /// Every slot `(i, w)` of `share_out` is overwritten with
    /// `-u·crp[i][w] + sk·2^(w·b) + e`, where the secret term is only added
    /// to the residue modulo the i-th modulus.
    #[instrument(level = "debug", skip_all, fields(shape = %self.shape()))]
    pub fn gen_share_round_one<G: RngCore + CryptoRng>(
        &self,
        u: &R::Element,
        sk: &R::Element,
        crp: &CommonRandomMatrix<R::Element>,
        share_out: &mut RoundOneShare<R::Element>,
        rng: &mut G,
    ) -> Result<()> {
        let shape = self.shape();
        crp.grid.check_shape(shape)?;
        share_out.grid.check_shape(shape)?;

        let seeds = self.slot_seeds(rng);
        let ring = self.ring.as_ref();
        share_out
            .grid
            .slots_mut()
            .par_iter_mut()
            .zip(crp.grid.slots().par_iter())
            .zip(seeds)
            .enumerate()
            .for_each(|(index, ((slot, a), seed))| {
                let (i, w) = shape.coordinates(index);
                let mut rng = ChaCha20Rng::from_seed(seed);
                self.sampler.sample_gaussian(ring, slot, &mut rng);
                ring.add_power_of_2(sk, (w * self.bit_decomposition) as u32, i, slot);
                ring.mul_montgomery_and_sub(u, a, slot);
            });
        Ok(())
    }

    /// out = a + b, for round-1 shares.
    pub fn aggregate_round_one(
        &self,
        a: &RoundOneShare<R::Element>,
        b: &RoundOneShare<R::Element>,
        out: &mut RoundOneShare<R::Element>,
    ) -> Result<()> {
        self.combine(&a.grid, &b.grid, &mut out.grid, |a, b, out| {
            self.ring.add(a, b, out)
        })
    }

    /// acc += share, for round-1 shares.
    pub fn accumulate_round_one(
        &self,
        acc: &mut RoundOneShare<R::Element>,
        share: &RoundOneShare<R::Element>,
    ) -> Result<()> {
        self.accumulate(&mut acc.grid, &share.grid, |acc, share| {
            self.ring.add_assign(acc, share)
        })
    }

    /// Sum of any non-empty collection of round-1 shares.
    pub fn aggregate_round_one_shares<'a, I>(&self, shares: I) -> Result<RoundOneShare<R::Element>>
    where
        I: IntoIterator<Item = &'a RoundOneShare<R::Element>>,
        R::Element: 'a,
    {
        let grid = self.fold(shares.into_iter().map(|share| &share.grid), |acc, share| {
            self.ring.add_assign(acc, share)
        })?;
        Ok(RoundOneShare { grid })
    }

    /// Generate the round-2 share of a party from the round-1 aggregate and
    /// its secret key share `sk` in NTT and Montgomery form.
    ///
    /// Every slot `(i, w)` of `share_out` is overwritten with
    /// `(round1_agg[i][w]·sk + e1, sk·crp[i][w] + e2)`.
    #[instrument(level = "debug", skip_all, fields(shape = %self.shape()))]
    pub fn gen_share_round_two<G: RngCore + CryptoRng>(
        &self,
        round1_agg: &RoundOneShare<R::Element>,
        sk: &R::Element,
        crp: &CommonRandomMatrix<R::Element>,
        share_out: &mut RoundTwoShare<R::Element>,
        rng: &mut G,
    ) -> Result<()> {
        let shape = self.shape();
        round1_agg.grid.check_shape(shape)?;
        crp.grid.check_shape(shape)?;
        share_out.grid.check_shape(shape)?;

        let seeds = self.slot_seeds(rng);
        let ring = self.ring.as_ref();
        share_out
            .grid
            .slots_mut()
            .par_iter_mut()
            .zip(round1_agg.grid.slots().par_iter())
            .zip(crp.grid.slots().par_iter())
            .zip(seeds)
            .for_each_init(
                || self.scratch.acquire(|| ring.zero()),
                |noise, (((slot, h), a), seed)| {
                    let mut rng = ChaCha20Rng::from_seed(seed);
                    let [c0, c1] = slot;

                    self.sampler.sample_gaussian(ring, &mut **noise, &mut rng);
                    ring.mul_montgomery(h, sk, c0);
                    ring.add_assign(c0, &**noise);

                    self.sampler.sample_gaussian(ring, c1, &mut rng);
                    ring.mul_montgomery_and_add(sk, a, c1);
                },
            );
        Ok(())
    }

    /// out = a + b, componentwise, for round-2 shares.
    pub fn aggregate_round_two(
        &self,
        a: &RoundTwoShare<R::Element>,
        b: &RoundTwoShare<R::Element>,
        out: &mut RoundTwoShare<R::Element>,
    ) -> Result<()> {
        self.combine(&a.grid, &b.grid, &mut out.grid, |a, b, out| {
            self.ring.add(&a[0], &b[0], &mut out[0]);
            self.ring.add(&a[1], &b[1], &mut out[1]);
        })
    }

    /// acc += share, componentwise, for round-2 shares.
    pub fn accumulate_round_two(
        &self,
        acc: &mut RoundTwoShare<R::Element>,
        share: &RoundTwoShare<R::Element>,
    ) -> Result<()> {
        self.accumulate(&mut acc.grid, &share.grid, add_assign_pair(self.ring.as_ref()))
    }

    /// Sum of any non-empty collection of round-2 shares.
    pub fn aggregate_round_two_shares<'a, I>(&self, shares: I) -> Result<RoundTwoShare<R::Element>>
    where
        I: IntoIterator<Item = &'a RoundTwoShare<R::Element>>,
        R::Element: 'a,
    {
        let grid = self.fold(
            shares.into_iter().map(|share| &share.grid),
            add_assign_pair(self.ring.as_ref()),
        )?;
        Ok(RoundTwoShare { grid })
    }

    /// Generate the round-3 share of a party from the round-2 aggregate, its
    /// ephemeral key `u` and its secret key share `sk`, both in NTT and
    /// Montgomery form.
    ///
    /// Every slot `(i, w)` of `share_out` is overwritten with
    /// `(u - sk)·round2_agg[i][w][1] + e`.
    #[instrument(level = "debug", skip_all, fields(shape = %self.shape()))]
    pub fn gen_share_round_three<G: RngCore + CryptoRng>(
        &self,
        round2_agg: &RoundTwoShare<R::Element>,
        u: &R::Element,
        sk: &R::Element,
        share_out: &mut RoundThreeShare<R::Element>,
        rng: &mut G,
    ) -> Result<()> {
        let shape = self.shape();
        round2_agg.grid.check_shape(shape)?;
        share_out.grid.check_shape(shape)?;

        let seeds = self.slot_seeds(rng);
        let ring = self.ring.as_ref();
        let mut delta = self.scratch.acquire(|| ring.zero());
        ring.sub(u, sk, &mut delta);
        let delta: &R::Element = &delta;

        share_out
            .grid
            .slots_mut()
            .par_iter_mut()
            .zip(round2_agg.grid.slots().par_iter())
            .zip(seeds)
            .for_each(|((slot, h), seed)| {
                let mut rng = ChaCha20Rng::from_seed(seed);
                self.sampler.sample_gaussian(ring, slot, &mut rng);
                ring.mul_montgomery_and_add(delta, &h[1], slot);
            });
        Ok(())
    }

    /// out = a + b, for round-3 shares.
    pub fn aggregate_round_three(
        &self,
        a: &RoundThreeShare<R::Element>,
        b: &RoundThreeShare<R::Element>,
        out: &mut RoundThreeShare<R::Element>,
    ) -> Result<()> {
        self.combine(&a.grid, &b.grid, &mut out.grid, |a, b, out| {
            self.ring.add(a, b, out)
        })
    }

    /// acc += share, for round-3 shares.
    pub fn accumulate_round_three(
        &self,
        acc: &mut RoundThreeShare<R::Element>,
        share: &RoundThreeShare<R::Element>,
    ) -> Result<()> {
        self.accumulate(&mut acc.grid, &share.grid, |acc, share| {
            self.ring.add_assign(acc, share)
        })
    }

    /// Sum of any non-empty collection of round-3 shares.
    pub fn aggregate_round_three_shares<'a, I>(
        &self,
        shares: I,
    ) -> Result<RoundThreeShare<R::Element>>
    where
        I: IntoIterator<Item = &'a RoundThreeShare<R::Element>>,
        R::Element: 'a,
    {
        let grid = self.fold(shares.into_iter().map(|share| &share.grid), |acc, share| {
            self.ring.add_assign(acc, share)
        })?;
        Ok(RoundThreeShare { grid })
    }

    /// Assemble the relinearization key from the round-2 and round-3
    /// aggregates: `key[i][w] = (round2_agg[i][w][0] + round3_agg[i][w],
    /// round2_agg[i][w][1])`, both converted to Montgomery form.
    #[instrument(level = "debug", skip_all, fields(shape = %self.shape()))]
    pub fn gen_relinearization_key(
        &self,
        round2_agg: &RoundTwoShare<R::Element>,
        round3_agg: &RoundThreeShare<R::Element>,
        key_out: &mut RelinearizationKey<R::Element>,
    ) -> Result<()> {
        let shape = self.shape();
        round2_agg.grid.check_shape(shape)?;
        round3_agg.grid.check_shape(shape)?;
        key_out.grid.check_shape(shape)?;

        let ring = self.ring.as_ref();
        key_out
            .grid
            .slots_mut()
            .par_iter_mut()
            .zip(round2_agg.grid.slots().par_iter())
            .zip(round3_agg.grid.slots().par_iter())
            .for_each(|((slot, [h0, h1]), h)| {
                let [k0, k1] = slot;
                ring.add(h0, h, k0);
                k1.clone_from(h1);
                ring.mform(k0);
                ring.mform(k1);
            });
        Ok(())
    }

    /// One seed per slot, drawn sequentially from the caller's generator.
    fn slot_seeds<G: RngCore + CryptoRng>(&self, rng: &mut G) -> Vec<Seed> {
        let seeds = (0..self.shape().len())
            .map(|_| {
                let mut seed = Seed::default();
                rng.fill_bytes(&mut seed);
                seed
            })
            .collect_vec();
        trace!(slots = seeds.len(), "drew slot seeds");
        seeds
    }

    fn combine<T, F>(&self, a: &Grid<T>, b: &Grid<T>, out: &mut Grid<T>, f: F) -> Result<()>
    where
        T: Send + Sync,
        F: Fn(&T, &T, &mut T) + Send + Sync,
    {
        let shape = self.shape();
        a.check_shape(shape)?;
        b.check_shape(shape)?;
        out.check_shape(shape)?;

        out.slots_mut()
            .par_iter_mut()
            .zip(a.slots().par_iter().zip(b.slots().par_iter()))
            .for_each(|(out, (a, b))| f(a, b, out));
        Ok(())
    }

    fn accumulate<T, F>(&self, acc: &mut Grid<T>, share: &Grid<T>, f: F) -> Result<()>
    where
        T: Send + Sync,
        F: Fn(&mut T, &T) + Send + Sync,
    {
        let shape = self.shape();
        acc.check_shape(shape)?;
        share.check_shape(shape)?;

        acc.slots_mut()
            .par_iter_mut()
            .zip(share.slots().par_iter())
            .for_each(|(acc, share)| f(acc, share));
        Ok(())
    }

    fn fold<'a, T, I, F>(&self, mut grids: I, f: F) -> Result<Grid<T>>
    where
        T: Clone + Send + Sync + 'a,
        I: Iterator<Item = &'a Grid<T>>,
        F: Fn(&mut T, &T) + Send + Sync,
    {
        let first = grids.next().ok_or(Error::TooFewValues(0, 1))?;
        first.check_shape(self.shape())?;
        let mut acc = first.clone();
        let mut count = 1;
        for grid in grids {
            self.accumulate(&mut acc, grid, &f)?;
            count += 1;
        }
        trace!(count, "aggregated shares");
        Ok(acc)
    }
}

fn add_assign_pair<R: RingArithmetic>(
    ring: &R,
) -> impl Fn(&mut [R::Element; 2], &[R::Element; 2]) + Send + Sync + '_ {
    move |acc, share| {
        ring.add_assign(&mut acc[0], &share[0]);
        ring.add_assign(&mut acc[1], &share[1]);
    }
}
