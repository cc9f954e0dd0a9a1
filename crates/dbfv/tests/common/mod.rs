//! Test helpers: secret key shares, a full protocol run, and a textbook BFV
//! over big integers to exercise the generated relinearization key.

#![allow(dead_code)]

use std::sync::Arc;

use dbfv::{
    rkg::{CommonRandomMatrix, RkgProtocol},
    RelinearizationKey, RkgParameters,
};
use dbfv_math::rq::{Context, Poly};
use dbfv_traits::RingArithmetic;
use dbfv_util::{sample_vec_normal, sample_vec_ternary};
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{One, Signed, ToPrimitive, Zero};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

/// A party's additive share of the secret key.
pub struct Party {
    /// Coefficients of the share in power basis.
    pub coefficients: Vec<i64>,
    /// The share in NTT and Montgomery form.
    pub sk: Zeroizing<Poly>,
}

impl Party {
    pub fn new<R: RngCore + CryptoRng>(ctx: &Context, rng: &mut R) -> Self {
        let coefficients = sample_vec_ternary(ctx.degree(), 0.5, rng).unwrap();
        let mut sk = Zeroizing::new(ctx.poly_from_i64(&coefficients).unwrap());
        ctx.ntt_forward(&mut sk);
        ctx.mform(&mut sk);
        Self { coefficients, sk }
    }
}

/// The combined secret key `Σ s_p`, in power basis.
pub fn combined_secret(parties: &[Party]) -> Vec<i64> {
    let n = parties[0].coefficients.len();
    (0..n)
        .map(|j| parties.iter().map(|p| p.coefficients[j]).sum())
        .collect()
}

/// The combined secret key `Σ s_p`, in NTT and Montgomery form.
pub fn combined_secret_poly(ctx: &Context, parties: &[Party]) -> Poly {
    let mut s = ctx.zero();
    for party in parties {
        ctx.add_assign(&mut s, &party.sk);
    }
    s
}

/// Run the three rounds for all the parties, aggregating in party order.
pub fn run_protocol<R: RngCore + CryptoRng>(
    engine: &RkgProtocol,
    crp: &CommonRandomMatrix<Poly>,
    parties: &[Party],
    rng: &mut R,
) -> RelinearizationKey<Poly> {
    let u = parties
        .iter()
        .map(|_| Zeroizing::new(engine.new_ephemeral_key(0.5, rng).unwrap()))
        .collect::<Vec<_>>();

    let mut round1 = vec![];
    for (party, u) in parties.iter().zip(u.iter()) {
        let (mut share, _, _) = engine.allocate_shares();
        engine
            .gen_share_round_one(u, &party.sk, crp, &mut share, rng)
            .unwrap();
        round1.push(share);
    }
    let round1_agg = engine.aggregate_round_one_shares(&round1).unwrap();

    let mut round2 = vec![];
    for party in parties {
        let (_, mut share, _) = engine.allocate_shares();
        engine
            .gen_share_round_two(&round1_agg, &party.sk, crp, &mut share, rng)
            .unwrap();
        round2.push(share);
    }
    let round2_agg = engine.aggregate_round_two_shares(&round2).unwrap();

    let mut round3 = vec![];
    for (party, u) in parties.iter().zip(u.iter()) {
        let (_, _, mut share) = engine.allocate_shares();
        engine
            .gen_share_round_three(&round2_agg, u, &party.sk, &mut share, rng)
            .unwrap();
        round3.push(share);
    }
    let round3_agg = engine.aggregate_round_three_shares(&round3).unwrap();

    let mut rlk = engine.allocate_relinearization_key();
    engine
        .gen_relinearization_key(&round2_agg, &round3_agg, &mut rlk)
        .unwrap();
    rlk
}

/// Centered infinity norm of the residual `k0 + s·k1 - s²·2^(w·b)` for every
/// slot of the key, where `s` is in NTT and Montgomery form.
pub fn key_residual_norm(par: &Arc<RkgParameters>, rlk: &RelinearizationKey<Poly>, s: &Poly) -> i64 {
    let ctx = par.ctx();
    let mut s2 = ctx.zero();
    ctx.mul_montgomery(s, s, &mut s2);

    let mut norm = 0;
    for ((i, w), [k0, k1]) in rlk.iter() {
        let mut k0 = k0.clone();
        let mut k1 = k1.clone();
        ctx.inv_mform(&mut k0);
        ctx.inv_mform(&mut k1);

        let mut residual = k0;
        ctx.mul_montgomery_and_add(s, &k1, &mut residual);
        let mut gadget = ctx.zero();
        ctx.add_power_of_2(&s2, (w * par.bit_decomposition()) as u32, i, &mut gadget);
        let mut diff = ctx.zero();
        ctx.sub(&residual, &gadget, &mut diff);
        norm = norm.max(infinity_norm(ctx, &mut diff));
    }
    norm
}

/// Centered infinity norm of an element in NTT form, checking that all the
/// residues agree.
pub fn infinity_norm(ctx: &Context, p: &mut Poly) -> i64 {
    ctx.ntt_backward(p);
    let mut norm = 0;
    for j in 0..ctx.degree() {
        let centered = ctx
            .moduli_operators()
            .iter()
            .enumerate()
            .map(|(i, qi)| qi.center(p.residue(i)[j]))
            .collect::<Vec<_>>();
        assert!(centered.iter().all(|c| *c == centered[0]));
        norm = norm.max(centered[0].abs());
    }
    norm
}

/// Textbook BFV over `Z_Q[x]/(x^n + 1)` with big integer coefficients.
pub struct Bfv {
    pub ctx: Arc<Context>,
    pub q: BigInt,
    pub t: u64,
    pub delta: BigInt,
}

/// A BFV ciphertext of degree 1 or 2, with coefficients in [0, Q).
pub type Ciphertext = Vec<Vec<BigInt>>;

impl Bfv {
    pub fn new(ctx: &Arc<Context>, t: u64) -> Self {
        let q = BigInt::from(ctx.modulus().clone());
        let delta = &q / BigInt::from(t);
        Self {
            ctx: ctx.clone(),
            q,
            t,
            delta,
        }
    }

    fn reduce(&self, x: &BigInt) -> BigInt {
        let r = x % &self.q;
        if r.is_negative() {
            r + &self.q
        } else {
            r
        }
    }

    fn center(&self, x: &BigInt) -> BigInt {
        let r = self.reduce(x);
        if &r + &r > self.q {
            r - &self.q
        } else {
            r
        }
    }

    /// Negacyclic product of two polynomials, without reduction.
    pub fn mul(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
        let n = a.len();
        let mut c = vec![BigInt::zero(); n];
        for i in 0..n {
            for j in 0..n {
                let prod = &a[i] * &b[j];
                if i + j < n {
                    c[i + j] += prod;
                } else {
                    c[i + j - n] -= prod;
                }
            }
        }
        c
    }

    fn add(&self, a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
        a.iter().zip(b).map(|(x, y)| self.reduce(&(x + y))).collect()
    }

    fn lift(v: &[i64]) -> Vec<BigInt> {
        v.iter().map(|x| BigInt::from(*x)).collect()
    }

    /// Symmetric encryption of `m` under the secret `s`.
    pub fn encrypt<R: RngCore + CryptoRng>(&self, m: &[u64], s: &[i64], rng: &mut R) -> Ciphertext {
        let n = m.len();
        let q = self.q.to_biguint().unwrap();
        let a = (0..n)
            .map(|_| BigInt::from(rng.gen_biguint_below(&q)))
            .collect::<Vec<_>>();
        let e = Self::lift(&sample_vec_normal(n, 3.19, 19, rng).unwrap());
        let a_s = Self::mul(&a, &Self::lift(s));
        let c0 = (0..n)
            .map(|j| self.reduce(&(&self.delta * BigInt::from(m[j]) + &e[j] - &a_s[j])))
            .collect();
        vec![c0, a]
    }

    /// Decryption of a ciphertext of any degree.
    pub fn decrypt(&self, ct: &Ciphertext, s: &[i64]) -> Vec<u64> {
        let n = s.len();
        let s = Self::lift(s);
        let mut x = vec![BigInt::zero(); n];
        let mut s_power = {
            let mut one = vec![BigInt::zero(); n];
            one[0] = BigInt::one();
            one
        };
        for c in ct {
            let term = Self::mul(c, &s_power);
            x = self.add(&x, &term);
            s_power = Self::mul(&s_power, &s);
        }
        x.iter()
            .map(|xi| {
                let scaled = round_div(&(self.center(xi) * BigInt::from(self.t)), &self.q);
                let t = BigInt::from(self.t);
                let r = ((scaled % &t) + &t) % &t;
                r.to_u64().unwrap()
            })
            .collect()
    }

    /// Tensor product of two degree-1 ciphertexts, scaled by t/Q.
    pub fn multiply(&self, a: &Ciphertext, b: &Ciphertext) -> Ciphertext {
        let center = |c: &Vec<BigInt>| c.iter().map(|x| self.center(x)).collect::<Vec<_>>();
        let (a0, a1, b0, b1) = (center(&a[0]), center(&a[1]), center(&b[0]), center(&b[1]));
        let d0 = Self::mul(&a0, &b0);
        let d1 = Self::mul(&a0, &b1)
            .into_iter()
            .zip(Self::mul(&a1, &b0))
            .map(|(x, y)| x + y)
            .collect::<Vec<_>>();
        let d2 = Self::mul(&a1, &b1);
        let t = BigInt::from(self.t);
        [d0, d1, d2]
            .iter()
            .map(|d| {
                d.iter()
                    .map(|x| self.reduce(&round_div(&(x * &t), &self.q)))
                    .collect()
            })
            .collect()
    }

    /// Relinearize a degree-2 ciphertext with a key in NTT and Montgomery
    /// form, decomposing `c2` in digits of `bit_decomposition` bits per
    /// residue.
    pub fn relinearize(
        &self,
        ct: &Ciphertext,
        rlk: &RelinearizationKey<Poly>,
        bit_decomposition: usize,
    ) -> Ciphertext {
        let ctx = self.ctx.as_ref();
        let mask = (1u64 << bit_decomposition) - 1;
        let mut acc0 = ctx.zero();
        let mut acc1 = ctx.zero();
        for ((i, w), [k0, k1]) in rlk.iter() {
            let qi = BigInt::from(ctx.moduli()[i]);
            let digits = ct[2]
                .iter()
                .map(|c| {
                    let residue = (c % &qi).to_u64().unwrap();
                    ((residue >> (w * bit_decomposition)) & mask) as i64
                })
                .collect::<Vec<_>>();
            let mut d = ctx.poly_from_i64(&digits).unwrap();
            ctx.ntt_forward(&mut d);
            ctx.mul_montgomery_and_add(k0, &d, &mut acc0);
            ctx.mul_montgomery_and_add(k1, &d, &mut acc1);
        }
        ctx.ntt_backward(&mut acc0);
        ctx.ntt_backward(&mut acc1);
        let to_bigint = |p: &Poly| {
            ctx.poly_to_biguint(p)
                .into_iter()
                .map(BigInt::from)
                .collect::<Vec<_>>()
        };
        vec![
            self.add(&ct[0], &to_bigint(&acc0)),
            self.add(&ct[1], &to_bigint(&acc1)),
        ]
    }

    /// Negacyclic product of two plaintexts modulo t.
    pub fn plaintext_product(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        let t = BigInt::from(self.t);
        let a = a.iter().map(|x| BigInt::from(*x)).collect::<Vec<_>>();
        let b = b.iter().map(|x| BigInt::from(*x)).collect::<Vec<_>>();
        Self::mul(&a, &b)
            .into_iter()
            .map(|x| (((x % &t) + &t) % &t).to_u64().unwrap())
            .collect()
    }
}

/// Rounded division `round(x / d)` for a positive `d`.
pub fn round_div(x: &BigInt, d: &BigInt) -> BigInt {
    let two = BigInt::from(2);
    if x.is_negative() {
        -((-x * &two + d) / (d * &two))
    } else {
        (x * &two + d) / (d * &two)
    }
}

/// The modulus `Q` as a `BigUint`.
pub fn modulus(ctx: &Context) -> BigUint {
    ctx.modulus().clone()
}
