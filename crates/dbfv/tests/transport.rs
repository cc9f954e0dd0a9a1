mod common;

use std::error::Error as StdError;

use common::Party;
use dbfv::{
    rkg::{CommonRandomMatrix, RkgProtocol, RoundOneShare, RoundThreeShare, RoundTwoShare, ShareShape},
    Error, RkgParametersBuilder,
};
use dbfv_math::rq::{Context, Poly};
use num_bigint::BigUint;
use rand::thread_rng;
use zeroize::Zeroizing;

/// Coefficients of an element as they would travel between parties.
type Wire = Vec<BigUint>;

fn send(ctx: &Context, p: &Poly) -> Wire {
    ctx.poly_to_biguint(p)
}

fn receive(ctx: &Context, wire: &Wire) -> Poly {
    ctx.poly_from_biguint(wire).unwrap()
}

#[test]
fn shares_received_from_peers_aggregate_like_local_ones() -> Result<(), Box<dyn StdError>> {
    let mut rng = thread_rng();
    let par = RkgParametersBuilder::new()
        .set_degree(16)
        .set_moduli_sizes(&[55, 55])
        .set_bit_decomposition(20)
        .build_arc()?;
    let ctx = par.ctx().as_ref();
    let engine = RkgProtocol::from_parameters(&par);
    let crp = CommonRandomMatrix::new_deterministic(&par, [5u8; 32]);
    let shape = engine.shape();

    let alice = Party::new(ctx, &mut rng);
    let bob = Party::new(ctx, &mut rng);
    let u_alice = Zeroizing::new(engine.new_ephemeral_key(0.5, &mut rng)?);
    let u_bob = Zeroizing::new(engine.new_ephemeral_key(0.5, &mut rng)?);

    // Round 1: Bob's share reaches Alice element by element.
    let (mut a1, mut a2, mut a3) = engine.allocate_shares();
    let (mut b1, mut b2, mut b3) = engine.allocate_shares();
    engine.gen_share_round_one(&u_alice, &alice.sk, &crp, &mut a1, &mut rng)?;
    engine.gen_share_round_one(&u_bob, &bob.sk, &crp, &mut b1, &mut rng)?;
    let wire = b1.iter().map(|(_, e)| send(ctx, e)).collect::<Vec<_>>();
    let received =
        RoundOneShare::from_fn(shape, |i, w| receive(ctx, &wire[i * shape.levels + w]));
    assert_eq!(received, b1);
    let h = engine.aggregate_round_one_shares([&a1, &received])?;
    assert_eq!(h, engine.aggregate_round_one_shares([&a1, &b1])?);

    // Round 2: two elements per slot.
    engine.gen_share_round_two(&h, &alice.sk, &crp, &mut a2, &mut rng)?;
    engine.gen_share_round_two(&h, &bob.sk, &crp, &mut b2, &mut rng)?;
    let wire = b2
        .iter()
        .map(|(_, [e0, e1])| [send(ctx, e0), send(ctx, e1)])
        .collect::<Vec<_>>();
    let received = RoundTwoShare::from_fn(shape, |i, w| {
        let [e0, e1] = &wire[i * shape.levels + w];
        [receive(ctx, e0), receive(ctx, e1)]
    });
    let mut h2 = a2.clone();
    engine.accumulate_round_two(&mut h2, &received)?;
    assert_eq!(h2, engine.aggregate_round_two_shares([&a2, &b2])?);

    // Round 3.
    engine.gen_share_round_three(&h2, &u_alice, &alice.sk, &mut a3, &mut rng)?;
    engine.gen_share_round_three(&h2, &u_bob, &bob.sk, &mut b3, &mut rng)?;
    let wire = b3.iter().map(|(_, e)| send(ctx, e)).collect::<Vec<_>>();
    let received =
        RoundThreeShare::from_fn(shape, |i, w| receive(ctx, &wire[i * shape.levels + w]));
    let (_, _, mut h3) = engine.allocate_shares();
    engine.aggregate_round_three(&a3, &received, &mut h3)?;

    let mut rlk = engine.allocate_relinearization_key();
    let mut expected = engine.allocate_relinearization_key();
    engine.gen_relinearization_key(&h2, &h3, &mut rlk)?;
    engine.gen_relinearization_key(
        &engine.aggregate_round_two_shares([&a2, &b2])?,
        &engine.aggregate_round_three_shares([&a3, &b3])?,
        &mut expected,
    )?;
    assert_eq!(rlk, expected);
    Ok(())
}

#[test]
fn received_share_of_the_wrong_shape_is_rejected() -> Result<(), Box<dyn StdError>> {
    let mut rng = thread_rng();
    let par = RkgParametersBuilder::new()
        .set_degree(16)
        .set_moduli_sizes(&[55, 55])
        .set_bit_decomposition(30)
        .build_arc()?;
    let ctx = par.ctx().as_ref();
    let engine = RkgProtocol::from_parameters(&par);
    let crp = CommonRandomMatrix::new(&par, &mut rng);
    let party = Party::new(ctx, &mut rng);
    let u = engine.new_ephemeral_key(0.5, &mut rng)?;

    let (mut local, _, _) = engine.allocate_shares();
    engine.gen_share_round_one(&u, &party.sk, &crp, &mut local, &mut rng)?;
    let before = local.clone();

    let truncated = ShareShape::new(2, 1);
    let received = RoundOneShare::from_fn(truncated, |i, w| local[(i, w)].clone());
    assert_eq!(
        engine.accumulate_round_one(&mut local, &received),
        Err(Error::ShareShape {
            expected: engine.shape(),
            found: truncated
        })
    );
    assert_eq!(local, before);
    Ok(())
}
