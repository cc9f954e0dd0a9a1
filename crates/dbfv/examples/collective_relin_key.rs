// Collective generation of a relinearization key between several parties,
// each holding an additive share of the secret key.

use std::{env, error::Error, process::exit, time::Instant};

use console::style;
use dbfv::{
    rkg::{CommonRandomMatrix, RkgProtocol},
    RkgParametersBuilder,
};
use dbfv_traits::PolySampler;
use rand::{rngs::OsRng, thread_rng};
use tracing::info;
use tracing_subscriber::fmt;
use zeroize::Zeroizing;

fn print_usage_and_exit() -> ! {
    println!("Usage: collective_relin_key [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -n, --parties <VALUE>    Number of parties (default: 3)");
    println!("  -d, --degree <VALUE>     Polynomial degree (power of 2, default: 4096)");
    println!("  -b, --bits <VALUE>       Bits per decomposition digit (default: 20)");
    println!("  -h, --help               Show this help message");
    exit(0)
}

fn parse_args() -> (usize, usize, usize) {
    let mut num_parties = 3;
    let mut degree = 4096;
    let mut bit_decomposition = 20;

    let args = env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0;
    while i < args.len() {
        let value = |i: usize| -> usize {
            args.get(i + 1)
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    eprintln!("Error: {} requires a numeric value", args[i]);
                    exit(1)
                })
        };
        match args[i].as_str() {
            "--parties" | "-n" => num_parties = value(i),
            "--degree" | "-d" => degree = value(i),
            "--bits" | "-b" => bit_decomposition = value(i),
            "--help" | "-h" => print_usage_and_exit(),
            other => {
                eprintln!("Error: Unknown argument '{other}'");
                print_usage_and_exit()
            }
        }
        i += 2;
    }
    if num_parties == 0 {
        eprintln!("Error: number of parties must be greater than 0");
        exit(1);
    }
    (num_parties, degree, bit_decomposition)
}

fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_target(false)
        .with_ansi(false)
        .init();

    let (num_parties, degree, bit_decomposition) = parse_args();

    println!(
        "{}",
        style("=== Collective relinearization key generation ===")
            .green()
            .bold()
    );

    let par = RkgParametersBuilder::new()
        .set_degree(degree)
        .set_moduli_sizes(&[55, 55, 55, 55])
        .set_bit_decomposition(bit_decomposition)
        .build_arc()?;
    let engine = RkgProtocol::from_parameters(&par);
    info!(
        parties = num_parties,
        degree,
        bit_decomposition,
        levels = engine.levels(),
        "starting relinearization key generation"
    );
    println!("Parameters:");
    println!("  • Parties: {num_parties}");
    println!("  • Degree: {degree}");
    println!("  • Moduli: {:?}", par.moduli());
    println!("  • Decomposition: {bit_decomposition} bits, {} levels", engine.levels());

    // The common random matrix would normally be expanded from a seed agreed
    // upon by all the parties.
    let crp = CommonRandomMatrix::new_deterministic(&par, [7u8; 32]);

    struct Party {
        sk: Zeroizing<dbfv_math::rq::Poly>,
        u: Zeroizing<dbfv_math::rq::Poly>,
    }

    let mut rng = thread_rng();
    let parties = (0..num_parties)
        .map(|_| -> Result<Party, Box<dyn Error>> {
            let sk = par
                .sampler()
                .sample_ternary(par.ctx().as_ref(), 0.5, &mut OsRng)?;
            let u = engine.new_ephemeral_key(0.5, &mut OsRng)?;
            Ok(Party {
                sk: Zeroizing::new(sk),
                u: Zeroizing::new(u),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    println!("\n{}", style("Round 1").yellow().bold());
    let start = Instant::now();
    let mut round1 = Vec::with_capacity(num_parties);
    for party in &parties {
        let (mut share, _, _) = engine.allocate_shares();
        engine.gen_share_round_one(&party.u, &party.sk, &crp, &mut share, &mut rng)?;
        round1.push(share);
    }
    let round1_agg = engine.aggregate_round_one_shares(&round1)?;
    println!("  shares and aggregation: {:?}", start.elapsed());

    println!("\n{}", style("Round 2").yellow().bold());
    let start = Instant::now();
    let mut round2 = Vec::with_capacity(num_parties);
    for party in &parties {
        let (_, mut share, _) = engine.allocate_shares();
        engine.gen_share_round_two(&round1_agg, &party.sk, &crp, &mut share, &mut rng)?;
        round2.push(share);
    }
    let round2_agg = engine.aggregate_round_two_shares(&round2)?;
    println!("  shares and aggregation: {:?}", start.elapsed());

    println!("\n{}", style("Round 3").yellow().bold());
    let start = Instant::now();
    let mut round3 = Vec::with_capacity(num_parties);
    for party in &parties {
        let (_, _, mut share) = engine.allocate_shares();
        engine.gen_share_round_three(&round2_agg, &party.u, &party.sk, &mut share, &mut rng)?;
        round3.push(share);
    }
    let round3_agg = engine.aggregate_round_three_shares(&round3)?;
    println!("  shares and aggregation: {:?}", start.elapsed());

    let start = Instant::now();
    let mut rlk = engine.allocate_relinearization_key();
    engine.gen_relinearization_key(&round2_agg, &round3_agg, &mut rlk)?;
    println!(
        "\n{} {} in {:?}",
        style("Relinearization key").green().bold(),
        rlk.shape(),
        start.elapsed()
    );
    Ok(())
}
