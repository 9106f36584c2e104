//! Execute simulations for measuring the return to player of a game.
//!
//! The game is either the built-in one or a game folder (see [`reel_engine::par_table`]). With a
//! seed the run is fully reproducible: two runs with the same seed print the same figures.
use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use reel_engine::{
    built_info,
    par_table::{reel_symbol_counts, ParTable},
    rng::{EntropyRandomSource, RandomSource, SeededRandomSource},
    rtp::{expected_rtp, simulate, RtpReport},
    Credits,
};

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Measures the return to player of a reel game", long_about = None)]
struct Args {
    /// Game folder with weights, paytable and paylines CSV files (built-in game if omitted)
    #[arg(long)]
    game: Option<PathBuf>,

    /// Spins per simulation run
    #[arg(long, default_value = "1000000")]
    spins: u64,

    /// Bet of every spin
    #[arg(long, default_value = "1")]
    bet: Credits,

    /// Seed for reproducible runs (entropy if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Runs averaged into the expected RTP (skipped when 0)
    #[arg(long, default_value = "10")]
    iterations: u64,
}

fn print_report(table: &ParTable, report: &RtpReport, bet: Credits) {
    println!("{:<12} {:>16}", "Figure", "Value");
    println!("{:-<12} {:->16}", "", "");
    println!("{:<12} {:>16}", "Spins", report.spins);
    println!("{:<12} {:>16}", "Total bet", report.total_bet);
    println!("{:<12} {:>16}", "Total return", report.total_return);
    println!("{:<12} {:>16}", "Wins", report.wins);
    println!("{:<12} {:>15.4}%", "Hit rate", report.hit_rate);
    println!("{:<12} {:>15.4}%", "RTP", report.rtp);
    println!();

    println!(
        "{:<10} {:<5} {:>12} {:>14} {:>12}",
        "Symbol", "Count", "Hits", "Per 1000 spins", "RTP share"
    );
    println!("{:-<10} {:-<5} {:->12} {:->14} {:->12}", "", "", "", "", "");
    for ((symbol, count), hits) in &report.line_hits {
        let returned = *hits as f64 * table.paytable.payout_for(*symbol, *count) as f64 * bet as f64;
        println!(
            "{:<10} {:<5} {:>12} {:>14.4} {:>11.4}%",
            symbol,
            count,
            hits,
            *hits as f64 / report.spins as f64 * 1000.0,
            returned / report.total_bet as f64 * 100.0
        );
    }
    println!();
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("reel-engine simulation v{}", built_info::PKG_VERSION);

    let table = match &args.game {
        Some(folder) => ParTable::from_folder(folder)
            .with_context(|| format!("Could not load game from {}", folder.display()))?,
        None => ParTable::default(),
    };
    println!("{}\n", table);

    let rng: Box<dyn RandomSource> = match args.seed {
        Some(seed) => Box::new(SeededRandomSource::new(seed)),
        None => Box::new(EntropyRandomSource::new()),
    };
    let mut machine = table
        .build_machine(rng)
        .context("Could not build slot machine")?;

    for (symbol, counts) in reel_symbol_counts(&machine) {
        info!("{:<10} per reel: {:?}", symbol, counts);
    }

    info!("Starting {} spin simulation", args.spins);
    let now = Instant::now();
    let report = simulate(&mut machine, args.spins, args.bet).context("Simulation failed")?;
    info!(
        "{} spin simulation finished ({:.2?})",
        args.spins,
        now.elapsed()
    );

    print_report(&table, &report, args.bet);

    if args.iterations > 0 {
        let now = Instant::now();
        let rtp = expected_rtp(&mut machine, args.iterations, args.spins, args.bet)
            .context("Expected RTP estimation failed")?;
        println!(
            "Expected RTP over {} runs of {} spins: {:.4}% ({:.2?})",
            args.iterations,
            args.spins,
            rtp,
            now.elapsed()
        );
    }

    Ok(())
}
