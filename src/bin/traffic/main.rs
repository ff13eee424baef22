// Network Traffic Replayer
// Seeded random command streams against the network core, with invariant
// checks after every step and a determinism check per seed
//
// Usage:
//   cargo run --release --bin traffic                        # 10 seeds, 2000 steps each
//   cargo run --release --bin traffic -- --runs 50 --seed 7  # 50 seeds starting at 7
//   cargo run --release --bin traffic -- --output out.json   # Write JSON report
//   RUST_LOG=telecom_engine=debug cargo run --bin traffic -- --runs 1 --steps 50

mod replay;
mod report;
mod traffic;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use replay::ReplayConfig;
use report::ReplayReport;

/// Replay seeded command streams and verify the network's invariants.
#[derive(Parser, Debug)]
#[command(name = "traffic")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of seeds to replay
    #[arg(short = 'r', long, default_value = "10")]
    runs: u64,

    /// First seed; runs use seed..seed+runs
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Commands per run
    #[arg(short = 'n', long, default_value = "2000")]
    steps: u32,

    /// Clients in the generated population
    #[arg(short = 'c', long, default_value = "8")]
    clients: usize,

    /// Terminals owned by each client
    #[arg(short = 't', long, default_value = "3")]
    terminals_per_client: usize,

    /// Write the JSON report here
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let config = ReplayConfig {
        clients: args.clients.max(1),
        terminals_per_client: args.terminals_per_client.max(1),
        steps: args.steps,
    };
    info!(runs = args.runs, seed = args.seed, steps = args.steps, "starting replay");

    println!("\n  Network Traffic Replayer v{}", env!("CARGO_PKG_VERSION"));
    println!("  PRNG: ChaCha8Rng | Runs: {} | Base seed: {} | Steps: {}", args.runs, args.seed, args.steps);
    println!();
    println!("  {:>6} {:>8} {:>8} {:>10} {:>10} {:>9} {:>7}", "Seed", "Comms", "OK", "Paid", "Debt", "Tiers", "Time");
    println!("  {}", "-".repeat(66));

    let suite_start = Instant::now();
    let mut runs = Vec::new();
    for seed in args.seed..args.seed.saturating_add(args.runs) {
        let result = match replay::run_checked(&config, seed) {
            Ok(result) => result,
            Err(err) => {
                error!(seed, %err, "population setup failed");
                return ExitCode::FAILURE;
            }
        };
        println!(
            "  {:>6} {:>8} {:>8} {:>10} {:>10} {:>3}/{}/{} {:>5}ms  {}",
            result.seed,
            result.communications,
            result.ok_commands,
            result.global_payments,
            result.global_debts,
            result.tier_breakdown[0],
            result.tier_breakdown[1],
            result.tier_breakdown[2],
            result.elapsed_ms,
            if result.passed() { "PASS" } else { "FAIL" },
        );
        for v in &result.violations {
            println!("           {v}");
        }
        runs.push(result);
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_default();
    let report = ReplayReport::new(timestamp, runs);

    println!("  {}", "-".repeat(66));
    println!(
        "  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        report.summary.total,
        report.summary.passed,
        report.summary.failed,
        suite_start.elapsed().as_secs_f64()
    );

    if let Some(path) = &args.output {
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("  Results saved to: {}\n", path.display()),
            Err(err) => {
                error!(path = %path.display(), %err, "could not write report");
                return ExitCode::FAILURE;
            }
        }
    }

    if report.summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
