//! towertrace CLI - Debug tool for trajectory inference
//!
//! Usage:
//!   towertrace-cli infer <records.json> [--output <file>] [--seed <n>]
//!   towertrace-cli generate [--devices <n>] [--days <n>] [--output <file>]
//!
//! `infer` reads a JSON array of raw sighting records, runs the full
//! pipeline for every flagged device and prints (or writes) the per-device
//! reports. `generate` emits a synthetic dataset with known ground truth
//! for exercising the pipeline.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use towertrace::synthetic::SyntheticScenario;
use towertrace::{
    DeviceReport, InferenceConfig, InferenceEngine, LocationEstimate, RawRecord, Strategy,
};

#[derive(Parser)]
#[command(name = "towertrace-cli")]
#[command(about = "Debug tool for sighting-log trajectory inference", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run inference over a JSON file of raw sighting records
    Infer {
        /// JSON file containing an array of records
        file: PathBuf,

        /// Write reports as JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fix the simulation seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Number of simulation trials
        #[arg(long, default_value = "100")]
        trials: u32,

        /// Result branches: "heuristic", "path" or "both"
        #[arg(long, default_value = "both")]
        strategy: String,

        /// Process devices serially even when parallel support is built in
        #[arg(long)]
        serial: bool,
    },

    /// Generate a synthetic dataset with known ground truth
    Generate {
        /// Number of flagged devices
        #[arg(long, default_value = "5")]
        devices: usize,

        /// Days of activity per device
        #[arg(long, default_value = "3")]
        days: u32,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Write records as JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Infer {
            file,
            output,
            seed,
            trials,
            strategy,
            serial,
        } => run_infer(&file, output.as_ref(), seed, trials, &strategy, serial),
        Commands::Generate {
            devices,
            days,
            seed,
            output,
        } => run_generate(devices, days, seed, output.as_ref()),
    }
}

fn run_infer(
    file: &PathBuf,
    output: Option<&PathBuf>,
    seed: Option<u64>,
    trials: u32,
    strategy: &str,
    serial: bool,
) -> ExitCode {
    let strategy = match strategy {
        "heuristic" => Strategy::Heuristic,
        "path" => Strategy::ConstrainedPath,
        "both" => Strategy::Both,
        other => {
            eprintln!("Unknown strategy '{}': use heuristic, path or both", other);
            return ExitCode::FAILURE;
        }
    };

    let records: Vec<RawRecord> = match File::open(file) {
        Ok(f) => match serde_json::from_reader(BufReader::new(f)) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Error parsing {}: {}", file.display(), e);
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            eprintln!("Error opening {}: {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    println!("\n{}", "=".repeat(60));
    println!("Inferring from {} records: {}", records.len(), file.display());
    println!("{}", "=".repeat(60));

    let config = InferenceConfig {
        simulation_seed: seed,
        simulation_trials: trials,
        strategy,
        ..InferenceConfig::default()
    };
    let engine = match InferenceEngine::new(config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let reports = run_batch(&engine, &records, serial);

    let mut device_ids: Vec<&String> = reports.keys().collect();
    device_ids.sort();
    for id in &device_ids {
        print_summary(&reports[*id]);
    }

    if let Some(path) = output {
        match File::create(path) {
            Ok(f) => {
                let mut writer = BufWriter::new(f);
                if let Err(e) = serde_json::to_writer_pretty(&mut writer, &reports) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
                let _ = writer.flush();
                println!("\nWrote {} reports to {}", reports.len(), path.display());
            }
            Err(e) => {
                eprintln!("Error creating {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

#[cfg(feature = "parallel")]
fn run_batch(
    engine: &InferenceEngine,
    records: &[RawRecord],
    serial: bool,
) -> std::collections::HashMap<String, DeviceReport> {
    if serial {
        engine.infer_batch(records)
    } else {
        engine.infer_batch_parallel(records)
    }
}

#[cfg(not(feature = "parallel"))]
fn run_batch(
    engine: &InferenceEngine,
    records: &[RawRecord],
    _serial: bool,
) -> std::collections::HashMap<String, DeviceReport> {
    engine.infer_batch(records)
}

fn print_summary(report: &DeviceReport) {
    println!("\nDevice: {}", report.device_id);
    match &report.estimate {
        LocationEstimate::Heuristic { tower, score } => {
            println!("  Estimate: {} (heuristic, score {:.3})", tower, score);
        }
        LocationEstimate::ConstrainedPath {
            tower,
            cost,
            timestamp,
        } => {
            println!(
                "  Estimate: {} (constrained path, cost {:.6}, at {})",
                tower, cost, timestamp
            );
        }
        LocationEstimate::LastSighting { tower, timestamp } => {
            println!("  Estimate: {} (last sighting fallback, at {})", tower, timestamp);
        }
        LocationEstimate::NoData => {
            println!("  Estimate: no data");
            return;
        }
    }
    println!(
        "  Sessions: {}  Top towers: {}",
        report.session_count,
        report.top_towers.join(", ")
    );
    if let Some(sim) = &report.simulated_likely_tower {
        println!("  Simulated next location: {}", sim);
    }
    if let Some(route) = &report.route {
        println!(
            "  Route: {} ({} hops, cost {:.6})",
            route.path.join(" -> "),
            route.hops,
            route.total_cost
        );
    }
}

fn run_generate(devices: usize, days: u32, seed: u64, output: Option<&PathBuf>) -> ExitCode {
    let scenario = SyntheticScenario {
        device_count: devices,
        days,
        seed,
        ..SyntheticScenario::default()
    };
    let dataset = scenario.generate();

    println!("\n{}", "=".repeat(60));
    println!(
        "Generated {} records for {} devices ({} towers)",
        dataset.records.len(),
        devices,
        dataset.tower_coords.len()
    );
    println!("{}", "=".repeat(60));

    let mut homes: Vec<(&String, &String)> = dataset.homes.iter().collect();
    homes.sort();
    for (device, home) in homes {
        println!("  {} home: {}", device, home);
    }

    match output {
        Some(path) => match File::create(path) {
            Ok(f) => {
                let mut writer = BufWriter::new(f);
                if let Err(e) = serde_json::to_writer_pretty(&mut writer, &dataset.records) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
                let _ = writer.flush();
                println!("\nWrote records to {}", path.display());
            }
            Err(e) => {
                eprintln!("Error creating {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => match serde_json::to_string_pretty(&dataset.records) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing records: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}
