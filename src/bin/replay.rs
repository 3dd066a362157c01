// Standalone replay tool for analyzing Snake3D tick logs
//
// Usage:
//   cargo run --bin replay -- <log_file> [options]
//
// Options:
//   --turns <turn1,turn2>  Report specific turns only (comma-separated)
//   --verbose              Show per-snake output for each turn
//   --config <path>        Path to Snake3d.toml (default: Snake3d.toml)

use std::env;
use std::process;

use snake3d_bot::config::Config;
use snake3d_bot::replay::ReplayEngine;

fn print_usage() {
    eprintln!("Snake3D Replay Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --turns <T1,T2,...>     Report specific turns (comma-separated)");
    eprintln!("  --verbose               Show per-snake output for each turn");
    eprintln!("  --config <path>         Path to Snake3d.toml (default: Snake3d.toml)");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  replay snake3d_debug.jsonl");
    eprintln!("  replay snake3d_debug.jsonl --turns 5,10,15 --verbose");
}

fn parse_turns(s: &str) -> Result<Vec<u64>, String> {
    s.split(',')
        .map(|t| {
            t.trim()
                .parse::<u64>()
                .map_err(|e| format!("Invalid turn number '{}': {}", t, e))
        })
        .collect()
}

struct Args {
    log_file: String,
    turns: Option<Vec<u64>>,
    verbose: bool,
    config_path: String,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut log_file = None;
    let mut turns = None;
    let mut verbose = false;
    let mut config_path = "Snake3d.toml".to_string();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--turns" => {
                let value = iter.next().ok_or("--turns requires a value")?;
                turns = Some(parse_turns(value)?);
            }
            "--verbose" => verbose = true,
            "--config" => {
                config_path = iter.next().ok_or("--config requires a value")?.clone();
            }
            other if other.starts_with("--") => return Err(format!("Unknown option: {}", other)),
            other => log_file = Some(other.to_string()),
        }
    }

    Ok(Args {
        log_file: log_file.ok_or("Missing log file")?,
        turns,
        verbose,
        config_path,
    })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help") {
        print_usage();
        process::exit(if args.is_empty() { 1 } else { 0 });
    }

    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    let config = Config::from_file(&args.config_path).unwrap_or_else(|e| {
        eprintln!("Warning: {} - using hardcoded defaults", e);
        Config::default_hardcoded()
    });

    let engine = ReplayEngine::new(config, args.verbose);
    let entries = match engine.load_log_file(&args.log_file) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let results = match engine.replay_entries(&entries, args.turns.as_deref()) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let stats = ReplayEngine::compute_stats(&results);
    println!();
    println!("Turns replayed: {}", stats.total_turns);
    println!("Matches:        {}", stats.matches);
    println!("Mismatches:     {}", stats.mismatches);
    println!("Match rate:     {:.1}%", stats.match_rate * 100.0);

    if stats.mismatches > 0 {
        process::exit(2);
    }
}
