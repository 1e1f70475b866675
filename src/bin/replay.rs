// Standalone replay tool for decision logs written by the server
//
// Usage:
//   cargo run --bin replay -- <log_file> [options]
//
// Set SNAKE_PROFILE=1 to print a profile of the replayed searches.

use std::env;
use std::process;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anytime_snake::config::Config;
use anytime_snake::replay::ReplayEngine;
use anytime_snake::simple_profiler;
use anytime_snake::types::Direction;

enum Mode {
    All,
    Turns(String),
    Validate(String),
}

fn print_usage() {
    eprintln!("anytime-snake replay tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --all                   Replay all turns in the log");
    eprintln!("  --turns <T1,T2,...>     Replay specific turns (comma-separated)");
    eprintln!("  --validate <T:M,...>    Validate logged moves (format: turn:move|move,...)");
    eprintln!("  --seed <N>              Use this seed for every turn instead of the logged one");
    eprintln!("  --budget-ms <N>         Search budget per turn (default: effective budget from config)");
    eprintln!("  --strict                Exit with status 2 if any replayed move differs from the log");
    eprintln!("  --verbose               Show detailed output for each turn");
    eprintln!("  --config <path>         Path to Snake.toml (default: Snake.toml)");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  replay snake_debug.jsonl --all");
    eprintln!("  replay snake_debug.jsonl --turns 5,10,15 --budget-ms 500");
    eprintln!("  replay snake_debug.jsonl --validate 5:up,10:left|right");
}

fn parse_turns(s: &str) -> Result<Vec<i32>, String> {
    s.split(',')
        .map(|t| {
            t.trim()
                .parse::<i32>()
                .map_err(|e| format!("Invalid turn number '{}': {}", t, e))
        })
        .collect()
}

fn parse_expected_moves(s: &str) -> Result<Vec<(i32, Vec<Direction>)>, String> {
    s.split(',')
        .map(|pair| {
            let parts: Vec<&str> = pair.trim().split(':').collect();
            if parts.len() != 2 {
                return Err(format!("Invalid format '{}'. Expected 'turn:move'", pair));
            }

            let turn = parts[0]
                .parse::<i32>()
                .map_err(|e| format!("Invalid turn number '{}': {}", parts[0], e))?;

            // Several acceptable moves are separated by '|'
            let moves = parts[1]
                .split('|')
                .map(Direction::from_str)
                .collect::<Result<Vec<Direction>, String>>()?;

            Ok((turn, moves))
        })
        .collect()
}

fn value_after(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) => v.clone(),
        None => {
            eprintln!("Error: {} requires an argument", flag);
            process::exit(1);
        }
    }
}

fn parse_number<T: FromStr>(raw: &str, flag: &str) -> T {
    raw.parse::<T>().unwrap_or_else(|_| {
        eprintln!("Error: {} expects a number, got '{}'", flag, raw);
        process::exit(1);
    })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(if args.contains(&"--help".to_string()) { 0 } else { 1 });
    }

    let log_file = &args[1];
    let mut config_path = "Snake.toml".to_string();
    let mut verbose = false;
    let mut mode = None;
    let mut seed = None;
    let mut budget_ms = None;
    let mut strict = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--all" => mode = Some(Mode::All),
            "--turns" => {
                mode = Some(Mode::Turns(value_after(&args, i, "--turns")));
                i += 1;
            }
            "--validate" => {
                mode = Some(Mode::Validate(value_after(&args, i, "--validate")));
                i += 1;
            }
            "--seed" => {
                seed = Some(parse_number::<u64>(&value_after(&args, i, "--seed"), "--seed"));
                i += 1;
            }
            "--budget-ms" => {
                budget_ms = Some(parse_number::<u64>(&value_after(&args, i, "--budget-ms"), "--budget-ms"));
                i += 1;
            }
            "--config" => {
                config_path = value_after(&args, i, "--config");
                i += 1;
            }
            "--verbose" => verbose = true,
            "--strict" => strict = true,
            _ => {
                eprintln!("Error: Unknown option '{}'", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mode = match mode {
        Some(m) => m,
        None => {
            eprintln!("Error: Must specify --all, --turns, or --validate");
            print_usage();
            process::exit(1);
        }
    };

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    println!("Loaded configuration from: {}", config_path);
    println!("Replay log file: {}", log_file);
    println!();

    let mut engine = ReplayEngine::new(config, verbose);
    if let Some(s) = seed {
        engine = engine.with_seed(s);
    }
    if let Some(ms) = budget_ms {
        engine = engine.with_budget(Duration::from_millis(ms));
    }

    let entries = match engine.load_log_file(log_file) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error loading log file: {}", e);
            process::exit(1);
        }
    };

    if entries.is_empty() {
        eprintln!("Error: Log file is empty");
        process::exit(1);
    }

    println!("Loaded {} log entries\n", entries.len());

    simple_profiler::reset();
    let started = Instant::now();

    let mismatches = match mode {
        Mode::All => {
            println!("Replaying all {} turns...\n", entries.len());
            let results = engine.replay_all(&entries);
            engine.print_report(&results);
            engine.generate_stats(&results).mismatches
        }
        Mode::Turns(raw) => {
            let turns = parse_turns(&raw).unwrap_or_else(|e| {
                eprintln!("Error parsing turns: {}", e);
                process::exit(1);
            });

            println!("Replaying {} specific turn(s)...\n", turns.len());
            match engine.replay_turns(&entries, &turns) {
                Ok(results) => {
                    engine.print_report(&results);
                    engine.generate_stats(&results).mismatches
                }
                Err(e) => {
                    eprintln!("Error during replay: {}", e);
                    process::exit(1);
                }
            }
        }
        Mode::Validate(raw) => {
            let expected_moves = parse_expected_moves(&raw).unwrap_or_else(|e| {
                eprintln!("Error parsing expected moves: {}", e);
                process::exit(1);
            });

            println!("Validating {} expected move(s)...\n", expected_moves.len());
            match engine.validate_expected_moves(&entries, &expected_moves) {
                Ok(()) => {
                    println!("✓ All expected moves validated successfully!");
                    0
                }
                Err(e) => {
                    eprintln!("✗ Validation failed: {}", e);
                    process::exit(1);
                }
            }
        }
    };

    simple_profiler::print_report(started.elapsed().as_millis() as u64);

    if strict && mismatches > 0 {
        eprintln!("{} replayed move(s) differ from the log", mismatches);
        process::exit(2);
    }
}
