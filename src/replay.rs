// Re-runs the search engine on boards recorded by the debug logger
//
// Each logged turn carries the seed it was decided with, so a replay under
// the same config and a budget large enough to finish the same depth
// reproduces the logged move. Differences point at config or engine changes.

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::search::{FallbackTier, SearchEngine, SharedSearchState};
use crate::types::Direction;

pub use crate::debug_logger::LogEntry;

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    pub original_score: f64,
    pub replayed_score: f64,
    pub original_depth: u8,
    pub search_depth: u8,
    pub tier: FallbackTier,
    pub completed: bool,
    pub computation_time_ms: u64,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
    /// Turns answered below the search tier
    pub fallbacks: usize,
    /// Turns where the replay finished a different depth than the log
    pub depth_changes: usize,
    pub average_depth: f64,
    pub average_time_ms: f64,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    engine: SearchEngine,
    budget: Duration,
    seed_override: Option<u64>,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration.
    /// Turns are searched with the configured effective budget.
    pub fn new(config: Config, verbose: bool) -> Self {
        let budget = Duration::from_millis(config.timing.effective_budget_ms());
        ReplayEngine {
            engine: SearchEngine::new(config),
            budget,
            seed_override: None,
            verbose,
        }
    }

    /// Searches every turn for `budget` instead of the configured budget
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Uses `seed` for every turn instead of the seed recorded in the log
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_override = Some(seed);
        self
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file = File::open(log_path.as_ref())
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &LogEntry) -> Result<ReplayResult, String> {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        if entry.board.snake(&entry.you).is_none() {
            return Err(format!("Snake with id '{}' not found in board state", entry.you));
        }

        let original_move = Direction::from_str(&entry.chosen_move)?;
        let seed = self.seed_override.unwrap_or(entry.seed);

        let decision = self.engine.decide_with(
            &entry.snapshot(),
            seed,
            self.budget,
            &SharedSearchState::new(),
        );

        let matches = original_move == decision.direction;
        let result = ReplayResult {
            turn: entry.turn,
            original_move,
            replayed_move: decision.direction,
            matches,
            original_score: entry.score,
            replayed_score: decision.score,
            original_depth: entry.depth,
            search_depth: decision.depth,
            tier: decision.tier,
            completed: decision.completed,
            computation_time_ms: decision.elapsed_ms,
        };

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} (score: {:.2}, depth: {}, time: {}ms)",
                    entry.turn,
                    result.replayed_move.as_str(),
                    result.replayed_score,
                    result.search_depth,
                    result.computation_time_ms
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {}, Replayed: {} (score: {:.2}, depth: {}, time: {}ms)",
                    entry.turn,
                    original_move.as_str(),
                    result.replayed_move.as_str(),
                    result.replayed_score,
                    result.search_depth,
                    result.computation_time_ms
                );
                for (dir, score) in &decision.move_scores {
                    info!("    {:>5}: {:.2}", dir.as_str(), score);
                }
            }
        }

        Ok(result)
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for entry in entries {
            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Failed to replay turn {}: {}", entry.turn, e),
            }
        }

        results
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for turn_num in turn_numbers {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn_num)
                .ok_or_else(|| format!("Turn {} not found in log file", turn_num))?;

            match self.replay_entry(entry) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Failed to replay turn {}: {}", turn_num, e),
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        if total_turns == 0 {
            return ReplayStats::default();
        }

        let n = total_turns as f64;
        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate: matches as f64 / n * 100.0,
            fallbacks: results.iter().filter(|r| r.tier != FallbackTier::Search).count(),
            depth_changes: results
                .iter()
                .filter(|r| r.search_depth != r.original_depth)
                .count(),
            average_depth: results.iter().map(|r| r.search_depth as f64).sum::<f64>() / n,
            average_time_ms: results.iter().map(|r| r.computation_time_ms as f64).sum::<f64>() / n,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("Fallbacks:      {}", stats.fallbacks);
        println!("Depth changes:  {}", stats.depth_changes);
        println!("═══════════════════════════════════════════════════════════\n");

        if stats.total_turns > 0 {
            println!("Average Search Depth:       {:.1}", stats.average_depth);
            println!("Average Computation Time:   {:.1}ms\n", stats.average_time_ms);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} (score {:.2} → {:.2}, depth {} → {}, {:?}{}, {}ms)",
                    result.turn,
                    result.original_move.as_str(),
                    result.replayed_move.as_str(),
                    result.original_score,
                    result.replayed_score,
                    result.original_depth,
                    result.search_depth,
                    result.tier,
                    if result.completed { "" } else { ", partial" },
                    result.computation_time_ms
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(i32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let actual_move = Direction::from_str(&entry.chosen_move)?;

            if !acceptable.contains(&actual_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    actual_move.as_str()
                ));
            }
        }

        Ok(())
    }
}
