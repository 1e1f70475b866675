// Configuration module for reading Snake.toml
// This module provides OOP-style configuration management for the decision engine

use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::heuristics::AreaMode;
use crate::opponent::OpponentMode;
use crate::search::SearchFraming;
use crate::types::Direction;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub time_estimation: TimeEstimationConfig,
    pub search: SearchConfig,
    pub rules: RulesConfig,
    pub weights: WeightsConfig,
    pub fallback: FallbackConfig,
    pub debug: DebugConfig,
}

/// Timing and performance constants
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
    pub polling_interval_ms: u64,
    pub initial_depth: u8,
    pub min_time_remaining_ms: u64,
    pub max_search_depth: u8,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Time estimation constants for iterative deepening
#[derive(Debug, Deserialize, Clone)]
pub struct TimeEstimationConfig {
    /// Share of the model in the blended estimate; the rest comes from the
    /// measured time of the previous iteration
    pub model_weight: f64,
    pub one_vs_one: GameModeTimeEstimation,
    pub multiplayer: GameModeTimeEstimation,
}

/// Exponential model constants for one game mode
#[derive(Debug, Deserialize, Clone)]
pub struct GameModeTimeEstimation {
    pub base_iteration_time_ms: f64,
    pub branching_factor: f64,
}

impl TimeEstimationConfig {
    /// Model constants for a game with `num_snakes` alive snakes
    pub fn for_snakes(&self, num_snakes: usize) -> &GameModeTimeEstimation {
        if num_snakes <= 2 {
            &self.one_vs_one
        } else {
            &self.multiplayer
        }
    }
}

/// Search framing and opponent prediction
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub framing: SearchFraming,
    pub opponent_model: OpponentMode,
    pub parallel_root: bool,
    /// Cap on joint opponent outcomes expanded under one self move
    pub max_opponent_branches: usize,
    /// Independent joint samples drawn per self move when the opponent
    /// model is stochastic
    pub sampled_outcomes: usize,
}

/// Game rules used by the forward simulator
#[derive(Debug, Deserialize, Clone)]
pub struct RulesConfig {
    pub health_max: i32,
    pub health_on_food: i32,
    pub health_loss_per_turn: i32,
    pub hazard_damage_per_turn: i32,
    /// Keep a snake's body as an obstacle for one extra step after it dies
    pub retain_dead_bodies: bool,
}

/// Evaluation weights and heuristic constants
///
/// Intended ordering: death >> territory & survival >> food >> aggression.
#[derive(Debug, Deserialize, Clone)]
pub struct WeightsConfig {
    pub death: f64,

    pub territory: f64,

    pub area: f64,
    pub area_mode: AreaMode,
    pub space_shortage_penalty: f64,
    pub cell_value_factor: f64,

    pub survival: f64,

    pub food: f64,
    pub food_satiated_factor: f64,

    pub hazard: f64,
    pub hazard_soak_factor: f64,

    pub boundary_push: f64,

    pub head_to_head_kill: f64,
    pub head_to_head_loss: f64,
    pub head_to_head_tie: f64,
}

/// Last-resort move selection
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    pub default_move: Direction,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 80,
                network_overhead_ms: 50,
                polling_interval_ms: 2,
                initial_depth: 1,
                min_time_remaining_ms: 2,
                max_search_depth: 12,
            },
            time_estimation: TimeEstimationConfig {
                model_weight: 0.1,
                one_vs_one: GameModeTimeEstimation {
                    base_iteration_time_ms: 0.02,
                    branching_factor: 2.5,
                },
                multiplayer: GameModeTimeEstimation {
                    base_iteration_time_ms: 0.01,
                    branching_factor: 1.2,
                },
            },
            search: SearchConfig {
                framing: SearchFraming::Adversarial,
                opponent_model: OpponentMode::Exhaustive,
                parallel_root: true,
                max_opponent_branches: 27,
                sampled_outcomes: 3,
            },
            rules: RulesConfig {
                health_max: 100,
                health_on_food: 100,
                health_loss_per_turn: 1,
                hazard_damage_per_turn: 14,
                retain_dead_bodies: false,
            },
            weights: WeightsConfig {
                death: 1_000_000.0,
                territory: 10.0,
                area: 6.0,
                area_mode: AreaMode::FloodFill,
                space_shortage_penalty: 25.0,
                cell_value_factor: 0.5,
                survival: 30.0,
                food: 4.0,
                food_satiated_factor: 0.25,
                hazard: 50.0,
                hazard_soak_factor: 0.5,
                boundary_push: 1.0,
                head_to_head_kill: 1000.0,
                head_to_head_loss: 500_000.0,
                head_to_head_tie: 400_000.0,
            },
            fallback: FallbackConfig {
                default_move: Direction::Up,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_budget_calculation() {
        let config = Config::default_hardcoded();
        assert_eq!(config.timing.effective_budget_ms(), 30);
    }

    #[test]
    fn test_weight_ordering() {
        let w = Config::default_hardcoded().weights;
        assert!(w.death > w.head_to_head_loss);
        assert!(w.head_to_head_loss > w.head_to_head_tie);
        assert!(w.territory > w.food);
        assert!(w.food > w.boundary_push);
    }

    #[test]
    fn test_estimation_block_follows_snake_count() {
        let est = Config::default_hardcoded().time_estimation;
        assert_eq!(est.for_snakes(2).branching_factor, est.one_vs_one.branching_factor);
        assert_eq!(est.for_snakes(1).branching_factor, est.one_vs_one.branching_factor);
        assert_eq!(est.for_snakes(4).branching_factor, est.multiplayer.branching_factor);
    }

    #[test]
    fn test_snake_toml_can_be_parsed() {
        // This test ensures Snake.toml is valid and can be parsed
        let result = Config::from_file("Snake.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Snake.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file = Config::from_file("Snake.toml").expect("Snake.toml should be parseable");
        let hard = Config::default_hardcoded();

        // Timing
        assert_eq!(file.timing.response_time_budget_ms, hard.timing.response_time_budget_ms);
        assert_eq!(file.timing.network_overhead_ms, hard.timing.network_overhead_ms);
        assert_eq!(file.timing.polling_interval_ms, hard.timing.polling_interval_ms);
        assert_eq!(file.timing.initial_depth, hard.timing.initial_depth);
        assert_eq!(file.timing.min_time_remaining_ms, hard.timing.min_time_remaining_ms);
        assert_eq!(file.timing.max_search_depth, hard.timing.max_search_depth);

        // Time estimation
        let (fe, he) = (&file.time_estimation, &hard.time_estimation);
        assert_eq!(fe.model_weight, he.model_weight);
        assert_eq!(fe.one_vs_one.base_iteration_time_ms, he.one_vs_one.base_iteration_time_ms);
        assert_eq!(fe.one_vs_one.branching_factor, he.one_vs_one.branching_factor);
        assert_eq!(fe.multiplayer.base_iteration_time_ms, he.multiplayer.base_iteration_time_ms);
        assert_eq!(fe.multiplayer.branching_factor, he.multiplayer.branching_factor);

        // Search
        assert_eq!(file.search.framing, hard.search.framing);
        assert_eq!(file.search.opponent_model, hard.search.opponent_model);
        assert_eq!(file.search.parallel_root, hard.search.parallel_root);
        assert_eq!(file.search.max_opponent_branches, hard.search.max_opponent_branches);
        assert_eq!(file.search.sampled_outcomes, hard.search.sampled_outcomes);

        // Rules
        assert_eq!(file.rules.health_on_food, hard.rules.health_on_food);
        assert_eq!(file.rules.health_loss_per_turn, hard.rules.health_loss_per_turn);
        assert_eq!(file.rules.hazard_damage_per_turn, hard.rules.hazard_damage_per_turn);
        assert_eq!(file.rules.retain_dead_bodies, hard.rules.retain_dead_bodies);

        // Weights
        assert_eq!(file.weights.death, hard.weights.death);
        assert_eq!(file.weights.territory, hard.weights.territory);
        assert_eq!(file.weights.area, hard.weights.area);
        assert_eq!(file.weights.area_mode, hard.weights.area_mode);
        assert_eq!(file.weights.survival, hard.weights.survival);
        assert_eq!(file.weights.food, hard.weights.food);
        assert_eq!(file.weights.hazard, hard.weights.hazard);
        assert_eq!(file.weights.boundary_push, hard.weights.boundary_push);
        assert_eq!(file.weights.head_to_head_loss, hard.weights.head_to_head_loss);

        // Fallback
        assert_eq!(file.fallback.default_move, hard.fallback.default_move);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());

        let result = Config::from_toml_str("[timing]\nresponse_time_budget_ms = \"soon\"");
        assert!(result.is_err());
    }
}
