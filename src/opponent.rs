// Opponent model
//
// Predicts what a rival snake might do next. The search engine only sees the
// `OpponentModel` trait; which implementation is used is a configuration
// choice trading accuracy for speed.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::heuristics::{flood_fill, food_threshold, nearest_food_distance};
use crate::safety;
use crate::simulator::Simulator;
use crate::types::Direction;

/// Which opponent model to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentMode {
    /// Branch on every legal move
    Exhaustive,
    /// One legal move drawn uniformly at random
    Sampled,
    /// The opponent's own one-ply best move
    Greedy,
}

/// Predicts the candidate next moves of one opponent.
///
/// Always returns at least one direction for a snake that is on the board;
/// a boxed-in snake is predicted to keep going and die in the simulator.
pub trait OpponentModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn predict(&self, board: &Board, snake_id: &str, rng: &mut StdRng) -> Vec<Direction>;

    /// True if repeated calls may return different predictions
    fn is_stochastic(&self) -> bool {
        false
    }
}

/// Builds the model selected by `mode`
pub fn build_opponent_model(mode: OpponentMode, simulator: &Simulator) -> Box<dyn OpponentModel> {
    match mode {
        OpponentMode::Exhaustive => Box::new(ExhaustiveOpponent),
        OpponentMode::Sampled => Box::new(SampledOpponent),
        OpponentMode::Greedy => Box::new(GreedyOpponent::new(simulator.clone())),
    }
}

/// Move a trapped snake is assumed to make
fn doomed_move(board: &Board, snake_id: &str) -> Vec<Direction> {
    let dir = board
        .snake(snake_id)
        .and_then(|s| s.heading())
        .unwrap_or(Direction::Up);
    vec![dir]
}

pub struct ExhaustiveOpponent;

impl OpponentModel for ExhaustiveOpponent {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn predict(&self, board: &Board, snake_id: &str, _rng: &mut StdRng) -> Vec<Direction> {
        let legal = safety::legal_moves(board, snake_id);
        if legal.is_empty() {
            doomed_move(board, snake_id)
        } else {
            legal
        }
    }
}

pub struct SampledOpponent;

impl OpponentModel for SampledOpponent {
    fn name(&self) -> &'static str {
        "sampled"
    }

    fn predict(&self, board: &Board, snake_id: &str, rng: &mut StdRng) -> Vec<Direction> {
        let legal = safety::legal_moves(board, snake_id);
        match legal.choose(rng) {
            Some(dir) => vec![*dir],
            None => doomed_move(board, snake_id),
        }
    }

    fn is_stochastic(&self) -> bool {
        true
    }
}

/// Picks the move that is best for the opponent itself, judged by the room
/// it keeps and, when hungry, how close it stays to food
pub struct GreedyOpponent {
    simulator: Simulator,
}

impl GreedyOpponent {
    pub fn new(simulator: Simulator) -> Self {
        GreedyOpponent { simulator }
    }

    fn score_move(&self, board: &Board, snake_id: &str, dir: Direction) -> f64 {
        let next = self.simulator.apply_move(board, snake_id, dir);
        let snake = match next.snake(snake_id) {
            Some(s) if s.is_alive() => s,
            _ => return f64::NEG_INFINITY,
        };
        let head = match snake.head() {
            Some(h) => h,
            None => return f64::NEG_INFINITY,
        };

        let area = flood_fill(&next, &head).len() as f64;
        let hunger = if (snake.health as f64) < food_threshold(&next) {
            nearest_food_distance(&next, &head).unwrap_or(0) as f64
        } else {
            0.0
        };
        area - hunger
    }
}

impl OpponentModel for GreedyOpponent {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn predict(&self, board: &Board, snake_id: &str, _rng: &mut StdRng) -> Vec<Direction> {
        let legal = safety::legal_moves(board, snake_id);
        let mut best: Option<(Direction, f64)> = None;
        for dir in legal {
            let score = self.score_move(board, snake_id, dir);
            match best {
                Some((_, s)) if s >= score => {}
                _ => best = Some((dir, score)),
            }
        }
        match best {
            Some((dir, _)) => vec![dir],
            None => doomed_move(board, snake_id),
        }
    }
}
