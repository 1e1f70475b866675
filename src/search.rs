// Search engine
//
// Depth-limited search over the forward simulator and the opponent model,
// with leaves scored by the evaluator. An iterative deepening controller
// keeps the best completed result so a move is available whenever time runs
// out.

use log::{debug, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use crate::board::{Board, TurnSnapshot};
use crate::config::{Config, TimeEstimationConfig};
use crate::heuristics::{EvalContext, Evaluator};
use crate::opponent::{build_opponent_model, OpponentModel};
use crate::profile;
use crate::safety;
use crate::simple_profiler;
use crate::simulator::Simulator;
use crate::types::Direction;

/// Root scores closer than this are treated as equal
const TIE_EPSILON: f64 = 1e-9;

/// How opponent outcomes under one of our moves are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFraming {
    /// Assume the worst joint reply (minimum)
    Adversarial,
    /// Average over joint replies (mean)
    Expectimax,
}

/// Which rung of the fallback ladder produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// Scored by search
    Search,
    /// A legal move picked without search
    SafetyFilter,
    /// No legal move existed
    Default,
}

/// The outcome of one decision call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub direction: Direction,
    pub score: f64,
    /// Deepest iteration that contributed to the result (0 without search)
    pub depth: u8,
    /// Score of every root move searched at `depth`
    pub move_scores: Vec<(Direction, f64)>,
    pub tier: FallbackTier,
    /// False when the result came from an interrupted iteration
    pub completed: bool,
    pub elapsed_ms: u64,
}

/// Lock-free progress shared between a running search and whoever waits
/// on it. The best decision is behind a mutex because it is not a single
/// word.
#[derive(Debug, Default)]
pub struct SharedSearchState {
    cancelled: AtomicBool,
    search_complete: AtomicBool,
    current_depth: AtomicU8,
    best: Mutex<Option<Decision>>,
}

impl SharedSearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the search to stop at the next node it visits
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.search_complete.load(Ordering::Acquire)
    }

    pub fn current_depth(&self) -> u8 {
        self.current_depth.load(Ordering::Acquire)
    }

    /// Latest published decision
    pub fn best(&self) -> Option<Decision> {
        self.best.lock().clone()
    }

    fn publish(&self, decision: &Decision) {
        *self.best.lock() = Some(decision.clone());
    }

    fn set_depth(&self, depth: u8) {
        self.current_depth.store(depth, Ordering::Release);
    }

    fn mark_complete(&self) {
        self.search_complete.store(true, Ordering::Release);
    }
}

/// Wall-clock limit for one decision
struct SearchLimits {
    start: Instant,
    deadline: Instant,
}

impl SearchLimits {
    fn new(budget: Duration) -> Self {
        let start = Instant::now();
        SearchLimits {
            start,
            deadline: start + budget,
        }
    }

    fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn expired(&self, shared: &SharedSearchState) -> bool {
        shared.is_cancelled() || Instant::now() >= self.deadline
    }
}

/// Estimates the time required for an iteration at a given depth
/// Uses exponential branching model: time ≈ base * branching_factor^(depth * num_snakes),
/// with separate constants for duels and multiplayer games
pub fn estimate_iteration_time(depth: u8, num_snakes: usize, estimation: &TimeEstimationConfig) -> u64 {
    model_iteration_ms(depth, num_snakes, estimation).ceil() as u64
}

fn model_iteration_ms(depth: u8, num_snakes: usize, estimation: &TimeEstimationConfig) -> f64 {
    let mode = estimation.for_snakes(num_snakes);
    let exponent = (depth as f64) * (num_snakes as f64);
    mode.base_iteration_time_ms * mode.branching_factor.powf(exponent)
}

/// Estimates the iteration at `depth` from the measured times (ms) of the
/// iterations already completed this turn, oldest first.
///
/// The last measurement is scaled by the growth seen between the last two
/// iterations, or by the model's growth when only one was measured, then
/// blended with the model by `model_weight`. Without measurements this is
/// the model estimate.
pub fn estimate_next_iteration(
    depth: u8,
    num_snakes: usize,
    measured_ms: &[f64],
    estimation: &TimeEstimationConfig,
) -> u64 {
    let model = model_iteration_ms(depth, num_snakes, estimation);
    let empirical = match measured_ms {
        [] => return model.ceil() as u64,
        [.., prev, last] if *prev > 0.0 => last * (last / prev).max(1.0),
        [.., last] => {
            let growth = model / model_iteration_ms(depth.saturating_sub(1), num_snakes, estimation);
            last * growth.max(1.0)
        }
    };
    let weight = estimation.model_weight.clamp(0.0, 1.0);
    (weight * model + (1.0 - weight) * empirical).ceil() as u64
}

/// Seed of the RNG used under one root move in one iteration
fn branch_seed(seed: u64, depth: u8, index: usize) -> u64 {
    seed ^ (depth as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (index as u64 + 1).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

/// Search engine configured once and reused for every decision
pub struct SearchEngine {
    config: Config,
    simulator: Simulator,
    evaluator: Evaluator,
    opponents: Box<dyn OpponentModel>,
}

impl SearchEngine {
    pub fn new(config: Config) -> Self {
        let simulator = Simulator::new(config.rules.clone());
        let evaluator = Evaluator::from_config(&config.weights, &config.rules);
        let opponents = build_opponent_model(config.search.opponent_model, &simulator);
        SearchEngine {
            config,
            simulator,
            evaluator,
            opponents,
        }
    }

    /// Replaces the evaluator built from configuration
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Replaces the opponent model selected by configuration
    pub fn with_opponent_model(mut self, opponents: Box<dyn OpponentModel>) -> Self {
        self.opponents = opponents;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decides within the configured effective budget
    pub fn decide(&self, snapshot: &TurnSnapshot, seed: u64) -> Decision {
        let budget = Duration::from_millis(self.config.timing.effective_budget_ms());
        self.decide_with(snapshot, seed, budget, &SharedSearchState::new())
    }

    /// Runs the anytime search.
    ///
    /// Every completed iteration is published to `shared`, so a caller on
    /// another thread can take the best result at any moment and cancel the
    /// rest. The returned decision is the same one last published.
    pub fn decide_with(
        &self,
        snapshot: &TurnSnapshot,
        seed: u64,
        budget: Duration,
        shared: &SharedSearchState,
    ) -> Decision {
        let limits = SearchLimits::new(budget);
        let mut rng = StdRng::seed_from_u64(seed);
        let board = &snapshot.board;
        let you = snapshot.you.as_str();

        let alive = board.snake(you).map_or(false, |s| s.is_alive());
        let legal = if alive {
            safety::legal_moves(board, you)
        } else {
            Vec::new()
        };

        let fallback = self.fallback_with(board, you, &legal, &mut rng, limits.elapsed_ms());
        shared.publish(&fallback);
        if legal.is_empty() {
            warn!(
                "Turn {}: no legal move for {}, using default {}",
                snapshot.turn,
                you,
                fallback.direction.as_str()
            );
            shared.mark_complete();
            return fallback;
        }

        debug!(
            "Turn {}: searching {} root moves against the {} opponent model",
            snapshot.turn,
            legal.len(),
            self.opponents.name()
        );

        let num_snakes = board.alive_snakes().count();
        let timing = &self.config.timing;
        let mut depth = timing.initial_depth.max(1);
        let mut completed: Option<Decision> = None;
        let mut partial: Option<(u8, Vec<(Direction, f64)>)> = None;
        let mut iteration_ms: Vec<f64> = Vec::new();

        loop {
            if depth > timing.max_search_depth {
                debug!("Stopping search: reached max depth ({})", timing.max_search_depth);
                break;
            }

            let remaining = limits.remaining().as_millis() as u64;
            if remaining < timing.min_time_remaining_ms {
                debug!("Stopping search: insufficient time remaining ({}ms)", remaining);
                break;
            }

            // The first iteration always runs so there is something to return
            let estimated =
                estimate_next_iteration(depth, num_snakes, &iteration_ms, &self.config.time_estimation);
            if completed.is_some() && estimated > remaining {
                debug!(
                    "Stopping search: next iteration would exceed budget (estimated {}ms, remaining {}ms)",
                    estimated, remaining
                );
                break;
            }

            debug!("Starting iteration at depth {}", depth);
            shared.set_depth(depth);

            let iteration_start = Instant::now();
            let results = self.search_root(board, you, &legal, depth, seed, &limits, shared);
            let finished: Vec<(Direction, f64)> = results
                .iter()
                .filter_map(|(dir, score)| score.map(|s| (*dir, s)))
                .collect();

            if finished.len() < results.len() {
                debug!(
                    "Iteration at depth {} interrupted after {} of {} root moves",
                    depth,
                    finished.len(),
                    results.len()
                );
                if completed.is_none() && !finished.is_empty() {
                    partial = Some((depth, finished));
                }
                break;
            }

            iteration_ms.push(iteration_start.elapsed().as_secs_f64() * 1000.0);
            let decision = self.pick(&finished, depth, true, &mut rng, limits.elapsed_ms());
            shared.publish(&decision);
            completed = Some(decision);

            // Nothing to choose between, so deeper search changes nothing
            if legal.len() == 1 {
                break;
            }
            depth += 1;
        }

        // A completed iteration was already published with its tie-break;
        // only the elapsed time is refreshed
        let decision = match (completed, partial) {
            (Some(last), _) => Decision {
                elapsed_ms: limits.elapsed_ms(),
                ..last
            },
            (None, Some((d, scores))) => self.pick(&scores, d, false, &mut rng, limits.elapsed_ms()),
            (None, None) => {
                warn!("Turn {}: search produced no result, using a legal move", snapshot.turn);
                Decision {
                    elapsed_ms: limits.elapsed_ms(),
                    ..fallback
                }
            }
        };

        shared.publish(&decision);
        shared.mark_complete();
        decision
    }

    /// Fallback ladder below search: a random legal move if one exists,
    /// otherwise the first in-bounds direction, otherwise the configured
    /// default
    pub fn fallback(&self, snapshot: &TurnSnapshot, seed: u64) -> Decision {
        let board = &snapshot.board;
        let you = snapshot.you.as_str();
        let legal = if board.snake(you).map_or(false, |s| s.is_alive()) {
            safety::legal_moves(board, you)
        } else {
            Vec::new()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        self.fallback_with(board, you, &legal, &mut rng, 0)
    }

    fn fallback_with(
        &self,
        board: &Board,
        you: &str,
        legal: &[Direction],
        rng: &mut StdRng,
        elapsed_ms: u64,
    ) -> Decision {
        let (direction, tier) = match legal.choose(rng) {
            Some(dir) => (*dir, FallbackTier::SafetyFilter),
            None => (self.default_direction(board, you), FallbackTier::Default),
        };
        Decision {
            direction,
            score: 0.0,
            depth: 0,
            move_scores: Vec::new(),
            tier,
            completed: false,
            elapsed_ms,
        }
    }

    fn default_direction(&self, board: &Board, you: &str) -> Direction {
        board
            .snake(you)
            .and_then(|s| s.head())
            .and_then(|head| {
                Direction::all()
                    .iter()
                    .copied()
                    .find(|dir| board.in_bounds(&dir.apply(&head)))
            })
            .unwrap_or(self.config.fallback.default_move)
    }

    /// Best root move; near-equal scores are broken at random
    fn pick(
        &self,
        scores: &[(Direction, f64)],
        depth: u8,
        completed: bool,
        rng: &mut StdRng,
        elapsed_ms: u64,
    ) -> Decision {
        let best = scores
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<Direction> = scores
            .iter()
            .filter(|(_, s)| (best - *s).abs() <= TIE_EPSILON)
            .map(|(d, _)| *d)
            .collect();
        let direction = tied
            .choose(rng)
            .copied()
            .unwrap_or(self.config.fallback.default_move);

        Decision {
            direction,
            score: best,
            depth,
            move_scores: scores.to_vec(),
            tier: FallbackTier::Search,
            completed,
            elapsed_ms,
        }
    }

    /// Scores each root move to `depth`. `None` marks a move whose subtree
    /// was cut off by the deadline.
    #[allow(clippy::too_many_arguments)]
    fn search_root(
        &self,
        board: &Board,
        you: &str,
        legal: &[Direction],
        depth: u8,
        seed: u64,
        limits: &SearchLimits,
        shared: &SharedSearchState,
    ) -> Vec<(Direction, Option<f64>)> {
        let score_move = |(index, dir): (usize, &Direction)| {
            let mut rng = StdRng::seed_from_u64(branch_seed(seed, depth, index));
            let value = self.expand(board, you, *dir, depth, 0, &mut rng, limits, shared);
            simple_profiler::merge_thread_local();
            (*dir, value)
        };

        if self.config.search.parallel_root {
            legal.par_iter().enumerate().map(score_move).collect()
        } else {
            legal.iter().enumerate().map(score_move).collect()
        }
    }

    /// Value of playing `dir` from `board`, combined over the predicted
    /// opponent replies
    #[allow(clippy::too_many_arguments)]
    fn expand(
        &self,
        board: &Board,
        you: &str,
        dir: Direction,
        depth: u8,
        ply: u32,
        rng: &mut StdRng,
        limits: &SearchLimits,
        shared: &SharedSearchState,
    ) -> Option<f64> {
        if limits.expired(shared) {
            return None;
        }

        let outcomes = self.joint_opponent_moves(board, you, rng);
        let mut values = Vec::with_capacity(outcomes.len());
        for joint in &outcomes {
            let mut moves: Vec<(&str, Direction)> =
                joint.iter().map(|(id, d)| (id.as_str(), *d)).collect();
            moves.push((you, dir));
            let next = self.simulator.step(board, &moves);
            values.push(self.value(&next, board, you, depth - 1, ply + 1, rng, limits, shared)?);
        }

        Some(match self.config.search.framing {
            SearchFraming::Adversarial => values.iter().copied().fold(f64::INFINITY, f64::min),
            SearchFraming::Expectimax => values.iter().sum::<f64>() / values.len().max(1) as f64,
        })
    }

    /// Value of `board` for `you` to move, searched `depth` more plies
    #[allow(clippy::too_many_arguments)]
    fn value(
        &self,
        board: &Board,
        previous: &Board,
        you: &str,
        depth: u8,
        ply: u32,
        rng: &mut StdRng,
        limits: &SearchLimits,
        shared: &SharedSearchState,
    ) -> Option<f64> {
        profile!("search", {
            if limits.expired(shared) {
                return None;
            }

            if !board.snake(you).map_or(false, |s| s.is_alive()) {
                return Some(self.death_value(ply));
            }
            if depth == 0 {
                return Some(self.evaluator.evaluate(&EvalContext::new(board, previous, you)));
            }

            let legal = safety::legal_moves(board, you);
            if legal.is_empty() {
                // Boxed in: dies on the next step whatever it does
                return Some(self.death_value(ply + 1));
            }

            let mut best = f64::NEG_INFINITY;
            for dir in legal {
                let v = self.expand(board, you, dir, depth, ply, rng, limits, shared)?;
                best = best.max(v);
            }
            Some(best)
        })
    }

    /// Always below any live evaluation, and lower the sooner death comes
    fn death_value(&self, ply: u32) -> f64 {
        -self.config.weights.death * (1.0 + 1.0 / ply.max(1) as f64)
    }

    /// Joint opponent replies to consider under one of our moves.
    ///
    /// Deterministic models expand the cross product of per-opponent
    /// predictions, capped at `max_opponent_branches`. Stochastic models
    /// draw `sampled_outcomes` independent joint samples instead.
    fn joint_opponent_moves(&self, board: &Board, you: &str, rng: &mut StdRng) -> Vec<Vec<(String, Direction)>> {
        let ids: Vec<String> = board.opponents_of(you).map(|s| s.id.clone()).collect();
        if ids.is_empty() {
            return vec![Vec::new()];
        }

        if self.opponents.is_stochastic() {
            let samples = self.config.search.sampled_outcomes.max(1);
            return (0..samples)
                .map(|_| {
                    ids.iter()
                        .map(|id| {
                            let dir = self
                                .opponents
                                .predict(board, id, rng)
                                .into_iter()
                                .next()
                                .unwrap_or(Direction::Up);
                            (id.clone(), dir)
                        })
                        .collect()
                })
                .collect();
        }

        let cap = self.config.search.max_opponent_branches.max(1);
        let mut joint: Vec<Vec<(String, Direction)>> = vec![Vec::new()];
        for id in &ids {
            let predicted = self.opponents.predict(board, id, rng);
            let mut expanded = Vec::with_capacity(joint.len() * predicted.len());
            'combine: for prefix in &joint {
                for dir in &predicted {
                    if expanded.len() >= cap {
                        break 'combine;
                    }
                    let mut combo = prefix.clone();
                    combo.push((id.clone(), *dir));
                    expanded.push(combo);
                }
            }
            joint = expanded;
        }
        joint
    }
}
