// Heuristic evaluators
//
// Each heuristic maps a board (usually a search leaf) to a raw score from the
// deciding snake's point of view. `Evaluator` holds the configured set with
// their weights and sums them. Weights are tuned so that certain death
// dominates territory and survival, which dominate food, which dominates
// opportunistic aggression.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::board::{cell_score, Board, Snake};
use crate::config::{RulesConfig, WeightsConfig};
use crate::profile;
use crate::types::Coord;

/// How the area-control term measures room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaMode {
    /// Free cells adjacent to the head
    Adjacency,
    /// Free cells reachable from the head
    FloodFill,
}

/// Cells reachable from `start` through in-bounds cells not covered by any
/// body. `start` itself is not included.
pub fn flood_fill(board: &Board, start: &Coord) -> Vec<Coord> {
    profile!("flood_fill", {
        let mut blocked = board.occupancy_grid();
        let mut reached = Vec::new();
        let mut queue = VecDeque::new();

        if board.in_bounds(start) {
            let idx = board.index(start);
            blocked[idx] = true;
        }
        queue.push_back(*start);

        while let Some(cell) = queue.pop_front() {
            for n in cell.neighbors().iter() {
                if !board.in_bounds(n) {
                    continue;
                }
                let idx = board.index(n);
                if blocked[idx] {
                    continue;
                }
                blocked[idx] = true;
                reached.push(*n);
                queue.push_back(*n);
            }
        }
        reached
    })
}

/// Health below which food becomes a priority: 30 on an empty board, rising
/// to 70 as bodies fill it
pub fn food_threshold(board: &Board) -> f64 {
    30.0 + (1.0 - board.free_space_ratio()) * 40.0
}

pub fn nearest_food_distance(board: &Board, from: &Coord) -> Option<i32> {
    board.food.iter().map(|f| from.manhattan(f)).min()
}

/// Voronoi partition of every cell by Manhattan distance to alive heads.
/// Cells equidistant to two or more heads belong to nobody.
pub fn voronoi(board: &Board) -> BTreeMap<String, usize> {
    profile!("territory", {
        let heads: Vec<(&str, Coord)> = board
            .alive_snakes()
            .filter_map(|s| s.head().map(|h| (s.id.as_str(), h)))
            .collect();

        let mut owned: BTreeMap<String, usize> =
            heads.iter().map(|(id, _)| (id.to_string(), 0)).collect();

        for y in 0..board.height {
            for x in 0..board.width {
                let cell = Coord::new(x, y);
                let mut best = i32::MAX;
                let mut owner: Option<&str> = None;
                for (id, head) in &heads {
                    let d = head.manhattan(&cell);
                    if d < best {
                        best = d;
                        owner = Some(id);
                    } else if d == best {
                        owner = None;
                    }
                }
                if let Some(id) = owner {
                    if let Some(count) = owned.get_mut(id) {
                        *count += 1;
                    }
                }
            }
        }
        owned
    })
}

/// What a heuristic gets to look at
pub struct EvalContext<'a> {
    /// Board being scored
    pub board: &'a Board,
    /// Board one ply earlier (equal to `board` at the root)
    pub previous: &'a Board,
    /// Deciding snake
    pub you: &'a str,
}

impl<'a> EvalContext<'a> {
    pub fn new(board: &'a Board, previous: &'a Board, you: &'a str) -> Self {
        EvalContext { board, previous, you }
    }

    pub fn me(&self) -> Option<&'a Snake> {
        self.board.snake(self.you).filter(|s| s.is_alive())
    }
}

/// One scoring term
pub trait Heuristic: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, ctx: &EvalContext) -> f64;
}

/// Pull toward food when hungry, mild push away when not
pub struct FoodScore {
    pub satiated_factor: f64,
}

impl Heuristic for FoodScore {
    fn name(&self) -> &'static str {
        "food"
    }

    fn score(&self, ctx: &EvalContext) -> f64 {
        let me = match ctx.me() {
            Some(s) => s,
            None => return 0.0,
        };
        let head = match me.head() {
            Some(h) => h,
            None => return 0.0,
        };
        let dist = match nearest_food_distance(ctx.board, &head) {
            Some(d) => d as f64,
            None => return 0.0,
        };

        if (me.health as f64) < food_threshold(ctx.board) {
            -dist
        } else {
            dist * self.satiated_factor
        }
    }
}

/// Room around the head, penalised when smaller than our own length
pub struct AreaControlScore {
    pub mode: AreaMode,
    pub shortage_penalty: f64,
    pub cell_value_factor: f64,
}

impl Heuristic for AreaControlScore {
    fn name(&self) -> &'static str {
        "area"
    }

    fn score(&self, ctx: &EvalContext) -> f64 {
        let me = match ctx.me() {
            Some(s) => s,
            None => return 0.0,
        };
        let head = match me.head() {
            Some(h) => h,
            None => return 0.0,
        };

        let cells: Vec<Coord> = match self.mode {
            AreaMode::FloodFill => flood_fill(ctx.board, &head),
            AreaMode::Adjacency => head
                .neighbors()
                .iter()
                .copied()
                .filter(|n| ctx.board.in_bounds(n) && !ctx.board.is_occupied(n))
                .collect(),
        };

        let area = cells.len() as f64;
        let richness: f64 = cells.iter().map(|c| cell_score(ctx.board, c)).sum();
        let needed = me.len() as f64;
        let shortfall = if area < needed {
            (needed - area) * self.shortage_penalty
        } else {
            0.0
        };

        area + richness * self.cell_value_factor - shortfall
    }
}

/// Voronoi territory plus length, ours minus everyone else's
pub struct TerritoryScore;

impl Heuristic for TerritoryScore {
    fn name(&self) -> &'static str {
        "territory"
    }

    fn score(&self, ctx: &EvalContext) -> f64 {
        let me = match ctx.me() {
            Some(s) => s,
            None => return 0.0,
        };
        let owned = voronoi(ctx.board);
        let mine = owned.get(ctx.you).copied().unwrap_or(0) + me.len();
        let theirs: usize = ctx
            .board
            .opponents_of(ctx.you)
            .map(|s| owned.get(&s.id).copied().unwrap_or(0) + s.len())
            .sum();
        mine as f64 - theirs as f64
    }
}

/// Cost of sitting on a hazard. The more of our body already soaks in
/// hazard, the less tolerance is left.
pub struct HazardPenalty {
    pub soak_factor: f64,
}

impl Heuristic for HazardPenalty {
    fn name(&self) -> &'static str {
        "hazard"
    }

    fn score(&self, ctx: &EvalContext) -> f64 {
        let me = match ctx.me() {
            Some(s) => s,
            None => return 0.0,
        };
        match me.head() {
            Some(h) if ctx.board.is_hazard(&h) => {
                let soaked = ctx.board.segments_in_hazard(me) as f64;
                -(1.0 + self.soak_factor * soaked)
            }
            _ => 0.0,
        }
    }
}

/// Remaining health as a fraction of the maximum
pub struct SurvivalScore {
    pub health_max: f64,
}

impl Heuristic for SurvivalScore {
    fn name(&self) -> &'static str {
        "survival"
    }

    fn score(&self, ctx: &EvalContext) -> f64 {
        match ctx.me() {
            Some(me) if self.health_max > 0.0 => me.health as f64 / self.health_max,
            _ => 0.0,
        }
    }
}

/// Rewards rivals whose heads are close to a wall
pub struct BoundaryPushScore;

impl Heuristic for BoundaryPushScore {
    fn name(&self) -> &'static str {
        "boundary_push"
    }

    fn score(&self, ctx: &EvalContext) -> f64 {
        let total: i32 = ctx
            .board
            .opponents_of(ctx.you)
            .filter_map(|s| s.head())
            .map(|h| ctx.board.distance_to_wall(&h))
            .sum();
        -(total as f64)
    }
}

/// Outcome of contesting a cell that a rival head could also have entered
pub struct HeadToHeadScore {
    pub kill_bonus: f64,
    pub loss_penalty: f64,
    pub tie_penalty: f64,
}

impl Heuristic for HeadToHeadScore {
    fn name(&self) -> &'static str {
        "head_to_head"
    }

    fn score(&self, ctx: &EvalContext) -> f64 {
        let head = match ctx.me().and_then(|s| s.head()) {
            Some(h) => h,
            None => return 0.0,
        };
        // Pre-move lengths: a rival reaching a contested food eats it too
        let my_len = match ctx.previous.snake(ctx.you) {
            Some(s) => s.len(),
            None => return 0.0,
        };

        let contenders: Vec<usize> = ctx
            .previous
            .opponents_of(ctx.you)
            .filter(|s| s.head().map_or(false, |h| h.is_adjacent(&head)))
            .map(|s| s.len())
            .collect();

        if contenders.is_empty() {
            0.0
        } else if contenders.iter().any(|&l| l > my_len) {
            -self.loss_penalty
        } else if contenders.iter().any(|&l| l == my_len) {
            -self.tie_penalty
        } else {
            self.kill_bonus
        }
    }
}

struct WeightedTerm {
    weight: f64,
    heuristic: Box<dyn Heuristic>,
}

/// Weighted sum of heuristics
pub struct Evaluator {
    terms: Vec<WeightedTerm>,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator { terms: Vec::new() }
    }

    /// Adds a term; a zero weight leaves it out
    pub fn with_term(mut self, weight: f64, heuristic: Box<dyn Heuristic>) -> Self {
        if weight != 0.0 {
            self.terms.push(WeightedTerm { weight, heuristic });
        }
        self
    }

    /// Builds the standard term set from configuration
    pub fn from_config(weights: &WeightsConfig, rules: &RulesConfig) -> Self {
        let h2h = HeadToHeadScore {
            kill_bonus: weights.head_to_head_kill,
            loss_penalty: weights.head_to_head_loss,
            tie_penalty: weights.head_to_head_tie,
        };
        let h2h_weight = if h2h.kill_bonus == 0.0 && h2h.loss_penalty == 0.0 && h2h.tie_penalty == 0.0 {
            0.0
        } else {
            1.0
        };

        Evaluator::new()
            .with_term(h2h_weight, Box::new(h2h))
            .with_term(weights.territory, Box::new(TerritoryScore))
            .with_term(
                weights.area,
                Box::new(AreaControlScore {
                    mode: weights.area_mode,
                    shortage_penalty: weights.space_shortage_penalty,
                    cell_value_factor: weights.cell_value_factor,
                }),
            )
            .with_term(
                weights.survival,
                Box::new(SurvivalScore {
                    health_max: rules.health_max as f64,
                }),
            )
            .with_term(
                weights.hazard,
                Box::new(HazardPenalty {
                    soak_factor: weights.hazard_soak_factor,
                }),
            )
            .with_term(
                weights.food,
                Box::new(FoodScore {
                    satiated_factor: weights.food_satiated_factor,
                }),
            )
            .with_term(weights.boundary_push, Box::new(BoundaryPushScore))
    }

    pub fn term_names(&self) -> Vec<&'static str> {
        self.terms.iter().map(|t| t.heuristic.name()).collect()
    }

    pub fn evaluate(&self, ctx: &EvalContext) -> f64 {
        profile!("eval", {
            self.terms
                .iter()
                .map(|t| t.weight * t.heuristic.score(ctx))
                .sum()
        })
    }

    /// Weighted contribution of every term, for diagnostics
    pub fn breakdown(&self, ctx: &EvalContext) -> Vec<(&'static str, f64)> {
        self.terms
            .iter()
            .map(|t| (t.heuristic.name(), t.weight * t.heuristic.score(ctx)))
            .collect()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
