// Board model
//
// The engine's own representation of one turn. Every simulated branch owns
// its own `Board` value; nothing here is shared or mutated in place across
// branches.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::types::{Coord, Direction};

/// Score for a cell occupied by any body
pub const CELL_SCORE_BODY: f64 = 0.0;
/// Score for a food cell
pub const CELL_SCORE_FOOD: f64 = 1.0;
/// Score for a cell on the outer boundary ring
pub const CELL_SCORE_BOUNDARY: f64 = 0.5;
/// Score for a hazard cell
pub const CELL_SCORE_HAZARD: f64 = 0.25;
/// Score for any other cell
pub const CELL_SCORE_EMPTY: f64 = 0.0;

/// A snake on the board. Head is `body[0]`, tail is the last element.
///
/// Alive/dead is derived from health; a collision death is recorded by
/// setting health to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snake {
    pub id: String,
    pub body: VecDeque<Coord>,
    pub health: i32,
}

impl Snake {
    pub fn new<I: IntoIterator<Item = Coord>>(id: &str, body: I, health: i32) -> Self {
        Snake {
            id: id.to_string(),
            body: body.into_iter().collect(),
            health,
        }
    }

    pub fn head(&self) -> Option<Coord> {
        self.body.front().copied()
    }

    pub fn tail(&self) -> Option<Coord> {
        self.body.back().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0 && !self.body.is_empty()
    }

    /// Direction the snake last moved in (neck -> head), if it has a neck
    pub fn heading(&self) -> Option<Direction> {
        let head = self.body.get(0)?;
        let neck = self.body.get(1)?;
        Direction::between(neck, head)
    }

    /// True when the last two segments coincide. Such a tail does not
    /// vacate on the next move.
    pub fn tail_is_stacked(&self) -> bool {
        let n = self.body.len();
        n >= 2 && self.body[n - 1] == self.body[n - 2]
    }
}

/// Immutable-per-turn board: grid, food, hazards and all snakes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    pub food: BTreeSet<Coord>,
    pub hazards: BTreeSet<Coord>,
    pub snakes: BTreeMap<String, Snake>,
}

impl Board {
    /// Empty board of the given size
    pub fn new(width: i32, height: i32) -> Self {
        Board {
            width,
            height,
            food: BTreeSet::new(),
            hazards: BTreeSet::new(),
            snakes: BTreeMap::new(),
        }
    }

    pub fn with_snake<I: IntoIterator<Item = Coord>>(mut self, id: &str, body: I, health: i32) -> Self {
        self.snakes.insert(id.to_string(), Snake::new(id, body, health));
        self
    }

    pub fn with_food<I: IntoIterator<Item = Coord>>(mut self, food: I) -> Self {
        self.food.extend(food);
        self
    }

    pub fn with_hazards<I: IntoIterator<Item = Coord>>(mut self, hazards: I) -> Self {
        self.hazards.extend(hazards);
        self
    }

    pub fn in_bounds(&self, c: &Coord) -> bool {
        c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height
    }

    pub fn total_cells(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Row-major cell index; caller guarantees `c` is in bounds
    #[inline]
    pub fn index(&self, c: &Coord) -> usize {
        (c.y * self.width + c.x) as usize
    }

    pub fn snake(&self, id: &str) -> Option<&Snake> {
        self.snakes.get(id)
    }

    pub fn alive_snakes(&self) -> impl Iterator<Item = &Snake> {
        self.snakes.values().filter(|s| s.is_alive())
    }

    /// Alive snakes other than `id`
    pub fn opponents_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Snake> + 'a {
        self.alive_snakes().filter(move |s| s.id != id)
    }

    pub fn is_food(&self, c: &Coord) -> bool {
        self.food.contains(c)
    }

    pub fn is_hazard(&self, c: &Coord) -> bool {
        self.hazards.contains(c)
    }

    /// True if any snake present on the board (alive, or a retained corpse)
    /// has a segment on `c`
    pub fn is_occupied(&self, c: &Coord) -> bool {
        self.snakes.values().any(|s| s.body.contains(c))
    }

    pub fn is_boundary(&self, c: &Coord) -> bool {
        c.x == 0 || c.y == 0 || c.x == self.width - 1 || c.y == self.height - 1
    }

    /// Distance from `c` to the nearest wall (0 on the boundary ring)
    pub fn distance_to_wall(&self, c: &Coord) -> i32 {
        [c.x, self.width - 1 - c.x, c.y, self.height - 1 - c.y]
            .iter()
            .copied()
            .min()
            .unwrap_or(0)
            .max(0)
    }

    /// Row-major grid marking every cell covered by a body of any snake
    /// still on the board
    pub fn occupancy_grid(&self) -> Vec<bool> {
        let mut grid = vec![false; self.total_cells()];
        for snake in self.snakes.values() {
            for seg in &snake.body {
                if self.in_bounds(seg) {
                    let idx = self.index(seg);
                    grid[idx] = true;
                }
            }
        }
        grid
    }

    /// Fraction of cells not covered by any body
    pub fn free_space_ratio(&self) -> f64 {
        let total = self.total_cells();
        if total == 0 {
            return 0.0;
        }
        let occupied = self.occupancy_grid().iter().filter(|&&b| b).count();
        (total - occupied) as f64 / total as f64
    }

    /// Number of `snake`'s segments that lie on hazard cells, head excluded
    pub fn segments_in_hazard(&self, snake: &Snake) -> usize {
        snake
            .body
            .iter()
            .skip(1)
            .filter(|seg| self.is_hazard(seg))
            .count()
    }
}

/// One decision's input: the board, the turn counter and who is deciding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub board: Board,
    pub turn: i32,
    pub you: String,
}

impl TurnSnapshot {
    pub fn new(board: Board, turn: i32, you: &str) -> Self {
        TurnSnapshot {
            board,
            turn,
            you: you.to_string(),
        }
    }

    pub fn you_snake(&self) -> Option<&Snake> {
        self.board.snake(&self.you)
    }
}

/// Per-cell desirability used by the area heuristic.
///
/// Bodies score 0, food 1.0, the boundary ring 0.5, hazards 0.25 and
/// everything else 0. Checks apply in that order.
pub fn cell_score(board: &Board, c: &Coord) -> f64 {
    if board.is_occupied(c) {
        CELL_SCORE_BODY
    } else if board.is_food(c) {
        CELL_SCORE_FOOD
    } else if board.is_boundary(c) {
        CELL_SCORE_BOUNDARY
    } else if board.is_hazard(c) {
        CELL_SCORE_HAZARD
    } else {
        CELL_SCORE_EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn test_snake_accessors() {
        let snake = Snake::new("a", vec![c(2, 2), c(2, 1), c(2, 0)], 80);
        assert_eq!(snake.head(), Some(c(2, 2)));
        assert_eq!(snake.tail(), Some(c(2, 0)));
        assert_eq!(snake.heading(), Some(Direction::Up));
        assert!(snake.is_alive());
        assert!(!snake.tail_is_stacked());

        let stacked = Snake::new("b", vec![c(1, 1), c(1, 0), c(1, 0)], 100);
        assert!(stacked.tail_is_stacked());

        let dead = Snake::new("c", vec![c(0, 0)], 0);
        assert!(!dead.is_alive());
    }

    #[test]
    fn test_distance_to_wall() {
        let board = Board::new(11, 11);
        assert_eq!(board.distance_to_wall(&c(0, 5)), 0);
        assert_eq!(board.distance_to_wall(&c(5, 5)), 5);
        assert_eq!(board.distance_to_wall(&c(9, 3)), 1);
    }

    #[test]
    fn test_free_space_ratio_counts_distinct_cells() {
        let board = Board::new(10, 10).with_snake("a", vec![c(0, 0), c(0, 1), c(0, 1)], 100);
        assert!((board.free_space_ratio() - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_cell_score_ordering() {
        let board = Board::new(5, 5)
            .with_snake("a", vec![c(2, 2)], 100)
            .with_food(vec![c(0, 0), c(1, 1)])
            .with_hazards(vec![c(3, 3), c(0, 4)]);

        assert_eq!(cell_score(&board, &c(2, 2)), CELL_SCORE_BODY);
        assert_eq!(cell_score(&board, &c(0, 0)), CELL_SCORE_FOOD);
        assert_eq!(cell_score(&board, &c(1, 1)), CELL_SCORE_FOOD);
        assert_eq!(cell_score(&board, &c(0, 4)), CELL_SCORE_BOUNDARY);
        assert_eq!(cell_score(&board, &c(3, 3)), CELL_SCORE_HAZARD);
        assert_eq!(cell_score(&board, &c(2, 1)), CELL_SCORE_EMPTY);
    }

    #[test]
    fn test_opponents_exclude_dead_and_self() {
        let board = Board::new(7, 7)
            .with_snake("me", vec![c(1, 1)], 50)
            .with_snake("alive", vec![c(3, 3)], 50)
            .with_snake("dead", vec![c(5, 5)], 0);

        let ids: Vec<&str> = board.opponents_of("me").map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["alive"]);
    }

    #[test]
    fn test_segments_in_hazard_skips_head() {
        let board = Board::new(5, 5)
            .with_snake("a", vec![c(0, 0), c(0, 1), c(0, 2)], 100)
            .with_hazards(vec![c(0, 0), c(0, 1)]);
        let snake = board.snake("a").unwrap();
        assert_eq!(board.segments_in_hazard(snake), 1);
    }
}
