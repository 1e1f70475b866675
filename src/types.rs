// Battlesnake API Types
// See https://docs.battlesnake.com/api
//
// Wire structs mirror the JSON payloads exactly. They are converted into the
// engine's `TurnSnapshot` at the edge, which is also where structurally
// invalid payloads are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::board::{Board, Snake, TurnSnapshot};

/// Game metadata including ID, ruleset, and timeout
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Game {
    pub id: String,
    #[serde(default)]
    pub ruleset: HashMap<String, Value>,
    pub timeout: u32,
    #[serde(default)]
    pub source: String,
}

/// Board state as sent by the game server
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BoardPayload {
    pub height: i32,
    pub width: i32,
    pub food: Vec<Coord>,
    pub snakes: Vec<Battlesnake>,
    #[serde(default)]
    pub hazards: Vec<Coord>,
}

/// Snake representation with all state information
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Battlesnake {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub health: i32,
    pub body: Vec<Coord>,
    pub head: Coord,
    pub length: i32,
    #[serde(default)]
    pub latency: String,
    #[serde(default)]
    pub shout: Option<String>,
}

/// 2D coordinate on the board
#[derive(
    Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Manhattan distance between two coordinates
    pub fn manhattan(&self, other: &Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The four orthogonal neighbours, in `Direction::all()` order.
    /// May lie outside the board.
    pub fn neighbors(&self) -> [Coord; 4] {
        let dirs = Direction::all();
        [
            dirs[0].apply(self),
            dirs[1].apply(self),
            dirs[2].apply(self),
            dirs[3].apply(self),
        ]
    }

    pub fn is_adjacent(&self, other: &Coord) -> bool {
        self.manhattan(other) == 1
    }
}

/// Represents the four possible movement directions for a Battlesnake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    /// Converts direction to string representation for API response
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        match self {
            Direction::Up => Coord { x: coord.x, y: coord.y + 1 },
            Direction::Down => Coord { x: coord.x, y: coord.y - 1 },
            Direction::Left => Coord { x: coord.x - 1, y: coord.y },
            Direction::Right => Coord { x: coord.x + 1, y: coord.y },
        }
    }

    /// Direction that leads from `from` to the adjacent cell `to`
    pub fn between(from: &Coord, to: &Coord) -> Option<Direction> {
        Direction::all()
            .iter()
            .copied()
            .find(|dir| dir.apply(from) == *to)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

/// Complete game state received from the API
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GameState {
    pub game: Game,
    pub turn: i32,
    pub board: BoardPayload,
    pub you: Battlesnake,
}

impl BoardPayload {
    /// Converts the wire board into the engine board.
    ///
    /// Rejects non-positive dimensions, out-of-range coordinates and empty
    /// bodies; the engine assumes all of these hold.
    pub fn to_board(&self) -> Result<Board, String> {
        if self.width <= 0 || self.height <= 0 {
            return Err(format!(
                "Invalid board dimensions {}x{}",
                self.width, self.height
            ));
        }

        let in_bounds = |c: &Coord| c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height;

        let mut food = BTreeSet::new();
        for f in &self.food {
            if !in_bounds(f) {
                return Err(format!("Food at ({}, {}) lies outside the board", f.x, f.y));
            }
            food.insert(*f);
        }

        let mut hazards = BTreeSet::new();
        for h in &self.hazards {
            if !in_bounds(h) {
                return Err(format!("Hazard at ({}, {}) lies outside the board", h.x, h.y));
            }
            hazards.insert(*h);
        }

        let mut snakes = BTreeMap::new();
        for s in &self.snakes {
            if s.body.is_empty() {
                return Err(format!("Snake '{}' has an empty body", s.id));
            }
            if let Some(c) = s.body.iter().find(|c| !in_bounds(c)) {
                return Err(format!(
                    "Snake '{}' has a segment at ({}, {}) outside the board",
                    s.id, c.x, c.y
                ));
            }
            let snake = Snake {
                id: s.id.clone(),
                body: s.body.iter().copied().collect::<VecDeque<_>>(),
                health: s.health.clamp(0, 100),
            };
            snakes.insert(s.id.clone(), snake);
        }

        Ok(Board {
            width: self.width,
            height: self.height,
            food,
            hazards,
            snakes,
        })
    }
}

impl GameState {
    /// Builds the immutable per-turn snapshot handed to the engine
    pub fn to_snapshot(&self) -> Result<TurnSnapshot, String> {
        let board = self.board.to_board()?;
        Ok(TurnSnapshot {
            board,
            turn: self.turn,
            you: self.you.id.clone(),
        })
    }
}
