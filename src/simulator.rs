// Forward simulator
//
// Pure functions from (board, moves) to the next board. No randomness and no
// shared state: the same inputs always give the same board.

use std::collections::BTreeSet;

use crate::board::Board;
use crate::config::RulesConfig;
use crate::profile;
use crate::types::{Coord, Direction};

/// Applies game rules to produce successor boards
#[derive(Debug, Clone)]
pub struct Simulator {
    rules: RulesConfig,
}

impl Simulator {
    pub fn new(rules: RulesConfig) -> Self {
        Simulator { rules }
    }

    /// Moves a single snake, leaving every other snake where it is.
    ///
    /// Eating removes the food, grows the body by one and restores health.
    /// Otherwise the tail is dropped and health decays, with extra damage on
    /// hazards. A snake that leaves the board, starves or runs into a body
    /// is marked dead (health 0), and removed unless dead bodies are
    /// retained. Other snakes do not move, so their tails stay solid.
    pub fn apply_move(&self, board: &Board, snake_id: &str, dir: Direction) -> Board {
        profile!("apply_move", {
            let mut next = board.clone();
            let new_head = match self.advance(&mut next, board, snake_id, dir) {
                Some(h) => h,
                None => return next,
            };

            if next.is_food(&new_head) {
                next.food.remove(&new_head);
            }

            let fatal = !next.in_bounds(&new_head)
                || next.snake(snake_id).map_or(true, |s| s.health <= 0)
                || Self::lands_on_body(&next, snake_id, &new_head);

            if fatal {
                self.kill(&mut next, snake_id);
            }
            next
        })
    }

    /// Resolves one simultaneous tick.
    ///
    /// Every alive snake moves (snakes without an entry in `moves` keep
    /// their heading). Food under any new head is eaten. Snakes that left the
    /// board or starved are eliminated first and take no further part in
    /// the step. The rest are checked together for body collisions and
    /// head-to-head contests: the strictly longest head on a cell survives,
    /// equal longest all die.
    pub fn step(&self, board: &Board, moves: &[(&str, Direction)]) -> Board {
        profile!("apply_move", {
            let mut next = board.clone();

            let corpses: Vec<String> = board
                .snakes
                .values()
                .filter(|s| !s.is_alive())
                .map(|s| s.id.clone())
                .collect();
            let movers: Vec<String> = board.alive_snakes().map(|s| s.id.clone()).collect();

            // Movement and feeding
            let mut eaten = BTreeSet::new();
            for id in &movers {
                let dir = moves
                    .iter()
                    .find(|(mid, _)| *mid == id.as_str())
                    .map(|(_, d)| *d)
                    .or_else(|| board.snake(id).and_then(|s| s.heading()))
                    .unwrap_or(Direction::Up);

                if let Some(head) = self.advance(&mut next, board, id, dir) {
                    if board.is_food(&head) {
                        eaten.insert(head);
                    }
                }
            }
            for f in &eaten {
                next.food.remove(f);
            }

            // Out of bounds and starvation
            let mut dead: BTreeSet<String> = BTreeSet::new();
            for id in &movers {
                if let Some(s) = next.snake(id) {
                    let off_board = s.head().map_or(true, |h| !next.in_bounds(&h));
                    if off_board || s.health <= 0 {
                        dead.insert(id.clone());
                    }
                }
            }
            let survivors: Vec<&String> = movers.iter().filter(|id| !dead.contains(*id)).collect();

            // Body and head-to-head collisions among survivors
            let mut collided: Vec<String> = Vec::new();
            for id in &survivors {
                if self.collides(&next, id, &survivors, &corpses) {
                    collided.push((*id).clone());
                }
            }
            dead.extend(collided);

            for id in &dead {
                self.mark_dead(&mut next, id);
            }

            for id in &corpses {
                next.snakes.remove(id);
            }
            if !self.rules.retain_dead_bodies {
                for id in &dead {
                    next.snakes.remove(id);
                }
            }
            next
        })
    }

    /// Moves `snake_id` one cell in `next`, updating body and health.
    /// `source` is the board before anyone moved. Returns the new head.
    fn advance(&self, next: &mut Board, source: &Board, snake_id: &str, dir: Direction) -> Option<Coord> {
        let snake = next.snakes.get_mut(snake_id)?;
        if !snake.is_alive() {
            return None;
        }
        let head = snake.head()?;
        let new_head = dir.apply(&head);

        snake.body.push_front(new_head);
        if source.is_food(&new_head) {
            snake.health = self.rules.health_on_food;
        } else {
            snake.body.pop_back();
            snake.health -= self.rules.health_loss_per_turn;
            if source.is_hazard(&new_head) {
                snake.health -= self.rules.hazard_damage_per_turn;
            }
        }
        snake.health = snake.health.clamp(0, self.rules.health_max);
        Some(new_head)
    }

    /// Whether `head` is on a body cell once only `snake_id` has moved:
    /// its own body behind the head, or anywhere on another snake
    fn lands_on_body(board: &Board, snake_id: &str, head: &Coord) -> bool {
        board.snakes.values().any(|s| {
            if s.id == snake_id {
                s.body.iter().skip(1).any(|seg| seg == head)
            } else {
                s.body.contains(head)
            }
        })
    }

    /// Post-move collision check for one surviving snake
    fn collides(&self, board: &Board, id: &str, survivors: &[&String], corpses: &[String]) -> bool {
        let me = match board.snake(id) {
            Some(s) => s,
            None => return false,
        };
        let head = match me.head() {
            Some(h) => h,
            None => return false,
        };

        if corpses
            .iter()
            .filter_map(|cid| board.snake(cid))
            .any(|c| c.body.contains(&head))
        {
            return true;
        }

        for other_id in survivors {
            let other = match board.snake(other_id) {
                Some(s) => s,
                None => continue,
            };
            if other.body.iter().skip(1).any(|seg| *seg == head) {
                return true;
            }
            if other.id != me.id && other.head() == Some(head) && other.len() >= me.len() {
                return true;
            }
        }
        false
    }

    fn kill(&self, board: &mut Board, snake_id: &str) {
        self.mark_dead(board, snake_id);
        if !self.rules.retain_dead_bodies {
            board.snakes.remove(snake_id);
        }
    }

    fn mark_dead(&self, board: &mut Board, snake_id: &str) {
        if let Some(s) = board.snakes.get_mut(snake_id) {
            s.health = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    fn sim() -> Simulator {
        Simulator::new(Config::default_hardcoded().rules)
    }

    #[test]
    fn test_plain_move_decays_health_and_keeps_length() {
        let board = Board::new(11, 11).with_snake("me", vec![c(5, 5), c(5, 4), c(5, 3)], 80);
        let next = sim().apply_move(&board, "me", Direction::Up);
        let me = next.snake("me").unwrap();
        assert_eq!(me.health, 79);
        assert_eq!(me.len(), 3);
        assert_eq!(me.head(), Some(c(5, 6)));
        assert_eq!(me.tail(), Some(c(5, 4)));
    }

    #[test]
    fn test_eating_grows_and_restores_health() {
        let board = Board::new(11, 11)
            .with_snake("me", vec![c(5, 5), c(5, 4), c(5, 3)], 20)
            .with_food(vec![c(5, 6)]);
        let next = sim().apply_move(&board, "me", Direction::Up);
        let me = next.snake("me").unwrap();
        assert_eq!(me.health, 100);
        assert_eq!(me.len(), 4);
        assert!(next.food.is_empty());
    }

    #[test]
    fn test_hazard_adds_damage() {
        let board = Board::new(11, 11)
            .with_snake("me", vec![c(5, 5), c(5, 4)], 50)
            .with_hazards(vec![c(5, 6)]);
        let next = sim().apply_move(&board, "me", Direction::Up);
        assert_eq!(next.snake("me").unwrap().health, 50 - 1 - 14);
    }

    #[test]
    fn test_wall_move_kills() {
        let board = Board::new(11, 11).with_snake("me", vec![c(0, 5), c(1, 5)], 50);
        let next = sim().apply_move(&board, "me", Direction::Left);
        assert!(next.snake("me").is_none());
    }

    #[test]
    fn test_starvation_kills() {
        let board = Board::new(11, 11).with_snake("me", vec![c(5, 5), c(5, 4)], 1);
        let next = sim().apply_move(&board, "me", Direction::Up);
        assert!(next.snake("me").is_none());
    }

    #[test]
    fn test_single_move_onto_a_standing_tail_kills() {
        // The other snake does not move, so its tail is still there
        let board = Board::new(11, 11)
            .with_snake("me", vec![c(5, 5), c(4, 5), c(3, 5)], 80)
            .with_snake("op", vec![c(6, 7), c(6, 6), c(6, 5)], 80);
        let next = sim().apply_move(&board, "me", Direction::Right);
        assert!(next.snake("me").is_none());
        assert_eq!(next.snake("op").and_then(|s| s.tail()), Some(c(6, 5)));
    }

    #[test]
    fn test_single_move_onto_own_tail_is_safe() {
        let board = Board::new(5, 5).with_snake("me", vec![c(1, 1), c(1, 2), c(2, 2), c(2, 1)], 80);
        let next = sim().apply_move(&board, "me", Direction::Right);
        assert_eq!(next.snake("me").and_then(|s| s.head()), Some(c(2, 1)));
        assert!(next.snake("me").map_or(false, |s| s.is_alive()));
    }

    #[test]
    fn test_snake_without_move_keeps_heading() {
        let board = Board::new(11, 11).with_snake("op", vec![c(3, 3), c(2, 3)], 50);
        let next = sim().step(&board, &[]);
        assert_eq!(next.snake("op").unwrap().head(), Some(c(4, 3)));
    }
}
