// Safety filter: one-step legal move generation
//
// A move is legal when the new head stays on the board and does not land on
// a body segment that will still be there after everyone moves.
//
// Tail rule: a tail vacates this turn unless its owner eats. Before moves are
// known we assume an opponent whose head touches food might eat, so its tail
// is treated as solid. A stacked tail (last two segments equal) never
// vacates. Retained corpses block their whole body.

use crate::board::{Board, Snake};
use crate::profile;
use crate::types::{Coord, Direction};

/// Enumerates the legal one-step moves for `snake_id`.
///
/// Returns an empty vector when the snake is absent, dead, has no body, or
/// is boxed in. Callers must fall back rather than invent a move.
pub fn legal_moves(board: &Board, snake_id: &str) -> Vec<Direction> {
    profile!("move_gen", {
        let snake = match board.snake(snake_id) {
            Some(s) if s.is_alive() => s,
            _ => return vec![],
        };
        let head = match snake.head() {
            Some(h) => h,
            None => return vec![],
        };

        Direction::all()
            .iter()
            .copied()
            .filter(|dir| is_safe_cell(board, snake_id, &dir.apply(&head)))
            .collect()
    })
}

/// True if `snake_id` may move its head onto `target` this turn
pub fn is_safe_cell(board: &Board, snake_id: &str, target: &Coord) -> bool {
    if !board.in_bounds(target) {
        return false;
    }

    board
        .snakes
        .values()
        .all(|other| !blocks(board, other, snake_id, target))
}

/// Does `other`'s body occupy `target` after this turn's movement?
fn blocks(board: &Board, other: &Snake, mover: &str, target: &Coord) -> bool {
    if !other.is_alive() {
        // Only retained corpses remain on the board once dead
        return other.body.contains(target);
    }

    let len = other.body.len();
    if len == 0 {
        return false;
    }

    if other.body.iter().take(len - 1).any(|seg| seg == target) {
        return true;
    }

    // Remaining candidate: the tail cell itself
    if other.body[len - 1] != *target {
        return false;
    }
    other.id != mover && may_eat_this_turn(board, other)
}

/// Whether `snake`'s head is next to food, so it could grow this turn
fn may_eat_this_turn(board: &Board, snake: &Snake) -> bool {
    match snake.head() {
        Some(head) => head.neighbors().iter().any(|n| board.is_food(n)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn test_neck_is_excluded() {
        let board = Board::new(11, 11).with_snake("me", vec![c(5, 5), c(5, 4), c(5, 3)], 100);
        let moves = legal_moves(&board, "me");
        assert_eq!(moves, vec![Direction::Up, Direction::Left, Direction::Right]);
    }

    #[test]
    fn test_own_tail_is_safe() {
        // Head at (1,1) curled so the tail sits right of the head
        let board = Board::new(5, 5).with_snake(
            "me",
            vec![c(1, 1), c(1, 2), c(2, 2), c(2, 1)],
            100,
        );
        let moves = legal_moves(&board, "me");
        assert!(moves.contains(&Direction::Right));
    }

    #[test]
    fn test_stacked_tail_is_not_safe() {
        let board = Board::new(5, 5).with_snake(
            "me",
            vec![c(1, 1), c(1, 2), c(2, 2), c(2, 1), c(2, 1)],
            100,
        );
        let moves = legal_moves(&board, "me");
        assert!(!moves.contains(&Direction::Right));
    }

    #[test]
    fn test_opponent_tail_blocked_when_it_can_eat() {
        let base = Board::new(7, 7)
            .with_snake("me", vec![c(2, 3), c(1, 3)], 90)
            .with_snake("op", vec![c(3, 5), c(3, 4), c(3, 3)], 90);

        assert!(legal_moves(&base, "me").contains(&Direction::Right));

        let hungry = base.with_food(vec![c(4, 5)]);
        assert!(!legal_moves(&hungry, "me").contains(&Direction::Right));
    }

    #[test]
    fn test_absent_or_dead_snake_has_no_moves() {
        let board = Board::new(5, 5).with_snake("dead", vec![c(2, 2)], 0);
        assert!(legal_moves(&board, "dead").is_empty());
        assert!(legal_moves(&board, "ghost").is_empty());
    }

    #[test]
    fn test_corpse_blocks_whole_body() {
        let board = Board::new(5, 5)
            .with_snake("me", vec![c(1, 1), c(0, 1), c(0, 0)], 50)
            .with_snake("corpse", vec![c(1, 2), c(2, 2), c(2, 1)], 0);
        let moves = legal_moves(&board, "me");
        assert!(!moves.contains(&Direction::Up));
        assert!(!moves.contains(&Direction::Right));
        assert_eq!(moves, vec![Direction::Down]);
    }
}
