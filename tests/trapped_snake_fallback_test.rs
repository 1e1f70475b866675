// Integration test for the bot's fallback behaviour through the API layer
//
// When a snake has NO legal moves it must still answer with a move that:
// 1. Stays in-bounds if possible
// 2. Doesn't arbitrarily default to "up" if "up" is out of bounds
//
// Malformed boards are answered with the configured default move, and a
// normal turn is answered within the response budget.

use std::collections::HashMap;
use std::time::Instant;

use anytime_snake::bot::Bot;
use anytime_snake::config::Config;
use anytime_snake::types::{Battlesnake, BoardPayload, Coord, Game};

fn game() -> Game {
    Game {
        id: "test-game".to_string(),
        ruleset: HashMap::new(),
        timeout: 500,
        source: "test".to_string(),
    }
}

fn snake(id: &str, health: i32, body: Vec<Coord>) -> Battlesnake {
    Battlesnake {
        id: id.to_string(),
        name: id.to_string(),
        health,
        head: body[0],
        length: body.len() as i32,
        body,
        latency: "0".to_string(),
        shout: None,
    }
}

/// Snake at top wall (y=10), boxed in by its own stacked tail and an opponent
/// Should choose "down" (in-bounds), not "up" (out-of-bounds)
#[tokio::test]
async fn test_trapped_at_top_wall_chooses_in_bounds_move() {
    let bot = Bot::new(Config::default_hardcoded());

    let board = BoardPayload {
        height: 11,
        width: 11,
        food: vec![],
        snakes: vec![
            snake(
                "our-snake",
                50,
                vec![
                    Coord::new(5, 10), // head at top wall
                    Coord::new(5, 9),  // neck blocks down
                    Coord::new(4, 9),
                    Coord::new(4, 10), // stacked tail blocks left
                    Coord::new(4, 10),
                ],
            ),
            snake(
                "opponent",
                50,
                vec![Coord::new(6, 10), Coord::new(6, 9), Coord::new(6, 8)], // blocks right
            ),
        ],
        hazards: vec![],
    };
    let you = board.snakes[0].clone();

    let response = bot.get_move(&game(), &42, &board, &you).await;
    assert_eq!(response["move"], "down");
}

/// Snake at bottom-right corner with every neighbour blocked
#[tokio::test]
async fn test_trapped_in_corner_avoids_walls() {
    let bot = Bot::new(Config::default_hardcoded());

    let board = BoardPayload {
        height: 11,
        width: 11,
        food: vec![],
        snakes: vec![
            snake(
                "our-snake",
                50,
                vec![
                    Coord::new(10, 0),
                    Coord::new(9, 0),
                    Coord::new(8, 0),
                    Coord::new(8, 0),
                ],
            ),
            snake(
                "opponent",
                50,
                vec![Coord::new(10, 1), Coord::new(10, 2), Coord::new(10, 3)],
            ),
        ],
        hazards: vec![],
    };
    let you = board.snakes[0].clone();

    let response = bot.get_move(&game(), &7, &board, &you).await;
    let chosen = response["move"].as_str().unwrap();

    // Up is the only in-bounds direction
    assert_eq!(chosen, "up");
}

#[tokio::test]
async fn test_malformed_board_answers_default_move() {
    let mut config = Config::default_hardcoded();
    config.fallback.default_move = anytime_snake::types::Direction::Right;
    let bot = Bot::new(config);

    let board = BoardPayload {
        height: 11,
        width: 11,
        food: vec![Coord::new(20, 20)],
        snakes: vec![snake("our-snake", 50, vec![Coord::new(5, 5), Coord::new(5, 4)])],
        hazards: vec![],
    };
    let you = board.snakes[0].clone();

    let response = bot.get_move(&game(), &1, &board, &you).await;
    assert_eq!(response["move"], "right");
}

#[tokio::test]
async fn test_open_board_answers_within_budget() {
    let config = Config::default_hardcoded();
    let budget = config.timing.effective_budget_ms();
    let bot = Bot::new(config);

    let board = BoardPayload {
        height: 11,
        width: 11,
        food: vec![Coord::new(2, 8), Coord::new(9, 1)],
        snakes: vec![
            snake("our-snake", 80, vec![Coord::new(5, 5), Coord::new(5, 4), Coord::new(5, 3)]),
            snake("opponent", 80, vec![Coord::new(1, 1), Coord::new(1, 2), Coord::new(1, 3)]),
        ],
        hazards: vec![],
    };
    let you = board.snakes[0].clone();

    let started = Instant::now();
    let response = bot.get_move(&game(), &3, &board, &you).await;
    let elapsed = started.elapsed().as_millis() as u64;

    let chosen = response["move"].as_str().unwrap();
    assert!(["up", "left", "right"].contains(&chosen), "illegal move {}", chosen);
    assert!(elapsed < budget + 40, "answered after {}ms", elapsed);
}
