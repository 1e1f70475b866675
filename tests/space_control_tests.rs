// Integration tests for the space, territory and hazard evaluators
//
// These check the heuristics in isolation on hand-built boards so that a
// change in one term is caught before it shows up as an odd search result.

use anytime_snake::board::Board;
use anytime_snake::config::Config;
use anytime_snake::heuristics::{
    flood_fill, voronoi, AreaControlScore, AreaMode, BoundaryPushScore, EvalContext, Evaluator,
    HazardPenalty, HeadToHeadScore, Heuristic, TerritoryScore,
};
use anytime_snake::simulator::Simulator;
use anytime_snake::types::{Coord, Direction};

fn c(x: i32, y: i32) -> Coord {
    Coord::new(x, y)
}

fn area(mode: AreaMode) -> AreaControlScore {
    AreaControlScore {
        mode,
        shortage_penalty: 25.0,
        cell_value_factor: 0.0,
    }
}

#[test]
fn test_flood_fill_ignores_cells_behind_walls() {
    // Column x=3 is walled off by a body from y=0 to y=6
    let wall: Vec<Coord> = (0..7).rev().map(|y| c(3, y)).collect();
    let board = Board::new(7, 7)
        .with_snake("me", vec![c(1, 3)], 90)
        .with_snake("wall", wall, 90);
    let reached = flood_fill(&board, &c(1, 3));
    assert_eq!(reached.len(), 3 * 7 - 1);
    assert!(reached.iter().all(|cell| cell.x < 3));
}

#[test]
fn test_small_pocket_is_penalised_below_length() {
    // A length-6 snake whose head sits in a 4-cell pocket
    let board = Board::new(5, 5)
        .with_snake(
            "me",
            vec![c(0, 2), c(1, 2), c(2, 2), c(2, 3), c(2, 4), c(3, 4)],
            90,
        )
        .with_snake("wall", vec![c(0, 1), c(1, 1), c(2, 1), c(3, 1), c(4, 1)], 90);
    let ctx = EvalContext::new(&board, &board, "me");

    let reached = flood_fill(&board, &c(0, 2));
    assert_eq!(reached.len(), 4);
    // area 4 against length 6: 4 - 2 * 25
    assert_eq!(area(AreaMode::FloodFill).score(&ctx), 4.0 - 50.0);
}

#[test]
fn test_adjacency_mode_counts_free_neighbours() {
    let board = Board::new(11, 11).with_snake("me", vec![c(5, 5), c(5, 4)], 90);
    let ctx = EvalContext::new(&board, &board, "me");
    // Three free neighbours, length 2: no shortage
    assert_eq!(area(AreaMode::Adjacency).score(&ctx), 3.0);
}

#[test]
fn test_territory_favours_the_central_snake() {
    let board = Board::new(11, 11)
        .with_snake("center", vec![c(5, 5), c(5, 4)], 90)
        .with_snake("corner", vec![c(0, 0), c(0, 1)], 90);

    let owned = voronoi(&board);
    assert!(owned["center"] > owned["corner"]);

    let center = TerritoryScore.score(&EvalContext::new(&board, &board, "center"));
    let corner = TerritoryScore.score(&EvalContext::new(&board, &board, "corner"));
    assert!(center > 0.0);
    assert_eq!(center, -corner);
}

#[test]
fn test_symmetric_territory_is_zero() {
    let board = Board::new(11, 11)
        .with_snake("a", vec![c(2, 5), c(1, 5)], 90)
        .with_snake("b", vec![c(8, 5), c(9, 5)], 90);
    let score = TerritoryScore.score(&EvalContext::new(&board, &board, "a"));
    assert_eq!(score, 0.0);
}

#[test]
fn test_hazard_penalty_grows_with_soaked_segments() {
    let penalty = HazardPenalty { soak_factor: 0.5 };
    let hazards = vec![c(5, 5), c(5, 4), c(5, 3)];

    let dry = Board::new(11, 11).with_snake("me", vec![c(6, 6), c(6, 5)], 90);
    assert_eq!(penalty.score(&EvalContext::new(&dry, &dry, "me")), 0.0);

    let fresh = Board::new(11, 11)
        .with_snake("me", vec![c(5, 5), c(6, 5), c(7, 5)], 90)
        .with_hazards(hazards.clone());
    assert_eq!(penalty.score(&EvalContext::new(&fresh, &fresh, "me")), -1.0);

    let soaked = Board::new(11, 11)
        .with_snake("me", vec![c(5, 5), c(5, 4), c(5, 3)], 90)
        .with_hazards(hazards);
    assert_eq!(penalty.score(&EvalContext::new(&soaked, &soaked, "me")), -2.0);
}

#[test]
fn test_boundary_push_rewards_rivals_on_the_wall() {
    let on_wall = Board::new(11, 11)
        .with_snake("me", vec![c(5, 5)], 90)
        .with_snake("op", vec![c(0, 7), c(0, 6)], 90);
    let in_middle = Board::new(11, 11)
        .with_snake("me", vec![c(5, 5)], 90)
        .with_snake("op", vec![c(4, 7), c(4, 6)], 90);

    let wall_score = BoundaryPushScore.score(&EvalContext::new(&on_wall, &on_wall, "me"));
    let middle_score = BoundaryPushScore.score(&EvalContext::new(&in_middle, &in_middle, "me"));
    assert_eq!(wall_score, 0.0);
    assert!(middle_score < wall_score);
}

#[test]
fn test_evaluator_is_weighted_sum_of_breakdown() {
    let config = Config::default_hardcoded();
    let evaluator = Evaluator::from_config(&config.weights, &config.rules);
    let board = Board::new(11, 11)
        .with_snake("me", vec![c(3, 3), c(3, 2), c(3, 1)], 40)
        .with_snake("op", vec![c(8, 8), c(8, 7), c(8, 6)], 80)
        .with_food(vec![c(5, 5)])
        .with_hazards(vec![c(0, 0)]);
    let ctx = EvalContext::new(&board, &board, "me");

    let total = evaluator.evaluate(&ctx);
    let parts: f64 = evaluator.breakdown(&ctx).iter().map(|(_, v)| v).sum();
    assert!((total - parts).abs() < 1e-9);
}

#[test]
fn test_contest_on_food_scores_like_the_simulated_collision() {
    // Equal snakes both able to reach the food at (6,5)
    let before = Board::new(11, 11)
        .with_snake("me", vec![c(5, 5), c(4, 5), c(3, 5)], 60)
        .with_snake("op", vec![c(7, 5), c(8, 5), c(9, 5)], 60)
        .with_food(vec![c(6, 5)]);
    let config = Config::default_hardcoded();
    let sim = Simulator::new(config.rules.clone());

    // Both heads land on the food, both eat, equal lengths both die
    let clash = sim.step(&before, &[("me", Direction::Right), ("op", Direction::Left)]);
    assert!(clash.snakes.is_empty());

    // The leaf where we took the food alone is still scored as a tie
    let leaf = sim.step(&before, &[("me", Direction::Right), ("op", Direction::Up)]);
    assert_eq!(leaf.snake("me").map(|s| s.len()), Some(4));
    let h2h = HeadToHeadScore {
        kill_bonus: config.weights.head_to_head_kill,
        loss_penalty: config.weights.head_to_head_loss,
        tie_penalty: config.weights.head_to_head_tie,
    };
    assert_eq!(
        h2h.score(&EvalContext::new(&leaf, &before, "me")),
        -config.weights.head_to_head_tie
    );
}
