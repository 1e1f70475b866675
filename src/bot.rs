// Welcome to
// __________         __    __  .__                               __
// \______   \_____ _/  |__/  |_|  |   ____   ______ ____ _____  |  | __ ____
//  |    |  _/\__  \\   __\   __\  | _/ __ \ /  ___//    \\__  \ |  |/ // __ \
//  |    |   \ / __ \|  |  |  | |  |_\  ___/ \___ \|   |  \/ __ \|    <\  ___/
//  |________/(______/__|  |__| |____/\_____>______>___|__(______/__|__\\_____>
//
// The bot binds the decision engine to the Battlesnake API lifecycle.
// For more info see docs.battlesnake.com

use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board::TurnSnapshot;
use crate::config::Config;
use crate::debug_logger::{DebugLogger, LogEntry};
use crate::search::{Decision, SearchEngine, SharedSearchState};
use crate::types::{Battlesnake, BoardPayload, Game};

/// Battlesnake Bot with OOP-style API
/// Takes static configuration dependencies and exposes methods corresponding to API endpoints
pub struct Bot {
    config: Config,
    engine: Arc<SearchEngine>,
    logger: DebugLogger,
}

/// Seed for one decision: an FNV-1a fold of game id, turn and snake id,
/// so the same turn gets the same seed on every build
pub fn decision_seed(game_id: &str, turn: i32, you: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let turn_bytes = turn.to_le_bytes();
    let parts: [&[u8]; 3] = [game_id.as_bytes(), &turn_bytes, you.as_bytes()];
    parts.iter().fold(FNV_OFFSET, |hash, part| {
        // 0xff terminates each part; it never occurs in UTF-8
        part.iter()
            .chain(std::iter::once(&0xff))
            .fold(hash, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
    })
}

impl Bot {
    /// Creates a new Bot instance with the given configuration
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        let engine = Arc::new(SearchEngine::new(config.clone()));
        Bot {
            config,
            engine,
            logger: DebugLogger::disabled(),
        }
    }

    /// Attaches a debug logger that records every decision
    pub fn with_logger(mut self, logger: DebugLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns bot metadata and appearance
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "anytime-snake",
            "color": "#00DEAD",
            "head": "default",
            "tail": "default",
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, game: &Game, _turn: &i32, board: &BoardPayload, _you: &Battlesnake) {
        info!(
            "GAME START {} ({}x{}, {} snakes)",
            game.id,
            board.width,
            board.height,
            board.snakes.len()
        );
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, game: &Game, turn: &i32, _board: &BoardPayload, you: &Battlesnake) {
        info!("GAME OVER {} at turn {} (health {})", game.id, turn, you.health);
    }

    /// Computes and returns the next move
    /// Corresponds to POST /move endpoint
    ///
    /// Malformed payloads are answered with the configured default move.
    ///
    /// # Returns
    /// * `Value` - JSON response containing the chosen move direction
    pub async fn get_move(
        &self,
        game: &Game,
        turn: &i32,
        board: &BoardPayload,
        you: &Battlesnake,
    ) -> Value {
        let snapshot = match board.to_board() {
            Ok(b) => TurnSnapshot::new(b, *turn, &you.id),
            Err(e) => {
                warn!("Turn {}: rejected board ({}), answering {}", turn, e, self.config.fallback.default_move);
                return self.default_move();
            }
        };

        let seed = decision_seed(&game.id, *turn, &you.id);
        let decision = self.decide(snapshot.clone(), seed).await;

        if self.logger.is_enabled() {
            self.logger.log_decision(LogEntry::new(&snapshot, &decision, seed));
        }

        json!({ "move": decision.direction.as_str() })
    }

    /// Response used when no snapshot can be built at all
    pub fn default_move(&self) -> Value {
        json!({ "move": self.config.fallback.default_move.as_str() })
    }

    /// Runs one anytime decision.
    ///
    /// This method orchestrates the async polling and CPU-bound search computation:
    /// 1. Spawns the search on a blocking thread (root moves fan out on rayon)
    /// 2. Polls for completion with timeout management
    /// 3. On budget, cancels the search and returns the best published result
    pub async fn decide(&self, snapshot: TurnSnapshot, seed: u64) -> Decision {
        let start_time = Instant::now();
        let turn = snapshot.turn;

        info!("Turn {}: Computing move", turn);

        // Shared state for lock-free communication between poller and search
        let shared = Arc::new(SharedSearchState::new());
        let effective_budget = self.config.timing.effective_budget_ms();
        let budget = Duration::from_millis(effective_budget);

        let engine = self.engine.clone();
        let shared_clone = shared.clone();
        let search_snapshot = snapshot.clone();
        tokio::task::spawn_blocking(move || {
            engine.decide_with(&search_snapshot, seed, budget, &shared_clone);
        });

        // Polling loop: check for results or timeout
        let polling_interval = Duration::from_millis(self.config.timing.polling_interval_ms.max(1));
        loop {
            tokio::time::sleep(polling_interval).await;

            if shared.is_complete() {
                break;
            }
            let elapsed = start_time.elapsed().as_millis() as u64;
            if elapsed >= effective_budget {
                info!(
                    "Turn {}: budget reached during depth {}, cancelling search",
                    turn,
                    shared.current_depth()
                );
                break;
            }
        }
        shared.cancel();

        let decision = match shared.best() {
            Some(d) => d,
            None => {
                warn!("Turn {}: search never published a result, using fallback", turn);
                self.engine.fallback(&snapshot, seed)
            }
        };

        info!(
            "Turn {}: Chose {} (score: {:.2}, depth: {}, tier: {:?}, time: {}ms)",
            turn,
            decision.direction.as_str(),
            decision.score,
            decision.depth,
            decision.tier,
            start_time.elapsed().as_millis()
        );

        decision
    }
}
