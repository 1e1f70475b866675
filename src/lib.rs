// Library exports for the anytime snake engine
// This allows the server, the replay tool and the integration tests to share the core logic

pub mod board;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod heuristics;
pub mod opponent;
pub mod replay;
pub mod safety;
pub mod search;
pub mod simple_profiler;
pub mod simulator;
pub mod types;
