// Debug logging module for asynchronous game state logging
//
// This module provides fire-and-forget async logging to avoid blocking
// the main request/response cycle. Each decision is written as one line of
// a JSONL file that the replay tool can read back.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::board::{Board, TurnSnapshot};
use crate::search::{Decision, FallbackTier};

/// A single debug log entry: the decision input and what was chosen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: i32,
    pub you: String,
    pub chosen_move: String,
    pub score: f64,
    pub depth: u8,
    pub tier: FallbackTier,
    /// Seed the decision RNG was created from
    pub seed: u64,
    pub board: Board,
    pub timestamp: String,
}

impl LogEntry {
    pub fn new(snapshot: &TurnSnapshot, decision: &Decision, seed: u64) -> Self {
        LogEntry {
            turn: snapshot.turn,
            you: snapshot.you.clone(),
            chosen_move: decision.direction.as_str().to_string(),
            score: decision.score,
            depth: decision.depth,
            tier: decision.tier,
            seed,
            board: snapshot.board.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuilds the snapshot the logged decision was made from
    pub fn snapshot(&self) -> TurnSnapshot {
        TurnSnapshot::new(self.board.clone(), self.turn, &self.you)
    }
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a decision asynchronously (fire-and-forget)
    /// This spawns a tokio task that writes to the file without blocking
    pub fn log_decision(&self, entry: LogEntry) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
    }

    /// Writes one entry and flushes; failures are logged and swallowed
    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: LogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write debug log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize debug log entry: {}", e);
                }
            }
        }
    }

    /// Writes an entry and waits for it to reach the file
    pub async fn log_decision_now(&self, entry: LogEntry) {
        if self.enabled {
            Self::write_entry(self.file.clone(), entry).await;
        }
    }
}
