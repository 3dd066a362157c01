// Debug logging module for asynchronous tick logging
//
// Fire-and-forget JSONL logging so the tick loop never waits on disk.
// Each line holds the full game state of a tick and the moves sent back for it,
// which is exactly what the replay engine needs to re-plan the tick offline.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::fallback::PlanOutcome;
use crate::planner::TickPlan;
use crate::types::{Direction, GameState};

/// A move as recorded in the tick log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedMove {
    pub id: String,
    pub direction: Direction,
    pub outcome: PlanOutcome,
}

/// Represents a single debug log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickLogEntry {
    pub turn: u64,
    pub state: GameState,
    pub moves: Vec<LoggedMove>,
    pub timestamp: String,
}

impl TickLogEntry {
    pub fn new(state: GameState, plan: &TickPlan) -> Self {
        TickLogEntry {
            turn: state.turn,
            moves: plan
                .plans
                .iter()
                .map(|agent| LoggedMove {
                    id: agent.id.clone(),
                    direction: agent.decision.direction,
                    outcome: agent.decision.outcome,
                })
                .collect(),
            state,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
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

    /// Logs a planned tick asynchronously (fire-and-forget)
    /// The returned handle may be awaited, but the tick loop drops it
    pub fn log_tick(&self, state: GameState, plan: &TickPlan) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }

        let file_handle = self.file.clone();
        let entry = TickLogEntry::new(state, plan);

        Some(tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        }))
    }

    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: TickLogEntry) {
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
}
