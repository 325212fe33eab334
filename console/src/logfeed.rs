use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Classification of one activity line, keyed off the markers the trading
/// agent writes into its log strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Profit,
    Loss,
    Signal,
    Info,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub text: String,
    pub kind: LogKind,
}

#[derive(Debug, Deserialize)]
struct BotData {
    #[serde(default)]
    logs: Vec<String>,
}

/// Reader for the activity file the trading agent drops next to the
/// console (`dashboard_data.json`). The agent owns the file; a missing or
/// half-written one is an empty feed, never an error.
pub struct LogFeed {
    path: PathBuf,
}

impl LogFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Last `limit` lines, oldest first, classified.
    pub fn tail(&self, limit: usize) -> Vec<LogLine> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("no activity file at {}: {e}", self.path.display());
                return Vec::new();
            }
        };
        let data: BotData = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(e) => {
                debug!("activity file unreadable, skipping: {e}");
                return Vec::new();
            }
        };

        let skip = data.logs.len().saturating_sub(limit);
        data.logs[skip..]
            .iter()
            .map(|line| LogLine {
                kind: classify(line),
                text: line.clone(),
            })
            .collect()
    }
}

pub fn classify(line: &str) -> LogKind {
    if line.contains("PROFIT") || line.contains("FILLED") || line.contains("WIN") {
        LogKind::Profit
    } else if line.contains("LOSS") || line.contains("STOP") {
        LogKind::Loss
    } else if line.contains("SIGNAL") {
        LogKind::Signal
    } else {
        LogKind::Info
    }
}
