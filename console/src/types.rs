use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fully-resolved read of the account at one point in time.
/// Replaced wholesale each poll, never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub equity: Decimal,
    /// Equity at the start of the trading day (venue's `last_equity`).
    pub prior_equity: Decimal,
    pub buying_power: Decimal,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// One open position as reported by the venue. The set of positions is
/// produced fresh each poll; symbol is the unique key within a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
    pub current_price: Decimal,
    pub unrealized_pnl_amount: Decimal,
    /// Percent, already scaled (5 means 5%).
    pub unrealized_pnl_percent: Decimal,
}

/// One daily bar from the market-data feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: DateTime<Utc>,
    pub close: Decimal,
}

/// Per-symbol row of the market performance table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub symbol: String,
    pub price: Decimal,
    pub pct_1day: Decimal,
    /// Absent when the weekly column is disabled or the reference close is unusable.
    /// With fewer than 5 bars this is really earliest-available-to-latest.
    pub pct_1week: Option<Decimal>,
}

/// Display-ready equity block for one cycle.
/// `day_pnl_percent` is None when prior equity is zero (fresh account).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquityMetrics {
    pub equity: Decimal,
    pub day_pnl_amount: Decimal,
    pub day_pnl_percent: Option<Decimal>,
    pub buying_power: Decimal,
}

/// Connectivity verdict for one cycle. Pure function of the latest
/// account fetch — no memory, no debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Online,
    Disconnected,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Online => write!(f, "ONLINE & CONNECTED"),
            HealthState::Disconnected => write!(f, "OFF-LINE"),
        }
    }
}

/// Gain/loss tone for a signed amount or percent. Zero counts as a gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnlTone {
    Gain,
    Loss,
}

/// Lifecycle of one operator-issued close command. Created on request,
/// resolved after the venue call, then discarded — never carried across
/// cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub id: Uuid,
    pub symbol: String,
    pub requested_at: DateTime<Utc>,
    pub state: ActionState,
}

impl ActionRequest {
    pub fn new(symbol: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            requested_at: Utc::now(),
            state: ActionState::Pending,
        }
    }
}

/// Immutable per-cycle view handed to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewModel {
    pub health: HealthState,
    pub equity: EquityMetrics,
    pub performance: Vec<PerformanceRow>,
    pub positions: Vec<Position>,
    pub last_error: Option<String>,
    pub cycle: u64,
    pub generated_at: DateTime<Utc>,
}
