mod alpaca;

pub use alpaca::AlpacaGateway;

use crate::error::BrokerError;
use crate::types::{AccountSnapshot, DailyBar, Position};
use async_trait::async_trait;
use std::collections::HashMap;

/// Venue operations the console depends on. One call, one network request;
/// the fixed-interval re-poll is the retry mechanism.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn fetch_account(&self) -> Result<AccountSnapshot, BrokerError>;

    /// Open positions as the venue reports them. An account holding
    /// nothing is an empty list, not an error.
    async fn list_open_positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Daily bars per symbol, oldest first. Symbols the venue returns no
    /// data for (delisted, halted) are omitted from the map.
    async fn fetch_daily_bars(
        &self,
        symbols: &[String],
        lookback_days: i64,
    ) -> Result<HashMap<String, Vec<DailyBar>>, BrokerError>;

    /// Issues exactly one close order. Callers must prevent concurrent
    /// calls for the same symbol.
    async fn close_position(&self, symbol: &str) -> Result<(), BrokerError>;
}
