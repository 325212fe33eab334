use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::Broker;
use crate::config::Credentials;
use crate::error::BrokerError;
use crate::types::{AccountSnapshot, DailyBar, Position, PositionSide};

/// Typed wrapper around the Alpaca trading and market-data REST APIs.
pub struct AlpacaGateway {
    trading_base: String,
    data_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    equity: String,
    last_equity: String,
    buying_power: String,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    symbol: String,
    side: String,
    qty: String,
    avg_entry_price: String,
    current_price: String,
    unrealized_pl: String,
    unrealized_plpc: String,
}

#[derive(Debug, Deserialize)]
struct RawBars {
    bars: Option<HashMap<String, Vec<RawBar>>>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "t")]
    time: DateTime<Utc>,
    #[serde(rename = "c")]
    close: Decimal,
}

/// The venue sends money fields as decimal strings.
fn money(field: &str, raw: &str) -> Result<Decimal, BrokerError> {
    Decimal::from_str(raw)
        .map_err(|e| BrokerError::Connectivity(format!("bad {field} '{raw}' from venue: {e}")))
}

impl AlpacaGateway {
    pub fn new(
        creds: &Credentials,
        trading_base: &str,
        data_base: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            HeaderValue::from_str(&creds.key_id).context("API key id is not a valid header value")?,
        );
        let mut secret = HeaderValue::from_str(&creds.secret_key)
            .context("API secret is not a valid header value")?;
        secret.set_sensitive(true);
        headers.insert("APCA-API-SECRET-KEY", secret);

        Ok(Self {
            trading_base: trading_base.trim_end_matches('/').to_string(),
            data_base: data_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .default_headers(headers)
                .build()
                .context("HTTP client")?,
        })
    }
}

#[async_trait]
impl Broker for AlpacaGateway {
    async fn fetch_account(&self) -> Result<AccountSnapshot, BrokerError> {
        let url = format!("{}/v2/account", self.trading_base);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(BrokerError::Connectivity(format!(
                "account request returned {}",
                resp.status()
            )));
        }
        let raw: RawAccount = resp.json().await?;

        Ok(AccountSnapshot {
            equity: money("equity", &raw.equity)?,
            prior_equity: money("last_equity", &raw.last_equity)?,
            buying_power: money("buying_power", &raw.buying_power)?,
            fetched_at: Utc::now(),
        })
    }

    async fn list_open_positions(&self) -> Result<Vec<Position>, BrokerError> {
        let url = format!("{}/v2/positions", self.trading_base);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(BrokerError::Connectivity(format!(
                "positions request returned {}",
                resp.status()
            )));
        }
        let raw: Vec<RawPosition> = resp.json().await?;

        let mut positions = Vec::with_capacity(raw.len());
        for p in raw {
            let side = match p.side.to_ascii_lowercase().as_str() {
                "long" => PositionSide::Long,
                "short" => PositionSide::Short,
                other => {
                    return Err(BrokerError::Connectivity(format!(
                        "unexpected side '{other}' for {}",
                        p.symbol
                    )))
                }
            };
            positions.push(Position {
                side,
                quantity: money("qty", &p.qty)?,
                avg_entry_price: money("avg_entry_price", &p.avg_entry_price)?,
                current_price: money("current_price", &p.current_price)?,
                unrealized_pnl_amount: money("unrealized_pl", &p.unrealized_pl)?,
                // Venue reports a fraction; the console works in percent.
                unrealized_pnl_percent: money("unrealized_plpc", &p.unrealized_plpc)?
                    * Decimal::ONE_HUNDRED,
                symbol: p.symbol,
            });
        }
        Ok(positions)
    }

    async fn fetch_daily_bars(
        &self,
        symbols: &[String],
        lookback_days: i64,
    ) -> Result<HashMap<String, Vec<DailyBar>>, BrokerError> {
        let start = (Utc::now() - ChronoDuration::days(lookback_days)).to_rfc3339();
        let url = format!("{}/v2/stocks/bars", self.data_base);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbols", symbols.join(",")),
                ("timeframe", "1Day".to_string()),
                ("start", start),
                ("limit", "1000".to_string()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(BrokerError::Connectivity(format!(
                "bars request returned {}",
                resp.status()
            )));
        }
        let raw: RawBars = resp.json().await?;

        let mut out = HashMap::new();
        for (symbol, bars) in raw.bars.unwrap_or_default() {
            if bars.is_empty() {
                continue;
            }
            let mut series: Vec<DailyBar> = bars
                .into_iter()
                .map(|b| DailyBar { date: b.time, close: b.close })
                .collect();
            series.sort_by_key(|b| b.date);
            out.insert(symbol, series);
        }
        debug!("bars fetched for {}/{} symbols", out.len(), symbols.len());
        Ok(out)
    }

    async fn close_position(&self, symbol: &str) -> Result<(), BrokerError> {
        let url = format!("{}/v2/positions/{}", self.trading_base, symbol);
        let resp = self.client.delete(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Action(format!(
                "{status}: {}",
                &body[..body.len().min(200)]
            )));
        }
        Ok(())
    }
}
