use anyhow::{bail, Context, Result};

/// Venue key pair, resolved once at startup and passed explicitly into the
/// components that need it. There is no embedded fallback: startup fails
/// when either key is absent.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub key_id: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub trading_api_base: String,
    pub data_api_base: String,
    pub symbols: Vec<String>,
    pub refresh_interval_secs: u64,
    pub perf_cache_ttl_secs: u64,
    pub bars_lookback_days: i64,
    pub show_week_change: bool,
    pub request_timeout_secs: u64,
    pub log_feed_path: String,
}

impl Config {
    /// Load config from a specific .env file, or the default `.env` if None.
    pub fn from_env_file(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => { dotenvy::from_filename(p).ok(); }
            None => { dotenvy::dotenv().ok(); }
        }
        Self::build_from_env()
    }

    fn build_from_env() -> Result<Self> {
        let credentials = Credentials {
            key_id: required_env("APCA_API_KEY_ID")?,
            secret_key: required_env("APCA_API_SECRET_KEY")?,
        };

        let symbols: Vec<String> = env("SYMBOLS", "SPY,SLV,GLD")
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            bail!("SYMBOLS must name at least one ticker");
        }

        let bars_lookback_days: i64 = env("BARS_LOOKBACK_DAYS", "8").parse().unwrap_or(8);
        // Need a calendar week plus weekends/holidays to get 5 trading days.
        if bars_lookback_days < 8 {
            bail!("BARS_LOOKBACK_DAYS must be at least 8, got {bars_lookback_days}");
        }

        Ok(Self {
            credentials,
            trading_api_base: env("ALPACA_TRADING_API", "https://paper-api.alpaca.markets"),
            data_api_base: env("ALPACA_DATA_API", "https://data.alpaca.markets"),
            symbols,
            refresh_interval_secs: env("REFRESH_INTERVAL_SECS", "5").parse().unwrap_or(5),
            perf_cache_ttl_secs: env("PERF_CACHE_TTL_SECS", "300").parse().unwrap_or(300),
            bars_lookback_days,
            show_week_change: env("SHOW_WEEK_CHANGE", "true") == "true",
            request_timeout_secs: env("REQUEST_TIMEOUT_SECS", "15").parse().unwrap_or(15),
            log_feed_path: env("LOG_FEED_PATH", "dashboard_data.json"),
        })
    }
}

fn env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required_env(key: &str) -> Result<String> {
    let val = std::env::var(key).with_context(|| format!("{key} must be set"))?;
    if val.trim().is_empty() {
        bail!("{key} must not be empty");
    }
    Ok(val)
}
