//! Pure derivations from raw venue data to display metrics. No I/O in
//! here; everything is deterministic given its inputs.

use crate::types::{AccountSnapshot, DailyBar, EquityMetrics, PerformanceRow, PnlTone};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Day P&L block for the header metrics. Percent is None when prior
/// equity is zero — the renderer shows a sentinel instead of dividing.
pub fn equity_metrics(snapshot: &AccountSnapshot) -> EquityMetrics {
    let day_pnl_amount = snapshot.equity - snapshot.prior_equity;
    let day_pnl_percent = if snapshot.prior_equity.is_zero() {
        None
    } else {
        Some(day_pnl_amount / snapshot.prior_equity * Decimal::ONE_HUNDRED)
    };

    EquityMetrics {
        equity: snapshot.equity,
        day_pnl_amount,
        day_pnl_percent,
        buying_power: snapshot.buying_power,
    }
}

/// Performance table rows in configured symbol order.
///
/// A symbol needs at least two bars to price a 1-day change; with fewer it
/// is left out of the table entirely rather than zero-filled. The weekly
/// reference is the earliest bar in the window, so with fewer than 5 bars
/// the "1W" figure is really earliest-available-to-latest. Better a short
/// baseline than a blank column.
pub fn performance_rows(
    bars_by_symbol: &HashMap<String, Vec<DailyBar>>,
    symbol_order: &[String],
    include_week: bool,
) -> Vec<PerformanceRow> {
    let mut rows = Vec::new();

    for symbol in symbol_order {
        let Some(bars) = bars_by_symbol.get(symbol) else {
            continue;
        };
        if bars.len() < 2 {
            continue;
        }

        let price = bars[bars.len() - 1].close;
        let prev_close = bars[bars.len() - 2].close;
        if prev_close.is_zero() {
            continue;
        }
        let pct_1day = (price - prev_close) / prev_close * Decimal::ONE_HUNDRED;

        let pct_1week = if include_week {
            let week_close = bars[0].close;
            if week_close.is_zero() {
                None
            } else {
                Some((price - week_close) / week_close * Decimal::ONE_HUNDRED)
            }
        } else {
            None
        };

        rows.push(PerformanceRow {
            symbol: symbol.clone(),
            price,
            pct_1day,
            pct_1week,
        });
    }

    rows
}

/// Gain/loss tone of a signed value. Zero is non-negative, so it reads
/// as a gain.
pub fn pnl_tone(value: Decimal) -> PnlTone {
    if value < Decimal::ZERO {
        PnlTone::Loss
    } else {
        PnlTone::Gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn snapshot(equity: Decimal, prior: Decimal, buying_power: Decimal) -> AccountSnapshot {
        AccountSnapshot {
            equity,
            prior_equity: prior,
            buying_power,
            fetched_at: Utc::now(),
        }
    }

    fn bars(closes: &[f64]) -> Vec<DailyBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| DailyBar {
                date: Utc.with_ymd_and_hms(2026, 7, 1 + i as u32, 4, 0, 0).unwrap(),
                close: Decimal::try_from(*c).unwrap(),
            })
            .collect()
    }

    #[test]
    fn day_pnl_from_snapshot() {
        let m = equity_metrics(&snapshot(dec!(100500.00), dec!(100000.00), dec!(50000.00)));
        assert_eq!(m.equity, dec!(100500.00));
        assert_eq!(m.day_pnl_amount, dec!(500.00));
        assert_eq!(m.day_pnl_percent.unwrap().round_dp(2), dec!(0.50));
        assert_eq!(m.buying_power, dec!(50000.00));
    }

    #[test]
    fn zero_prior_equity_reports_sentinel_not_division() {
        let m = equity_metrics(&snapshot(dec!(2500), Decimal::ZERO, dec!(2500)));
        assert_eq!(m.day_pnl_amount, dec!(2500));
        assert!(m.day_pnl_percent.is_none());
    }

    #[test]
    fn negative_day_pnl() {
        let m = equity_metrics(&snapshot(dec!(99000), dec!(100000), dec!(40000)));
        assert_eq!(m.day_pnl_amount, dec!(-1000));
        assert_eq!(m.day_pnl_percent.unwrap().round_dp(2), dec!(-1.00));
    }

    #[test]
    fn seven_bar_window_prices_day_and_week() {
        let mut by_symbol = HashMap::new();
        by_symbol.insert(
            "SPY".to_string(),
            bars(&[400.0, 402.0, 404.0, 406.0, 408.0, 410.0, 412.0]),
        );

        let rows = performance_rows(&by_symbol, &["SPY".to_string()], true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, dec!(412));
        // (412 - 410) / 410 * 100
        assert_eq!(rows[0].pct_1day.round_dp(4), dec!(0.4878));
        // week reference is the earliest bar, 400
        assert_eq!(rows[0].pct_1week.unwrap().round_dp(2), dec!(3.00));
    }

    #[test]
    fn single_bar_symbol_is_excluded() {
        let mut by_symbol = HashMap::new();
        by_symbol.insert("GLD".to_string(), bars(&[180.0]));

        let rows = performance_rows(&by_symbol, &["GLD".to_string()], true);
        assert!(rows.is_empty());
    }

    #[test]
    fn short_window_falls_back_to_earliest_bar_for_week() {
        let mut by_symbol = HashMap::new();
        by_symbol.insert("SLV".to_string(), bars(&[20.0, 21.0, 22.0]));

        let rows = performance_rows(&by_symbol, &["SLV".to_string()], true);
        assert_eq!(rows.len(), 1);
        // 3 bars < 5: "1W" is earliest-available-to-latest, (22-20)/20
        assert_eq!(rows[0].pct_1week.unwrap().round_dp(2), dec!(10.00));
    }

    #[test]
    fn week_column_disabled_by_variant() {
        let mut by_symbol = HashMap::new();
        by_symbol.insert("SPY".to_string(), bars(&[400.0, 404.0]));

        let rows = performance_rows(&by_symbol, &["SPY".to_string()], false);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].pct_1week.is_none());
    }

    #[test]
    fn missing_symbols_keep_configured_order() {
        let mut by_symbol = HashMap::new();
        by_symbol.insert("GLD".to_string(), bars(&[180.0, 181.0]));
        by_symbol.insert("SPY".to_string(), bars(&[400.0, 404.0]));

        let order = vec!["SPY".to_string(), "SLV".to_string(), "GLD".to_string()];
        let rows = performance_rows(&by_symbol, &order, true);
        let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["SPY", "GLD"]);
    }

    #[test]
    fn tone_is_sign_based_and_zero_is_gain() {
        assert_eq!(pnl_tone(dec!(0.01)), PnlTone::Gain);
        assert_eq!(pnl_tone(Decimal::ZERO), PnlTone::Gain);
        assert_eq!(pnl_tone(dec!(-0.01)), PnlTone::Loss);
    }
}
