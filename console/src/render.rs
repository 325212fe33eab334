use crate::logfeed::{LogKind, LogLine};
use crate::metrics::pnl_tone;
use crate::types::{PnlTone, ViewModel};
use rust_decimal::Decimal;
use std::fmt::Write;

/// Plain-text rendering of one cycle for the terminal. Reads the view
/// model, never mutates it. Tone picks the gain/loss marker; actual
/// colors are left to whatever displays the text.
pub fn render(view: &ViewModel, logs: &[LogLine]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} | cycle #{} | {}",
        view.health,
        view.cycle,
        view.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(err) = &view.last_error {
        let _ = writeln!(out, "last error: {err}");
    }
    let _ = writeln!(out, "{}", "─".repeat(54));

    let _ = writeln!(out, "Total Equity   ${}", view.equity.equity.round_dp(2));
    let _ = writeln!(
        out,
        "Day P&L ($)    {} {}",
        marker(view.equity.day_pnl_amount),
        signed(view.equity.day_pnl_amount)
    );
    match view.equity.day_pnl_percent {
        Some(pct) => {
            let _ = writeln!(out, "Day P&L (%)    {} {}%", marker(pct), signed(pct));
        }
        None => {
            let _ = writeln!(out, "Day P&L (%)    —");
        }
    }
    let _ = writeln!(out, "Buying Power   ${}", view.equity.buying_power.round_dp(2));

    let _ = writeln!(out, "\nMarket Performance");
    if view.performance.is_empty() {
        let _ = writeln!(out, "  (no data)");
    }
    for row in &view.performance {
        let week = match row.pct_1week {
            Some(pct) => format!("   1W {} {}%", marker(pct), signed(pct)),
            None => String::new(),
        };
        let price = format!("${}", row.price.round_dp(2));
        let _ = writeln!(
            out,
            "  {:<5} {:<10} 1D {} {}%{week}",
            row.symbol,
            price,
            marker(row.pct_1day),
            signed(row.pct_1day)
        );
    }

    let _ = writeln!(out, "\nActive Positions");
    if view.positions.is_empty() {
        let _ = writeln!(out, "  No positions currently open.");
    }
    for pos in &view.positions {
        let _ = writeln!(
            out,
            "  {} ({})  qty {}  entry ${}  curr ${}  {} {} ({}%)",
            pos.symbol,
            pos.side,
            pos.quantity,
            pos.avg_entry_price.round_dp(2),
            pos.current_price.round_dp(2),
            marker(pos.unrealized_pnl_amount),
            signed(pos.unrealized_pnl_amount),
            signed(pos.unrealized_pnl_percent)
        );
    }

    if !logs.is_empty() {
        let _ = writeln!(out, "\nActivity");
        for line in logs {
            let _ = writeln!(out, "  [{}] {}", tag(line.kind), line.text);
        }
    }

    out
}

fn marker(value: Decimal) -> char {
    match pnl_tone(value) {
        PnlTone::Gain => '▲',
        PnlTone::Loss => '▼',
    }
}

fn signed(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded.is_sign_negative() {
        rounded.to_string()
    } else {
        format!("+{rounded}")
    }
}

fn tag(kind: LogKind) -> &'static str {
    match kind {
        LogKind::Profit => "WIN ",
        LogKind::Loss => "LOSS",
        LogKind::Signal => "SIG ",
        LogKind::Info => "INFO",
    }
}
