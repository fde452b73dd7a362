#![allow(clippy::format_push_string)]

use rust_decimal::Decimal;

use crate::manager::ManagerSummary;

const RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────\n";

pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn format(summary: &ManagerSummary) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str(RULE);
        output.push_str("                    TRADE SEQUENCES                            \n");
        output.push_str(RULE);
        output.push('\n');

        output.push_str("Instrument\n");
        output.push_str(THIN_RULE);
        output.push_str(&format!("Symbol:                {}\n", summary.symbol));
        output.push_str(&format!("Exchange:              {}\n", summary.exchange));
        output.push_str(&format!("Lot Size:              {}\n", summary.lot_size));
        output.push('\n');

        for seq in &summary.sequences {
            let status = if seq.active { "ACTIVE" } else { "CLOSED" };
            output.push_str(&format!("Sequence #{} ({}, {})\n", seq.index, seq.direction, status));
            output.push_str(THIN_RULE);
            output.push_str(&format!("Trades:                {}\n", seq.trade_count));
            output.push_str(&format!("Outstanding:           {}\n", seq.outstanding));
            output.push_str(&format!("Stop Loss:             {}\n", price_or_na(seq.stop_loss)));
            output.push_str(&format!("Min Price:             {}\n", price_or_na(seq.min_price)));
            output.push_str(&format!("Max Price:             {}\n", price_or_na(seq.max_price)));
            if let Some(opened) = seq.opened_at {
                output.push_str(&format!(
                    "Opened:                {}\n",
                    opened.format("%Y-%m-%d %H:%M:%S UTC")
                ));
            }
            if let (false, Some(last)) = (seq.active, seq.last_trade_at) {
                output.push_str(&format!(
                    "Closed:                {}\n",
                    last.format("%Y-%m-%d %H:%M:%S UTC")
                ));
            }
            output.push('\n');
        }

        output.push_str("Totals\n");
        output.push_str(THIN_RULE);
        output.push_str(&format!("Sequences:             {}\n", summary.sequences.len()));
        output.push_str(&format!("Trades:                {}\n", summary.total_trades));
        output.push_str(&format!("Outstanding:           {}\n", summary.total_outstanding));
        output.push('\n');
        output.push_str(RULE);

        if summary.sequences.is_empty() {
            output.push_str("\nNo trades were recorded for this instrument.\n\n");
        }

        output
    }
}

fn price_or_na(price: Option<Decimal>) -> String {
    price.map_or_else(|| "N/A".to_string(), |p| format!("{:.2}", p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::TradeManager;
    use crate::protect_money::ProtectMoney;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use trade_manager_core::{Instrument, Quantity, TradeEvent, TradeKind};

    #[test]
    fn empty_report_mentions_no_trades() {
        let instrument = Instrument::new(1, "TCS", "NSE", "EQ", 150).unwrap();
        let mgr = TradeManager::new(instrument, ProtectMoney::default());
        let text = ReportFormatter::format(&mgr.summary());

        assert!(text.contains("Symbol:                TCS"));
        assert!(text.contains("Sequences:             0"));
        assert!(text.contains("No trades were recorded"));
    }

    #[test]
    fn report_lists_each_sequence() {
        let instrument = Instrument::new(1, "TCS", "NSE", "EQ", 100).unwrap();
        let mut mgr = TradeManager::new(instrument, ProtectMoney::default());
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let entry = TradeEvent::new(at, TradeKind::LongEntry, Quantity::from(100), dec!(100)).unwrap();
        let exit = TradeEvent::new(at, TradeKind::LongExit, Quantity::from(100), dec!(101)).unwrap();
        let short = TradeEvent::new(at, TradeKind::ShortEntry, Quantity::from(20), dec!(102)).unwrap();
        mgr.enter_trade(entry).unwrap();
        mgr.enter_trade(exit).unwrap();
        mgr.enter_trade(short).unwrap();

        let text = ReportFormatter::format(&mgr.summary());
        assert!(text.contains("Sequence #1 (LONG, CLOSED)"));
        assert!(text.contains("Sequence #2 (SHORT, ACTIVE)"));
        assert!(text.contains("Stop Loss:             70.00"));
        assert!(text.contains("Min Price:             N/A"));
        assert!(text.contains("Closed:                2024-01-15 10:30:00 UTC"));
        assert!(!text.contains("No trades were recorded"));
    }
}
