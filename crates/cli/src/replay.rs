//! CSV replay of recorded trades and bars through an instrument worker.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use trade_manager::WorkerHandle;
use trade_manager_core::{PriceBar, Quantity, TradeEvent, TradeIds, TradeKind};

#[derive(Debug, Clone)]
pub enum FeedEvent {
    Trade(TradeEvent),
    Bar(PriceBar),
}

impl FeedEvent {
    /// Ordering key: bars are keyed by their end time and sort ahead of trades
    /// stamped at the same instant.
    fn sort_key(&self) -> (DateTime<Utc>, u8) {
        match self {
            Self::Bar(bar) => (bar.end_time(), 0),
            Self::Trade(trade) => (trade.timestamp(), 1),
        }
    }
}

/// Reads trades from CSV with columns `timestamp,trade_id,kind,quantity,price`.
///
/// # Errors
///
/// Returns an error if a row is malformed or fails trade validation.
pub fn read_trades<R: Read>(reader: R, ids: &TradeIds) -> Result<Vec<TradeEvent>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut trades = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = row + 2;

        let timestamp: DateTime<Utc> = field(&record, 0, line)?
            .parse()
            .with_context(|| format!("Invalid timestamp on line {line}"))?;
        let trade_id = field(&record, 1, line)?.to_string();
        let kind = TradeKind::from_str(field(&record, 2, line)?)
            .with_context(|| format!("Invalid trade kind on line {line}"))?;
        let quantity = Quantity::from_str(field(&record, 3, line)?)
            .with_context(|| format!("Invalid quantity on line {line}"))?;
        let price = Decimal::from_str(field(&record, 4, line)?.trim())
            .with_context(|| format!("Invalid price on line {line}"))?;

        let trade = TradeEvent::new(timestamp, kind, quantity, price)
            .with_context(|| format!("Invalid trade on line {line}"))?
            .with_ids(TradeIds {
                trade_id,
                ..ids.clone()
            });
        trades.push(trade);
    }

    Ok(trades)
}

/// Reads bars from CSV with columns
/// `start_time,end_time,open,high,low,close,volume`.
///
/// # Errors
///
/// Returns an error if a row is malformed or the bar is inconsistent.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<PriceBar>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut bars = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = row + 2;

        let start_time: DateTime<Utc> = field(&record, 0, line)?
            .parse()
            .with_context(|| format!("Invalid start_time on line {line}"))?;
        let end_time: DateTime<Utc> = field(&record, 1, line)?
            .parse()
            .with_context(|| format!("Invalid end_time on line {line}"))?;
        let decimal = |index: usize, name: &str| -> Result<Decimal> {
            Decimal::from_str(field(&record, index, line)?.trim())
                .with_context(|| format!("Invalid {name} on line {line}"))
        };

        let bar = PriceBar::new(
            decimal(2, "open")?,
            decimal(3, "high")?,
            decimal(4, "low")?,
            decimal(5, "close")?,
            decimal(6, "volume")?,
            start_time,
            end_time,
        )
        .with_context(|| format!("Invalid bar on line {line}"))?;
        bars.push(bar);
    }

    Ok(bars)
}

/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_trades(path: &Path, ids: &TradeIds) -> Result<Vec<TradeEvent>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_trades(file, ids)
}

/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_bars(path: &Path) -> Result<Vec<PriceBar>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_bars(file)
}

/// Interleaves trades and bars into one chronological feed.
#[must_use]
pub fn merge(trades: Vec<TradeEvent>, bars: Vec<PriceBar>) -> Vec<FeedEvent> {
    let mut feed: Vec<FeedEvent> = bars
        .into_iter()
        .map(FeedEvent::Bar)
        .chain(trades.into_iter().map(FeedEvent::Trade))
        .collect();
    feed.sort_by_key(FeedEvent::sort_key);
    feed
}

/// Pushes the feed through a worker, stopping at the first rejected trade.
///
/// # Errors
///
/// Returns an error if the worker rejects a trade or is no longer running.
pub async fn replay(handle: &WorkerHandle, feed: Vec<FeedEvent>) -> Result<()> {
    let total = feed.len();
    for event in feed {
        match event {
            FeedEvent::Trade(trade) => {
                let description = trade.to_string();
                if let Some(stop_loss) = handle
                    .enter_trade(trade)
                    .await
                    .with_context(|| format!("Replay stopped at {description}"))?
                {
                    tracing::info!(%stop_loss, "Opened sequence with {}", description);
                }
            }
            FeedEvent::Bar(bar) => handle.on_bar(bar).await?,
        }
    }

    tracing::info!(events = total, "Replay finished");
    Ok(())
}

fn field(record: &csv::StringRecord, index: usize, line: usize) -> Result<&str> {
    record
        .get(index)
        .with_context(|| format!("Missing column {} on line {line}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trade_manager::{spawn_worker, ProtectMoney, TradeManager};
    use trade_manager_core::Instrument;

    const TRADES: &str = "\
timestamp,trade_id,kind,quantity,price
2024-01-15T10:01:00Z,T1,LONG,100,1500
2024-01-15T10:03:00Z,T2,LONG_EXIT,100,1510
2024-01-15T10:05:00Z,T3,SHORT,40,1505
";

    const BARS: &str = "\
start_time,end_time,open,high,low,close,volume
2024-01-15T10:00:00Z,2024-01-15T10:01:00Z,1499,1502,1490,1500,1000
2024-01-15T10:01:00Z,2024-01-15T10:02:00Z,1500,1520,1495,1510,1200
2024-01-15T10:02:00Z,2024-01-15T10:03:00Z,1510,1530,1505,1510,900
2024-01-15T10:05:00Z,2024-01-15T10:06:00Z,1505,1512,1480,1490,800
";

    fn ids() -> TradeIds {
        TradeIds {
            broker: "replay".to_string(),
            instrument_id: "INFY".to_string(),
            exchange: "NSE".to_string(),
            segment: "EQ".to_string(),
            trade_id: String::new(),
        }
    }

    #[test]
    fn parses_trades_and_keeps_ids() {
        let trades = read_trades(TRADES.as_bytes(), &ids()).unwrap();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].kind(), TradeKind::LongEntry);
        assert_eq!(trades[1].kind(), TradeKind::LongExit);
        assert_eq!(trades[2].quantity().value(), dec!(40));
        assert_eq!(trades[2].ids().trade_id, "T3");
        assert_eq!(trades[2].ids().instrument_id, "INFY");
    }

    #[test]
    fn rejects_bad_rows_with_line_number() {
        let bad = "timestamp,trade_id,kind,quantity,price\n2024-01-15T10:01:00Z,T1,HOLD,100,1500\n";
        let err = read_trades(bad.as_bytes(), &ids()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));

        let zero = "timestamp,trade_id,kind,quantity,price\n2024-01-15T10:01:00Z,T1,LONG,0,1500\n";
        assert!(read_trades(zero.as_bytes(), &ids()).is_err());

        let bad_bar = "start_time,end_time,open,high,low,close,volume\n\
2024-01-15T10:00:00Z,2024-01-15T10:01:00Z,1499,1490,1502,1500,1000\n";
        assert!(read_bars(bad_bar.as_bytes()).is_err());
    }

    #[test]
    fn merge_orders_bars_before_same_time_trades() {
        let trades = read_trades(TRADES.as_bytes(), &ids()).unwrap();
        let bars = read_bars(BARS.as_bytes()).unwrap();
        let feed = merge(trades, bars);

        let kinds: Vec<&str> = feed
            .iter()
            .map(|event| match event {
                FeedEvent::Bar(_) => "bar",
                FeedEvent::Trade(_) => "trade",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["bar", "trade", "bar", "bar", "trade", "trade", "bar"]
        );
    }

    #[tokio::test]
    async fn replay_builds_sequences() {
        let trades = read_trades(TRADES.as_bytes(), &ids()).unwrap();
        let bars = read_bars(BARS.as_bytes()).unwrap();

        let instrument = Instrument::new(1, "INFY", "NSE", "EQ", 100).unwrap();
        let (handle, join) = spawn_worker(TradeManager::new(instrument, ProtectMoney::default()), 16);

        replay(&handle, merge(trades, bars)).await.unwrap();
        let summary = handle.summary().await.unwrap();
        handle.shutdown().await.unwrap();
        join.await.unwrap();

        assert_eq!(summary.sequences.len(), 2);
        let first = &summary.sequences[0];
        assert!(!first.active);
        // Bars ending 10:02 and 10:03 fall inside the first sequence.
        assert_eq!(first.min_price, Some(dec!(1495)));
        assert_eq!(first.max_price, Some(dec!(1530)));
        // min(1485, 1500 - 30 = 1470)
        assert_eq!(first.stop_loss, Some(dec!(1470)));

        let second = &summary.sequences[1];
        assert!(second.active);
        assert_eq!(second.min_price, Some(dec!(1480)));
        assert_eq!(second.max_price, Some(dec!(1512)));
        // min(1520.05, 1505 + 30 = 1535)
        assert_eq!(second.stop_loss, Some(dec!(1520.05)));
    }
}
