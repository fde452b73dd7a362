//! Per-instrument owner of the trade group.
//!
//! The manager is the only place the stop-loss calculator is consulted: once,
//! when a trade opens a new sequence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trade_manager_core::{
    Instrument, PriceBar, Quantity, StopLoss, TradeDirection, TradeError, TradeEvent,
};

use crate::group::TradeGroup;
use crate::protect_money::ProtectMoney;
use crate::sequence::TradeSequence;

pub struct TradeManager {
    instrument: Instrument,
    protect_money: ProtectMoney,
    group: TradeGroup,
    /// Stop loss per sequence, same index as `group.sequences()`.
    stop_losses: Vec<Decimal>,
}

impl TradeManager {
    #[must_use]
    pub const fn new(instrument: Instrument, protect_money: ProtectMoney) -> Self {
        Self {
            instrument,
            protect_money,
            group: TradeGroup::new(),
            stop_losses: Vec::new(),
        }
    }

    /// Records a trade. When it opens a new sequence the protective stop is
    /// computed, attached to the stored event and returned.
    ///
    /// # Errors
    ///
    /// Returns `TradeError::ExitHasNoDirection` for an exit with no open
    /// sequence and `TradeError::Overflow` when the stop or the running total
    /// leaves the decimal range. No state changes on error.
    pub fn enter_trade(&mut self, event: TradeEvent) -> Result<Option<Decimal>, TradeError> {
        if self.group.active_sequence().is_some() {
            self.group.enter_trade(event)?;
            return Ok(None);
        }

        let direction = event.kind().direction()?;
        let stop_loss =
            self.protect_money
                .stop_loss(direction, self.instrument.lot_size(), event.price())?;
        let event = event.with_stop_loss(StopLoss::absolute(stop_loss));

        self.group.enter_trade(event)?;
        self.stop_losses.push(stop_loss);

        tracing::info!(
            symbol = self.instrument.trading_symbol,
            %direction,
            %stop_loss,
            sequence = self.group.len(),
            "Stop loss set for new sequence"
        );

        Ok(Some(stop_loss))
    }

    /// # Errors
    ///
    /// Propagates errors from the active sequence; none are expected.
    pub fn on_bar(&mut self, bar: &PriceBar) -> Result<(), TradeError> {
        self.group.on_bar(bar)
    }

    #[must_use]
    pub fn active_sequence(&self) -> Option<&TradeSequence> {
        self.group.active_sequence()
    }

    #[must_use]
    pub const fn group(&self) -> &TradeGroup {
        &self.group
    }

    #[must_use]
    pub const fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Every recorded trade in arrival order, across all sequences.
    pub fn history(&self) -> impl Iterator<Item = &TradeEvent> + '_ {
        self.group.sequences().iter().flat_map(TradeSequence::trades)
    }

    /// Outstanding quantity of the most recent sequence, zero before any trade.
    #[must_use]
    pub fn total_outstanding(&self) -> Quantity {
        self.group
            .last_sequence()
            .map_or(Quantity::ZERO, TradeSequence::outstanding)
    }

    #[must_use]
    pub fn total_sequences(&self) -> usize {
        self.group.len()
    }

    #[must_use]
    pub fn first_trade_time(&self) -> Option<DateTime<Utc>> {
        self.history().next().map(TradeEvent::timestamp)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    #[must_use]
    pub fn stop_loss(&self, sequence: usize) -> Option<Decimal> {
        self.stop_losses.get(sequence).copied()
    }

    pub fn analyse_trades(&self) {
        for (index, sequence) in self.group.sequences().iter().enumerate() {
            tracing::info!(
                symbol = self.instrument.trading_symbol,
                sequence = index + 1,
                direction = %sequence.direction(),
                active = sequence.is_active(),
                "Sequence history"
            );
            sequence.log_trades();
        }
        tracing::info!("Total outstanding shares = {}", self.total_outstanding());
    }

    #[must_use]
    pub fn summary(&self) -> ManagerSummary {
        let sequences = self
            .group
            .sequences()
            .iter()
            .enumerate()
            .map(|(index, sequence)| SequenceSummary {
                index: index + 1,
                direction: sequence.direction(),
                active: sequence.is_active(),
                outstanding: sequence.outstanding(),
                min_price: sequence.min_price(),
                max_price: sequence.max_price(),
                stop_loss: self.stop_loss(index),
                trade_count: sequence.trades().len(),
                opened_at: sequence.trades().first().map(TradeEvent::timestamp),
                last_trade_at: sequence.trades().last().map(TradeEvent::timestamp),
            })
            .collect();

        ManagerSummary {
            symbol: self.instrument.trading_symbol.clone(),
            exchange: self.instrument.exchange.clone(),
            lot_size: self.instrument.lot_size(),
            total_trades: self.history().count(),
            total_outstanding: self.total_outstanding(),
            first_trade_time: self.first_trade_time(),
            sequences,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceSummary {
    /// 1-based position in the group.
    pub index: usize,
    pub direction: TradeDirection,
    pub active: bool,
    pub outstanding: Quantity,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub trade_count: usize,
    pub opened_at: Option<DateTime<Utc>>,
    pub last_trade_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerSummary {
    pub symbol: String,
    pub exchange: String,
    pub lot_size: u32,
    pub total_trades: usize,
    pub total_outstanding: Quantity,
    pub first_trade_time: Option<DateTime<Utc>>,
    pub sequences: Vec<SequenceSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use trade_manager_core::{StopLossKind, TradeKind};

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap()
    }

    fn manager(lot_size: u32) -> TradeManager {
        let instrument = Instrument::new(408_065, "INFY", "NSE", "EQ", lot_size).unwrap();
        TradeManager::new(instrument, ProtectMoney::default())
    }

    fn trade(minute: u32, kind: TradeKind, quantity: Decimal, price: Decimal) -> TradeEvent {
        TradeEvent::new(ts(minute), kind, Quantity::new(quantity), price).unwrap()
    }

    #[test]
    fn stop_loss_computed_only_when_sequence_opens() {
        let mut mgr = manager(100);

        let opened = mgr.enter_trade(trade(1, TradeKind::LongEntry, dec!(100), dec!(100))).unwrap();
        assert_eq!(opened, Some(dec!(70)));

        let added = mgr.enter_trade(trade(2, TradeKind::LongEntry, dec!(50), dec!(90))).unwrap();
        assert_eq!(added, None);

        let exited = mgr.enter_trade(trade(3, TradeKind::LongExit, dec!(150), dec!(95))).unwrap();
        assert_eq!(exited, None);

        let reopened = mgr.enter_trade(trade(4, TradeKind::ShortEntry, dec!(100), dec!(100))).unwrap();
        assert_eq!(reopened, Some(dec!(101)));

        assert_eq!(mgr.total_sequences(), 2);
        assert_eq!(mgr.stop_loss(0), Some(dec!(70)));
        assert_eq!(mgr.stop_loss(1), Some(dec!(101)));
        assert_eq!(mgr.stop_loss(2), None);
    }

    #[test]
    fn opening_trade_carries_absolute_stop_loss() {
        let mut mgr = manager(10);
        mgr.enter_trade(trade(1, TradeKind::LongEntry, dec!(10), dec!(100))).unwrap();
        mgr.enter_trade(trade(2, TradeKind::LongEntry, dec!(10), dec!(101))).unwrap();

        let history: Vec<&TradeEvent> = mgr.history().collect();
        let first = history[0].stop_loss().unwrap();
        assert_eq!(first.kind, StopLossKind::Absolute);
        assert_eq!(first.value, dec!(-200));
        assert!(history[1].stop_loss().is_none());

        let seq = mgr.active_sequence().unwrap();
        assert_eq!(seq.trades()[0].stop_loss(), Some(first));
    }

    #[test]
    fn orphan_exit_leaves_manager_untouched() {
        let mut mgr = manager(100);
        let err = mgr
            .enter_trade(trade(1, TradeKind::ShortExit, dec!(10), dec!(100)))
            .unwrap_err();
        assert!(matches!(err, TradeError::ExitHasNoDirection { .. }));
        assert!(mgr.is_empty());
        assert_eq!(mgr.history().count(), 0);
        assert_eq!(mgr.total_sequences(), 0);
        assert!(mgr.first_trade_time().is_none());
        assert!(mgr.total_outstanding().is_zero());
    }

    #[test]
    fn overflowing_trade_is_not_recorded() {
        let mut mgr = manager(100);
        let huge = Decimal::MAX - dec!(1);
        mgr.enter_trade(trade(1, TradeKind::ShortEntry, huge, dec!(100))).unwrap();

        let err = mgr
            .enter_trade(trade(2, TradeKind::ShortEntry, huge, dec!(100)))
            .unwrap_err();
        assert!(matches!(err, TradeError::Overflow { .. }));
        assert_eq!(mgr.history().count(), 1);
        assert_eq!(mgr.total_outstanding().value(), huge);
    }

    #[test]
    fn huge_opening_price_is_rejected_without_sequence() {
        let mut mgr = manager(1);
        let err = mgr
            .enter_trade(trade(1, TradeKind::ShortEntry, dec!(1), Decimal::MAX / dec!(100)))
            .unwrap_err();
        assert!(matches!(err, TradeError::Overflow { .. }));
        assert!(mgr.is_empty());
        assert_eq!(mgr.stop_loss(0), None);
    }

    #[test]
    fn totals_follow_latest_sequence() {
        let mut mgr = manager(100);
        mgr.enter_trade(trade(1, TradeKind::LongEntry, dec!(100), dec!(1500))).unwrap();
        mgr.enter_trade(trade(2, TradeKind::LongExit, dec!(100), dec!(1550))).unwrap();
        assert!(mgr.total_outstanding().is_zero());

        mgr.enter_trade(trade(3, TradeKind::LongEntry, dec!(200), dec!(1600))).unwrap();
        mgr.enter_trade(trade(4, TradeKind::LongExit, dec!(50), dec!(1650))).unwrap();

        assert_eq!(mgr.total_outstanding().value(), dec!(150));
        assert_eq!(mgr.first_trade_time(), Some(ts(1)));
        assert_eq!(mgr.history().count(), 4);
        let prices: Vec<Decimal> = mgr.history().map(TradeEvent::price).collect();
        assert_eq!(prices, vec![dec!(1500), dec!(1550), dec!(1600), dec!(1650)]);
    }

    #[test]
    fn summary_reports_every_sequence() {
        let mut mgr = manager(100);
        mgr.enter_trade(trade(1, TradeKind::LongEntry, dec!(100), dec!(100))).unwrap();
        let bar = PriceBar::new(dec!(100), dec!(104), dec!(98), dec!(103), dec!(500), ts(1), ts(2)).unwrap();
        mgr.on_bar(&bar).unwrap();
        mgr.enter_trade(trade(3, TradeKind::LongExit, dec!(100), dec!(103))).unwrap();
        mgr.enter_trade(trade(4, TradeKind::ShortEntry, dec!(40), dec!(102))).unwrap();

        let summary = mgr.summary();
        assert_eq!(summary.symbol, "INFY");
        assert_eq!(summary.lot_size, 100);
        assert_eq!(summary.total_trades, 3);
        assert_eq!(summary.total_outstanding.value(), dec!(40));
        assert_eq!(summary.sequences.len(), 2);

        let first = &summary.sequences[0];
        assert_eq!(first.index, 1);
        assert!(!first.active);
        assert_eq!(first.min_price, Some(dec!(98)));
        assert_eq!(first.max_price, Some(dec!(104)));
        assert_eq!(first.stop_loss, Some(dec!(70)));
        assert_eq!(first.trade_count, 2);
        assert_eq!(first.opened_at, Some(ts(1)));
        assert_eq!(first.last_trade_at, Some(ts(3)));

        let second = &summary.sequences[1];
        assert!(second.active);
        assert_eq!(second.direction, TradeDirection::Short);
        assert_eq!(second.min_price, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["sequences"][1]["direction"], "Short");
    }
}
