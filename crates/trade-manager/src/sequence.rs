//! One directional position from open to flat.

use rust_decimal::Decimal;
use trade_manager_core::{PriceBar, Quantity, TradeDirection, TradeError, TradeEvent};

#[derive(Debug, Clone)]
pub struct TradeSequence {
    direction: TradeDirection,
    trades: Vec<TradeEvent>,
    outstanding: Quantity,
    active: bool,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
}

impl TradeSequence {
    #[must_use]
    pub const fn new(direction: TradeDirection) -> Self {
        Self {
            direction,
            trades: Vec::new(),
            outstanding: Quantity::ZERO,
            active: true,
            min_price: None,
            max_price: None,
        }
    }

    /// Folds a trade into the running outstanding total.
    ///
    /// Entries add their quantity, exits subtract it. The sequence closes for
    /// good as soon as the total returns to exactly zero.
    ///
    /// # Errors
    ///
    /// Returns `TradeError::SequenceClosed` if the sequence is already flat.
    /// The error carries the rejected event and the sequence state. Returns
    /// `TradeError::Overflow` if the running total leaves the decimal range,
    /// in which case the trade is not recorded.
    pub fn add_trade(&mut self, event: TradeEvent) -> Result<(), TradeError> {
        if !self.active {
            return Err(TradeError::SequenceClosed {
                direction: self.direction,
                outstanding: self.outstanding,
                trade_count: self.trades.len(),
                event: Box::new(event),
            });
        }

        if event.kind().side() != self.direction {
            tracing::warn!(
                direction = %self.direction,
                kind = %event.kind(),
                "Trade side does not match sequence direction"
            );
        }

        if event.is_entry() {
            self.outstanding.add(event.quantity())?;
        } else {
            self.outstanding.subtract(event.quantity())?;
        }
        self.trades.push(event);

        if self.outstanding.is_negative() {
            tracing::warn!(
                direction = %self.direction,
                outstanding = %self.outstanding,
                "Exits exceed entries, sequence is over-closed"
            );
        }

        if self.outstanding.is_zero() {
            self.active = false;
            tracing::info!(
                direction = %self.direction,
                trades = self.trades.len(),
                "Sequence closed"
            );
        }

        Ok(())
    }

    /// Widens the observed price range with a bar's high and low.
    ///
    /// # Errors
    ///
    /// Returns `TradeError::BarOnClosedSequence` if the sequence is flat.
    pub fn on_bar(&mut self, bar: &PriceBar) -> Result<(), TradeError> {
        if !self.active {
            return Err(TradeError::BarOnClosedSequence {
                direction: self.direction,
                bar_end: bar.end_time(),
            });
        }

        self.min_price = Some(self.min_price.map_or(bar.low(), |min| min.min(bar.low())));
        self.max_price = Some(self.max_price.map_or(bar.high(), |max| max.max(bar.high())));
        Ok(())
    }

    #[must_use]
    pub const fn direction(&self) -> TradeDirection {
        self.direction
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Copy of the running outstanding total.
    #[must_use]
    pub const fn outstanding(&self) -> Quantity {
        self.outstanding.snapshot()
    }

    /// Lowest low seen while active, `None` before the first bar.
    #[must_use]
    pub const fn min_price(&self) -> Option<Decimal> {
        self.min_price
    }

    /// Highest high seen while active, `None` before the first bar.
    #[must_use]
    pub const fn max_price(&self) -> Option<Decimal> {
        self.max_price
    }

    #[must_use]
    pub fn trades(&self) -> &[TradeEvent] {
        &self.trades
    }

    pub fn log_trades(&self) {
        for trade in &self.trades {
            tracing::info!("{trade}");
        }
    }
}
