//! Protective stop-loss sizing for newly opened positions.
//!
//! The stop is the smaller of two legs: a percent-of-price leg and an
//! absolute leg that spreads a fixed currency risk budget over the lot size.
//! The formula is kept literally. For small lot sizes the absolute leg can
//! drop below zero and is still returned.

use rust_decimal::Decimal;
use trade_manager_core::{ProtectMoneyConfig, TradeDirection, TradeError};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Named configuration value exposed for configuration dumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProperty {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProtectMoney {
    config: ProtectMoneyConfig,
}

impl ProtectMoney {
    #[must_use]
    pub const fn new(config: ProtectMoneyConfig) -> Self {
        Self { config }
    }

    /// Stop-loss price for a position opened at `price`.
    ///
    /// # Errors
    ///
    /// Returns `TradeError::ZeroLotSize` if `lot_size` is zero and
    /// `TradeError::Overflow` if either leg leaves the decimal range.
    pub fn stop_loss(
        &self,
        direction: TradeDirection,
        lot_size: u32,
        price: Decimal,
    ) -> Result<Decimal, TradeError> {
        if lot_size == 0 {
            return Err(TradeError::ZeroLotSize);
        }

        let percent_leg = self.percent_leg(direction, price)?;
        let absolute_leg = self.absolute_leg(direction, lot_size, price)?;
        let stop_loss = percent_leg.min(absolute_leg);

        tracing::debug!(
            %direction,
            lot_size,
            %price,
            %percent_leg,
            %absolute_leg,
            %stop_loss,
            "Computed stop loss"
        );

        Ok(stop_loss)
    }

    fn percent_leg(&self, direction: TradeDirection, price: Decimal) -> Result<Decimal, TradeError> {
        ONE_HUNDRED
            .checked_add(sign(direction) * self.config.stop_loss_percent)
            .and_then(|factor| price.checked_mul(factor))
            .and_then(|scaled| scaled.checked_div(ONE_HUNDRED))
            .ok_or(TradeError::Overflow { operation: "stop loss percent leg" })
    }

    fn absolute_leg(
        &self,
        direction: TradeDirection,
        lot_size: u32,
        price: Decimal,
    ) -> Result<Decimal, TradeError> {
        self.config
            .stop_loss_absolute
            .checked_div(Decimal::from(lot_size))
            .and_then(|loss_per_unit| price.checked_add(sign(direction) * loss_per_unit))
            .ok_or(TradeError::Overflow { operation: "stop loss absolute leg" })
    }

    /// The two stop-loss constants as `(name, value)` pairs.
    #[must_use]
    pub fn properties(&self) -> Vec<ConfigProperty> {
        vec![
            ConfigProperty {
                key: "ProtectMoney:StopLossPercent".to_string(),
                value: property_value(self.config.stop_loss_percent),
            },
            ConfigProperty {
                key: "ProtectMoney:StopLossAbsolute".to_string(),
                value: property_value(self.config.stop_loss_absolute),
            },
        ]
    }
}

/// Normalized value with at least one fractional digit, e.g. `3000.0`.
fn property_value(value: Decimal) -> String {
    let value = value.normalize();
    if value.scale() == 0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

const fn sign(direction: TradeDirection) -> Decimal {
    match direction {
        TradeDirection::Long => Decimal::NEGATIVE_ONE,
        TradeDirection::Short => Decimal::ONE,
    }
}
