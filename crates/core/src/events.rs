use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TradeError;
use crate::quantity::Quantity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeKind {
    #[serde(alias = "LONG")]
    LongEntry,
    #[serde(alias = "SHORT")]
    ShortEntry,
    LongExit,
    ShortExit,
}

impl TradeKind {
    #[must_use]
    pub const fn is_entry(self) -> bool {
        match self {
            Self::LongEntry | Self::ShortEntry => true,
            Self::LongExit | Self::ShortExit => false,
        }
    }

    #[must_use]
    pub const fn is_exit(self) -> bool {
        !self.is_entry()
    }

    /// Direction implied by an entry kind.
    ///
    /// # Errors
    ///
    /// Returns `TradeError::ExitHasNoDirection` for exit kinds: an exit on its
    /// own says nothing about which position it belongs to.
    pub fn direction(self) -> Result<TradeDirection, TradeError> {
        match self {
            Self::LongEntry => Ok(TradeDirection::Long),
            Self::ShortEntry => Ok(TradeDirection::Short),
            Self::LongExit | Self::ShortExit => Err(TradeError::ExitHasNoDirection { kind: self }),
        }
    }

    /// Side of the book this kind trades on, defined for every kind.
    #[must_use]
    pub const fn side(self) -> TradeDirection {
        match self {
            Self::LongEntry | Self::LongExit => TradeDirection::Long,
            Self::ShortEntry | Self::ShortExit => TradeDirection::Short,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LongEntry => "LONG_ENTRY",
            Self::ShortEntry => "SHORT_ENTRY",
            Self::LongExit => "LONG_EXIT",
            Self::ShortExit => "SHORT_EXIT",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeKind {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" | "LONG_ENTRY" => Ok(Self::LongEntry),
            "SHORT" | "SHORT_ENTRY" => Ok(Self::ShortEntry),
            "LONG_EXIT" => Ok(Self::LongExit),
            "SHORT_EXIT" => Ok(Self::ShortExit),
            _ => Err(TradeError::UnknownTradeKind(s.to_string())),
        }
    }
}

impl TryFrom<TradeKind> for TradeDirection {
    type Error = TradeError;

    fn try_from(kind: TradeKind) -> Result<Self, Self::Error> {
        kind.direction()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TradeDirection {
    Long,
    Short,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopLossKind {
    /// Stop at a fixed price.
    Absolute,
    /// Stop at a fixed distance from the entry price.
    DiffAbsolute,
    /// Stop at a percentage distance from the entry price.
    DiffPercent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StopLoss {
    pub kind: StopLossKind,
    pub value: Decimal,
}

impl StopLoss {
    #[must_use]
    pub const fn absolute(value: Decimal) -> Self {
        Self {
            kind: StopLossKind::Absolute,
            value,
        }
    }
}

impl fmt::Display for StopLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.value)
    }
}

/// Opaque identifiers carried through for audit and logging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TradeIds {
    pub broker: String,
    pub instrument_id: String,
    pub exchange: String,
    pub segment: String,
    pub trade_id: String,
}

/// One execution. Built once by the caller and never mutated after it is
/// handed to a trade group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeEvent {
    timestamp: DateTime<Utc>,
    kind: TradeKind,
    quantity: Quantity,
    price: Decimal,
    ids: TradeIds,
    stop_loss: Option<StopLoss>,
}

impl TradeEvent {
    /// # Errors
    ///
    /// Returns an error if `quantity` or `price` is not strictly positive.
    pub fn new(
        timestamp: DateTime<Utc>,
        kind: TradeKind,
        quantity: Quantity,
        price: Decimal,
    ) -> Result<Self, TradeError> {
        if !quantity.is_positive() {
            return Err(TradeError::NonPositiveQuantity { quantity });
        }
        if price <= Decimal::ZERO {
            return Err(TradeError::NonPositivePrice { price });
        }

        Ok(Self {
            timestamp,
            kind,
            quantity,
            price,
            ids: TradeIds::default(),
            stop_loss: None,
        })
    }

    #[must_use]
    pub fn with_ids(mut self, ids: TradeIds) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn with_stop_loss(mut self, stop_loss: StopLoss) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn kind(&self) -> TradeKind {
        self.kind
    }

    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub const fn ids(&self) -> &TradeIds {
        &self.ids
    }

    #[must_use]
    pub const fn stop_loss(&self) -> Option<StopLoss> {
        self.stop_loss
    }

    #[must_use]
    pub const fn is_entry(&self) -> bool {
        self.kind.is_entry()
    }
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade [{}, {}, type={}, quantity={}, price={}",
            self.ids.instrument_id,
            self.timestamp.to_rfc3339(),
            self.kind,
            self.quantity,
            self.price
        )?;
        match &self.stop_loss {
            Some(stop_loss) => write!(f, ", stopLoss={stop_loss}]"),
            None => write!(f, "]"),
        }
    }
}

/// OHLCV bar from the market-data feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBar {
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl PriceBar {
    /// # Errors
    ///
    /// Returns `TradeError::InvalidBar` unless `low <= open, close <= high`
    /// and `start_time <= end_time`.
    pub fn new(
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self, TradeError> {
        if low > high {
            return Err(TradeError::InvalidBar {
                reason: format!("low {low} above high {high}"),
            });
        }
        if open < low || open > high || close < low || close > high {
            return Err(TradeError::InvalidBar {
                reason: format!("open {open} / close {close} outside [{low}, {high}]"),
            });
        }
        if start_time > end_time {
            return Err(TradeError::InvalidBar {
                reason: format!("starts {start_time} after it ends {end_time}"),
            });
        }

        Ok(Self {
            open,
            high,
            low,
            close,
            volume,
            start_time,
            end_time,
        })
    }

    #[must_use]
    pub const fn open(&self) -> Decimal {
        self.open
    }

    #[must_use]
    pub const fn high(&self) -> Decimal {
        self.high
    }

    #[must_use]
    pub const fn low(&self) -> Decimal {
        self.low
    }

    #[must_use]
    pub const fn close(&self) -> Decimal {
        self.close
    }

    #[must_use]
    pub const fn volume(&self) -> Decimal {
        self.volume
    }

    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub const fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }
}
