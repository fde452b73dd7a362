use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TradeError;
use crate::events::TradeIds;

/// Reference data for one tradable instrument.
///
/// Only `lot_size` feeds the stop-loss calculation; everything else is carried
/// for reporting. Deserialization goes through the same lot-size check as
/// [`Instrument::new`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "InstrumentRecord")]
pub struct Instrument {
    pub instrument_token: u64,
    pub exchange_token: u64,
    pub trading_symbol: String,
    pub name: String,
    pub last_price: Decimal,
    pub tick_size: Decimal,
    pub instrument_type: String,
    pub segment: String,
    pub exchange: String,
    pub strike: Option<Decimal>,
    lot_size: u32,
    pub expiry: Option<NaiveDate>,
}

impl Instrument {
    /// Creates an instrument with the identifying fields set and the rest
    /// left at neutral defaults.
    ///
    /// # Errors
    ///
    /// Returns `TradeError::ZeroLotSize` if `lot_size` is zero.
    pub fn new(
        instrument_token: u64,
        trading_symbol: impl Into<String>,
        exchange: impl Into<String>,
        segment: impl Into<String>,
        lot_size: u32,
    ) -> Result<Self, TradeError> {
        if lot_size == 0 {
            return Err(TradeError::ZeroLotSize);
        }

        let trading_symbol = trading_symbol.into();
        Ok(Self {
            instrument_token,
            exchange_token: 0,
            name: trading_symbol.clone(),
            trading_symbol,
            last_price: Decimal::ZERO,
            tick_size: Decimal::new(5, 2),
            instrument_type: "EQ".to_string(),
            segment: segment.into(),
            exchange: exchange.into(),
            strike: None,
            lot_size,
            expiry: None,
        })
    }

    #[must_use]
    pub const fn lot_size(&self) -> u32 {
        self.lot_size
    }

    #[must_use]
    pub fn core(&self) -> CoreInstrument {
        CoreInstrument::from(self)
    }
}

#[derive(Deserialize)]
struct InstrumentRecord {
    instrument_token: u64,
    #[serde(default)]
    exchange_token: u64,
    trading_symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    last_price: Decimal,
    tick_size: Decimal,
    instrument_type: String,
    segment: String,
    exchange: String,
    #[serde(default)]
    strike: Option<Decimal>,
    lot_size: u32,
    #[serde(default)]
    expiry: Option<NaiveDate>,
}

impl TryFrom<InstrumentRecord> for Instrument {
    type Error = TradeError;

    fn try_from(record: InstrumentRecord) -> Result<Self, Self::Error> {
        if record.lot_size == 0 {
            return Err(TradeError::ZeroLotSize);
        }

        Ok(Self {
            instrument_token: record.instrument_token,
            exchange_token: record.exchange_token,
            trading_symbol: record.trading_symbol,
            name: record.name,
            last_price: record.last_price,
            tick_size: record.tick_size,
            instrument_type: record.instrument_type,
            segment: record.segment,
            exchange: record.exchange,
            strike: record.strike,
            lot_size: record.lot_size,
            expiry: record.expiry,
        })
    }
}

/// Identifying subset of an [`Instrument`], cheap to attach to trades.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CoreInstrument {
    pub instrument_token: u64,
    pub trading_symbol: String,
    pub exchange: String,
    pub segment: String,
}

impl From<&Instrument> for CoreInstrument {
    fn from(instrument: &Instrument) -> Self {
        Self {
            instrument_token: instrument.instrument_token,
            trading_symbol: instrument.trading_symbol.clone(),
            exchange: instrument.exchange.clone(),
            segment: instrument.segment.clone(),
        }
    }
}

impl CoreInstrument {
    /// Identifiers stamped on every trade executed through `broker`. The
    /// per-trade id is left empty for the caller to fill.
    #[must_use]
    pub fn trade_ids(&self, broker: impl Into<String>) -> TradeIds {
        TradeIds {
            broker: broker.into(),
            instrument_id: self.trading_symbol.clone(),
            exchange: self.exchange.clone(),
            segment: self.segment.clone(),
            trade_id: String::new(),
        }
    }
}
