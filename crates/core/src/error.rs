use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::events::{TradeDirection, TradeEvent, TradeKind};
use crate::quantity::Quantity;

/// Errors raised by the sequencing core.
///
/// The routing variants are precondition violations: they point at a bug in
/// the caller and are never transient. The rest reject input values. The offending values travel with the error so the caller can
/// decide what to log.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    /// A direction was requested from an exit kind.
    #[error("invalid argument: {kind} is an exit kind and implies no trade direction")]
    ExitHasNoDirection { kind: TradeKind },

    /// A trade was routed to a sequence that is already flat.
    #[error(
        "illegal state: {direction} sequence is closed (outstanding {outstanding}, {trade_count} trades), rejected {event}"
    )]
    SequenceClosed {
        direction: TradeDirection,
        outstanding: Quantity,
        trade_count: usize,
        event: Box<TradeEvent>,
    },

    /// A bar was routed to a sequence that is already flat.
    #[error("illegal state: bar ending {bar_end} sent to closed {direction} sequence")]
    BarOnClosedSequence {
        direction: TradeDirection,
        bar_end: DateTime<Utc>,
    },

    #[error("trade quantity must be positive, got {quantity}")]
    NonPositiveQuantity { quantity: Quantity },

    #[error("trade price must be positive, got {price}")]
    NonPositivePrice { price: Decimal },

    #[error("invalid price bar: {reason}")]
    InvalidBar { reason: String },

    #[error("lot size must be a positive integer")]
    ZeroLotSize,

    #[error("unknown trade kind: {0}")]
    UnknownTradeKind(String),

    /// A decimal result fell outside the representable range.
    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },
}

impl TradeError {
    /// True for errors caused by routing a call to the wrong state.
    #[must_use]
    pub const fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::ExitHasNoDirection { .. }
                | Self::SequenceClosed { .. }
                | Self::BarOnClosedSequence { .. }
        )
    }
}
