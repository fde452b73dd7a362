//! Append-only list of sequences for one instrument.
//!
//! Only the last sequence can be active; everything before it is frozen
//! history.

use trade_manager_core::{PriceBar, TradeError, TradeEvent};

use crate::sequence::TradeSequence;

#[derive(Debug, Clone, Default)]
pub struct TradeGroup {
    sequences: Vec<TradeSequence>,
}

impl TradeGroup {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sequences: Vec::new(),
        }
    }

    /// Routes a trade to the current sequence, opening a new one first when
    /// nothing is active.
    ///
    /// # Errors
    ///
    /// Returns `TradeError::ExitHasNoDirection` when an exit arrives with no
    /// active sequence. Nothing is appended in that case.
    pub fn enter_trade(&mut self, event: TradeEvent) -> Result<(), TradeError> {
        if let Some(sequence) = self.sequences.last_mut().filter(|s| s.is_active()) {
            return sequence.add_trade(event);
        }

        let direction = event.kind().direction()?;
        tracing::info!(
            %direction,
            sequence = self.sequences.len() + 1,
            "Opening new trade sequence"
        );

        let mut sequence = TradeSequence::new(direction);
        sequence.add_trade(event)?;
        self.sequences.push(sequence);
        Ok(())
    }

    /// Forwards a bar to the active sequence. Without one this is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates sequence errors; with the active check in place none are
    /// expected.
    pub fn on_bar(&mut self, bar: &PriceBar) -> Result<(), TradeError> {
        match self.sequences.last_mut() {
            Some(sequence) if sequence.is_active() => sequence.on_bar(bar),
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn active_sequence(&self) -> Option<&TradeSequence> {
        self.sequences.last().filter(|sequence| sequence.is_active())
    }

    #[must_use]
    pub fn last_sequence(&self) -> Option<&TradeSequence> {
        self.sequences.last()
    }

    #[must_use]
    pub fn sequences(&self) -> &[TradeSequence] {
        &self.sequences
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
