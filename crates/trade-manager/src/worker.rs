//! One worker task per instrument.
//!
//! The trade group is a single-writer structure. When several producers feed
//! the same instrument, they talk to a [`WorkerHandle`] and the worker applies
//! commands strictly in channel order.

use anyhow::Result;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use trade_manager_core::{PriceBar, TradeError, TradeEvent};

use crate::manager::{ManagerSummary, TradeManager};

#[derive(Debug)]
pub enum WorkerCommand {
    EnterTrade(TradeEvent, oneshot::Sender<Result<Option<Decimal>, TradeError>>),
    Bar(PriceBar),
    Summary(oneshot::Sender<ManagerSummary>),
    Shutdown,
}

pub struct InstrumentWorker {
    manager: TradeManager,
    rx: mpsc::Receiver<WorkerCommand>,
}

impl InstrumentWorker {
    #[must_use]
    pub const fn new(manager: TradeManager, rx: mpsc::Receiver<WorkerCommand>) -> Self {
        Self { manager, rx }
    }

    /// Processes commands until `Shutdown` or until every handle is dropped,
    /// then hands the manager back.
    pub async fn run(mut self) -> TradeManager {
        let symbol = self.manager.instrument().trading_symbol.clone();
        tracing::info!(symbol, "Instrument worker starting");

        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                WorkerCommand::EnterTrade(event, reply) => {
                    let result = self.manager.enter_trade(event);
                    if let Err(e) = &result {
                        tracing::error!(symbol, "Rejected trade: {}", e);
                    }
                    if reply.send(result).is_err() {
                        tracing::debug!(symbol, "Trade reply dropped by caller");
                    }
                }
                WorkerCommand::Bar(bar) => {
                    if let Err(e) = self.manager.on_bar(&bar) {
                        tracing::error!(symbol, "Failed to apply bar: {}", e);
                    }
                }
                WorkerCommand::Summary(reply) => {
                    let _ = reply.send(self.manager.summary());
                }
                WorkerCommand::Shutdown => {
                    tracing::info!(symbol, "Instrument worker received shutdown");
                    break;
                }
            }
        }

        tracing::info!(
            symbol,
            sequences = self.manager.total_sequences(),
            "Instrument worker stopped"
        );
        self.manager
    }
}

#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerCommand>,
}

impl WorkerHandle {
    #[must_use]
    pub const fn new(tx: mpsc::Sender<WorkerCommand>) -> Self {
        Self { tx }
    }

    /// Sends a trade and waits for the worker to apply it.
    ///
    /// Returns the stop loss when the trade opened a new sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker is gone or rejected the trade. Rejections
    /// carry a [`TradeError`] that can be recovered with `downcast_ref`.
    pub async fn enter_trade(&self, event: TradeEvent) -> Result<Option<Decimal>> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(WorkerCommand::EnterTrade(event, tx)).await?;
        let stop_loss = rx.await??;
        Ok(stop_loss)
    }

    /// Queues a bar. Bars are applied in order with trades.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent to the worker.
    pub async fn on_bar(&self, bar: PriceBar) -> Result<()> {
        self.tx.send(WorkerCommand::Bar(bar)).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the command cannot be sent or the response cannot be received.
    pub async fn summary(&self) -> Result<ManagerSummary> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(WorkerCommand::Summary(tx)).await?;
        let summary = rx.await?;
        Ok(summary)
    }

    /// # Errors
    ///
    /// Returns an error if the command cannot be sent to the worker.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(WorkerCommand::Shutdown).await?;
        Ok(())
    }
}

/// Spawns a worker task that owns `manager`.
///
/// The join handle resolves to the manager once the worker stops.
#[must_use]
pub fn spawn_worker(
    manager: TradeManager,
    capacity: usize,
) -> (WorkerHandle, JoinHandle<TradeManager>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let worker = InstrumentWorker::new(manager, rx);
    let join = tokio::spawn(worker.run());
    (WorkerHandle::new(tx), join)
}
