pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod instrument;
pub mod quantity;

pub use config::{AppConfig, ProtectMoneyConfig, WorkerConfig};
pub use config_loader::ConfigLoader;
pub use error::TradeError;
pub use events::{PriceBar, StopLoss, StopLossKind, TradeDirection, TradeEvent, TradeIds, TradeKind};
pub use instrument::{CoreInstrument, Instrument};
pub use quantity::Quantity;
