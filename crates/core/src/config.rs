use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub protect_money: ProtectMoneyConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Stop-loss parameters used when a new position is opened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtectMoneyConfig {
    /// Percent of the entry price (1.0 = 1%).
    #[serde(default = "default_stop_loss_percent")]
    pub stop_loss_percent: Decimal,
    /// Total currency risk per position, spread over the lot size.
    #[serde(default = "default_stop_loss_absolute")]
    pub stop_loss_absolute: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_stop_loss_percent() -> Decimal {
    Decimal::new(10, 1) // 1.0%
}

fn default_stop_loss_absolute() -> Decimal {
    Decimal::from(3000)
}

const fn default_channel_capacity() -> usize {
    1024
}

impl Default for ProtectMoneyConfig {
    fn default() -> Self {
        Self {
            stop_loss_percent: default_stop_loss_percent(),
            stop_loss_absolute: default_stop_loss_absolute(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}
