use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use trade_manager::{spawn_worker, ProtectMoney, ReportFormatter, TradeManager};
use trade_manager_core::{AppConfig, ConfigLoader, Instrument};

mod replay;

#[derive(Parser)]
#[command(name = "trade-manager")]
#[command(about = "Position sequencing and stop-loss sizing for recorded executions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded trades and bars for one instrument
    Replay {
        /// Trades CSV (timestamp,trade_id,kind,quantity,price)
        #[arg(short, long)]
        trades: PathBuf,
        /// Bars CSV (start_time,end_time,open,high,low,close,volume)
        #[arg(short, long)]
        bars: Option<PathBuf>,
        /// Trading symbol
        #[arg(short, long)]
        symbol: String,
        /// Instrument lot size
        #[arg(short, long)]
        lot_size: u32,
        /// Instrument token
        #[arg(long, default_value_t = 0)]
        token: u64,
        /// Exchange name
        #[arg(long, default_value = "NSE")]
        exchange: String,
        /// Exchange segment
        #[arg(long, default_value = "EQ")]
        segment: String,
        /// Broker name recorded on every trade
        #[arg(long, default_value = "replay")]
        broker: String,
        /// Config file path
        #[arg(short, long, env = "TRADE_MANAGER_CONFIG")]
        config: Option<PathBuf>,
        /// Config profile overlay (config/Config.{profile}.toml)
        #[arg(short, long)]
        profile: Option<String>,
        /// Print the summary as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
    /// Print the stop-loss configuration properties
    Properties {
        /// Config file path
        #[arg(short, long, env = "TRADE_MANAGER_CONFIG")]
        config: Option<PathBuf>,
        /// Config profile overlay (config/Config.{profile}.toml)
        #[arg(short, long)]
        profile: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            trades,
            bars,
            symbol,
            lot_size,
            token,
            exchange,
            segment,
            broker,
            config,
            profile,
            json,
        } => {
            let app_config = load_config(config.as_deref(), profile.as_deref())?;
            let instrument = Instrument::new(token, symbol, exchange, segment, lot_size)?;
            run_replay(&app_config, instrument, &broker, &trades, bars.as_deref(), json).await?;
        }
        Commands::Properties { config, profile } => {
            let app_config = load_config(config.as_deref(), profile.as_deref())?;
            let protect_money = ProtectMoney::new(app_config.protect_money);
            for property in protect_money.properties() {
                println!("{} = {}", property.key, property.value);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, profile: Option<&str>) -> Result<AppConfig> {
    let config = match (path, profile) {
        (Some(path), _) => ConfigLoader::load_from(path)?,
        (None, Some(profile)) => ConfigLoader::load_with_profile(profile)?,
        (None, None) => ConfigLoader::load()?,
    };
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

async fn run_replay(
    config: &AppConfig,
    instrument: Instrument,
    broker: &str,
    trades_path: &Path,
    bars_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let ids = instrument.core().trade_ids(broker);

    let trades = replay::load_trades(trades_path, &ids)?;
    let bars = match bars_path {
        Some(path) => replay::load_bars(path)?,
        None => Vec::new(),
    };
    tracing::info!(
        symbol = instrument.trading_symbol,
        trades = trades.len(),
        bars = bars.len(),
        "Loaded replay data"
    );

    let manager = TradeManager::new(instrument, ProtectMoney::new(config.protect_money));
    let (handle, join) = spawn_worker(manager, config.worker.channel_capacity);

    let outcome = replay::replay(&handle, replay::merge(trades, bars)).await;
    let summary = handle.summary().await?;
    handle.shutdown().await?;
    let manager = join.await?;
    manager.analyse_trades();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", ReportFormatter::format(&summary));
    }

    outcome
}
