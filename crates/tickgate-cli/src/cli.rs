//! CLI argument definitions for tickgate.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `indicator` | Compute an indicator series for a symbol |
//! | `symbols` | List symbols present in the dataset |
//! | `tiers` | Show the tier capability table |
//! | `init` | Initialize the local store, optionally registering a key |
//!
//! # Examples
//!
//! ```bash
//! # Initialize and register a free-tier key
//! tickgate init --register free
//!
//! # Compute a 20-day SMA
//! tickgate indicator sma AAPL --api-key <KEY>
//!
//! # MACD with custom spans, pretty-printed
//! tickgate indicator macd MSFT --fast 8 --slow 21 --pretty
//! ```

use clap::{Args, Parser, Subcommand};

/// API-key gated technical indicators over a local daily OHLC dataset.
#[derive(Debug, Parser)]
#[command(
    name = "tickgate",
    author,
    version,
    about = "Tiered technical-indicator service"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// API key identifying the caller.
    #[arg(long, global = true, env = "TICKGATE_API_KEY")]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute an indicator series for a symbol.
    ///
    /// Access is gated by the caller's tier: allowed indicators, history
    /// depth, and the daily request quota all follow the tier table
    /// (see `tickgate tiers`).
    Indicator(IndicatorArgs),

    /// List symbols present in the loaded dataset.
    Symbols,

    /// Show the tier capability table.
    Tiers,

    /// Initialize the local store, optionally registering a new API key.
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct IndicatorArgs {
    /// Indicator name: sma, ema, rsi, macd, or bollinger.
    pub name: String,

    /// Market symbol, e.g. AAPL. Case-insensitive.
    pub symbol: String,

    /// Averaging period (default 20; rsi defaults to 14).
    #[arg(long)]
    pub period: Option<u32>,

    /// Fast EMA span for macd (default 12).
    #[arg(long)]
    pub fast: Option<u32>,

    /// Slow EMA span for macd (default 26).
    #[arg(long)]
    pub slow: Option<u32>,

    /// Signal span for macd (default 9).
    #[arg(long)]
    pub signal: Option<u32>,

    /// Standard-deviation multiplier for bollinger (default 2.0).
    #[arg(long = "std-dev")]
    pub std_dev: Option<f64>,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Register a new API key on this tier (free, pro, premium) and print it.
    #[arg(long, value_name = "TIER")]
    pub register: Option<String>,
}
