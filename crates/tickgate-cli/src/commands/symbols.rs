use std::sync::Arc;

use serde::Serialize;

use tickgate_core::{MarketDataCache, Symbol};
use tickgate_store::{resolve_dataset_path, ParquetDataset};

use super::CommandResult;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SymbolsResponseData {
    symbols: Vec<Symbol>,
    degraded: bool,
}

pub async fn run() -> Result<CommandResult, CliError> {
    let cache = MarketDataCache::new(Arc::new(ParquetDataset::new(resolve_dataset_path())));

    let symbols = cache.symbols().await;
    let degraded = cache.is_degraded().await;

    let data = serde_json::to_value(SymbolsResponseData { symbols, degraded })?;
    Ok(CommandResult::ok(data))
}
