use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use tickgate_core::{AccessGate, EnvelopeError, GateRequest, MarketDataCache};
use tickgate_store::{resolve_dataset_path, DuckDbIdentityStore, ParquetDataset};

use super::CommandResult;
use crate::cli::{Cli, IndicatorArgs};
use crate::error::CliError;

pub async fn run(cli: &Cli, args: &IndicatorArgs) -> Result<CommandResult, CliError> {
    let api_key = cli.api_key.clone().ok_or_else(|| {
        CliError::Command(String::from(
            "an API key is required: pass --api-key or set TICKGATE_API_KEY",
        ))
    })?;

    let store = DuckDbIdentityStore::open_default()
        .map_err(|error| CliError::Command(error.to_string()))?;
    let cache = MarketDataCache::new(Arc::new(ParquetDataset::new(resolve_dataset_path())));
    let gate = AccessGate::new(Arc::new(store), cache);

    let request = GateRequest {
        api_key,
        indicator: args.name.clone(),
        symbol: args.symbol.clone(),
        params: params_map(args),
    };

    match gate.handle(&request).await {
        Ok(response) => Ok(CommandResult::ok(serde_json::to_value(response)?)),
        Err(error) => {
            let envelope_error = EnvelopeError::new(error.code(), error.to_string())?
                .with_status(error.status_code());
            Ok(CommandResult::failed(Value::Null, envelope_error))
        }
    }
}

fn params_map(args: &IndicatorArgs) -> HashMap<String, f64> {
    let mut params = HashMap::new();
    if let Some(period) = args.period {
        params.insert(String::from("period"), f64::from(period));
    }
    if let Some(fast) = args.fast {
        params.insert(String::from("fast"), f64::from(fast));
    }
    if let Some(slow) = args.slow {
        params.insert(String::from("slow"), f64::from(slow));
    }
    if let Some(signal) = args.signal {
        params.insert(String::from("signal"), f64::from(signal));
    }
    if let Some(std_dev) = args.std_dev {
        params.insert(String::from("std_dev"), std_dev);
    }
    params
}
